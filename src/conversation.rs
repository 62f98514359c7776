//! Conversation State
//!
//! Two parallel views of the dialogue: a display log shown to the student
//! and an API log replayed to the model as context. Both are appended in the
//! same call so they never drift apart.

use serde::{Deserialize, Serialize};

/// Speaker label for the student's turns.
pub const USER_LABEL: &str = "🧍 You";
/// Speaker label for the tutor's turns.
pub const ASSISTANT_LABEL: &str = "🤖 AI";

/// Chat role as understood by the model API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One line of the on-screen history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayTurn {
    pub speaker: String,
    pub text: String,
}

/// One message of model context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiTurn {
    pub role: Role,
    pub content: String,
}

impl ApiTurn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// In-memory dialogue for one session
#[derive(Debug, Clone, Default)]
pub struct ConversationState {
    display: Vec<DisplayTurn>,
    api: Vec<ApiTurn>,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one entry to each log.
    pub fn append_turn(
        &mut self,
        speaker_label: impl Into<String>,
        display_text: impl Into<String>,
        role: Role,
        api_text: impl Into<String>,
    ) {
        self.display.push(DisplayTurn {
            speaker: speaker_label.into(),
            text: display_text.into(),
        });
        self.api.push(ApiTurn {
            role,
            content: api_text.into(),
        });
    }

    /// Record a completed question/answer pair, user turn first.
    pub fn record_exchange(&mut self, query: &str, reply: &str) {
        self.append_turn(USER_LABEL, query, Role::User, query);
        self.append_turn(ASSISTANT_LABEL, reply, Role::Assistant, reply);
    }

    pub fn clear(&mut self) {
        self.display.clear();
        self.api.clear();
    }

    /// The last `n` display turns, newest first.
    ///
    /// The iterator borrows the log, so it is cheap to clone and walk again.
    pub fn recent_display(
        &self,
        n: usize,
    ) -> impl DoubleEndedIterator<Item = &DisplayTurn> + ExactSizeIterator + Clone + '_ {
        let start = self.display.len().saturating_sub(n);
        self.display[start..].iter().rev()
    }

    pub fn api_history(&self) -> &[ApiTurn] {
        &self.api
    }

    pub fn display_log(&self) -> &[DisplayTurn] {
        &self.display
    }

    /// Number of turns (identical for both logs).
    pub fn len(&self) -> usize {
        self.api.len()
    }

    pub fn is_empty(&self) -> bool {
        self.api.is_empty()
    }
}
