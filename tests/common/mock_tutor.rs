//! Mock tutor backend for testing
//!
//! Plays back scripted replies and records what it was asked.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tutortalk::conversation::ApiTurn;
use tutortalk::core::TutorBackend;
use tutortalk::error::{TutorError, TutorResult};

/// One recorded `ask` call
#[derive(Debug, Clone, PartialEq)]
pub struct AskCall {
    pub query: String,
    pub history: Vec<ApiTurn>,
}

pub struct MockTutor {
    replies: Mutex<VecDeque<TutorResult<String>>>,
    pub calls: Mutex<Vec<AskCall>>,
}

impl MockTutor {
    pub fn new(replies: Vec<TutorResult<String>>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Tutor that always gives the same answer
    pub fn answering(reply: &str) -> Self {
        Self::new(vec![Ok(reply.to_string())])
    }

    pub fn calls(&self) -> Vec<AskCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl TutorBackend for MockTutor {
    async fn ask(&self, query: &str, history: &[ApiTurn]) -> TutorResult<String> {
        self.calls.lock().unwrap().push(AskCall {
            query: query.to_string(),
            history: history.to_vec(),
        });

        let mut replies = self.replies.lock().unwrap();
        if replies.len() > 1 {
            return replies.pop_front().unwrap();
        }
        replies
            .front()
            .cloned()
            .unwrap_or_else(|| Err(TutorError::Upstream("no scripted reply".to_string())))
    }

    fn name(&self) -> &str {
        "mock-tutor"
    }
}
