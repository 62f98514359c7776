//! Mock speech listener for testing
//!
//! Returns a scripted transcript (or error) instead of opening a microphone.

use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use tutortalk::error::{TutorError, TutorResult};
use tutortalk::speech_input::SpeechListener;

pub struct MockListener {
    outcome: TutorResult<String>,
    /// (timeout, phrase_limit) of every listen call
    pub requests: Mutex<Vec<(Duration, Duration)>>,
}

impl MockListener {
    /// Listener that hears `text`
    pub fn hearing(text: &str) -> Self {
        Self::with_outcome(Ok(text.to_string()))
    }

    /// Listener that hears nothing before the timeout
    pub fn silent() -> Self {
        Self::with_outcome(Err(TutorError::NoSpeechDetected(8)))
    }

    pub fn with_outcome(outcome: TutorResult<String>) -> Self {
        Self {
            outcome,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn listen_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl SpeechListener for MockListener {
    async fn listen(&self, timeout: Duration, phrase_limit: Duration) -> TutorResult<String> {
        self.requests.lock().unwrap().push((timeout, phrase_limit));
        self.outcome.clone()
    }
}
