//! TutorTalk Error Types
//!
//! Centralized error handling. Every variant carries plain strings so the
//! error can be cloned into GUI messages.

use thiserror::Error;

/// Central error type for TutorTalk
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TutorError {
    /// The remote model could not be reached at all.
    #[error("could not reach the tutor service: {0}")]
    Transport(String),

    /// The remote model answered, but not with a usable reply.
    #[error("tutor service error: {0}")]
    Upstream(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("no speech detected within {0} seconds")]
    NoSpeechDetected(u64),

    #[error("speech recognition failed: {0}")]
    Recognition(String),

    #[error("audio capture error: {0}")]
    Audio(String),

    #[error("speech synthesis error: {0}")]
    Synthesis(String),

    #[error("still busy with the previous request")]
    Busy,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("lock poisoned: {0}")]
    Lock(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("JSON error: {0}")]
    Json(String),
}

impl TutorError {
    /// True for failures of the microphone path (capture or recognition).
    pub fn is_voice_input(&self) -> bool {
        matches!(
            self,
            TutorError::NoSpeechDetected(_) | TutorError::Recognition(_) | TutorError::Audio(_)
        )
    }
}

/// Result type alias for TutorTalk operations
pub type TutorResult<T> = Result<T, TutorError>;

impl From<std::io::Error> for TutorError {
    fn from(err: std::io::Error) -> Self {
        TutorError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for TutorError {
    fn from(err: serde_json::Error) -> Self {
        TutorError::Json(err.to_string())
    }
}

/// Helper to convert Mutex poison errors
impl<T> From<std::sync::PoisonError<T>> for TutorError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        TutorError::Lock(err.to_string())
    }
}
