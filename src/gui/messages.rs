//! Message types for the TutorTalk GUI

use crate::error::TutorResult;
use crate::session::AskRequest;

/// Messages that drive the application
#[derive(Debug, Clone)]
pub enum Message {
    // Question box
    InputChanged(String),
    SendPressed,

    // Buttons
    SpeakPressed,
    StopVoicePressed,
    ClearMemoryPressed,

    // Background results
    Heard(TutorResult<String>),
    ReplyReceived(AskRequest, TutorResult<String>),
    HealthChecked(bool),

    /// Periodic refresh while a reply is being spoken
    Tick,
}
