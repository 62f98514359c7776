//! TutorTalk Library
//!
//! Conversation state, the tutor model client, and the speech adapters
//! behind the TutorTalk voice tutor.

pub mod asr;
pub mod audio;
pub mod config;
pub mod conversation;
pub mod core;
pub mod error;
pub mod gui;
pub mod logging;
pub mod session;
pub mod speech_input;
pub mod speech_output;
pub mod tts;

pub use conversation::{ApiTurn, ConversationState, DisplayTurn, Role};
pub use error::{TutorError, TutorResult};
pub use session::{ControllerState, SessionController, SessionOptions};
