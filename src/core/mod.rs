//! Core tutoring logic
//!
//! Contains the remote model client used to answer questions.

pub mod tutor;

pub use tutor::{ChatCompletionsClient, TutorBackend};
