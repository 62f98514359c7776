//! Main application state for the TutorTalk GUI

use iced::Task;
use tracing::info;

use super::messages::Message;
use crate::session::SessionController;

/// One-line feedback shown under the buttons
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Info(String),
    Success(String),
    Warning(String),
    Error(String),
}

impl Notice {
    pub fn text(&self) -> &str {
        match self {
            Notice::Info(s) | Notice::Success(s) | Notice::Warning(s) | Notice::Error(s) => s,
        }
    }
}

/// Main application state
pub struct TutorApp {
    /// Question sequencing and conversation memory
    pub(crate) controller: SessionController,
    /// Current contents of the question box
    pub(crate) input: String,
    /// Feedback for the last action
    pub(crate) notice: Option<Notice>,
    /// How many turns the history panel shows
    pub(crate) history_limit: usize,
    /// Mirrors the controller's speaking flag between ticks
    pub(crate) speaking: bool,
    /// Tutor endpoint health (None = not checked yet)
    pub(crate) tutor_online: Option<bool>,
}

impl TutorApp {
    pub fn new(controller: SessionController, history_limit: usize) -> (Self, Task<Message>) {
        info!("🖥️ Launching tutor window");
        let tutor = controller.tutor();
        let app = Self {
            controller,
            input: String::new(),
            notice: None,
            history_limit,
            speaking: false,
            tutor_online: None,
        };
        let check = Task::perform(
            async move { tutor.health_check().await },
            Message::HealthChecked,
        );
        (app, check)
    }

    pub fn title(&self) -> String {
        "TutorTalk - AI Learning Tutor".to_string()
    }

    pub fn theme(&self) -> iced::Theme {
        iced::Theme::Dark
    }

    /// Whether a question is in flight
    pub fn busy(&self) -> bool {
        self.controller.state() != crate::session::ControllerState::Idle
    }
}
