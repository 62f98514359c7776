//! GUI module using iced
//!
//! A single window: question box, four action buttons, a notice line and
//! the recent conversation. Tutor requests and listening run as background
//! tasks so the window stays responsive.

use iced::{Element, Subscription, Task};
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::session::{AskRequest, SessionController};

pub mod app;
pub mod chat;
pub mod messages;

pub use app::{Notice, TutorApp};
pub use messages::Message;

/// How often the speaking indicator is refreshed
const SPEECH_POLL: Duration = Duration::from_millis(250);

impl TutorApp {
    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::InputChanged(value) => {
                self.input = value;
            }
            Message::SendPressed => match self.controller.begin_text(&self.input) {
                Ok(Some(request)) => {
                    self.input.clear();
                    self.notice = Some(Notice::Info("🤖 Thinking...".to_string()));
                    return self.send(request);
                }
                Ok(None) => debug!("Send pressed with an empty question"),
                Err(e) => self.fail(&e),
            },
            Message::SpeakPressed => match self.controller.begin_listen() {
                Ok(listen) => {
                    self.notice = Some(Notice::Info("🎧 Listening... Speak now!".to_string()));
                    return Task::perform(listen.listen(self.controller.listener()), Message::Heard);
                }
                Err(e) => self.fail(&e),
            },
            Message::Heard(heard) => match self.controller.finish_listen(heard) {
                Ok(request) => {
                    self.notice = Some(Notice::Success(format!("✅ You said: {}", request.query)));
                    return self.send(request);
                }
                Err(e) => self.fail(&e),
            },
            Message::ReplyReceived(request, reply) => {
                let turns_before = self.controller.conversation().len();
                match self.controller.finish_ask(request, reply) {
                    // A discarded stale reply keeps the "cleared" notice
                    Ok(_) if self.controller.conversation().len() > turns_before => {
                        self.notice = None
                    }
                    Ok(_) => {}
                    Err(e) => self.fail(&e),
                }
                self.speaking = self.controller.is_speaking();
            }
            Message::StopVoicePressed => {
                self.controller.stop_voice();
                self.speaking = false;
                self.notice = Some(Notice::Info("🛑 Voice stopped.".to_string()));
            }
            Message::ClearMemoryPressed => {
                self.controller.clear_memory();
                self.notice = Some(Notice::Success("🧠 Chat memory cleared!".to_string()));
            }
            Message::HealthChecked(online) => {
                if online {
                    info!("✅ Tutor endpoint reachable");
                } else {
                    warn!("⚠️ Tutor endpoint not reachable");
                }
                self.tutor_online = Some(online);
            }
            Message::Tick => {
                self.speaking = self.controller.is_speaking();
            }
        }
        Task::none()
    }

    pub fn view(&self) -> Element<'_, Message> {
        chat::view(self)
    }

    pub fn subscription(&self) -> Subscription<Message> {
        if self.speaking {
            iced::time::every(SPEECH_POLL).map(|_| Message::Tick)
        } else {
            Subscription::none()
        }
    }

    fn send(&self, request: AskRequest) -> Task<Message> {
        Task::perform(request.send(self.controller.tutor()), |(request, reply)| {
            Message::ReplyReceived(request, reply)
        })
    }

    fn fail(&mut self, err: &crate::error::TutorError) {
        let text = SessionController::error_notice(err);
        self.notice = Some(if matches!(err, crate::error::TutorError::Busy) {
            Notice::Warning(text)
        } else {
            Notice::Error(text)
        });
    }
}
