//! Session controller
//!
//! Sequences one user action at a time: ask the tutor, record the exchange,
//! speak the reply. Each action is split into a `begin_*` step that checks
//! and updates state, the blocking work itself, and a `finish_*` step that
//! applies the outcome. The GUI runs the middle part as a background task;
//! `submit_text` and `submit_voice` run all three in order.

use crate::conversation::{ConversationState, DisplayTurn};
use crate::core::TutorBackend;
use crate::error::{TutorError, TutorResult};
use crate::speech_input::SpeechListener;
use crate::speech_output::SpeechOutput;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// What the controller is waiting on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ControllerState {
    #[default]
    Idle,
    AwaitingReply,
    Listening,
}

/// A question ready to be sent, with the context it was asked in
#[derive(Debug, Clone, PartialEq)]
pub struct AskRequest {
    pub query: String,
    pub history: Vec<crate::conversation::ApiTurn>,
    /// Memory generation the question was asked in
    pub(crate) memory_epoch: u64,
}

impl AskRequest {
    /// Run the request against `tutor`
    pub async fn send(self, tutor: Arc<dyn TutorBackend>) -> (Self, TutorResult<String>) {
        let result = tutor.ask(&self.query, &self.history).await;
        (self, result)
    }
}

/// Microphone bounds for one voice question
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListenRequest {
    pub timeout: Duration,
    pub phrase_limit: Duration,
}

impl ListenRequest {
    pub async fn listen(self, listener: Arc<dyn SpeechListener>) -> TutorResult<String> {
        listener.listen(self.timeout, self.phrase_limit).await
    }
}

/// Tunables the controller needs from config
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub listen_timeout: Duration,
    pub phrase_limit: Duration,
    pub speak_replies: bool,
}

impl From<&crate::config::Config> for SessionOptions {
    fn from(config: &crate::config::Config) -> Self {
        Self {
            listen_timeout: config.listen_timeout(),
            phrase_limit: config.phrase_limit(),
            speak_replies: config.speak_replies,
        }
    }
}

pub struct SessionController {
    state: ControllerState,
    conversation: ConversationState,
    tutor: Arc<dyn TutorBackend>,
    listener: Arc<dyn SpeechListener>,
    voice: SpeechOutput,
    options: SessionOptions,
    /// Bumped by every `clear_memory`
    memory_epoch: u64,
}

impl SessionController {
    pub fn new(
        tutor: Arc<dyn TutorBackend>,
        listener: Arc<dyn SpeechListener>,
        voice: SpeechOutput,
        options: SessionOptions,
    ) -> Self {
        info!(
            "🎓 Session started (tutor: {}, voice: {})",
            tutor.name(),
            voice.engine_name()
        );
        Self {
            state: ControllerState::Idle,
            conversation: ConversationState::new(),
            tutor,
            listener,
            voice,
            options,
            memory_epoch: 0,
        }
    }

    /// Wire up the real collaborators described by `config`.
    ///
    /// Speech output is spawned onto `runtime`.
    pub fn from_config(
        config: &crate::config::Config,
        runtime: tokio::runtime::Handle,
    ) -> TutorResult<Self> {
        let tutor = Arc::new(crate::core::ChatCompletionsClient::new(config)?);
        let asr = crate::asr::create_engine(config)?;
        let listener = Arc::new(crate::speech_input::MicrophoneListener::new(asr, config));
        let voice = SpeechOutput::new(crate::tts::create_engine(config), runtime);
        Ok(Self::new(tutor, listener, voice, SessionOptions::from(config)))
    }

    pub fn state(&self) -> ControllerState {
        self.state
    }

    pub fn conversation(&self) -> &ConversationState {
        &self.conversation
    }

    /// Newest-first view of the last `n` turns
    pub fn recent_turns(&self, n: usize) -> impl Iterator<Item = &DisplayTurn> + Clone + '_ {
        self.conversation.recent_display(n)
    }

    pub fn is_speaking(&self) -> bool {
        self.voice.is_speaking()
    }

    pub fn tutor(&self) -> Arc<dyn TutorBackend> {
        self.tutor.clone()
    }

    pub fn listener(&self) -> Arc<dyn SpeechListener> {
        self.listener.clone()
    }

    /// Start a typed question.
    ///
    /// Returns `None` for blank input, which is ignored.
    pub fn begin_text(&mut self, input: &str) -> TutorResult<Option<AskRequest>> {
        self.ensure_idle()?;
        let query = input.trim();
        if query.is_empty() {
            debug!("Ignoring blank question");
            return Ok(None);
        }
        Ok(Some(self.begin_ask(query)))
    }

    /// Start listening for a spoken question
    pub fn begin_listen(&mut self) -> TutorResult<ListenRequest> {
        self.ensure_idle()?;
        self.state = ControllerState::Listening;
        Ok(ListenRequest {
            timeout: self.options.listen_timeout,
            phrase_limit: self.options.phrase_limit,
        })
    }

    /// Apply the recognizer's outcome; on success the question is ready to send
    pub fn finish_listen(&mut self, heard: TutorResult<String>) -> TutorResult<AskRequest> {
        if self.state != ControllerState::Listening {
            warn!("Transcript arrived while {:?}", self.state);
        }
        let query = match heard {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                self.state = ControllerState::Idle;
                return Err(TutorError::Recognition(
                    "could not understand the audio".to_string(),
                ));
            }
            Err(e) => {
                warn!("⚠️ Voice input failed: {}", e);
                self.state = ControllerState::Idle;
                return Err(e);
            }
        };
        info!("✅ You said: '{}'", query);
        Ok(self.begin_ask(&query))
    }

    /// Apply the tutor's outcome.
    ///
    /// Only a successful reply touches the conversation; it is then spoken.
    /// A reply to a question asked before the last `clear_memory` is
    /// returned but neither recorded nor spoken.
    pub fn finish_ask(
        &mut self,
        request: AskRequest,
        reply: TutorResult<String>,
    ) -> TutorResult<String> {
        self.state = ControllerState::Idle;
        let reply = reply.inspect_err(|e| warn!("⚠️ Tutor request failed: {}", e))?;

        if request.memory_epoch != self.memory_epoch {
            info!("🧹 Discarding reply to '{}' asked before memory was cleared", request.query);
            return Ok(reply);
        }

        self.conversation.record_exchange(&request.query, &reply);
        debug!("Conversation now has {} turns", self.conversation.len());

        if self.options.speak_replies {
            self.voice.speak(&reply);
        }
        Ok(reply)
    }

    /// Ask a typed question end to end. `Ok(None)` means blank input.
    pub async fn submit_text(&mut self, input: &str) -> TutorResult<Option<String>> {
        let Some(request) = self.begin_text(input)? else {
            return Ok(None);
        };
        let (request, reply) = request.send(self.tutor.clone()).await;
        self.finish_ask(request, reply).map(Some)
    }

    /// Ask a spoken question end to end, returning (question, reply)
    pub async fn submit_voice(&mut self) -> TutorResult<(String, String)> {
        let listen = self.begin_listen()?;
        let heard = listen.listen(self.listener.clone()).await;
        let request = self.finish_listen(heard)?;
        let query = request.query.clone();
        let (request, reply) = request.send(self.tutor.clone()).await;
        let reply = self.finish_ask(request, reply)?;
        Ok((query, reply))
    }

    /// Silence the current reply; allowed in any state
    pub fn stop_voice(&self) {
        self.voice.stop();
    }

    /// Forget the conversation; allowed in any state
    pub fn clear_memory(&mut self) {
        self.conversation.clear();
        self.memory_epoch += 1;
        info!("🧹 Chat memory cleared");
    }

    /// Text shown to the user for a failed action
    pub fn error_notice(err: &TutorError) -> String {
        if err.is_voice_input() {
            format!("⚠️ Voice Input Error: {err}")
        } else if matches!(err, TutorError::Busy) {
            format!("⏳ {err}")
        } else {
            format!("⚠️ Tutor Error: {err}")
        }
    }

    fn ensure_idle(&self) -> TutorResult<()> {
        if self.state == ControllerState::Idle {
            Ok(())
        } else {
            Err(TutorError::Busy)
        }
    }

    fn begin_ask(&mut self, query: &str) -> AskRequest {
        self.state = ControllerState::AwaitingReply;
        AskRequest {
            query: query.to_string(),
            history: self.conversation.api_history().to_vec(),
            memory_epoch: self.memory_epoch,
        }
    }
}
