//! TTS (Text-to-Speech) Module
//!
//! Provides a unified interface for multiple TTS backends.

use crate::config::Config;
use crate::error::TutorResult;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

pub mod piper;
pub mod system;

/// Trait for TTS engines
#[async_trait]
pub trait TtsEngine: Send + Sync + std::fmt::Debug {
    /// Speak the given text, resolving once the utterance has finished.
    ///
    /// Dropping the future must silence anything it started.
    async fn speak(&self, text: &str) -> TutorResult<()>;

    /// Halt playback that runs outside the `speak` future (audio threads,
    /// speech daemons). Called after the speaking task is aborted.
    fn stop(&self) {}

    /// Get the engine name
    fn name(&self) -> &str;
}

/// Factory to create the configured TTS engine
pub fn create_engine(config: &Config) -> Arc<dyn TtsEngine> {
    info!("🛠️ Creating TTS engine: {}", config.tts_engine);
    let engine: Arc<dyn TtsEngine> = match config.tts_engine.as_str() {
        "piper" => {
            info!("  - Using Piper TTS (Voice: {})", config.piper_voice);
            Arc::new(piper::PiperEngine::new(config))
        }
        "system" => {
            info!("  - Using System TTS (rate {} wpm)", config.speech_rate);
            Arc::new(system::SystemEngine::new(config))
        }
        _ => {
            warn!(
                "  - Unknown engine '{}', falling back to System",
                config.tts_engine
            );
            Arc::new(system::SystemEngine::new(config))
        }
    };
    info!("✅ TTS engine '{}' initialized", engine.name());
    engine
}

/// Pick a voice: the configured one, else the second listed, else the first
pub fn choose_voice(configured: Option<&str>, available: &[String]) -> Option<String> {
    configured
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .or_else(|| available.get(1).or_else(|| available.first()).cloned())
}
