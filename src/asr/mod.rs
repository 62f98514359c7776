//! ASR (Automatic Speech Recognition) Module
//!
//! Turns one captured utterance into text. Backends:
//! - Wyoming: remote recognizer over TCP (e.g., faster-whisper)
//! - Vosk: local offline recognition (`vosk` feature)

#[cfg(feature = "vosk")]
pub mod vosk;
pub mod wyoming;

use crate::config::Config;
use crate::error::{TutorError, TutorResult};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

#[cfg(feature = "vosk")]
pub use vosk::VoskAsr;
pub use wyoming::WyomingClient;

/// Trait for ASR engines
#[async_trait]
pub trait AsrEngine: Send + Sync {
    /// Transcribe mono 16 kHz samples.
    ///
    /// An utterance that produces no words is a `Recognition` error, never an
    /// empty string.
    async fn transcribe(&self, samples: &[i16]) -> TutorResult<String>;

    /// Get the engine name
    fn name(&self) -> &str;
}

/// Factory to create the configured ASR engine
pub fn create_engine(config: &Config) -> TutorResult<Arc<dyn AsrEngine>> {
    let engine: Arc<dyn AsrEngine> = match config.asr_engine.as_str() {
        "wyoming" => Arc::new(WyomingClient::new(&config.wyoming_host, config.wyoming_port)),
        #[cfg(feature = "vosk")]
        "vosk" => Arc::new(VoskAsr::new(config)?),
        #[cfg(not(feature = "vosk"))]
        "vosk" => {
            return Err(TutorError::Config(
                "this build has no Vosk support (enable the `vosk` feature)".to_string(),
            ))
        }
        other => {
            warn!("  - Unknown ASR engine '{}', falling back to Wyoming", other);
            Arc::new(WyomingClient::new(&config.wyoming_host, config.wyoming_port))
        }
    };
    info!("✅ ASR engine '{}' initialized", engine.name());
    Ok(engine)
}

/// Trim a transcript, rejecting empty results
pub(crate) fn extract_text(text: &str) -> TutorResult<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(TutorError::Recognition(
            "could not understand the audio".to_string(),
        ))
    } else {
        Ok(trimmed.to_string())
    }
}
