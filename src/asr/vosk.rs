//! ASR module using Vosk

use crate::config::Config;
use crate::error::{TutorError, TutorResult};
use async_trait::async_trait;
use std::sync::Mutex;
use tracing::{debug, info};
use vosk::{Model, Recognizer};

const SAMPLE_RATE: f32 = crate::audio::SAMPLE_RATE as f32;

/// Vosk-based ASR engine
pub struct VoskAsr {
    recognizer: Mutex<Recognizer>,
}

impl VoskAsr {
    /// Create a new Vosk ASR instance
    pub fn new(config: &Config) -> TutorResult<Self> {
        let model_path = std::path::PathBuf::from(&config.vosk_model_path);

        if !model_path.exists() {
            return Err(TutorError::Config(format!(
                "Vosk model not found at {}",
                model_path.display()
            )));
        }

        info!("Loading Vosk model from: {}", model_path.display());

        let model_str = model_path.to_str().ok_or_else(|| {
            TutorError::Config(format!(
                "Vosk model path is not valid UTF-8: {}",
                model_path.display()
            ))
        })?;

        let model = Model::new(model_str)
            .ok_or_else(|| TutorError::Config("Failed to load Vosk model".to_string()))?;

        let recognizer = Recognizer::new(&model, SAMPLE_RATE)
            .ok_or_else(|| TutorError::Config("Failed to create Vosk recognizer".to_string()))?;

        Ok(Self {
            recognizer: Mutex::new(recognizer),
        })
    }
}

#[async_trait]
impl super::AsrEngine for VoskAsr {
    async fn transcribe(&self, samples: &[i16]) -> TutorResult<String> {
        let mut recognizer = self.recognizer.lock()?;
        recognizer.reset();

        let _ = recognizer.accept_waveform(samples);
        let result = recognizer.final_result();
        let text = result
            .single()
            .map(|single| single.text.to_string())
            .unwrap_or_default();
        debug!("Vosk final result: '{}'", text);

        super::extract_text(&text)
    }

    fn name(&self) -> &str {
        "vosk"
    }
}
