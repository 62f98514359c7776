use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variables checked (in order) for the model API credential.
pub const API_KEY_VARS: [&str; 2] = ["TUTORTALK_API_KEY", "OPENROUTER_API_KEY"];

const DEFAULT_SYSTEM_PROMPT: &str = "You are a friendly, patient tutor. \
Teach any topic the student asks about in simple words, with short examples, \
and check their understanding when it helps.";

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    // Tutor model
    pub api_base_url: String,
    pub api_key: String,
    pub model: String,
    pub system_prompt: String,

    // Speech input
    pub asr_engine: String,
    pub wyoming_host: String,
    pub wyoming_port: u16,
    pub vosk_model_path: String,
    pub audio_device: Option<usize>,
    pub listen_timeout_secs: u64,
    pub phrase_limit_secs: u64,
    pub pause_threshold_ms: u64,
    pub energy_threshold: f32,

    // Speech output
    pub tts_engine: String,
    pub speech_rate: u32,
    pub voice: Option<String>,
    /// Language whose voices are considered when `voice` is unset
    pub voice_language: String,
    pub piper_voice: String,
    pub speak_replies: bool,

    // Meta
    pub history_display_limit: usize,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "https://openrouter.ai/api/v1".to_string(),
            api_key: String::new(),
            model: "meta-llama/llama-3-8b-instruct".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            asr_engine: "wyoming".to_string(),
            wyoming_host: "localhost".to_string(),
            wyoming_port: 10300,
            vosk_model_path: dirs::data_dir()
                .unwrap_or_default()
                .join("tutortalk/models/vosk-model-small-en-us")
                .to_string_lossy()
                .to_string(),
            audio_device: None,
            listen_timeout_secs: 8,
            phrase_limit_secs: 10,
            pause_threshold_ms: 800,
            energy_threshold: 300.0,
            tts_engine: "system".to_string(),
            speech_rate: 175,
            voice: None,
            voice_language: "en".to_string(),
            piper_voice: "en_US-lessac-medium".to_string(),
            speak_replies: true,
            history_display_limit: 10,
            log_level: "INFO".to_string(),
        }
    }
}

impl Config {
    /// Load config from the default location, writing defaults on first run
    pub fn load() -> Result<Self> {
        Self::load_or_init(&config_path())
    }

    /// Like `load_from`, but a missing file is created with the defaults so
    /// there is something to edit.
    pub fn load_or_init(path: &Path) -> Result<Self> {
        if path.exists() {
            return Self::load_from(path);
        }
        let config = Self::default();
        match config.save_to(path) {
            Ok(()) => tracing::info!("📝 Wrote default config to {}", path.display()),
            Err(e) => tracing::warn!("⚠️ Could not write default config: {}", e),
        }
        Ok(config)
    }

    /// Load config from an explicit path.
    ///
    /// A missing file yields defaults. A corrupt file is moved aside to
    /// `config.json.corrupt` and defaults are used.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        match serde_json::from_str(&content) {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!("⚠️ Config file corrupted or invalid, using defaults: {}", e);
                let backup_path = path.with_extension("json.corrupt");
                let _ = std::fs::rename(path, &backup_path);
                Ok(Self::default())
            }
        }
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Overlay settings from the environment (and a `.env` file, if present).
    ///
    /// The credential is never required to live in the config file.
    pub fn apply_env(&mut self) {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }
        self.apply_vars(|name| std::env::var(name).ok());
    }

    fn apply_vars(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(key) = API_KEY_VARS
            .into_iter()
            .filter_map(&lookup)
            .find(|v| !v.trim().is_empty())
        {
            self.api_key = key;
        }
        if let Some(model) = lookup("TUTORTALK_MODEL").filter(|v| !v.trim().is_empty()) {
            self.model = model;
        }
        if let Some(url) = lookup("TUTORTALK_BASE_URL").filter(|v| !v.trim().is_empty()) {
            self.api_base_url = url;
        }
    }

    pub fn listen_timeout(&self) -> Duration {
        Duration::from_secs(self.listen_timeout_secs)
    }

    pub fn phrase_limit(&self) -> Duration {
        Duration::from_secs(self.phrase_limit_secs)
    }

    pub fn pause_threshold(&self) -> Duration {
        Duration::from_millis(self.pause_threshold_ms)
    }
}

pub fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tutortalk")
        .join("config.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.speech_rate, 175);
        assert_eq!(config.listen_timeout_secs, 8);
        assert_eq!(config.phrase_limit_secs, 10);
        assert_eq!(config.history_display_limit, 10);
        assert!(config.api_key.is_empty());
        assert!(config.voice.is_none());
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let json = serde_json::to_string(&config).expect("Failed to serialize");
        let restored: Config = serde_json::from_str(&json).expect("Failed to deserialize");
        assert_eq!(config.model, restored.model);
        assert_eq!(config.wyoming_port, restored.wyoming_port);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let restored: Config =
            serde_json::from_str(r#"{"model": "openai/gpt-4o-mini"}"#).expect("partial config");
        assert_eq!(restored.model, "openai/gpt-4o-mini");
        assert_eq!(restored.speech_rate, 175);
    }

    #[test]
    fn test_corrupt_file_is_moved_aside() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not valid json").expect("write");

        let config = Config::load_from(&path).expect("load");
        assert_eq!(config.speech_rate, 175);
        assert!(!path.exists());
        assert!(dir.path().join("config.json.corrupt").exists());
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested/config.json");

        let mut config = Config::default();
        config.voice = Some("gmw/en-US".to_string());
        config.save_to(&path).expect("save");

        let restored = Config::load_from(&path).expect("load");
        assert_eq!(restored.voice.as_deref(), Some("gmw/en-US"));
    }

    #[test]
    fn test_first_run_writes_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("tutortalk/config.json");

        let config = Config::load_or_init(&path).expect("load");
        assert_eq!(config.voice_language, "en");
        assert!(path.exists());

        let written: Config =
            serde_json::from_str(&std::fs::read_to_string(&path).expect("read")).expect("json");
        assert_eq!(written.model, config.model);
        assert!(written.api_key.is_empty());
    }

    #[test]
    fn test_env_overlay_prefers_first_non_empty_key() {
        let vars = HashMap::from([
            ("TUTORTALK_API_KEY", "  "),
            ("OPENROUTER_API_KEY", "sk-or-test"),
            ("TUTORTALK_MODEL", "mistralai/mistral-7b-instruct"),
        ]);
        let mut config = Config::default();
        config.apply_vars(|name| vars.get(name).map(|v| v.to_string()));

        assert_eq!(config.api_key, "sk-or-test");
        assert_eq!(config.model, "mistralai/mistral-7b-instruct");
        assert_eq!(config.api_base_url, "https://openrouter.ai/api/v1");
    }
}
