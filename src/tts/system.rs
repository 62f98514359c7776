//! System TTS engine (espeak-ng, falling back to spd-say)

use super::TtsEngine;
use crate::config::Config;
use crate::error::{TutorError, TutorResult};
use async_trait::async_trait;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::sync::OnceCell;
use tracing::debug;

const DEFAULT_RATE: i32 = 175;

#[derive(Debug)]
pub struct SystemEngine {
    rate: u32,
    configured_voice: Option<String>,
    /// Language the default voice is picked from
    language: String,
    /// espeak-ng voice, resolved on first use
    voice: OnceCell<Option<String>>,
    /// Set once speech-dispatcher had to be used
    using_spd: std::sync::atomic::AtomicBool,
}

impl SystemEngine {
    pub fn new(config: &Config) -> Self {
        Self {
            rate: config.speech_rate,
            configured_voice: config.voice.clone(),
            language: config.voice_language.trim().to_lowercase(),
            voice: OnceCell::new(),
            using_spd: std::sync::atomic::AtomicBool::new(false),
        }
    }

    async fn voice(&self) -> Option<&str> {
        self.voice
            .get_or_init(|| async {
                let available = Command::new("espeak-ng")
                    .arg(format!("--voices={}", self.language))
                    .stdout(Stdio::piped())
                    .stderr(Stdio::null())
                    .output()
                    .await
                    .map(|out| {
                        voices_for_language(&String::from_utf8_lossy(&out.stdout), &self.language)
                    })
                    .unwrap_or_default();
                let chosen = super::choose_voice(self.configured_voice.as_deref(), &available);
                debug!(
                    "espeak-ng voice: {:?} ({} '{}' voices available)",
                    chosen,
                    available.len(),
                    self.language
                );
                chosen
            })
            .await
            .as_deref()
    }

    async fn speak_espeak(&self, text: &str) -> std::io::Result<std::process::ExitStatus> {
        let mut cmd = Command::new("espeak-ng");
        cmd.arg("-s").arg(self.rate.to_string());
        if let Some(voice) = self.voice().await {
            cmd.arg("-v").arg(voice);
        }
        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()?;

        // Text goes through stdin so a leading '-' is never read as a flag
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
            stdin.shutdown().await?;
        }
        child.wait().await
    }

    async fn speak_spd(&self, text: &str) -> std::io::Result<std::process::ExitStatus> {
        self.using_spd
            .store(true, std::sync::atomic::Ordering::SeqCst);
        Command::new("spd-say")
            .arg("--wait")
            .arg("-r")
            .arg(spd_rate(self.rate).to_string())
            .arg("--")
            .arg(text)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .status()
            .await
    }
}

#[async_trait]
impl TtsEngine for SystemEngine {
    async fn speak(&self, text: &str) -> TutorResult<()> {
        debug!("System speaking: {}", text);

        let status = match self.speak_espeak(text).await {
            Ok(status) => status,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                self.speak_spd(text).await.map_err(|e| {
                    TutorError::Synthesis(format!(
                        "No system TTS command found (tried espeak-ng, spd-say): {e}"
                    ))
                })?
            }
            Err(e) => return Err(TutorError::Synthesis(e.to_string())),
        };

        if !status.success() {
            return Err(TutorError::Synthesis(format!(
                "speech command exited with {status}"
            )));
        }
        Ok(())
    }

    fn stop(&self) {
        // spd-say only queues text; the daemon keeps talking after we kill it
        if self.using_spd.load(std::sync::atomic::Ordering::SeqCst) {
            cancel_spd();
        }
    }

    fn name(&self) -> &str {
        "system"
    }
}

/// Run `spd-say --cancel` off-thread and reap it
fn cancel_spd() -> std::thread::JoinHandle<()> {
    std::thread::spawn(|| {
        let status = std::process::Command::new("spd-say")
            .arg("--cancel")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status();
        if let Err(e) = status {
            debug!("spd-say --cancel failed: {}", e);
        }
    })
}

/// (language, file) rows of `espeak-ng --voices` output
fn parse_voice_table(output: &str) -> Vec<(String, String)> {
    output
        .lines()
        .filter(|line| !line.trim_start().starts_with("Pty"))
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            let language = cols.get(1)?;
            let file = cols.get(4).unwrap_or(language);
            Some((language.to_string(), file.to_string()))
        })
        .collect()
}

/// Voice identifiers (the File column) in listing order
pub fn parse_voice_list(output: &str) -> Vec<String> {
    parse_voice_table(output)
        .into_iter()
        .map(|(_, file)| file)
        .collect()
}

/// Voices whose language is `language` or one of its regional variants
pub fn voices_for_language(output: &str, language: &str) -> Vec<String> {
    let variant = format!("{language}-");
    parse_voice_table(output)
        .into_iter()
        .filter(|(lang, _)| lang.eq_ignore_ascii_case(language) || lang.starts_with(&variant))
        .map(|(_, file)| file)
        .collect()
}

/// Map words-per-minute onto speech-dispatcher's -100..=100 scale
fn spd_rate(wpm: u32) -> i32 {
    (wpm as i32 - DEFAULT_RATE).clamp(-100, 100)
}
