//! Piper TTS backend calling a local binary

use super::TtsEngine;
use crate::config::Config;
use crate::error::{TutorError, TutorResult};
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, error, info, warn};

/// Rate piper's voices are tuned for, in words per minute
const NATURAL_RATE: f32 = 175.0;

/// Playback shared between the speaking task and `stop()`
#[derive(Default)]
struct Playback {
    /// Bumped by every `stop()`; a playback started under an older
    /// generation must not begin.
    generation: AtomicU64,
    sink: Mutex<Option<Arc<rodio::Sink>>>,
}

impl std::fmt::Debug for Playback {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Playback")
            .field("generation", &self.generation)
            .finish()
    }
}

/// Synthesized WAV that is deleted when dropped, including when the
/// speaking task is aborted mid-utterance
#[derive(Debug)]
struct TempWav(PathBuf);

impl TempWav {
    fn path(&self) -> &std::path::Path {
        &self.0
    }
}

impl Drop for TempWav {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.0) {
            if e.kind() != std::io::ErrorKind::NotFound {
                warn!("⚠️ Could not remove {}: {}", self.0.display(), e);
            }
        }
    }
}

#[derive(Debug)]
pub struct PiperEngine {
    model_path: PathBuf,
    length_scale: f32,
    playback: Arc<Playback>,
}

impl PiperEngine {
    pub fn new(config: &Config) -> Self {
        let data_dir = dirs::data_dir().unwrap_or_default().join("tutortalk/voices");
        let model_path = data_dir.join(format!("{}.onnx", config.piper_voice));

        if !model_path.exists() {
            warn!("⚠️ Piper model not found at {}", model_path.display());
        }

        Self {
            model_path,
            length_scale: length_scale(config.speech_rate),
            playback: Arc::new(Playback::default()),
        }
    }

    async fn synthesize(&self, text: &str, wav_path: &std::path::Path) -> TutorResult<()> {
        let mut child = Command::new("piper-tts")
            .arg("-m")
            .arg(&self.model_path)
            .arg("-f")
            .arg(wav_path)
            .arg("--length_scale")
            .arg(format!("{:.2}", self.length_scale))
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                error!("❌ Failed to spawn piper-tts: {}", e);
                TutorError::Synthesis(format!("Failed to spawn piper-tts: {e}"))
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes()).await?;
            stdin.shutdown().await?;
        }

        let status = child.wait().await?;
        if !status.success() {
            return Err(TutorError::Synthesis(format!(
                "Piper failed with status {status}"
            )));
        }
        if !wav_path.exists() {
            return Err(TutorError::Synthesis(
                "Piper output file not created".to_string(),
            ));
        }
        Ok(())
    }
}

/// Play a WAV file to the end, unless `stop()` intervenes
fn play_wav(playback: &Playback, generation: u64, wav_path: &std::path::Path) -> TutorResult<()> {
    // The output stream is not Send; it lives and dies on this thread
    let (_stream, stream_handle) = rodio::OutputStream::try_default()
        .map_err(|e| TutorError::Synthesis(format!("no audio output: {e}")))?;
    let sink = rodio::Sink::try_new(&stream_handle)
        .map_err(|e| TutorError::Synthesis(format!("failed to create audio sink: {e}")))?;
    let file = std::fs::File::open(wav_path)?;
    let source = rodio::Decoder::new(std::io::BufReader::new(file))
        .map_err(|e| TutorError::Synthesis(format!("unreadable WAV: {e}")))?;

    let sink = Arc::new(sink);
    {
        let mut slot = playback.sink.lock()?;
        if playback.generation.load(Ordering::SeqCst) != generation {
            debug!("Playback cancelled before it started");
            return Ok(());
        }
        sink.append(source);
        *slot = Some(sink.clone());
    }

    sink.sleep_until_end();

    if let Ok(mut slot) = playback.sink.lock() {
        if slot.as_ref().is_some_and(|s| Arc::ptr_eq(s, &sink)) {
            *slot = None;
        }
    }
    Ok(())
}

#[async_trait]
impl TtsEngine for PiperEngine {
    async fn speak(&self, text: &str) -> TutorResult<()> {
        info!("📢 Piper speaking: '{}'", text);

        if !self.model_path.exists() {
            return Err(TutorError::Synthesis(format!(
                "Piper model file missing: {}",
                self.model_path.display()
            )));
        }

        let generation = self.playback.generation.load(Ordering::SeqCst);
        let wav = TempWav(std::env::temp_dir().join(format!(
            "tutortalk_speech_{}_{}.wav",
            std::process::id(),
            generation
        )));

        self.synthesize(text, wav.path()).await?;

        let playback = self.playback.clone();
        // The guard moves into the blocking closure so the file outlives playback
        tokio::task::spawn_blocking(move || play_wav(&playback, generation, wav.path()))
            .await
            .map_err(|e| TutorError::Synthesis(format!("Task join error: {e}")))?
    }

    fn stop(&self) {
        let slot = self.playback.sink.lock();
        self.playback.generation.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut slot) = slot {
            if let Some(sink) = slot.take() {
                debug!("🛑 Stopping Piper playback");
                sink.stop();
            }
        }
    }

    fn name(&self) -> &str {
        "piper"
    }
}

/// Piper's `length_scale` for a target speaking rate (larger = slower)
fn length_scale(rate_wpm: u32) -> f32 {
    if rate_wpm == 0 {
        return 1.0;
    }
    (NATURAL_RATE / rate_wpm as f32).clamp(0.25, 4.0)
}
