//! Speech input
//!
//! Records one utterance from the microphone and hands it to the configured
//! recognizer. Capture blocks, so it runs on tokio's blocking pool.

use crate::asr::AsrEngine;
use crate::audio::{self, calculate_energy, samples_duration};
use crate::config::Config;
use crate::error::{TutorError, TutorResult};
use async_trait::async_trait;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Something that can turn the student's voice into a question
#[async_trait]
pub trait SpeechListener: Send + Sync {
    /// Wait up to `timeout` for speech to start, then record for at most
    /// `phrase_limit` and return the transcript.
    async fn listen(&self, timeout: Duration, phrase_limit: Duration) -> TutorResult<String>;
}

/// End-pointing parameters for one capture
#[derive(Debug, Clone, Copy)]
pub struct ListenParams {
    pub timeout: Duration,
    pub phrase_limit: Duration,
    /// Trailing silence that ends the phrase early
    pub pause_threshold: Duration,
    /// RMS energy above which a chunk counts as speech
    pub energy_threshold: f32,
}

/// Pull chunks from `rx` until one complete utterance has been heard.
///
/// Timing is measured in captured audio, with the wall clock as a backstop
/// for a microphone that stops delivering chunks.
pub fn collect_utterance(rx: &Receiver<Vec<i16>>, params: &ListenParams) -> TutorResult<Vec<i16>> {
    let started = Instant::now();
    let mut waited = Duration::ZERO;
    let mut utterance: Vec<i16> = Vec::new();

    // Wait for speech to start
    loop {
        let remaining = params.timeout.saturating_sub(started.elapsed());
        if waited >= params.timeout || remaining.is_zero() {
            return Err(TutorError::NoSpeechDetected(params.timeout.as_secs()));
        }
        match rx.recv_timeout(remaining) {
            Ok(chunk) => {
                if calculate_energy(&chunk) > params.energy_threshold {
                    debug!("Speech started after {:?}", waited);
                    utterance.extend_from_slice(&chunk);
                    break;
                }
                waited += samples_duration(chunk.len());
            }
            Err(RecvTimeoutError::Timeout) => {
                return Err(TutorError::NoSpeechDetected(params.timeout.as_secs()));
            }
            Err(RecvTimeoutError::Disconnected) => {
                return Err(TutorError::Audio("microphone stream ended".to_string()));
            }
        }
    }

    // Record until the phrase limit or a long enough pause
    let phrase_started = Instant::now();
    let mut silence = Duration::ZERO;
    while samples_duration(utterance.len()) < params.phrase_limit {
        let remaining = params.phrase_limit.saturating_sub(phrase_started.elapsed());
        if remaining.is_zero() {
            break;
        }
        match rx.recv_timeout(remaining) {
            Ok(chunk) => {
                if calculate_energy(&chunk) > params.energy_threshold {
                    silence = Duration::ZERO;
                } else {
                    silence += samples_duration(chunk.len());
                }
                utterance.extend_from_slice(&chunk);
                if silence >= params.pause_threshold {
                    debug!("Phrase ended after {:?} of silence", silence);
                    break;
                }
            }
            Err(_) => break,
        }
    }

    let max_samples =
        (params.phrase_limit.as_secs_f64() * audio::SAMPLE_RATE as f64).round() as usize;
    utterance.truncate(max_samples);
    Ok(utterance)
}

/// Microphone + recognizer
pub struct MicrophoneListener {
    asr: Arc<dyn AsrEngine>,
    device: Option<usize>,
    pause_threshold: Duration,
    energy_threshold: f32,
}

impl MicrophoneListener {
    pub fn new(asr: Arc<dyn AsrEngine>, config: &Config) -> Self {
        Self {
            asr,
            device: config.audio_device,
            pause_threshold: config.pause_threshold(),
            energy_threshold: config.energy_threshold,
        }
    }
}

#[async_trait]
impl SpeechListener for MicrophoneListener {
    async fn listen(&self, timeout: Duration, phrase_limit: Duration) -> TutorResult<String> {
        let params = ListenParams {
            timeout,
            phrase_limit,
            pause_threshold: self.pause_threshold,
            energy_threshold: self.energy_threshold,
        };
        let device = self.device;

        info!("🎧 Listening... Speak now!");
        let samples = tokio::task::spawn_blocking(move || {
            let capture = audio::start_capture(device)
                .map_err(|e| TutorError::Audio(format!("{e:#}")))?;
            collect_utterance(capture.receiver(), &params)
        })
        .await
        .map_err(|e| TutorError::Audio(format!("capture task failed: {e}")))??;

        info!(
            "🎙️ Captured {:.1}s of audio, transcribing with {}",
            samples_duration(samples.len()).as_secs_f32(),
            self.asr.name()
        );
        self.asr.transcribe(&samples).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    const CHUNK: usize = 1600; // 100 ms

    fn params() -> ListenParams {
        ListenParams {
            timeout: Duration::from_secs(1),
            phrase_limit: Duration::from_secs(2),
            pause_threshold: Duration::from_millis(300),
            energy_threshold: 300.0,
        }
    }

    fn feed(chunks: &[(i16, usize)]) -> Receiver<Vec<i16>> {
        let (tx, rx) = mpsc::channel();
        for &(level, count) in chunks {
            for _ in 0..count {
                tx.send(vec![level; CHUNK]).expect("send");
            }
        }
        rx
    }

    #[test]
    fn test_silence_times_out_as_no_speech() {
        let rx = feed(&[(0, 20)]);
        let err = collect_utterance(&rx, &params()).unwrap_err();
        assert_eq!(err, TutorError::NoSpeechDetected(1));
    }

    #[test]
    fn test_speech_then_pause_ends_phrase() {
        // 300 ms silence, 500 ms speech, 400 ms silence, more speech never reached
        let rx = feed(&[(0, 3), (2000, 5), (0, 4), (2000, 5)]);
        let utterance = collect_utterance(&rx, &params()).expect("utterance");
        // speech + pause_threshold worth of silence
        assert_eq!(utterance.len(), 8 * CHUNK);
        assert_eq!(utterance[0], 2000);
    }

    #[test]
    fn test_phrase_limit_caps_recording() {
        let rx = feed(&[(2000, 40)]);
        let utterance = collect_utterance(&rx, &params()).expect("utterance");
        assert_eq!(utterance.len(), 2 * audio::SAMPLE_RATE as usize);
    }

    #[test]
    fn test_stream_end_before_speech_is_audio_error() {
        let rx = feed(&[(0, 2)]);
        let err = collect_utterance(&rx, &params()).unwrap_err();
        assert!(matches!(err, TutorError::Audio(_)));
    }

    #[test]
    fn test_stream_end_mid_phrase_keeps_audio() {
        let rx = feed(&[(2000, 3)]);
        let utterance = collect_utterance(&rx, &params()).expect("utterance");
        assert_eq!(utterance.len(), 3 * CHUNK);
    }
}
