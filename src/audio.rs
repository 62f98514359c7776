//! Audio capture module using cpal

use anyhow::{Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use std::sync::mpsc::{self, Receiver, Sender};
use tracing::{debug, info, warn};

pub const SAMPLE_RATE: u32 = 16000;
const CHUNK_SIZE: usize = 1024;

/// A live microphone stream.
///
/// Recording stops when this value is dropped. `cpal::Stream` is not `Send`,
/// so a capture must be opened and drained on the same thread.
pub struct Capture {
    _stream: cpal::Stream,
    receiver: Receiver<Vec<i16>>,
}

impl Capture {
    /// Chunks of mono 16 kHz samples, in arrival order
    pub fn receiver(&self) -> &Receiver<Vec<i16>> {
        &self.receiver
    }
}

/// Start audio capture on the given device (or the default input)
pub fn start_capture(device_index: Option<usize>) -> Result<Capture> {
    let host = cpal::default_host();

    debug!("Available audio input devices:");
    for (i, device) in host.input_devices()?.enumerate() {
        let name = device.name().unwrap_or_else(|_| "Unknown".to_string());
        let marker = if device_index == Some(i) { "*" } else { " " };
        debug!("  {} [{}] {}", marker, i, name);
    }

    let device = if let Some(idx) = device_index {
        host.input_devices()?
            .nth(idx)
            .context("Device index out of range")?
    } else {
        host.default_input_device()
            .context("No default input device")?
    };

    let device_name = device.name().unwrap_or_else(|_| "Unknown".to_string());
    info!("🎙️ Using audio device: {}", device_name);

    let config = cpal::StreamConfig {
        channels: 1,
        sample_rate: cpal::SampleRate(SAMPLE_RATE),
        buffer_size: cpal::BufferSize::Fixed(CHUNK_SIZE as u32),
    };

    let (tx, rx): (Sender<Vec<i16>>, Receiver<Vec<i16>>) = mpsc::channel();

    let stream = device
        .build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                // Receiver goes away as soon as the utterance is complete
                let _ = tx.send(data.to_vec());
            },
            |err| {
                warn!("Audio stream error: {}", err);
            },
            None,
        )
        .context("Failed to open microphone stream")?;

    stream.play().context("Failed to start microphone stream")?;

    Ok(Capture {
        _stream: stream,
        receiver: rx,
    })
}

/// RMS energy of a chunk, used to tell speech from silence
pub fn calculate_energy(samples: &[i16]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }

    let sum: i64 = samples.iter().map(|&s| (s as i64).pow(2)).sum();
    (sum as f32 / samples.len() as f32).sqrt()
}

/// Duration covered by `samples` at the capture rate
pub fn samples_duration(samples: usize) -> std::time::Duration {
    std::time::Duration::from_secs_f64(samples as f64 / SAMPLE_RATE as f64)
}
