//! Wyoming Protocol Client
//!
//! Implements the Wyoming protocol for external ASR services.
//! Each event is a JSON header line, optionally followed by `data_length`
//! bytes of extra JSON data and `payload_length` bytes of binary payload.
//!
//! Reference: https://github.com/rhasspy/wyoming

use crate::error::{TutorError, TutorResult};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// Samples per `audio-chunk` event (64 ms at 16 kHz)
const CHUNK_SAMPLES: usize = 1024;
const TRANSCRIPT_TIMEOUT: Duration = Duration::from_secs(30);

/// Header line of a Wyoming event
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventHeader {
    #[serde(rename = "type")]
    pub event_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload_length: Option<usize>,
}

/// A fully read event
#[derive(Debug, Clone, PartialEq)]
pub struct Event {
    pub event_type: String,
    pub data: serde_json::Value,
    pub payload: Vec<u8>,
}

/// Audio format carried by `audio-start` and `audio-chunk`
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct AudioFormat {
    pub rate: u32,
    pub width: u8,
    pub channels: u8,
}

/// Transcript result data
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptData {
    pub text: String,
}

/// Write one event with an optional binary payload
pub async fn write_event<W>(
    writer: &mut W,
    event_type: &str,
    data: Option<serde_json::Value>,
    payload: &[u8],
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let header = EventHeader {
        event_type: event_type.to_string(),
        data,
        data_length: None,
        payload_length: (!payload.is_empty()).then_some(payload.len()),
    };
    let mut line = serde_json::to_vec(&header)?;
    line.push(b'\n');
    writer.write_all(&line).await?;
    if !payload.is_empty() {
        writer.write_all(payload).await?;
    }
    Ok(())
}

/// Read the next event, or `None` at end of stream
pub async fn read_event<R>(reader: &mut R) -> std::io::Result<Option<Event>>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    if reader.read_line(&mut line).await? == 0 {
        return Ok(None);
    }

    let header: EventHeader = serde_json::from_str(line.trim())
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    let mut data = header
        .data
        .unwrap_or_else(|| serde_json::Value::Object(Default::default()));

    if let Some(len) = header.data_length.filter(|&l| l > 0) {
        let mut buf = vec![0u8; len];
        reader.read_exact(&mut buf).await?;
        let extra: serde_json::Value = serde_json::from_slice(&buf)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        if let (Some(target), serde_json::Value::Object(extra)) = (data.as_object_mut(), extra) {
            target.extend(extra);
        }
    }

    let mut payload = Vec::new();
    if let Some(len) = header.payload_length.filter(|&l| l > 0) {
        payload.resize(len, 0);
        reader.read_exact(&mut payload).await?;
    }

    Ok(Some(Event {
        event_type: header.event_type,
        data,
        payload,
    }))
}

/// Wyoming client for ASR services
#[derive(Debug, Clone)]
pub struct WyomingClient {
    host: String,
    port: u16,
    format: AudioFormat,
}

impl WyomingClient {
    /// Create a new Wyoming client
    pub fn new(host: &str, port: u16) -> Self {
        Self {
            host: host.to_string(),
            port,
            format: AudioFormat {
                rate: crate::audio::SAMPLE_RATE,
                width: 2,
                channels: 1,
            },
        }
    }

    /// Check if the server is available
    pub async fn health_check(&self) -> bool {
        match TcpStream::connect((&*self.host, self.port)).await {
            Ok(_) => {
                debug!("Wyoming server available at {}:{}", self.host, self.port);
                true
            }
            Err(e) => {
                warn!("Wyoming server not available: {}", e);
                false
            }
        }
    }

    async fn run_session(&self, samples: &[i16]) -> std::io::Result<Option<String>> {
        let stream = TcpStream::connect((&*self.host, self.port)).await?;
        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        let format = serde_json::to_value(self.format)?;
        write_event(&mut writer, "transcribe", None, &[]).await?;
        write_event(&mut writer, "audio-start", Some(format.clone()), &[]).await?;

        for chunk in samples.chunks(CHUNK_SAMPLES) {
            let bytes: Vec<u8> = chunk.iter().flat_map(|s| s.to_le_bytes()).collect();
            write_event(&mut writer, "audio-chunk", Some(format.clone()), &bytes).await?;
        }

        write_event(&mut writer, "audio-stop", None, &[]).await?;
        writer.flush().await?;

        debug!(
            "Sent {} samples, waiting for transcript...",
            samples.len()
        );

        while let Some(event) = read_event(&mut reader).await? {
            if event.event_type == "transcript" {
                let transcript: TranscriptData = serde_json::from_value(event.data)?;
                return Ok(Some(transcript.text));
            }
            debug!("Ignoring Wyoming event '{}'", event.event_type);
        }
        Ok(None)
    }
}

#[async_trait::async_trait]
impl super::AsrEngine for WyomingClient {
    async fn transcribe(&self, samples: &[i16]) -> TutorResult<String> {
        let outcome = tokio::time::timeout(TRANSCRIPT_TIMEOUT, self.run_session(samples))
            .await
            .map_err(|_| {
                TutorError::Recognition("timed out waiting for transcript".to_string())
            })?;

        let transcript = match outcome {
            Ok(Some(text)) => text,
            Ok(None) => {
                return Err(TutorError::Recognition(
                    "recognizer closed the connection without a transcript".to_string(),
                ))
            }
            Err(e) => {
                return Err(TutorError::Recognition(format!(
                    "recognizer at {}:{} failed: {}",
                    self.host, self.port, e
                )))
            }
        };

        info!("📝 Wyoming transcript: '{}'", transcript);
        super::extract_text(&transcript)
    }

    fn name(&self) -> &str {
        "wyoming"
    }
}
