//! Speech output
//!
//! Speaks replies on a detached tokio task so the UI never waits for audio.
//! At most one utterance is active; starting a new one cancels the old one.

use crate::tts::TtsEngine;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::runtime::Handle;
use tokio::task::AbortHandle;
use tracing::{debug, info, warn};

struct Utterance {
    id: u64,
    task: AbortHandle,
}

/// Cancelable, fire-and-forget speech
///
/// "Speaking" is exactly "an utterance handle is held": both live behind the
/// same mutex, which is never held across an await.
pub struct SpeechOutput {
    engine: Arc<dyn TtsEngine>,
    runtime: Handle,
    active: Arc<Mutex<Option<Utterance>>>,
    next_id: AtomicU64,
}

impl std::fmt::Debug for SpeechOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SpeechOutput")
            .field("engine", &self.engine.name())
            .field("speaking", &self.is_speaking())
            .finish()
    }
}

fn lock(slot: &Mutex<Option<Utterance>>) -> MutexGuard<'_, Option<Utterance>> {
    // A panicking speech task must not wedge the session
    slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl SpeechOutput {
    /// Utterances are spawned onto `runtime`.
    pub fn new(engine: Arc<dyn TtsEngine>, runtime: Handle) -> Self {
        Self {
            engine,
            runtime,
            active: Arc::new(Mutex::new(None)),
            next_id: AtomicU64::new(1),
        }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Start speaking `text` without waiting for it to finish.
    ///
    /// Synthesis failures are logged, never returned.
    pub fn speak(&self, text: &str) {
        let text = text.trim();
        if text.is_empty() {
            return;
        }

        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let engine = self.engine.clone();
        let active = self.active.clone();
        let text = text.to_string();

        let mut slot = lock(&self.active);
        if let Some(previous) = slot.take() {
            debug!("Cancelling utterance {} for {}", previous.id, id);
            previous.task.abort();
            self.engine.stop();
        }

        // Registered before the task can finish, so its cleanup always
        // finds its own entry.
        let task = self.runtime.spawn(async move {
            if let Err(e) = engine.speak(&text).await {
                warn!("🔇 Speech error: {}", e);
            }
            let mut slot = lock(&active);
            if slot.as_ref().is_some_and(|u| u.id == id) {
                *slot = None;
            }
        });
        *slot = Some(Utterance {
            id,
            task: task.abort_handle(),
        });
    }

    /// Cancel the current utterance. No-op while idle.
    pub fn stop(&self) {
        let current = lock(&self.active).take();
        if let Some(utterance) = current {
            utterance.task.abort();
            self.engine.stop();
            info!("🛑 Voice stopped");
        }
    }

    pub fn is_speaking(&self) -> bool {
        lock(&self.active).is_some()
    }
}

impl Drop for SpeechOutput {
    fn drop(&mut self) {
        self.stop();
    }
}
