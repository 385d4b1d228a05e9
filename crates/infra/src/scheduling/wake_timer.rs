//! In-process wake timer on the tokio runtime.
//!
//! Each outstanding key owns one sleeping task and a cancellation token.
//! Re-arming a key cancels the previous task; a generation number stops a
//! task that already woke from delivering a payload that was replaced in the
//! meantime.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use medalarm_core::{Clock, WakeTimer};
use medalarm_domain::{FirePayload, MedAlarmError, Result, TimerKey};
use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

struct PendingWake {
    due: DateTime<Local>,
    generation: u64,
    token: CancellationToken,
}

type PendingMap = Arc<Mutex<HashMap<TimerKey, PendingWake>>>;

/// [`WakeTimer`] backed by `tokio::time::sleep`.
///
/// Delays are computed against the injected [`Clock`] when the request is
/// made, so tests can drive a mock wall clock together with paused tokio
/// time.
pub struct TokioWakeTimer {
    pending: PendingMap,
    runtime: Handle,
    clock: Arc<dyn Clock>,
    sender: mpsc::UnboundedSender<FirePayload>,
    exact_allowed: AtomicBool,
    generation: AtomicU64,
}

impl TokioWakeTimer {
    /// Create the timer and the receiver fired payloads are delivered to.
    pub fn new(
        runtime: Handle,
        clock: Arc<dyn Clock>,
    ) -> (Self, mpsc::UnboundedReceiver<FirePayload>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        let timer = Self {
            pending: Arc::new(Mutex::new(HashMap::new())),
            runtime,
            clock,
            sender,
            exact_allowed: AtomicBool::new(true),
            generation: AtomicU64::new(0),
        };
        (timer, receiver)
    }

    /// Toggle the exact-wake permission reported to the scheduler.
    pub fn set_exact_wake_allowed(&self, allowed: bool) {
        self.exact_allowed.store(allowed, Ordering::SeqCst);
    }

    pub fn is_pending(&self, key: TimerKey) -> bool {
        self.pending.lock().contains_key(&key)
    }

    pub fn pending_due(&self, key: TimerKey) -> Option<DateTime<Local>> {
        self.pending.lock().get(&key).map(|wake| wake.due)
    }

    /// Outstanding keys, in no particular order.
    pub fn pending_keys(&self) -> Vec<TimerKey> {
        self.pending.lock().keys().copied().collect()
    }

    /// Cancel every outstanding wake-up.
    pub fn cancel_all(&self) {
        let drained: Vec<_> = self.pending.lock().drain().collect();
        for (key, wake) in drained {
            debug!(%key, "wake-up cancelled on shutdown");
            wake.token.cancel();
        }
    }
}

impl WakeTimer for TokioWakeTimer {
    fn can_schedule_exact_wake(&self) -> bool {
        self.exact_allowed.load(Ordering::SeqCst)
    }

    fn request_wake(&self, key: TimerKey, due: DateTime<Local>, payload: FirePayload) -> Result<()> {
        if self.sender.is_closed() {
            return Err(MedAlarmError::Platform("wake receiver has been dropped".into()));
        }

        let delay = (due - self.clock.now()).to_std().unwrap_or(Duration::ZERO);
        let generation = self.generation.fetch_add(1, Ordering::Relaxed);
        let token = CancellationToken::new();

        let replaced = self
            .pending
            .lock()
            .insert(key, PendingWake { due, generation, token: token.clone() });
        if let Some(previous) = replaced {
            debug!(%key, previous_due = %previous.due, "replacing outstanding wake-up");
            previous.token.cancel();
        }

        let pending = Arc::clone(&self.pending);
        let sender = self.sender.clone();
        self.runtime.spawn(async move {
            tokio::select! {
                () = token.cancelled() => {
                    debug!(%key, "wake-up cancelled");
                }
                () = tokio::time::sleep(delay) => {
                    let current = {
                        let mut map = pending.lock();
                        match map.get(&key) {
                            Some(wake) if wake.generation == generation => map.remove(&key).is_some(),
                            _ => false,
                        }
                    };
                    if !current {
                        return;
                    }
                    debug!(%key, "wake-up due");
                    if sender.send(payload).is_err() {
                        warn!(%key, "wake-up fired with no receiver");
                    }
                }
            }
        });

        debug!(%key, raw_key = key.raw(), %due, delay_secs = delay.as_secs(), "wake-up armed");
        Ok(())
    }

    fn cancel(&self, key: TimerKey) {
        if let Some(wake) = self.pending.lock().remove(&key) {
            wake.token.cancel();
            debug!(%key, "wake-up removed");
        }
    }
}

impl Drop for TokioWakeTimer {
    fn drop(&mut self) {
        for wake in self.pending.lock().values() {
            wake.token.cancel();
        }
    }
}
