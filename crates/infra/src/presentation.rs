//! Log-only alarm presentation.
//!
//! Stands in for sound, vibration and the full-screen prompt on headless
//! hosts. Keeps the set of alarms currently on screen.

use std::collections::HashSet;

use medalarm_core::AlarmPresenter;
use medalarm_domain::{FirePayload, TimerKey};
use parking_lot::Mutex;
use tracing::{info, warn};

#[derive(Default)]
pub struct TracingPresenter {
    showing: Mutex<HashSet<TimerKey>>,
}

impl TracingPresenter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keys of alarms presented and not yet torn down.
    pub fn showing(&self) -> Vec<TimerKey> {
        self.showing.lock().iter().copied().collect()
    }
}

impl AlarmPresenter for TracingPresenter {
    fn present(&self, payload: &FirePayload) {
        let key = payload.timer_key();
        if !self.showing.lock().insert(key) {
            warn!(%key, "alarm presented twice");
        }
        info!(
            %key,
            medication = %payload.medication_name,
            hour = payload.hour,
            minute = payload.minute,
            snooze_count = payload.snooze_count,
            "time to take medication"
        );
    }

    fn teardown(&self, payload: &FirePayload) {
        let key = payload.timer_key();
        self.showing.lock().remove(&key);
        info!(%key, "alarm dismissed from screen");
    }
}
