//! Recording doubles for the wake timer and presenter ports.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Local};
use medalarm_core::{AlarmPresenter, WakeTimer};
use medalarm_domain::{FirePayload, Result, TimerKey};
use parking_lot::Mutex;

/// Ordered log shared between doubles to assert on call order.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, event: impl Into<String>) {
        self.0.lock().push(event.into());
    }

    pub fn events(&self) -> Vec<String> {
        self.0.lock().clone()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WakeRequest {
    pub key: TimerKey,
    pub due: DateTime<Local>,
    pub payload: FirePayload,
}

/// Wake timer that keeps outstanding requests in a map and records every call.
pub struct RecordingWakeTimer {
    pending: Mutex<HashMap<TimerKey, WakeRequest>>,
    requests: Mutex<Vec<WakeRequest>>,
    cancels: Mutex<Vec<TimerKey>>,
    exact_allowed: AtomicBool,
}

impl Default for RecordingWakeTimer {
    fn default() -> Self {
        Self {
            pending: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            cancels: Mutex::new(Vec::new()),
            exact_allowed: AtomicBool::new(true),
        }
    }
}

impl RecordingWakeTimer {
    pub fn set_exact_allowed(&self, allowed: bool) {
        self.exact_allowed.store(allowed, Ordering::SeqCst);
    }

    pub fn pending(&self, key: TimerKey) -> Option<WakeRequest> {
        self.pending.lock().get(&key).cloned()
    }

    pub fn pending_count(&self) -> usize {
        self.pending.lock().len()
    }

    pub fn requests(&self) -> Vec<WakeRequest> {
        self.requests.lock().clone()
    }

    pub fn cancels(&self) -> Vec<TimerKey> {
        self.cancels.lock().clone()
    }

    pub fn clear_history(&self) {
        self.requests.lock().clear();
        self.cancels.lock().clear();
    }

    /// Remove and return a pending request as if it had fired.
    pub fn take_fired(&self, key: TimerKey) -> Option<FirePayload> {
        self.pending.lock().remove(&key).map(|request| request.payload)
    }
}

impl WakeTimer for RecordingWakeTimer {
    fn can_schedule_exact_wake(&self) -> bool {
        self.exact_allowed.load(Ordering::SeqCst)
    }

    fn request_wake(&self, key: TimerKey, due: DateTime<Local>, payload: FirePayload) -> Result<()> {
        let request = WakeRequest { key, due, payload };
        self.requests.lock().push(request.clone());
        self.pending.lock().insert(key, request);
        Ok(())
    }

    fn cancel(&self, key: TimerKey) {
        self.cancels.lock().push(key);
        self.pending.lock().remove(&key);
    }
}

/// Presenter that records present/teardown calls into the shared log.
pub struct RecordingPresenter {
    log: EventLog,
    presented: Mutex<Vec<FirePayload>>,
    torn_down: Mutex<Vec<FirePayload>>,
}

impl RecordingPresenter {
    pub fn new(log: EventLog) -> Self {
        Self { log, presented: Mutex::new(Vec::new()), torn_down: Mutex::new(Vec::new()) }
    }

    pub fn presented(&self) -> Vec<FirePayload> {
        self.presented.lock().clone()
    }

    pub fn torn_down(&self) -> Vec<FirePayload> {
        self.torn_down.lock().clone()
    }
}

impl AlarmPresenter for RecordingPresenter {
    fn present(&self, payload: &FirePayload) {
        self.log.push(format!("present {}", payload.alarm_id));
        self.presented.lock().push(payload.clone());
    }

    fn teardown(&self, payload: &FirePayload) {
        self.log.push(format!("teardown {}", payload.alarm_id));
        self.torn_down.lock().push(payload.clone());
    }
}
