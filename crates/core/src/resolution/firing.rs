//! Per-firing state

use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Local};
use medalarm_domain::FirePayload;

/// One delivered alarm and its "already handled" guard.
#[derive(Debug)]
pub struct FiringInstance {
    payload: FirePayload,
    fired_at: DateTime<Local>,
    handled: AtomicBool,
}

impl FiringInstance {
    pub fn new(payload: FirePayload, fired_at: DateTime<Local>) -> Self {
        Self { payload, fired_at, handled: AtomicBool::new(false) }
    }

    pub const fn payload(&self) -> &FirePayload {
        &self.payload
    }

    pub const fn fired_at(&self) -> DateTime<Local> {
        self.fired_at
    }

    pub fn is_handled(&self) -> bool {
        self.handled.load(Ordering::Acquire)
    }

    /// Claim the right to record the outcome. Only the first caller gets
    /// `true`.
    pub fn try_claim(&self) -> bool {
        self.handled.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire).is_ok()
    }
}
