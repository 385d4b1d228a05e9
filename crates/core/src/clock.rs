//! Wall-clock abstraction
//!
//! Alarm times are local wall-clock times, so the clock hands out
//! `DateTime<Local>`. Production code uses [`SystemClock`]; tests drive a
//! [`MockClock`] explicitly.

use std::sync::Arc;

use chrono::{DateTime, Duration, Local};
use parking_lot::Mutex;

/// Source of the current local time.
pub trait Clock: Send + Sync {
    /// Current local wall-clock time.
    fn now(&self) -> DateTime<Local>;

    /// Current time as milliseconds since the UNIX epoch.
    fn now_millis(&self) -> i64 {
        self.now().timestamp_millis()
    }
}

/// Real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Local> {
        Local::now()
    }
}

/// Manually driven clock for deterministic tests.
///
/// Clones share the same underlying time.
#[derive(Debug, Clone)]
pub struct MockClock {
    now: Arc<Mutex<DateTime<Local>>>,
}

impl MockClock {
    /// Clock frozen at `start`.
    pub fn new(start: DateTime<Local>) -> Self {
        Self { now: Arc::new(Mutex::new(start)) }
    }

    /// Move time forward by `by` for every clone.
    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock();
        *now += by;
    }

    /// Jump to `to`, forwards or backwards.
    pub fn set(&self, to: DateTime<Local>) {
        *self.now.lock() = to;
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Local> {
        *self.now.lock()
    }
}
