//! Port interface for the platform wake service

use chrono::{DateTime, Local};
use medalarm_domain::{FirePayload, Result, TimerKey};

/// "Invoke me at wall-clock time T" with at most one outstanding request per
/// key.
///
/// Requests are fire-and-forget. Implementations deliver the payload to the
/// dose resolver once the due time is reached.
pub trait WakeTimer: Send + Sync {
    /// Whether exact wake-ups are currently permitted.
    fn can_schedule_exact_wake(&self) -> bool;

    /// Arm a wake-up, replacing any outstanding request under the same key.
    fn request_wake(&self, key: TimerKey, due: DateTime<Local>, payload: FirePayload)
        -> Result<()>;

    /// Drop the outstanding request for `key`. Unknown keys are ignored.
    fn cancel(&self, key: TimerKey);
}
