//! Reminder policy constants
//!
//! Defaults for the dose lifecycle. The effective values live in
//! [`crate::ReminderPolicy`] so deployments can tune them.

/// Minutes a snoozed reminder waits before firing again.
pub const SNOOZE_MINUTES: u32 = 5;

/// Maximum number of snoozes for a single scheduled dose.
pub const MAX_SNOOZES: u32 = 4;

/// Seconds a fired reminder waits for an action before it is recorded as missed.
pub const MISSED_TIMEOUT_SECS: u64 = 180;

/// Offset separating snooze timer keys from daily alarm keys.
///
/// SQLite row ids stay far below 2^40, so `offset + alarm_id` never collides
/// with a daily key.
pub const SNOOZE_KEY_OFFSET: i64 = 1 << 40;

/// Alarm id used for a restored snooze whose originating alarm is gone.
pub const UNMATCHED_ALARM_ID: i64 = 0;

/// Display name used when a medication row cannot be found.
pub const DEFAULT_MEDICATION_NAME: &str = "Medication";

/// Milliseconds per minute, used for snooze arithmetic on epoch millis.
pub const MILLIS_PER_MINUTE: i64 = 60_000;
