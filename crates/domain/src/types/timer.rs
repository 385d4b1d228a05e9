//! Timer keys and fire payloads exchanged with the wake service

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::constants::SNOOZE_KEY_OFFSET;

/// Logical key of an outstanding wake request.
///
/// Daily and snooze requests for the same alarm live in disjoint namespaces,
/// so an alarm can have both outstanding at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TimerKey {
    /// Daily recurrence of the alarm with this id.
    Daily(i64),
    /// Pending snooze of the alarm with this id.
    Snooze(i64),
}

impl TimerKey {
    /// Flat integer form for platform timer services that only accept a
    /// single integer request code. Snooze keys are offset by
    /// [`SNOOZE_KEY_OFFSET`].
    pub const fn raw(self) -> i64 {
        match self {
            Self::Daily(alarm_id) => alarm_id,
            Self::Snooze(alarm_id) => SNOOZE_KEY_OFFSET + alarm_id,
        }
    }

    /// Inverse of [`Self::raw`], for adapters that hand back the flat code.
    pub const fn from_raw(raw: i64) -> Self {
        if raw >= SNOOZE_KEY_OFFSET {
            Self::Snooze(raw - SNOOZE_KEY_OFFSET)
        } else {
            Self::Daily(raw)
        }
    }

    /// Alarm the request belongs to.
    pub const fn alarm_id(self) -> i64 {
        match self {
            Self::Daily(alarm_id) | Self::Snooze(alarm_id) => alarm_id,
        }
    }
}

impl fmt::Display for TimerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Daily(alarm_id) => write!(f, "daily:{alarm_id}"),
            Self::Snooze(alarm_id) => write!(f, "snooze:{alarm_id}"),
        }
    }
}

/// Data delivered with a fired wake request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FirePayload {
    pub alarm_id: i64,
    /// Values `<= 0` mean the medication is unknown and must be resolved
    /// through `alarm_id`.
    pub medication_id: i64,
    pub medication_name: String,
    /// Originally scheduled slot, preserved across snoozes.
    pub hour: u8,
    pub minute: u8,
    /// Snoozes already spent on this dose.
    pub snooze_count: u32,
    pub is_snooze: bool,
}

impl FirePayload {
    pub const fn has_valid_medication(&self) -> bool {
        self.medication_id > 0
    }

    /// Key the payload was scheduled under.
    pub const fn timer_key(&self) -> TimerKey {
        if self.is_snooze {
            TimerKey::Snooze(self.alarm_id)
        } else {
            TimerKey::Daily(self.alarm_id)
        }
    }
}
