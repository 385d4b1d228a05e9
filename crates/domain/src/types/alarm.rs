//! Daily alarm definitions

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{MedAlarmError, Result};

/// A validated local wall-clock time of day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TimeOfDay {
    hour: u8,
    minute: u8,
}

impl TimeOfDay {
    pub fn new(hour: u8, minute: u8) -> Result<Self> {
        if hour > 23 || minute > 59 {
            return Err(MedAlarmError::InvalidInput(format!(
                "time of day out of range: {hour:02}:{minute:02}"
            )));
        }
        Ok(Self { hour, minute })
    }

    pub const fn hour(self) -> u8 {
        self.hour
    }

    pub const fn minute(self) -> u8 {
        self.minute
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.hour, self.minute)
    }
}

/// One daily reminder slot of a medication.
///
/// Several rows may share the same medication and time; each is scheduled
/// independently under its own id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlarmSchedule {
    pub id: i64,
    pub medication_id: i64,
    pub hour: u8,
    pub minute: u8,
    pub enabled: bool,
}

impl AlarmSchedule {
    /// True when this alarm owns the given medication slot.
    pub const fn matches_slot(&self, medication_id: i64, hour: u8, minute: u8) -> bool {
        self.medication_id == medication_id && self.hour == hour && self.minute == minute
    }
}
