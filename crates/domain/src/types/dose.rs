//! Dose history records

use serde::{Deserialize, Serialize};

use crate::impl_domain_status_conversions;

/// Outcome of one alarm firing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DoseStatus {
    Taken,
    Snoozed,
    Dismissed,
    Missed,
}

impl_domain_status_conversions!(DoseStatus {
    Taken => "TAKEN",
    Snoozed => "SNOOZED",
    Dismissed => "DISMISSED",
    Missed => "MISSED",
});

/// A persisted dose outcome.
///
/// `scheduled_hour`/`scheduled_minute` always hold the intended slot, even for
/// outcomes recorded after one or more snoozes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DoseHistory {
    pub id: i64,
    pub medication_id: i64,
    /// Name at fire time; later renames do not rewrite history.
    pub medication_name: String,
    pub scheduled_hour: u8,
    pub scheduled_minute: u8,
    /// Epoch millis of the outcome write.
    pub recorded_at: i64,
    pub status: DoseStatus,
    /// Epoch millis when the snooze expires. Only set for SNOOZED rows.
    pub snoozed_until: Option<i64>,
}

impl DoseHistory {
    /// SNOOZED with an expiry still in the future.
    pub fn is_pending_snooze(&self, now_ms: i64) -> bool {
        self.status == DoseStatus::Snoozed && self.snoozed_until.is_some_and(|until| until > now_ms)
    }
}

/// A dose outcome that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewDoseRecord {
    pub medication_id: i64,
    pub medication_name: String,
    pub scheduled_hour: u8,
    pub scheduled_minute: u8,
    pub recorded_at: i64,
    pub status: DoseStatus,
    pub snoozed_until: Option<i64>,
}

impl NewDoseRecord {
    pub fn into_history(self, id: i64) -> DoseHistory {
        DoseHistory {
            id,
            medication_id: self.medication_id,
            medication_name: self.medication_name,
            scheduled_hour: self.scheduled_hour,
            scheduled_minute: self.scheduled_minute,
            recorded_at: self.recorded_at,
            status: self.status,
            snoozed_until: self.snoozed_until,
        }
    }
}
