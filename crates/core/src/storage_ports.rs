//! Port interfaces for durable storage
//!
//! The stores are the single source of truth. Services never cache rows
//! between calls.

use async_trait::async_trait;
use medalarm_domain::{
    AlarmSchedule, DoseHistory, DoseStatus, Medication, NewDoseRecord, NewMedication, Result,
    TimeOfDay,
};
use tokio::sync::watch;

/// Persistence of medications.
#[async_trait]
pub trait MedicationStore: Send + Sync {
    /// Insert a medication and return the stored row.
    async fn insert(&self, medication: NewMedication) -> Result<Medication>;

    /// Replace an existing medication row.
    async fn update(&self, medication: &Medication) -> Result<()>;

    /// Delete a medication. Its alarms are removed with it.
    async fn delete(&self, id: i64) -> Result<bool>;

    /// All medications ordered by name.
    async fn get_all(&self) -> Result<Vec<Medication>>;

    async fn get_by_id(&self, id: i64) -> Result<Option<Medication>>;
}

/// Persistence of daily alarm definitions.
#[async_trait]
pub trait ScheduleStore: Send + Sync {
    async fn insert(
        &self,
        medication_id: i64,
        time: TimeOfDay,
        enabled: bool,
    ) -> Result<AlarmSchedule>;

    async fn update(&self, alarm: &AlarmSchedule) -> Result<()>;

    async fn delete(&self, id: i64) -> Result<bool>;

    async fn get_by_id(&self, id: i64) -> Result<Option<AlarmSchedule>>;

    async fn get_all_enabled(&self) -> Result<Vec<AlarmSchedule>>;

    /// Alarms of one medication ordered by hour, then minute.
    async fn get_by_medication(&self, medication_id: i64) -> Result<Vec<AlarmSchedule>>;

    async fn delete_by_medication(&self, medication_id: i64) -> Result<usize>;
}

/// Persistence of dose outcomes.
#[async_trait]
pub trait DoseRecordStore: Send + Sync {
    /// Insert an outcome and return its id.
    async fn insert(&self, record: NewDoseRecord) -> Result<i64>;

    async fn get_by_id(&self, id: i64) -> Result<Option<DoseHistory>>;

    /// Unconditionally overwrite status and timestamp. Returns whether a row
    /// was touched.
    ///
    /// Part of the store interface for administrative corrections. The
    /// resolver never rewrites a row this way; its only in-place transition
    /// is [`Self::confirm_snoozed`].
    async fn update_status(&self, id: i64, status: DoseStatus, recorded_at: i64) -> Result<bool>;

    /// Move a pending snooze to TAKEN in one conditional write, recorded at
    /// `now_ms`.
    ///
    /// Only a row that is still SNOOZED with `snoozed_until > now_ms`
    /// qualifies. Returns `false` when the row does not exist, is no longer
    /// SNOOZED or its snooze has already lapsed.
    async fn confirm_snoozed(&self, id: i64, now_ms: i64) -> Result<bool>;

    /// SNOOZED rows whose expiry is after `now_ms`, soonest first.
    async fn get_pending_snoozes(&self, now_ms: i64) -> Result<Vec<DoseHistory>>;

    /// All rows, most recent first.
    async fn get_all(&self) -> Result<Vec<DoseHistory>>;

    async fn get_by_medication(&self, medication_id: i64) -> Result<Vec<DoseHistory>>;

    /// Rows recorded in `[start_ms, end_ms)`, most recent first.
    async fn get_by_date_range(&self, start_ms: i64, end_ms: i64) -> Result<Vec<DoseHistory>>;

    async fn count_taken_since(&self, since_ms: i64) -> Result<i64>;

    /// Administrative bulk clear.
    async fn delete_all(&self) -> Result<usize>;

    /// Change notifications. The value is a monotonically increasing revision
    /// bumped after every successful write.
    fn subscribe_changes(&self) -> watch::Receiver<u64>;
}
