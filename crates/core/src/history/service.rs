//! History service - read side of the dose record store

use std::sync::Arc;

use chrono::{DateTime, Local, NaiveDate, TimeZone};
use futures::stream::{self, BoxStream, StreamExt};
use medalarm_domain::{DoseHistory, MedAlarmError, Result};
use tracing::info;

use crate::clock::Clock;
use crate::storage_ports::DoseRecordStore;

/// Queries over recorded dose outcomes.
pub struct HistoryService {
    doses: Arc<dyn DoseRecordStore>,
    clock: Arc<dyn Clock>,
}

impl HistoryService {
    pub fn new(doses: Arc<dyn DoseRecordStore>, clock: Arc<dyn Clock>) -> Self {
        Self { doses, clock }
    }

    /// Every outcome, most recent first.
    pub async fn all(&self) -> Result<Vec<DoseHistory>> {
        self.doses.get_all().await
    }

    pub async fn for_medication(&self, medication_id: i64) -> Result<Vec<DoseHistory>> {
        self.doses.get_by_medication(medication_id).await
    }

    /// Outcomes recorded during the given local calendar day.
    pub async fn for_day(&self, day: NaiveDate) -> Result<Vec<DoseHistory>> {
        let start = start_of_day(day)?;
        let next = day
            .succ_opt()
            .ok_or_else(|| MedAlarmError::InvalidInput(format!("no day after {day}")))?;
        let end = start_of_day(next)?;
        self.doses.get_by_date_range(start.timestamp_millis(), end.timestamp_millis()).await
    }

    /// Number of TAKEN outcomes recorded at or after `since`.
    pub async fn taken_since(&self, since: DateTime<Local>) -> Result<i64> {
        self.doses.count_taken_since(since.timestamp_millis()).await
    }

    /// Snoozes that have not expired yet.
    pub async fn pending_snoozes(&self) -> Result<Vec<DoseHistory>> {
        self.doses.get_pending_snoozes(self.clock.now_millis()).await
    }

    /// Live view of pending snoozes.
    ///
    /// Yields the current list immediately and again after every write to the
    /// dose store. Ends when the store is dropped.
    pub fn watch_pending_snoozes(&self) -> BoxStream<'static, Result<Vec<DoseHistory>>> {
        let receiver = self.doses.subscribe_changes();
        let doses = Arc::clone(&self.doses);
        let clock = Arc::clone(&self.clock);

        stream::unfold((receiver, true), move |(mut receiver, first)| {
            let doses = Arc::clone(&doses);
            let clock = Arc::clone(&clock);
            async move {
                if !first {
                    receiver.changed().await.ok()?;
                }
                receiver.mark_unchanged();
                let snapshot = doses.get_pending_snoozes(clock.now_millis()).await;
                Some((snapshot, (receiver, false)))
            }
        })
        .boxed()
    }

    /// Administrative clear of the whole history.
    pub async fn clear(&self) -> Result<usize> {
        let removed = self.doses.delete_all().await?;
        info!(removed, "dose history cleared");
        Ok(removed)
    }
}

fn start_of_day(day: NaiveDate) -> Result<DateTime<Local>> {
    let midnight = day.and_hms_opt(0, 0, 0).ok_or_else(|| {
        MedAlarmError::Internal(format!("midnight not representable for {day}"))
    })?;
    Local
        .from_local_datetime(&midnight)
        .earliest()
        .or_else(|| Local.from_local_datetime(&(midnight + chrono::Duration::hours(1))).earliest())
        .ok_or_else(|| MedAlarmError::Internal(format!("start of {day} not representable")))
}
