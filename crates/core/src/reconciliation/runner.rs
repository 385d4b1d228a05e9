//! Reconciliation runner

use std::collections::HashMap;
use std::sync::Arc;

use medalarm_domain::constants::{
    DEFAULT_MEDICATION_NAME, MILLIS_PER_MINUTE, UNMATCHED_ALARM_ID,
};
use medalarm_domain::{AlarmSchedule, DoseHistory};
use serde::Serialize;
use tracing::{error, info, instrument, warn};

use crate::clock::Clock;
use crate::scheduling::{AlarmScheduler, SnoozeRequest};
use crate::storage_ports::{DoseRecordStore, MedicationStore, ScheduleStore};

/// Snooze count assumed for a restored snooze. The row proves at least one
/// snooze was spent; the exact number is not persisted.
const RESTORED_SNOOZE_COUNT: u32 = 1;

/// Counts of one reconciliation run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReconciliationReport {
    pub alarms_scheduled: usize,
    pub alarms_skipped: usize,
    pub snoozes_restored: usize,
    pub snoozes_skipped: usize,
}

/// Whole minutes until `snoozed_until`, rounded up and never below one.
pub fn remaining_snooze_minutes(snoozed_until: i64, now_ms: i64) -> u32 {
    let remaining_ms = snoozed_until.saturating_sub(now_ms).max(0);
    let minutes = remaining_ms.saturating_add(MILLIS_PER_MINUTE - 1) / MILLIS_PER_MINUTE;
    u32::try_from(minutes).unwrap_or(u32::MAX).max(1)
}

/// Replays every scheduler call that should be outstanding after a restart.
pub struct ReconciliationRunner {
    medications: Arc<dyn MedicationStore>,
    schedules: Arc<dyn ScheduleStore>,
    doses: Arc<dyn DoseRecordStore>,
    scheduler: Arc<AlarmScheduler>,
    clock: Arc<dyn Clock>,
}

impl ReconciliationRunner {
    pub fn new(
        medications: Arc<dyn MedicationStore>,
        schedules: Arc<dyn ScheduleStore>,
        doses: Arc<dyn DoseRecordStore>,
        scheduler: Arc<AlarmScheduler>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { medications, schedules, doses, scheduler, clock }
    }

    /// Run both passes. A failing item never stops the remaining ones, and a
    /// failing pass never stops the other pass.
    #[instrument(skip(self))]
    pub async fn run(&self) -> ReconciliationReport {
        let mut report = ReconciliationReport::default();
        self.restore_alarms(&mut report).await;
        self.restore_snoozes(&mut report).await;
        info!(
            alarms_scheduled = report.alarms_scheduled,
            alarms_skipped = report.alarms_skipped,
            snoozes_restored = report.snoozes_restored,
            snoozes_skipped = report.snoozes_skipped,
            "reconciliation finished"
        );
        report
    }

    async fn restore_alarms(&self, report: &mut ReconciliationReport) {
        let alarms = match self.schedules.get_all_enabled().await {
            Ok(alarms) => alarms,
            Err(err) => {
                error!(error = %err, "failed to load enabled alarms; skipping alarm pass");
                return;
            }
        };

        let mut names: HashMap<i64, String> = HashMap::new();
        for alarm in &alarms {
            let name = match names.get(&alarm.medication_id) {
                Some(name) => name.clone(),
                None => {
                    let name = self.medication_name(alarm.medication_id).await;
                    names.insert(alarm.medication_id, name.clone());
                    name
                }
            };

            if self.scheduler.schedule(alarm, &name).is_scheduled() {
                report.alarms_scheduled += 1;
            } else {
                report.alarms_skipped += 1;
            }
        }
        info!(count = report.alarms_scheduled, "alarms rescheduled");
    }

    async fn restore_snoozes(&self, report: &mut ReconciliationReport) {
        let now_ms = self.clock.now_millis();
        let pending = match self.doses.get_pending_snoozes(now_ms).await {
            Ok(pending) => pending,
            Err(err) => {
                error!(error = %err, "failed to load pending snoozes; skipping snooze pass");
                return;
            }
        };

        let mut alarms_by_medication: HashMap<i64, Vec<AlarmSchedule>> = HashMap::new();
        for dose in &pending {
            let Some(snoozed_until) = dose.snoozed_until else {
                report.snoozes_skipped += 1;
                continue;
            };

            if !alarms_by_medication.contains_key(&dose.medication_id) {
                let alarms = match self.schedules.get_by_medication(dose.medication_id).await {
                    Ok(alarms) => alarms,
                    Err(err) => {
                        warn!(
                            medication_id = dose.medication_id,
                            error = %err,
                            "failed to load alarms for snooze; using unmatched key"
                        );
                        Vec::new()
                    }
                };
                alarms_by_medication.insert(dose.medication_id, alarms);
            }
            let alarm_id = alarms_by_medication
                .get(&dose.medication_id)
                .and_then(|alarms| owning_alarm(alarms, dose))
                .unwrap_or(UNMATCHED_ALARM_ID);

            let outcome = self.scheduler.schedule_snooze(SnoozeRequest {
                alarm_id,
                medication_id: dose.medication_id,
                medication_name: dose.medication_name.clone(),
                original_hour: dose.scheduled_hour,
                original_minute: dose.scheduled_minute,
                delay_minutes: remaining_snooze_minutes(snoozed_until, now_ms),
                snooze_count: RESTORED_SNOOZE_COUNT,
            });
            if outcome.is_scheduled() {
                report.snoozes_restored += 1;
            } else {
                report.snoozes_skipped += 1;
            }
        }
        info!(count = report.snoozes_restored, "pending snoozes restored");
    }

    async fn medication_name(&self, medication_id: i64) -> String {
        match self.medications.get_by_id(medication_id).await {
            Ok(Some(medication)) => medication.name,
            Ok(None) => DEFAULT_MEDICATION_NAME.to_owned(),
            Err(err) => {
                warn!(medication_id, error = %err, "medication lookup failed; using default name");
                DEFAULT_MEDICATION_NAME.to_owned()
            }
        }
    }
}

fn owning_alarm(alarms: &[AlarmSchedule], dose: &DoseHistory) -> Option<i64> {
    alarms
        .iter()
        .find(|alarm| {
            alarm.matches_slot(dose.medication_id, dose.scheduled_hour, dose.scheduled_minute)
        })
        .map(|alarm| alarm.id)
}
