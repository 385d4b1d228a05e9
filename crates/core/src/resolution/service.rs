//! Dose resolver - the per-firing state machine
//!
//! `FIRED -> {TAKEN, SNOOZED, DISMISSED, MISSED}`, plus `SNOOZED -> TAKEN`
//! through early confirmation of a stored row.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Duration;
use medalarm_domain::constants::UNMATCHED_ALARM_ID;
use medalarm_domain::{DoseStatus, FirePayload, NewDoseRecord, ReminderPolicy, Result, TimerKey};
use parking_lot::Mutex;
use tracing::{debug, error, info, instrument, warn};

use super::firing::FiringInstance;
use super::ports::AlarmPresenter;
use crate::clock::Clock;
use crate::scheduling::{AlarmScheduler, SnoozeRequest};
use crate::storage_ports::{DoseRecordStore, MedicationStore, ScheduleStore};

/// What an action did to a firing instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// This action won the firing. `dose_id` is `None` when the row could
    /// not be written.
    Recorded { status: DoseStatus, dose_id: Option<i64> },
    /// Another action already resolved the firing.
    AlreadyResolved,
    /// Snooze refused; the firing stays open.
    SnoozeLimitReached,
}

/// Determines, persists and follows up the outcome of every fired alarm.
pub struct DoseResolver {
    medications: Arc<dyn MedicationStore>,
    schedules: Arc<dyn ScheduleStore>,
    doses: Arc<dyn DoseRecordStore>,
    scheduler: Arc<AlarmScheduler>,
    presenter: Arc<dyn AlarmPresenter>,
    clock: Arc<dyn Clock>,
    policy: ReminderPolicy,
    active: Mutex<HashMap<TimerKey, Arc<FiringInstance>>>,
}

impl DoseResolver {
    /// Resolver over the given stores, scheduler and presenter.
    pub fn new(
        medications: Arc<dyn MedicationStore>,
        schedules: Arc<dyn ScheduleStore>,
        doses: Arc<dyn DoseRecordStore>,
        scheduler: Arc<AlarmScheduler>,
        presenter: Arc<dyn AlarmPresenter>,
        clock: Arc<dyn Clock>,
        policy: ReminderPolicy,
    ) -> Self {
        Self {
            medications,
            schedules,
            doses,
            scheduler,
            presenter,
            clock,
            policy,
            active: Mutex::new(HashMap::new()),
        }
    }

    /// Reminder policy the resolver was built with.
    pub const fn policy(&self) -> &ReminderPolicy {
        &self.policy
    }

    /// Entry point for a delivered wake-up.
    ///
    /// Presents the alarm and starts the missed timeout. The returned instance
    /// is also reachable through [`Self::active`] until it is resolved.
    #[instrument(skip(self, payload), fields(alarm_id = payload.alarm_id, snooze = payload.is_snooze))]
    pub async fn on_fire(self: &Arc<Self>, payload: FirePayload) -> Arc<FiringInstance> {
        info!(
            medication = %payload.medication_name,
            hour = payload.hour,
            minute = payload.minute,
            snooze_count = payload.snooze_count,
            "alarm fired"
        );

        let key = payload.timer_key();
        self.presenter.present(&payload);
        let instance = Arc::new(FiringInstance::new(payload, self.clock.now()));
        self.active.lock().insert(key, Arc::clone(&instance));

        let resolver = Arc::clone(self);
        let pending = Arc::clone(&instance);
        let timeout = self.policy.missed_timeout();
        tokio::spawn(async move {
            tokio::time::sleep(timeout).await;
            if !pending.is_handled() {
                resolver.expire(&pending).await;
            }
        });

        instance
    }

    /// The unresolved firing currently registered under `key`, if any.
    pub fn active(&self, key: TimerKey) -> Option<Arc<FiringInstance>> {
        self.active.lock().get(&key).cloned()
    }

    /// The user took the dose.
    pub async fn confirm(&self, instance: &FiringInstance) -> Resolution {
        self.resolve(instance, DoseStatus::Taken).await
    }

    /// The user postponed the dose.
    pub async fn snooze(&self, instance: &FiringInstance) -> Resolution {
        self.resolve(instance, DoseStatus::Snoozed).await
    }

    /// The user dismissed the reminder without taking the dose.
    pub async fn dismiss(&self, instance: &FiringInstance) -> Resolution {
        self.resolve(instance, DoseStatus::Dismissed).await
    }

    /// Nobody acted within the missed timeout.
    pub async fn expire(&self, instance: &FiringInstance) -> Resolution {
        self.resolve(instance, DoseStatus::Missed).await
    }

    /// Mark a pending snooze as TAKEN before its snooze fires.
    ///
    /// Returns `Ok(false)` when the row is unknown, no longer SNOOZED or its
    /// snooze has already lapsed; the alarm's timers are left alone then. On
    /// success the pending snooze wake-up is cancelled and the owning alarm is
    /// re-armed for its next daily occurrence.
    #[instrument(skip(self))]
    pub async fn confirm_snoozed_early(&self, dose_id: i64) -> Result<bool> {
        let Some(dose) = self.doses.get_by_id(dose_id).await? else {
            debug!(dose_id, "early confirm for unknown dose");
            return Ok(false);
        };

        if !self.doses.confirm_snoozed(dose_id, self.clock.now_millis()).await? {
            debug!(dose_id, status = %dose.status, "dose is not a pending snooze; nothing to confirm");
            return Ok(false);
        }

        let owner = self
            .schedules
            .get_by_medication(dose.medication_id)
            .await?
            .into_iter()
            .find(|alarm| {
                alarm.matches_slot(dose.medication_id, dose.scheduled_hour, dose.scheduled_minute)
            });

        match owner {
            Some(alarm) => {
                self.scheduler.cancel_snooze(alarm.id);
                if alarm.enabled {
                    self.scheduler.schedule_next_occurrence(&alarm, &dose.medication_name);
                }
            }
            None => self.scheduler.cancel_snooze(UNMATCHED_ALARM_ID),
        }

        info!(dose_id, medication_id = dose.medication_id, "snoozed dose confirmed early");
        Ok(true)
    }

    async fn resolve(&self, instance: &FiringInstance, status: DoseStatus) -> Resolution {
        let payload = instance.payload();

        if status == DoseStatus::Snoozed && payload.snooze_count >= self.policy.max_snoozes {
            info!(
                alarm_id = payload.alarm_id,
                snooze_count = payload.snooze_count,
                max_snoozes = self.policy.max_snoozes,
                "snooze limit reached"
            );
            return Resolution::SnoozeLimitReached;
        }

        if !instance.try_claim() {
            debug!(alarm_id = payload.alarm_id, %status, "firing already resolved");
            return Resolution::AlreadyResolved;
        }

        self.forget(instance);
        self.presenter.teardown(payload);

        let now = self.clock.now();
        let medication_id = self.resolve_medication_id(payload).await;
        let snooze_delay = Duration::minutes(i64::from(self.policy.snooze_minutes));
        let snoozed_until =
            (status == DoseStatus::Snoozed).then(|| (now + snooze_delay).timestamp_millis());

        let dose_id = match medication_id {
            Some(medication_id) => {
                let record = NewDoseRecord {
                    medication_id,
                    medication_name: payload.medication_name.clone(),
                    scheduled_hour: payload.hour,
                    scheduled_minute: payload.minute,
                    recorded_at: now.timestamp_millis(),
                    status,
                    snoozed_until,
                };
                match self.doses.insert(record).await {
                    Ok(id) => Some(id),
                    Err(err) => {
                        error!(alarm_id = payload.alarm_id, %status, error = %err, "failed to record dose outcome");
                        None
                    }
                }
            }
            None => {
                warn!(
                    alarm_id = payload.alarm_id,
                    medication_id = payload.medication_id,
                    %status,
                    "medication could not be resolved; dose outcome not recorded"
                );
                None
            }
        };

        info!(alarm_id = payload.alarm_id, %status, dose_id, "dose resolved");

        if status == DoseStatus::Snoozed {
            self.scheduler.schedule_snooze(SnoozeRequest {
                alarm_id: payload.alarm_id,
                medication_id: medication_id.unwrap_or(payload.medication_id),
                medication_name: payload.medication_name.clone(),
                original_hour: payload.hour,
                original_minute: payload.minute,
                delay_minutes: self.policy.snooze_minutes,
                snooze_count: payload.snooze_count + 1,
            });
        } else {
            self.rearm(payload).await;
        }

        Resolution::Recorded { status, dose_id }
    }

    async fn resolve_medication_id(&self, payload: &FirePayload) -> Option<i64> {
        if payload.has_valid_medication() {
            return Some(payload.medication_id);
        }
        if payload.alarm_id <= 0 {
            return None;
        }
        match self.schedules.get_by_id(payload.alarm_id).await {
            Ok(alarm) => alarm.map(|alarm| alarm.medication_id).filter(|id| *id > 0),
            Err(err) => {
                error!(alarm_id = payload.alarm_id, error = %err, "failed to look up alarm");
                None
            }
        }
    }

    async fn rearm(&self, payload: &FirePayload) {
        if payload.alarm_id <= 0 {
            return;
        }
        let alarm = match self.schedules.get_by_id(payload.alarm_id).await {
            Ok(Some(alarm)) if alarm.enabled => alarm,
            Ok(_) => {
                debug!(alarm_id = payload.alarm_id, "alarm gone or disabled; not re-arming");
                return;
            }
            Err(err) => {
                error!(alarm_id = payload.alarm_id, error = %err, "failed to load alarm for re-arm");
                return;
            }
        };

        let name = match self.medications.get_by_id(alarm.medication_id).await {
            Ok(Some(medication)) => medication.name,
            Ok(None) => payload.medication_name.clone(),
            Err(err) => {
                warn!(medication_id = alarm.medication_id, error = %err, "medication lookup failed; reusing fired name");
                payload.medication_name.clone()
            }
        };

        self.scheduler.schedule_next_occurrence(&alarm, &name);
    }

    fn forget(&self, instance: &FiringInstance) {
        let key = instance.payload().timer_key();
        let mut active = self.active.lock();
        if active.get(&key).is_some_and(|current| std::ptr::eq(current.as_ref(), instance)) {
            active.remove(&key);
        }
    }
}
