//! Alarm scheduler - turns alarm definitions into wake requests

use std::sync::Arc;

use chrono::{DateTime, Duration, Local};
use medalarm_domain::{AlarmSchedule, FirePayload, Result, TimerKey};
use tracing::{debug, error, info, warn};

use super::occurrence::next_occurrence;
use super::ports::WakeTimer;
use crate::clock::Clock;

/// Result of a scheduling call.
///
/// Scheduling never fails loudly: a denied permission or a rejected request
/// leaves the alarm unarmed and is reported here and in the logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleOutcome {
    /// A wake-up is armed under `key` for `due`.
    Scheduled { key: TimerKey, due: DateTime<Local> },
    /// The alarm is disabled; nothing was armed.
    Disabled,
    /// Exact wake-ups are not permitted on this host.
    PermissionDenied,
    /// The fire time could not be computed or the timer rejected it.
    Failed,
}

impl ScheduleOutcome {
    /// Whether a wake-up was armed.
    pub const fn is_scheduled(&self) -> bool {
        matches!(self, Self::Scheduled { .. })
    }
}

/// Everything needed to arm a snooze wake-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnoozeRequest {
    /// Originating alarm, or the unmatched sentinel.
    pub alarm_id: i64,
    pub medication_id: i64,
    pub medication_name: String,
    /// Originally scheduled slot, carried unchanged into the payload.
    pub original_hour: u8,
    pub original_minute: u8,
    /// Minutes from now until the snooze fires.
    pub delay_minutes: u32,
    /// Snoozes spent so far, including the one being scheduled.
    pub snooze_count: u32,
}

/// Computes next fire times and issues or cancels wake requests.
pub struct AlarmScheduler {
    timer: Arc<dyn WakeTimer>,
    clock: Arc<dyn Clock>,
}

impl AlarmScheduler {
    /// Scheduler issuing requests on `timer`, with fire times taken from
    /// `clock`.
    pub fn new(timer: Arc<dyn WakeTimer>, clock: Arc<dyn Clock>) -> Self {
        Self { timer, clock }
    }

    /// Arm the next occurrence of `alarm`, today if still ahead, else
    /// tomorrow. Replaces any outstanding daily request of the alarm.
    pub fn schedule(&self, alarm: &AlarmSchedule, medication_name: &str) -> ScheduleOutcome {
        if !alarm.enabled {
            debug!(alarm_id = alarm.id, "alarm disabled; not scheduling");
            return ScheduleOutcome::Disabled;
        }
        let due = next_occurrence(self.clock.now(), alarm.hour, alarm.minute);
        self.arm_daily(alarm, medication_name, due)
    }

    /// Re-arm `alarm` after one of its firings has been resolved.
    ///
    /// The served slot is always behind now, so the next slot is the day after
    /// the served one. A late-evening slot resolved after midnight is re-armed
    /// for the same calendar day, not the day after.
    pub fn schedule_next_occurrence(
        &self,
        alarm: &AlarmSchedule,
        medication_name: &str,
    ) -> ScheduleOutcome {
        if !alarm.enabled {
            debug!(alarm_id = alarm.id, "alarm disabled; not re-arming");
            return ScheduleOutcome::Disabled;
        }
        let due = next_occurrence(self.clock.now(), alarm.hour, alarm.minute);
        self.arm_daily(alarm, medication_name, due)
    }

    /// Cancel the daily request of an alarm. Idempotent.
    pub fn cancel(&self, alarm_id: i64) {
        self.timer.cancel(TimerKey::Daily(alarm_id));
        debug!(alarm_id, "daily alarm cancelled");
    }

    /// Arm a snooze wake-up `delay_minutes` from now.
    pub fn schedule_snooze(&self, request: SnoozeRequest) -> ScheduleOutcome {
        let key = TimerKey::Snooze(request.alarm_id);
        let due = self.clock.now() + Duration::minutes(i64::from(request.delay_minutes));
        let payload = FirePayload {
            alarm_id: request.alarm_id,
            medication_id: request.medication_id,
            medication_name: request.medication_name,
            hour: request.original_hour,
            minute: request.original_minute,
            snooze_count: request.snooze_count,
            is_snooze: true,
        };
        let outcome = self.arm(key, Ok(due), payload);
        if let ScheduleOutcome::Scheduled { due, .. } = outcome {
            info!(
                alarm_id = request.alarm_id,
                snooze_count = request.snooze_count,
                due = %due,
                "snooze scheduled"
            );
        }
        outcome
    }

    /// Cancel the snooze request of an alarm. Idempotent.
    pub fn cancel_snooze(&self, alarm_id: i64) {
        self.timer.cancel(TimerKey::Snooze(alarm_id));
        debug!(alarm_id, "snooze cancelled");
    }

    fn arm_daily(
        &self,
        alarm: &AlarmSchedule,
        medication_name: &str,
        due: Result<DateTime<Local>>,
    ) -> ScheduleOutcome {
        let payload = FirePayload {
            alarm_id: alarm.id,
            medication_id: alarm.medication_id,
            medication_name: medication_name.to_owned(),
            hour: alarm.hour,
            minute: alarm.minute,
            snooze_count: 0,
            is_snooze: false,
        };
        let outcome = self.arm(TimerKey::Daily(alarm.id), due, payload);
        if let ScheduleOutcome::Scheduled { due, .. } = outcome {
            info!(alarm_id = alarm.id, medication = medication_name, due = %due, "alarm scheduled");
        }
        outcome
    }

    fn arm(
        &self,
        key: TimerKey,
        due: Result<DateTime<Local>>,
        payload: FirePayload,
    ) -> ScheduleOutcome {
        if !self.timer.can_schedule_exact_wake() {
            warn!(%key, "exact wake permission missing; reminder not armed");
            return ScheduleOutcome::PermissionDenied;
        }

        let due = match due {
            Ok(due) => due,
            Err(err) => {
                error!(%key, error = %err, "could not compute fire time");
                return ScheduleOutcome::Failed;
            }
        };

        match self.timer.request_wake(key, due, payload) {
            Ok(()) => ScheduleOutcome::Scheduled { key, due },
            Err(err) => {
                error!(%key, error = %err, "wake request rejected");
                ScheduleOutcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicBool, Ordering};

    use chrono::TimeZone;
    use medalarm_domain::MedAlarmError;
    use parking_lot::Mutex;

    use super::*;
    use crate::clock::MockClock;

    #[derive(Default)]
    struct MapTimer {
        pending: Mutex<HashMap<TimerKey, (DateTime<Local>, FirePayload)>>,
        denied: AtomicBool,
        reject: AtomicBool,
    }

    impl WakeTimer for MapTimer {
        fn can_schedule_exact_wake(&self) -> bool {
            !self.denied.load(Ordering::SeqCst)
        }

        fn request_wake(
            &self,
            key: TimerKey,
            due: DateTime<Local>,
            payload: FirePayload,
        ) -> Result<()> {
            if self.reject.load(Ordering::SeqCst) {
                return Err(MedAlarmError::Platform("timer service unavailable".into()));
            }
            self.pending.lock().insert(key, (due, payload));
            Ok(())
        }

        fn cancel(&self, key: TimerKey) {
            self.pending.lock().remove(&key);
        }
    }

    fn at(h: u32, m: u32) -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 6, 10, h, m, 0).single().expect("valid local time")
    }

    fn alarm(id: i64, hour: u8, minute: u8, enabled: bool) -> AlarmSchedule {
        AlarmSchedule { id, medication_id: 1, hour, minute, enabled }
    }

    fn setup(now: DateTime<Local>) -> (AlarmScheduler, Arc<MapTimer>) {
        let timer = Arc::new(MapTimer::default());
        let scheduler = AlarmScheduler::new(timer.clone(), Arc::new(MockClock::new(now)));
        (scheduler, timer)
    }

    #[test]
    fn schedule_arms_daily_key_with_slot_payload() {
        let (scheduler, timer) = setup(at(7, 0));

        let outcome = scheduler.schedule(&alarm(3, 8, 0, true), "Aspirin");

        assert_eq!(outcome, ScheduleOutcome::Scheduled { key: TimerKey::Daily(3), due: at(8, 0) });
        let pending = timer.pending.lock();
        let (_, payload) = pending.get(&TimerKey::Daily(3)).expect("daily request armed");
        assert_eq!(payload.medication_name, "Aspirin");
        assert_eq!((payload.hour, payload.minute), (8, 0));
        assert!(!payload.is_snooze);
        assert_eq!(payload.snooze_count, 0);
    }

    #[test]
    fn rescheduling_replaces_the_previous_request() {
        let (scheduler, timer) = setup(at(7, 0));

        scheduler.schedule(&alarm(3, 8, 0, true), "Aspirin");
        scheduler.schedule(&alarm(3, 9, 30, true), "Aspirin");

        let pending = timer.pending.lock();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[&TimerKey::Daily(3)].0, at(9, 30));
    }

    #[test]
    fn disabled_alarm_is_not_armed() {
        let (scheduler, timer) = setup(at(7, 0));

        let outcome = scheduler.schedule(&alarm(3, 8, 0, false), "Aspirin");

        assert_eq!(outcome, ScheduleOutcome::Disabled);
        assert!(timer.pending.lock().is_empty());
    }

    #[test]
    fn missing_permission_degrades_to_no_op() {
        let (scheduler, timer) = setup(at(7, 0));
        timer.denied.store(true, Ordering::SeqCst);

        assert_eq!(
            scheduler.schedule(&alarm(3, 8, 0, true), "Aspirin"),
            ScheduleOutcome::PermissionDenied
        );
        assert!(timer.pending.lock().is_empty());
    }

    #[test]
    fn rejected_request_is_reported_not_raised() {
        let (scheduler, timer) = setup(at(7, 0));
        timer.reject.store(true, Ordering::SeqCst);

        assert_eq!(scheduler.schedule(&alarm(3, 8, 0, true), "Aspirin"), ScheduleOutcome::Failed);
    }

    #[test]
    fn rearm_after_firing_moves_to_the_next_day() {
        let (scheduler, _timer) = setup(at(8, 3));

        let outcome = scheduler.schedule_next_occurrence(&alarm(3, 8, 0, true), "Aspirin");

        let tomorrow = Local.with_ymd_and_hms(2024, 6, 11, 8, 0, 0).single().expect("valid");
        assert_eq!(outcome, ScheduleOutcome::Scheduled { key: TimerKey::Daily(3), due: tomorrow });
    }

    #[test]
    fn rearm_after_midnight_keeps_the_following_day() {
        let resolved = Local.with_ymd_and_hms(2024, 6, 11, 0, 20, 0).single().expect("valid");
        let (scheduler, _timer) = setup(resolved);

        let outcome = scheduler.schedule_next_occurrence(&alarm(3, 23, 59, true), "Aspirin");

        let due = Local.with_ymd_and_hms(2024, 6, 11, 23, 59, 0).single().expect("valid");
        assert_eq!(outcome, ScheduleOutcome::Scheduled { key: TimerKey::Daily(3), due });
    }

    #[test]
    fn snooze_uses_its_own_namespace() {
        let (scheduler, timer) = setup(at(8, 0));
        scheduler.schedule(&alarm(3, 8, 30, true), "Aspirin");

        let outcome = scheduler.schedule_snooze(SnoozeRequest {
            alarm_id: 3,
            medication_id: 1,
            medication_name: "Aspirin".into(),
            original_hour: 8,
            original_minute: 0,
            delay_minutes: 5,
            snooze_count: 1,
        });

        assert_eq!(outcome, ScheduleOutcome::Scheduled { key: TimerKey::Snooze(3), due: at(8, 5) });
        let pending = timer.pending.lock();
        assert_eq!(pending.len(), 2, "daily and snooze requests coexist");
        let (_, payload) = &pending[&TimerKey::Snooze(3)];
        assert!(payload.is_snooze);
        assert_eq!(payload.snooze_count, 1);
        assert_eq!((payload.hour, payload.minute), (8, 0));
    }

    #[test]
    fn cancel_is_idempotent() {
        let (scheduler, timer) = setup(at(7, 0));
        scheduler.schedule(&alarm(3, 8, 0, true), "Aspirin");

        scheduler.cancel(3);
        scheduler.cancel(3);
        scheduler.cancel(99);
        scheduler.cancel_snooze(3);

        assert!(timer.pending.lock().is_empty());
    }
}
