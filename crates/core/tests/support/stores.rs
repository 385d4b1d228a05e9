//! In-memory implementation of every storage port.
//!
//! A single state behind one mutex so medication deletes can cascade to
//! alarms the way the SQLite schema does.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use medalarm_core::{DoseRecordStore, MedicationStore, ScheduleStore};
use medalarm_domain::{
    AlarmSchedule, DoseHistory, DoseStatus, MedAlarmError, Medication, NewDoseRecord,
    NewMedication, Result, TimeOfDay,
};
use parking_lot::Mutex;
use tokio::sync::watch;

use super::doubles::EventLog;

#[derive(Default)]
struct State {
    next_id: i64,
    medications: Vec<Medication>,
    alarms: Vec<AlarmSchedule>,
    doses: Vec<DoseHistory>,
}

impl State {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

pub struct InMemoryDb {
    state: Mutex<State>,
    log: EventLog,
    changes: watch::Sender<u64>,
    fail_dose_writes: AtomicBool,
    fail_alarm_reads: AtomicBool,
}

impl InMemoryDb {
    pub fn new(log: EventLog) -> Self {
        let (changes, _) = watch::channel(0);
        Self {
            state: Mutex::new(State::default()),
            log,
            changes,
            fail_dose_writes: AtomicBool::new(false),
            fail_alarm_reads: AtomicBool::new(false),
        }
    }

    pub fn fail_dose_writes(&self, fail: bool) {
        self.fail_dose_writes.store(fail, Ordering::SeqCst);
    }

    pub fn fail_alarm_reads(&self, fail: bool) {
        self.fail_alarm_reads.store(fail, Ordering::SeqCst);
    }

    /// Seed a medication without going through the port.
    pub fn seed_medication(&self, name: &str) -> Medication {
        let mut state = self.state.lock();
        let medication = Medication {
            id: state.next_id(),
            name: name.into(),
            dosage: "1 tablet".into(),
            notes: String::new(),
            active: true,
        };
        state.medications.push(medication.clone());
        medication
    }

    pub fn seed_alarm(&self, medication_id: i64, hour: u8, minute: u8, enabled: bool) -> AlarmSchedule {
        let mut state = self.state.lock();
        let alarm = AlarmSchedule { id: state.next_id(), medication_id, hour, minute, enabled };
        state.alarms.push(alarm.clone());
        alarm
    }

    pub fn seed_dose(&self, record: NewDoseRecord) -> DoseHistory {
        let mut state = self.state.lock();
        let dose = record.into_history(state.next_id());
        state.doses.push(dose.clone());
        dose
    }

    pub fn doses(&self) -> Vec<DoseHistory> {
        self.state.lock().doses.clone()
    }

    pub fn alarm_rows(&self) -> Vec<AlarmSchedule> {
        self.state.lock().alarms.clone()
    }

    fn bump(&self) {
        self.changes.send_modify(|revision| *revision += 1);
    }

    fn check_dose_writes(&self) -> Result<()> {
        if self.fail_dose_writes.load(Ordering::SeqCst) {
            return Err(MedAlarmError::Database("disk I/O error".into()));
        }
        Ok(())
    }

    fn check_alarm_reads(&self) -> Result<()> {
        if self.fail_alarm_reads.load(Ordering::SeqCst) {
            return Err(MedAlarmError::Database("database is locked".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl MedicationStore for InMemoryDb {
    async fn insert(&self, medication: NewMedication) -> Result<Medication> {
        let mut state = self.state.lock();
        let stored = Medication {
            id: state.next_id(),
            name: medication.name,
            dosage: medication.dosage,
            notes: medication.notes,
            active: true,
        };
        state.medications.push(stored.clone());
        Ok(stored)
    }

    async fn update(&self, medication: &Medication) -> Result<()> {
        let mut state = self.state.lock();
        let row = state
            .medications
            .iter_mut()
            .find(|row| row.id == medication.id)
            .ok_or_else(|| MedAlarmError::NotFound(format!("medication {}", medication.id)))?;
        *row = medication.clone();
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut state = self.state.lock();
        let before = state.medications.len();
        state.medications.retain(|row| row.id != id);
        state.alarms.retain(|alarm| alarm.medication_id != id);
        Ok(state.medications.len() != before)
    }

    async fn get_all(&self) -> Result<Vec<Medication>> {
        let mut all = self.state.lock().medications.clone();
        all.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(all)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Medication>> {
        Ok(self.state.lock().medications.iter().find(|row| row.id == id).cloned())
    }
}

#[async_trait]
impl ScheduleStore for InMemoryDb {
    async fn insert(&self, medication_id: i64, time: TimeOfDay, enabled: bool) -> Result<AlarmSchedule> {
        let mut state = self.state.lock();
        let alarm = AlarmSchedule {
            id: state.next_id(),
            medication_id,
            hour: time.hour(),
            minute: time.minute(),
            enabled,
        };
        state.alarms.push(alarm.clone());
        Ok(alarm)
    }

    async fn update(&self, alarm: &AlarmSchedule) -> Result<()> {
        let mut state = self.state.lock();
        let row = state
            .alarms
            .iter_mut()
            .find(|row| row.id == alarm.id)
            .ok_or_else(|| MedAlarmError::NotFound(format!("alarm {}", alarm.id)))?;
        *row = alarm.clone();
        Ok(())
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let mut state = self.state.lock();
        let before = state.alarms.len();
        state.alarms.retain(|row| row.id != id);
        Ok(state.alarms.len() != before)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<AlarmSchedule>> {
        self.check_alarm_reads()?;
        Ok(self.state.lock().alarms.iter().find(|row| row.id == id).cloned())
    }

    async fn get_all_enabled(&self) -> Result<Vec<AlarmSchedule>> {
        self.check_alarm_reads()?;
        Ok(self.state.lock().alarms.iter().filter(|row| row.enabled).cloned().collect())
    }

    async fn get_by_medication(&self, medication_id: i64) -> Result<Vec<AlarmSchedule>> {
        self.check_alarm_reads()?;
        let mut alarms: Vec<_> = self
            .state
            .lock()
            .alarms
            .iter()
            .filter(|row| row.medication_id == medication_id)
            .cloned()
            .collect();
        alarms.sort_by_key(|alarm| (alarm.hour, alarm.minute));
        Ok(alarms)
    }

    async fn delete_by_medication(&self, medication_id: i64) -> Result<usize> {
        let mut state = self.state.lock();
        let before = state.alarms.len();
        state.alarms.retain(|row| row.medication_id != medication_id);
        Ok(before - state.alarms.len())
    }
}

#[async_trait]
impl DoseRecordStore for InMemoryDb {
    async fn insert(&self, record: NewDoseRecord) -> Result<i64> {
        self.log.push(format!("insert {}", record.status));
        self.check_dose_writes()?;
        let id = {
            let mut state = self.state.lock();
            let id = state.next_id();
            state.doses.push(record.into_history(id));
            id
        };
        self.bump();
        Ok(id)
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<DoseHistory>> {
        Ok(self.state.lock().doses.iter().find(|row| row.id == id).cloned())
    }

    async fn update_status(&self, id: i64, status: DoseStatus, recorded_at: i64) -> Result<bool> {
        self.check_dose_writes()?;
        let updated = {
            let mut state = self.state.lock();
            match state.doses.iter_mut().find(|row| row.id == id) {
                Some(row) => {
                    row.status = status;
                    row.recorded_at = recorded_at;
                    true
                }
                None => false,
            }
        };
        if updated {
            self.bump();
        }
        Ok(updated)
    }

    async fn confirm_snoozed(&self, id: i64, now_ms: i64) -> Result<bool> {
        self.check_dose_writes()?;
        let updated = {
            let mut state = self.state.lock();
            match state.doses.iter_mut().find(|row| row.id == id && row.is_pending_snooze(now_ms)) {
                Some(row) => {
                    row.status = DoseStatus::Taken;
                    row.recorded_at = now_ms;
                    true
                }
                None => false,
            }
        };
        if updated {
            self.bump();
        }
        Ok(updated)
    }

    async fn get_pending_snoozes(&self, now_ms: i64) -> Result<Vec<DoseHistory>> {
        let mut pending: Vec<_> =
            self.state.lock().doses.iter().filter(|row| row.is_pending_snooze(now_ms)).cloned().collect();
        pending.sort_by_key(|row| row.snoozed_until);
        Ok(pending)
    }

    async fn get_all(&self) -> Result<Vec<DoseHistory>> {
        let mut all = self.state.lock().doses.clone();
        all.sort_by_key(|row| std::cmp::Reverse(row.recorded_at));
        Ok(all)
    }

    async fn get_by_medication(&self, medication_id: i64) -> Result<Vec<DoseHistory>> {
        let mut rows: Vec<_> = self
            .state
            .lock()
            .doses
            .iter()
            .filter(|row| row.medication_id == medication_id)
            .cloned()
            .collect();
        rows.sort_by_key(|row| std::cmp::Reverse(row.recorded_at));
        Ok(rows)
    }

    async fn get_by_date_range(&self, start_ms: i64, end_ms: i64) -> Result<Vec<DoseHistory>> {
        let mut rows: Vec<_> = self
            .state
            .lock()
            .doses
            .iter()
            .filter(|row| row.recorded_at >= start_ms && row.recorded_at < end_ms)
            .cloned()
            .collect();
        rows.sort_by_key(|row| std::cmp::Reverse(row.recorded_at));
        Ok(rows)
    }

    async fn count_taken_since(&self, since_ms: i64) -> Result<i64> {
        let count = self
            .state
            .lock()
            .doses
            .iter()
            .filter(|row| row.status == DoseStatus::Taken && row.recorded_at >= since_ms)
            .count();
        Ok(i64::try_from(count).unwrap_or(i64::MAX))
    }

    async fn delete_all(&self) -> Result<usize> {
        let removed = {
            let mut state = self.state.lock();
            let removed = state.doses.len();
            state.doses.clear();
            removed
        };
        self.bump();
        Ok(removed)
    }

    fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}
