//! Alarm management service

use std::sync::Arc;

use medalarm_domain::{
    AlarmSchedule, MedAlarmError, Medication, NewMedication, Result, TimeOfDay,
};
use tracing::{info, instrument};

use crate::scheduling::AlarmScheduler;
use crate::storage_ports::{MedicationStore, ScheduleStore};

/// Create, edit and delete medications and their alarms.
pub struct AlarmService {
    medications: Arc<dyn MedicationStore>,
    schedules: Arc<dyn ScheduleStore>,
    scheduler: Arc<AlarmScheduler>,
}

impl AlarmService {
    pub fn new(
        medications: Arc<dyn MedicationStore>,
        schedules: Arc<dyn ScheduleStore>,
        scheduler: Arc<AlarmScheduler>,
    ) -> Self {
        Self { medications, schedules, scheduler }
    }

    #[instrument(skip(self, medication), fields(name = %medication.name))]
    pub async fn add_medication(&self, medication: NewMedication) -> Result<Medication> {
        medication.validate()?;
        let stored = self.medications.insert(medication).await?;
        info!(medication_id = stored.id, "medication added");
        Ok(stored)
    }

    /// All medications ordered by name.
    pub async fn medications(&self) -> Result<Vec<Medication>> {
        self.medications.get_all().await
    }

    /// Update a medication and re-arm its enabled alarms so future reminders
    /// carry the new name.
    pub async fn update_medication(&self, medication: Medication) -> Result<()> {
        if medication.name.trim().is_empty() {
            return Err(MedAlarmError::InvalidInput("medication name must not be empty".into()));
        }
        self.require_medication(medication.id).await?;
        self.medications.update(&medication).await?;
        for alarm in self.schedules.get_by_medication(medication.id).await? {
            self.scheduler.schedule(&alarm, &medication.name);
        }
        Ok(())
    }

    /// Delete a medication after cancelling every wake request of its alarms.
    #[instrument(skip(self))]
    pub async fn delete_medication(&self, medication_id: i64) -> Result<()> {
        self.require_medication(medication_id).await?;
        for alarm in self.schedules.get_by_medication(medication_id).await? {
            self.scheduler.cancel(alarm.id);
            self.scheduler.cancel_snooze(alarm.id);
        }
        self.medications.delete(medication_id).await?;
        info!(medication_id, "medication deleted");
        Ok(())
    }

    /// Add an enabled daily alarm and arm it.
    #[instrument(skip(self), fields(time = %time))]
    pub async fn add_alarm(&self, medication_id: i64, time: TimeOfDay) -> Result<AlarmSchedule> {
        let medication = self.require_medication(medication_id).await?;
        let alarm = self.schedules.insert(medication_id, time, true).await?;
        self.scheduler.schedule(&alarm, &medication.name);
        info!(alarm_id = alarm.id, "alarm added");
        Ok(alarm)
    }

    /// Alarms of a medication ordered by time of day.
    pub async fn alarms_for(&self, medication_id: i64) -> Result<Vec<AlarmSchedule>> {
        self.schedules.get_by_medication(medication_id).await
    }

    /// Persist the enabled flag, then arm or cancel the daily request.
    #[instrument(skip(self))]
    pub async fn set_alarm_enabled(&self, alarm_id: i64, enabled: bool) -> Result<AlarmSchedule> {
        let mut alarm = self.require_alarm(alarm_id).await?;
        alarm.enabled = enabled;
        self.schedules.update(&alarm).await?;

        if enabled {
            let name = self.medication_name(alarm.medication_id).await?;
            self.scheduler.schedule(&alarm, &name);
        } else {
            self.scheduler.cancel(alarm.id);
        }
        Ok(alarm)
    }

    /// Delete an alarm and cancel its daily and snooze requests.
    #[instrument(skip(self))]
    pub async fn delete_alarm(&self, alarm_id: i64) -> Result<()> {
        let alarm = self.require_alarm(alarm_id).await?;
        self.schedules.delete(alarm.id).await?;
        self.scheduler.cancel(alarm.id);
        self.scheduler.cancel_snooze(alarm.id);
        info!(alarm_id, "alarm deleted");
        Ok(())
    }

    async fn require_medication(&self, medication_id: i64) -> Result<Medication> {
        self.medications
            .get_by_id(medication_id)
            .await?
            .ok_or_else(|| MedAlarmError::NotFound(format!("medication {medication_id}")))
    }

    async fn require_alarm(&self, alarm_id: i64) -> Result<AlarmSchedule> {
        self.schedules
            .get_by_id(alarm_id)
            .await?
            .ok_or_else(|| MedAlarmError::NotFound(format!("alarm {alarm_id}")))
    }

    async fn medication_name(&self, medication_id: i64) -> Result<String> {
        Ok(self.require_medication(medication_id).await?.name)
    }
}
