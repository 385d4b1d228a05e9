//! Shared fixtures for infra integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone};
use medalarm_domain::{DoseStatus, NewDoseRecord};
use medalarm_infra::database::{
    DbManager, SqlCipherDoseRepository, SqlCipherMedicationRepository, SqlCipherScheduleRepository,
};
use tempfile::TempDir;

pub const TEST_DB_KEY: &str = "test_key_64_chars_long_aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";

/// Migrated SQLCipher database in a temporary directory, plus its
/// repositories.
pub struct DbHarness {
    pub temp_dir: TempDir,
    pub manager: Arc<DbManager>,
    pub medications: Arc<SqlCipherMedicationRepository>,
    pub schedules: Arc<SqlCipherScheduleRepository>,
    pub doses: Arc<SqlCipherDoseRepository>,
}

impl DbHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("temporary directory should be created");
        let db_path = temp_dir.path().join("medalarm-integration.db");

        let manager = Arc::new(
            DbManager::new(&db_path, 4, Some(TEST_DB_KEY))
                .expect("database manager should initialise"),
        );
        manager.run_migrations().expect("schema migrations should apply");

        Self {
            temp_dir,
            medications: Arc::new(SqlCipherMedicationRepository::new(Arc::clone(&manager))),
            schedules: Arc::new(SqlCipherScheduleRepository::new(Arc::clone(&manager))),
            doses: Arc::new(SqlCipherDoseRepository::new(Arc::clone(&manager))),
            manager,
        }
    }
}

/// Local wall-clock time on a fixed mid-June day.
pub fn at(hour: u32, minute: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2024, 6, 10, hour, minute, 0).single().expect("unambiguous local time")
}

pub fn tomorrow_at(hour: u32, minute: u32) -> DateTime<Local> {
    Local.with_ymd_and_hms(2024, 6, 11, hour, minute, 0).single().expect("unambiguous local time")
}

pub fn dose(
    medication_id: i64,
    status: DoseStatus,
    recorded_at: DateTime<Local>,
    snoozed_until: Option<DateTime<Local>>,
) -> NewDoseRecord {
    NewDoseRecord {
        medication_id,
        medication_name: "Aspirin".into(),
        scheduled_hour: 8,
        scheduled_minute: 0,
        recorded_at: recorded_at.timestamp_millis(),
        status,
        snoozed_until: snoozed_until.map(|until| until.timestamp_millis()),
    }
}
