//! SQLite-backed implementation of the `ScheduleStore` port.

use std::sync::Arc;

use async_trait::async_trait;
use medalarm_core::ScheduleStore;
use medalarm_domain::{AlarmSchedule, MedAlarmError, Result as DomainResult, TimeOfDay};
use rusqlite::{params, OptionalExtension, Params, Row};
use tokio::task;

use super::manager::{map_sql_error, DbManager};
use super::pool::SqliteConnection;
use crate::errors::map_join_error;

const SELECT_ALARMS: &str = "SELECT id, medication_id, hour, minute, enabled FROM alarm_schedules";

/// Alarm schedule repository on the shared `DbManager` pool.
pub struct SqlCipherScheduleRepository {
    db: Arc<DbManager>,
}

impl SqlCipherScheduleRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl ScheduleStore for SqlCipherScheduleRepository {
    async fn insert(
        &self,
        medication_id: i64,
        time: TimeOfDay,
        enabled: bool,
    ) -> DomainResult<AlarmSchedule> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<AlarmSchedule> {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO alarm_schedules (medication_id, hour, minute, enabled) VALUES (?1, ?2, ?3, ?4)",
                params![medication_id, time.hour(), time.minute(), enabled],
            )
            .map_err(map_sql_error)?;

            Ok(AlarmSchedule {
                id: conn.last_insert_rowid(),
                medication_id,
                hour: time.hour(),
                minute: time.minute(),
                enabled,
            })
        })
        .await
        .map_err(map_join_error)?
    }

    async fn update(&self, alarm: &AlarmSchedule) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let alarm = alarm.clone();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            let changed = conn
                .execute(
                    "UPDATE alarm_schedules SET medication_id = ?2, hour = ?3, minute = ?4, enabled = ?5 WHERE id = ?1",
                    params![alarm.id, alarm.medication_id, alarm.hour, alarm.minute, alarm.enabled],
                )
                .map_err(map_sql_error)?;
            if changed == 0 {
                return Err(MedAlarmError::NotFound(format!("alarm {}", alarm.id)));
            }
            Ok(())
        })
        .await
        .map_err(map_join_error)?
    }

    async fn delete(&self, id: i64) -> DomainResult<bool> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<bool> {
            let conn = db.get_connection()?;
            let changed = conn
                .execute("DELETE FROM alarm_schedules WHERE id = ?1", params![id])
                .map_err(map_sql_error)?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn get_by_id(&self, id: i64) -> DomainResult<Option<AlarmSchedule>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Option<AlarmSchedule>> {
            let conn = db.get_connection()?;
            conn.query_row(&format!("{SELECT_ALARMS} WHERE id = ?1"), params![id], map_alarm_row)
                .optional()
                .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn get_all_enabled(&self) -> DomainResult<Vec<AlarmSchedule>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Vec<AlarmSchedule>> {
            let conn = db.get_connection()?;
            query_alarms(&conn, &format!("{SELECT_ALARMS} WHERE enabled = 1 ORDER BY id"), [])
        })
        .await
        .map_err(map_join_error)?
    }

    async fn get_by_medication(&self, medication_id: i64) -> DomainResult<Vec<AlarmSchedule>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Vec<AlarmSchedule>> {
            let conn = db.get_connection()?;
            query_alarms(
                &conn,
                &format!("{SELECT_ALARMS} WHERE medication_id = ?1 ORDER BY hour, minute, id"),
                params![medication_id],
            )
        })
        .await
        .map_err(map_join_error)?
    }

    async fn delete_by_medication(&self, medication_id: i64) -> DomainResult<usize> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<usize> {
            let conn = db.get_connection()?;
            conn.execute("DELETE FROM alarm_schedules WHERE medication_id = ?1", params![medication_id])
                .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

fn query_alarms<P: Params>(
    conn: &SqliteConnection,
    sql: &str,
    params: P,
) -> DomainResult<Vec<AlarmSchedule>> {
    let mut stmt = conn.prepare(sql).map_err(map_sql_error)?;
    let rows = stmt
        .query_map(params, map_alarm_row)
        .map_err(map_sql_error)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(map_sql_error)?;
    Ok(rows)
}

fn map_alarm_row(row: &Row<'_>) -> rusqlite::Result<AlarmSchedule> {
    Ok(AlarmSchedule {
        id: row.get(0)?,
        medication_id: row.get(1)?,
        hour: row.get(2)?,
        minute: row.get(3)?,
        enabled: row.get(4)?,
    })
}
