//! SQLite-backed implementation of the `DoseRecordStore` port.
//!
//! Every successful write bumps a revision on a `watch` channel so history
//! observers can re-query without polling.

use std::sync::Arc;

use async_trait::async_trait;
use medalarm_core::DoseRecordStore;
use medalarm_domain::{DoseHistory, DoseStatus, NewDoseRecord, Result as DomainResult};
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Params, Row};
use tokio::sync::watch;
use tokio::task;
use tracing::debug;

use super::manager::{map_sql_error, DbManager};
use super::pool::SqliteConnection;
use crate::errors::map_join_error;

const SELECT_DOSES: &str = "SELECT id, medication_id, medication_name, scheduled_hour, \
     scheduled_minute, recorded_at, status, snoozed_until FROM dose_history";

/// Dose history repository on the shared `DbManager` pool.
pub struct SqlCipherDoseRepository {
    db: Arc<DbManager>,
    changes: watch::Sender<u64>,
}

impl SqlCipherDoseRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        let (changes, _) = watch::channel(0);
        Self { db, changes }
    }

    fn notify(&self) {
        self.changes.send_modify(|revision| *revision = revision.wrapping_add(1));
        debug!(revision = *self.changes.borrow(), "dose history changed");
    }

    async fn read<T, F>(&self, query: F) -> DomainResult<T>
    where
        T: Send + 'static,
        F: FnOnce(&SqliteConnection) -> DomainResult<T> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        task::spawn_blocking(move || {
            let conn = db.get_connection()?;
            query(&conn)
        })
        .await
        .map_err(map_join_error)?
    }
}

#[async_trait]
impl DoseRecordStore for SqlCipherDoseRepository {
    async fn insert(&self, record: NewDoseRecord) -> DomainResult<i64> {
        let id = self
            .read(move |conn| {
                conn.execute(
                    "INSERT INTO dose_history (medication_id, medication_name, scheduled_hour, \
                     scheduled_minute, recorded_at, status, snoozed_until) \
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        record.medication_id,
                        record.medication_name,
                        record.scheduled_hour,
                        record.scheduled_minute,
                        record.recorded_at,
                        record.status.as_str(),
                        record.snoozed_until
                    ],
                )
                .map_err(map_sql_error)?;
                Ok(conn.last_insert_rowid())
            })
            .await?;
        self.notify();
        Ok(id)
    }

    async fn get_by_id(&self, id: i64) -> DomainResult<Option<DoseHistory>> {
        self.read(move |conn| {
            conn.query_row(&format!("{SELECT_DOSES} WHERE id = ?1"), params![id], map_dose_row)
                .optional()
                .map_err(map_sql_error)
        })
        .await
    }

    async fn update_status(
        &self,
        id: i64,
        status: DoseStatus,
        recorded_at: i64,
    ) -> DomainResult<bool> {
        let updated = self
            .read(move |conn| {
                conn.execute(
                    "UPDATE dose_history SET status = ?2, recorded_at = ?3 WHERE id = ?1",
                    params![id, status.as_str(), recorded_at],
                )
                .map(|changed| changed > 0)
                .map_err(map_sql_error)
            })
            .await?;
        if updated {
            self.notify();
        }
        Ok(updated)
    }

    async fn confirm_snoozed(&self, id: i64, now_ms: i64) -> DomainResult<bool> {
        let updated = self
            .read(move |conn| {
                conn.execute(
                    "UPDATE dose_history SET status = 'TAKEN', recorded_at = ?2 \
                     WHERE id = ?1 AND status = 'SNOOZED' AND snoozed_until > ?2",
                    params![id, now_ms],
                )
                .map(|changed| changed == 1)
                .map_err(map_sql_error)
            })
            .await?;
        if updated {
            self.notify();
        }
        Ok(updated)
    }

    async fn get_pending_snoozes(&self, now_ms: i64) -> DomainResult<Vec<DoseHistory>> {
        self.read(move |conn| {
            query_doses(
                conn,
                &format!(
                    "{SELECT_DOSES} WHERE status = 'SNOOZED' AND snoozed_until > ?1 \
                     ORDER BY snoozed_until, id"
                ),
                params![now_ms],
            )
        })
        .await
    }

    async fn get_all(&self) -> DomainResult<Vec<DoseHistory>> {
        self.read(|conn| {
            query_doses(conn, &format!("{SELECT_DOSES} ORDER BY recorded_at DESC, id DESC"), [])
        })
        .await
    }

    async fn get_by_medication(&self, medication_id: i64) -> DomainResult<Vec<DoseHistory>> {
        self.read(move |conn| {
            query_doses(
                conn,
                &format!(
                    "{SELECT_DOSES} WHERE medication_id = ?1 ORDER BY recorded_at DESC, id DESC"
                ),
                params![medication_id],
            )
        })
        .await
    }

    async fn get_by_date_range(&self, start_ms: i64, end_ms: i64) -> DomainResult<Vec<DoseHistory>> {
        self.read(move |conn| {
            query_doses(
                conn,
                &format!(
                    "{SELECT_DOSES} WHERE recorded_at >= ?1 AND recorded_at < ?2 \
                     ORDER BY recorded_at DESC, id DESC"
                ),
                params![start_ms, end_ms],
            )
        })
        .await
    }

    async fn count_taken_since(&self, since_ms: i64) -> DomainResult<i64> {
        self.read(move |conn| {
            conn.query_row(
                "SELECT COUNT(*) FROM dose_history WHERE status = 'TAKEN' AND recorded_at >= ?1",
                params![since_ms],
                |row| row.get(0),
            )
            .map_err(map_sql_error)
        })
        .await
    }

    async fn delete_all(&self) -> DomainResult<usize> {
        let removed = self
            .read(|conn| conn.execute("DELETE FROM dose_history", []).map_err(map_sql_error))
            .await?;
        self.notify();
        Ok(removed)
    }

    fn subscribe_changes(&self) -> watch::Receiver<u64> {
        self.changes.subscribe()
    }
}

fn query_doses<P: Params>(
    conn: &SqliteConnection,
    sql: &str,
    params: P,
) -> DomainResult<Vec<DoseHistory>> {
    let mut stmt = conn.prepare(sql).map_err(map_sql_error)?;
    let rows = stmt
        .query_map(params, map_dose_row)
        .map_err(map_sql_error)?
        .collect::<rusqlite::Result<Vec<_>>>()
        .map_err(map_sql_error)?;
    Ok(rows)
}

fn map_dose_row(row: &Row<'_>) -> rusqlite::Result<DoseHistory> {
    let status: String = row.get(6)?;
    let status = status
        .parse::<DoseStatus>()
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(6, Type::Text, err.into()))?;

    Ok(DoseHistory {
        id: row.get(0)?,
        medication_id: row.get(1)?,
        medication_name: row.get(2)?,
        scheduled_hour: row.get(3)?,
        scheduled_minute: row.get(4)?,
        recorded_at: row.get(5)?,
        status,
        snoozed_until: row.get(7)?,
    })
}
