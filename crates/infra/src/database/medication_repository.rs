//! SQLite-backed implementation of the `MedicationStore` port.

use std::sync::Arc;

use async_trait::async_trait;
use medalarm_core::MedicationStore;
use medalarm_domain::{MedAlarmError, Medication, NewMedication, Result as DomainResult};
use rusqlite::{params, OptionalExtension, Row};
use tokio::task;

use super::manager::{map_sql_error, DbManager};
use crate::errors::map_join_error;

const MEDICATION_COLUMNS: &str = "id, name, dosage, notes, active";

/// Medication repository on the shared `DbManager` pool.
pub struct SqlCipherMedicationRepository {
    db: Arc<DbManager>,
}

impl SqlCipherMedicationRepository {
    pub fn new(db: Arc<DbManager>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl MedicationStore for SqlCipherMedicationRepository {
    async fn insert(&self, medication: NewMedication) -> DomainResult<Medication> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Medication> {
            let conn = db.get_connection()?;
            conn.execute(
                "INSERT INTO medications (name, dosage, notes, active) VALUES (?1, ?2, ?3, 1)",
                params![medication.name, medication.dosage, medication.notes],
            )
            .map_err(map_sql_error)?;

            Ok(Medication {
                id: conn.last_insert_rowid(),
                name: medication.name,
                dosage: medication.dosage,
                notes: medication.notes,
                active: true,
            })
        })
        .await
        .map_err(map_join_error)?
    }

    async fn update(&self, medication: &Medication) -> DomainResult<()> {
        let db = Arc::clone(&self.db);
        let medication = medication.clone();

        task::spawn_blocking(move || -> DomainResult<()> {
            let conn = db.get_connection()?;
            let changed = conn
                .execute(
                    "UPDATE medications SET name = ?2, dosage = ?3, notes = ?4, active = ?5 WHERE id = ?1",
                    params![
                        medication.id,
                        medication.name,
                        medication.dosage,
                        medication.notes,
                        medication.active
                    ],
                )
                .map_err(map_sql_error)?;
            if changed == 0 {
                return Err(MedAlarmError::NotFound(format!("medication {}", medication.id)));
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
            // alarm_schedules rows go with it through ON DELETE CASCADE
            let changed = conn
                .execute("DELETE FROM medications WHERE id = ?1", params![id])
                .map_err(map_sql_error)?;
            Ok(changed > 0)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn get_all(&self) -> DomainResult<Vec<Medication>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Vec<Medication>> {
            let conn = db.get_connection()?;
            let sql = format!("SELECT {MEDICATION_COLUMNS} FROM medications ORDER BY name, id");
            let mut stmt = conn.prepare(&sql).map_err(map_sql_error)?;
            let rows = stmt
                .query_map([], map_medication_row)
                .map_err(map_sql_error)?
                .collect::<rusqlite::Result<Vec<_>>>()
                .map_err(map_sql_error)?;
            Ok(rows)
        })
        .await
        .map_err(map_join_error)?
    }

    async fn get_by_id(&self, id: i64) -> DomainResult<Option<Medication>> {
        let db = Arc::clone(&self.db);

        task::spawn_blocking(move || -> DomainResult<Option<Medication>> {
            let conn = db.get_connection()?;
            let sql = format!("SELECT {MEDICATION_COLUMNS} FROM medications WHERE id = ?1");
            conn.query_row(&sql, params![id], map_medication_row)
                .optional()
                .map_err(map_sql_error)
        })
        .await
        .map_err(map_join_error)?
    }
}

fn map_medication_row(row: &Row<'_>) -> rusqlite::Result<Medication> {
    Ok(Medication {
        id: row.get(0)?,
        name: row.get(1)?,
        dosage: row.get(2)?,
        notes: row.get(3)?,
        active: row.get(4)?,
    })
}
