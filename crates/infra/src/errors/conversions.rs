//! Conversions from external infrastructure errors into domain errors.

use medalarm_domain::MedAlarmError;
use rusqlite::Error as SqlError;
use tokio::task::JoinError;

/// Error newtype that keeps conversions on the infrastructure side and can be
/// converted back into the domain error.
#[derive(Debug)]
pub struct InfraError(pub MedAlarmError);

impl From<InfraError> for MedAlarmError {
    fn from(value: InfraError) -> Self {
        value.0
    }
}

impl From<MedAlarmError> for InfraError {
    fn from(value: MedAlarmError) -> Self {
        InfraError(value)
    }
}

trait IntoMedAlarmError {
    fn into_medalarm(self) -> MedAlarmError;
}

/* -------------------------------------------------------------------------- */
/* rusqlite::Error → MedAlarmError */
/* -------------------------------------------------------------------------- */

impl IntoMedAlarmError for SqlError {
    fn into_medalarm(self) -> MedAlarmError {
        use rusqlite::ffi::ErrorCode;
        use rusqlite::Error as RE;

        match self {
            RE::SqliteFailure(err, maybe_message) => {
                let message = maybe_message.unwrap_or_default();
                match (err.code, err.extended_code) {
                    (ErrorCode::DatabaseBusy, _) => MedAlarmError::Database("database is busy".into()),
                    (ErrorCode::DatabaseLocked, _) => {
                        MedAlarmError::Database("database is locked".into())
                    }
                    (ErrorCode::ConstraintViolation, 787) => {
                        MedAlarmError::InvalidInput("foreign key constraint violation".into())
                    }
                    (ErrorCode::ConstraintViolation, 275) => {
                        MedAlarmError::InvalidInput("check constraint violation".into())
                    }
                    (ErrorCode::NotADatabase, _) => MedAlarmError::Config(
                        "SQLCipher key rejected or database not encrypted".into(),
                    ),
                    _ => MedAlarmError::Database(format!(
                        "sqlite failure {:?} (code {}): {}",
                        err.code, err.extended_code, message
                    )),
                }
            }
            RE::QueryReturnedNoRows => MedAlarmError::NotFound("no rows returned by query".into()),
            RE::FromSqlConversionFailure(_, _, cause) => {
                MedAlarmError::Database(format!("failed to convert sqlite value: {cause}"))
            }
            RE::InvalidColumnType(_, _, ty) => {
                MedAlarmError::Database(format!("invalid column type: {ty}"))
            }
            RE::InvalidPath(path) => MedAlarmError::Config(format!(
                "invalid database path: {}",
                path.to_string_lossy()
            )),
            other => MedAlarmError::Database(other.to_string()),
        }
    }
}

impl From<SqlError> for InfraError {
    fn from(value: SqlError) -> Self {
        InfraError(value.into_medalarm())
    }
}

/* -------------------------------------------------------------------------- */
/* r2d2::Error → MedAlarmError */
/* -------------------------------------------------------------------------- */

impl IntoMedAlarmError for r2d2::Error {
    fn into_medalarm(self) -> MedAlarmError {
        let message = self.to_string();
        let lower = message.to_ascii_lowercase();
        if lower.contains("not a database") || lower.contains("file is encrypted") {
            MedAlarmError::Config("SQLCipher key rejected or database not encrypted".into())
        } else {
            MedAlarmError::Database(format!("connection pool error: {message}"))
        }
    }
}

impl From<r2d2::Error> for InfraError {
    fn from(value: r2d2::Error) -> Self {
        InfraError(value.into_medalarm())
    }
}

/// Map a `JoinError` from `spawn_blocking` into the domain error.
pub fn map_join_error(err: JoinError) -> MedAlarmError {
    if err.is_cancelled() {
        MedAlarmError::Internal("blocking task cancelled".into())
    } else {
        MedAlarmError::Internal(format!("blocking task failed: {err}"))
    }
}

/* -------------------------------------------------------------------------- */
/* Tests */
/* -------------------------------------------------------------------------- */
