//! SQLite / SQLCipher connection pool
//!
//! r2d2 pool whose connections are keyed (when a key is configured) and get
//! the per-connection pragmas applied before first use.

use std::path::Path;
use std::time::Duration;

use medalarm_domain::{MedAlarmError, Result as DomainResult};
use r2d2::{Pool, PooledConnection};
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::Connection;
use tracing::{info, instrument, warn};

use crate::errors::InfraError;

/// Pooled connection handed out by [`SqlitePool`].
pub type SqliteConnection = PooledConnection<SqliteConnectionManager>;

/// r2d2 pool of SQLite connections.
pub type SqlitePool = Pool<SqliteConnectionManager>;

/// Pool configuration
#[derive(Debug, Clone)]
pub struct PoolConfig {
    /// Maximum number of connections in the pool
    pub max_size: u32,

    /// Connection timeout
    pub connection_timeout: Duration,

    /// Busy timeout for SQLite operations
    pub busy_timeout: Duration,

    /// Enable WAL journal mode
    pub enable_wal: bool,

    /// Enable foreign key constraints
    pub enable_foreign_keys: bool,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: 10,
            connection_timeout: Duration::from_secs(5),
            busy_timeout: Duration::from_millis(5000),
            enable_wal: true,
            enable_foreign_keys: true,
        }
    }
}

/// Apply connection-level pragmas.
///
/// Runs for every new pooled connection, after the SQLCipher key.
pub fn apply_connection_pragmas(conn: &Connection, config: &PoolConfig) -> rusqlite::Result<()> {
    let mut pragma_sql = String::new();

    if config.enable_wal {
        pragma_sql.push_str("PRAGMA journal_mode=WAL;\n");
        pragma_sql.push_str("PRAGMA wal_autocheckpoint=1000;\n");
    }

    pragma_sql.push_str("PRAGMA synchronous=NORMAL;\n");

    if config.enable_foreign_keys {
        pragma_sql.push_str("PRAGMA foreign_keys=ON;\n");
    }

    conn.execute_batch(&pragma_sql)?;
    conn.busy_timeout(config.busy_timeout)?;
    Ok(())
}

/// Build a pool for the database at `path`.
///
/// With `encryption_key` set every connection issues `PRAGMA key` first; a
/// wrong key surfaces here because the pool opens one connection eagerly.
#[instrument(skip_all, fields(db_path = ?path.as_ref(), pool_size = config.max_size))]
pub fn create_pool<P: AsRef<Path>>(
    path: P,
    encryption_key: Option<String>,
    config: PoolConfig,
) -> DomainResult<SqlitePool> {
    let encrypted = encryption_key.is_some();
    let init_config = config.clone();

    let manager = SqliteConnectionManager::file(path.as_ref()).with_init(move |conn| {
        if let Some(key) = encryption_key.as_deref() {
            conn.pragma_update(None, "key", key)?;
        }
        apply_connection_pragmas(conn, &init_config)
    });

    let pool = Pool::builder()
        .max_size(config.max_size)
        .connection_timeout(config.connection_timeout)
        .build(manager)
        .map_err(|err| {
            warn!(error = %err, "failed to create connection pool");
            MedAlarmError::from(InfraError::from(err))
        })?;

    // Touch the schema so a wrong key fails now rather than on first query.
    {
        let conn = pool.get().map_err(|err| MedAlarmError::from(InfraError::from(err)))?;
        conn.query_row("SELECT count(*) FROM sqlite_master", [], |row| row.get::<_, i64>(0))
            .map_err(|err| MedAlarmError::from(InfraError::from(err)))?;
    }

    info!(encrypted, "sqlite pool created with {} connections", config.max_size);
    Ok(pool)
}
