//! Configuration loader
//!
//! `load` reads the environment when `MEDALARM_DB_PATH` is set and a config
//! file otherwise. A source that is present but invalid is an error.
//!
//! ## Environment Variables
//! - `MEDALARM_DB_PATH` (required): database file path
//! - `MEDALARM_DB_POOL_SIZE`: connection pool size
//! - `MEDALARM_DB_ENCRYPTION_KEY`: SQLCipher key, unset for a plain database
//! - `MEDALARM_SNOOZE_MINUTES`: delay of one snooze
//! - `MEDALARM_MAX_SNOOZES`: snoozes allowed per occurrence
//! - `MEDALARM_MISSED_TIMEOUT_SECS`: seconds before an unanswered alarm is missed
//! - `MEDALARM_LOG_LEVEL`: default log filter
//! - `MEDALARM_LOG_JSON`: JSON log lines (true/false)
//!
//! ## File Locations
//! `config.{json,toml}` and `medalarm.{json,toml}` in the working directory,
//! its two parents, and the same set relative to the executable.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use medalarm_domain::{Config, DatabaseConfig, LoggingConfig, MedAlarmError, ReminderPolicy, Result};

const FILE_NAMES: [&str; 4] = ["config.json", "config.toml", "medalarm.json", "medalarm.toml"];

/// Load configuration, environment first, then the first config file found.
///
/// Returns `Ok(None)` only when neither `MEDALARM_DB_PATH` nor a config file
/// exists. Malformed variables or an unreadable file are errors.
pub fn load() -> Result<Option<Config>> {
    if std::env::var_os("MEDALARM_DB_PATH").is_some() {
        let config = load_from_env()?;
        tracing::info!("Configuration loaded from environment variables");
        return Ok(Some(config));
    }

    match probe_config_paths() {
        Some(path) => load_from_file(Some(path)).map(Some),
        None => {
            tracing::debug!("MEDALARM_DB_PATH unset and no config file found");
            Ok(None)
        }
    }
}

/// Load configuration from `MEDALARM_*` environment variables.
///
/// Only `MEDALARM_DB_PATH` is required; everything else falls back to the
/// defaults of the domain config types. A value that is set but does not
/// parse is an error rather than a silent default.
pub fn load_from_env() -> Result<Config> {
    let db_defaults = DatabaseConfig::default();
    let reminder_defaults = ReminderPolicy::default();
    let logging_defaults = LoggingConfig::default();

    let database = DatabaseConfig {
        path: env_var("MEDALARM_DB_PATH")?,
        pool_size: env_parse("MEDALARM_DB_POOL_SIZE", db_defaults.pool_size)?,
        encryption_key: std::env::var("MEDALARM_DB_ENCRYPTION_KEY").ok().filter(|k| !k.is_empty()),
    };

    let reminders = ReminderPolicy {
        snooze_minutes: env_parse("MEDALARM_SNOOZE_MINUTES", reminder_defaults.snooze_minutes)?,
        max_snoozes: env_parse("MEDALARM_MAX_SNOOZES", reminder_defaults.max_snoozes)?,
        missed_timeout_secs: env_parse(
            "MEDALARM_MISSED_TIMEOUT_SECS",
            reminder_defaults.missed_timeout_secs,
        )?,
    };

    let logging = LoggingConfig {
        level: std::env::var("MEDALARM_LOG_LEVEL").unwrap_or(logging_defaults.level),
        json: env_bool("MEDALARM_LOG_JSON", logging_defaults.json),
    };

    Ok(Config { database, reminders, logging })
}

/// Load configuration from a file, probing the standard locations when
/// `path` is `None`. Format follows the extension.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(MedAlarmError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            MedAlarmError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| MedAlarmError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("json");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| MedAlarmError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| MedAlarmError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(MedAlarmError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// First existing config file among the standard locations.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut roots = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        roots.push(cwd);
    }
    if let Some(exe_dir) =
        std::env::current_exe().ok().and_then(|exe| exe.parent().map(Path::to_path_buf))
    {
        roots.push(exe_dir);
    }

    roots
        .iter()
        .flat_map(|root| [root.clone(), root.join(".."), root.join("../..")])
        .flat_map(|dir| FILE_NAMES.iter().map(move |name| dir.join(name)))
        .find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key).map_err(|_| {
        MedAlarmError::Config(format!("Missing required environment variable: {key}"))
    })
}

fn env_parse<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| MedAlarmError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

/// Accepts `1`/`true`/`yes`/`on` (case-insensitive); anything else is false.
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
