//! Configuration structures
//!
//! Loaded by `medalarm_infra::config::loader` from environment variables or
//! a JSON/TOML file. Every section has defaults so partial files are valid.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{MAX_SNOOZES, MISSED_TIMEOUT_SECS, SNOOZE_MINUTES};

/// Application configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub reminders: ReminderPolicy,
    pub logging: LoggingConfig,
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: String,
    pub pool_size: u32,
    /// SQLCipher key. `None` opens the database unencrypted.
    pub encryption_key: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "medalarm.db".into(), pool_size: 4, encryption_key: None }
    }
}

/// Tunables of the dose lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReminderPolicy {
    pub snooze_minutes: u32,
    pub max_snoozes: u32,
    pub missed_timeout_secs: u64,
}

impl ReminderPolicy {
    pub const fn missed_timeout(&self) -> Duration {
        Duration::from_secs(self.missed_timeout_secs)
    }
}

impl Default for ReminderPolicy {
    fn default() -> Self {
        Self {
            snooze_minutes: SNOOZE_MINUTES,
            max_snoozes: MAX_SNOOZES,
            missed_timeout_secs: MISSED_TIMEOUT_SECS,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive used when `RUST_LOG` is unset.
    pub level: String,
    /// Emit JSON lines instead of human-readable output.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".into(), json: false }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_falls_back_to_defaults() {
        let config: Config = serde_json::from_str(r#"{"reminders": {"max_snoozes": 2}}"#)
            .expect("partial config parses");

        assert_eq!(config.reminders.max_snoozes, 2);
        assert_eq!(config.reminders.snooze_minutes, SNOOZE_MINUTES);
        assert_eq!(config.database, DatabaseConfig::default());
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn missed_timeout_defaults_to_three_minutes() {
        assert_eq!(ReminderPolicy::default().missed_timeout(), Duration::from_secs(180));
    }
}
