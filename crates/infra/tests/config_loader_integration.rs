//! Loading a config file and opening the database it describes.

use std::io::Write;

use medalarm_infra::config;
use medalarm_infra::database::DbManager;
use tempfile::{NamedTempFile, TempDir};

#[test]
fn toml_config_opens_the_described_database() {
    let temp_dir = TempDir::new().expect("temp dir");
    let db_path = temp_dir.path().join("from-config.db");
    let toml_content = format!(
        r#"
[database]
path = "{}"
pool_size = 2
encryption_key = "integration-key"

[reminders]
snooze_minutes = 10
max_snoozes = 3
missed_timeout_secs = 120
"#,
        db_path.display().to_string().replace('\\', "/")
    );

    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file.write_all(toml_content.as_bytes()).expect("Failed to write to temp file");
    let path = temp_file.path().with_extension("toml");
    std::fs::copy(temp_file.path(), &path).expect("Failed to copy file");

    let loaded = config::load_from_file(Some(path.clone())).expect("config loads");
    std::fs::remove_file(path).ok();

    assert_eq!(loaded.reminders.snooze_minutes, 10);
    assert_eq!(loaded.reminders.missed_timeout().as_secs(), 120);

    let manager = DbManager::from_config(&loaded.database).expect("database opens");
    manager.run_migrations().expect("schema applies");
    manager.health_check().expect("healthy");
    assert!(db_path.exists());
}

#[test]
fn json_config_without_database_section_uses_defaults() {
    let mut temp_file = NamedTempFile::new().expect("Failed to create temp file");
    temp_file
        .write_all(br#"{ "logging": { "level": "debug" } }"#)
        .expect("Failed to write to temp file");
    let path = temp_file.path().with_extension("json");
    std::fs::copy(temp_file.path(), &path).expect("Failed to copy file");

    let loaded = config::load_from_file(Some(path.clone())).expect("config loads");
    std::fs::remove_file(path).ok();

    assert_eq!(loaded.logging.level, "debug");
    assert_eq!(loaded.database.path, "medalarm.db");
    assert_eq!(loaded.database.encryption_key, None);
}
