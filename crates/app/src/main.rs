//! MedAlarm - medication reminder daemon
//!
//! Restores persisted alarms at startup and runs until interrupted.
//! Configuration comes from `MEDALARM_*` variables (a `.env` file is honoured)
//! or from the config file given as the first argument.

use std::path::PathBuf;

use anyhow::Context;
use medalarm_domain::Config;
use medalarm_infra::config;
use medalarm_infra::observability::init_logging;
use medalarm_lib::AppContext;

/// Returns the config, where it came from, and why defaults were used if they
/// were.
fn load_config() -> anyhow::Result<(Config, &'static str, Option<String>)> {
    if let Some(path) = std::env::args_os().nth(1).map(PathBuf::from) {
        let loaded = config::load_from_file(Some(path.clone()))
            .with_context(|| format!("loading {}", path.display()))?;
        return Ok((loaded, "file", None));
    }

    match config::load().context("loading configuration")? {
        Some(loaded) => Ok((loaded, "environment or probed file", None)),
        None => Ok((
            Config::default(),
            "defaults",
            Some("MEDALARM_DB_PATH unset and no config file found".to_owned()),
        )),
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let dotenv = dotenvy::dotenv();
    let (config, source, fallback) = load_config()?;

    init_logging(&config.logging).context("initialising logging")?;
    match dotenv {
        Ok(path) => tracing::info!(path = %path.display(), "loaded .env"),
        Err(e) => tracing::debug!(error = %e, "no .env file loaded"),
    }
    if let Some(reason) = fallback {
        tracing::warn!(%reason, "no configuration found; using defaults");
    }
    tracing::info!(
        source,
        db_path = %config.database.path,
        encrypted = config.database.encryption_key.is_some(),
        "configuration loaded"
    );

    let mut ctx = AppContext::new_with_config(config).await.context("starting medalarm")?;
    tracing::info!("medalarm running; press Ctrl-C to exit");

    tokio::signal::ctrl_c().await.context("waiting for Ctrl-C")?;
    tracing::info!("shutdown requested");

    ctx.shutdown().await.context("shutting down")?;
    Ok(())
}
