//! Tracing subscriber setup
//!
//! The engine only emits `tracing` events. An embedding binary calls [`init`]
//! once at startup with the `logging` configuration section; `RUST_LOG`, when
//! set, takes precedence over `logging.level`.

use anyhow::{Context, Result};
use bucketsync_core::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

/// Filter for the configured level, ignoring the environment
///
/// # Errors
/// Returns an error if `logging.level` is not a valid filter directive.
pub fn level_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    EnvFilter::try_new(&config.level)
        .with_context(|| format!("invalid logging.level '{}'", config.level))
}

/// Installs a global fmt subscriber
///
/// # Errors
/// Fails on an invalid level or when a global subscriber is already set.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => level_filter(config)?,
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to install tracing subscriber: {e}"))
}
