//! Tracing subscriber setup for hosts embedding the library

use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;

/// `RUST_LOG` wins over the configured level; HTTP internals are kept quiet
pub fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&config.level)
            .with_context(|| format!("Invalid log level '{}'", config.level))?,
    };
    Ok(filter
        .add_directive("hyper_util=warn".parse()?)
        .add_directive("reqwest_retry=warn".parse()?))
}

/// Install the global `fmt` subscriber in pretty or JSON format.
///
/// Fails when a global subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = env_filter(config)?;
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let installed = match config.format.as_str() {
        "json" => builder.json().try_init(),
        _ => builder.with_target(true).try_init(),
    };
    installed
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to install tracing subscriber")?;

    tracing::debug!("Tracing initialized ({} format)", config.format);
    Ok(())
}
