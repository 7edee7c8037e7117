//! Tracing subscriber setup driven by the `logger` config section.

use tracing_subscriber::EnvFilter;

use crate::{
    config::{self, LogFormat},
    Error, Result,
};

/// Builds the filter: `RUST_LOG` wins, then `override_filter`, then the
/// configured level applied to this crate with `sqlx` capped at `warn`.
fn filter(config: &config::Logger) -> Result<EnvFilter> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    let directives = match &config.override_filter {
        Some(filter) => filter.clone(),
        None => format!("semantic_annotator={},sqlx=warn", config.level),
    };
    EnvFilter::try_new(&directives).map_err(|err| Error::Logger(err.to_string()))
}

/// Installs the global subscriber. Does nothing when logging is disabled.
///
/// # Errors
///
/// Fails on an invalid filter directive or when a global subscriber is
/// already installed.
pub fn init(config: &config::Logger) -> Result<()> {
    if !config.enable {
        return Ok(());
    }

    let filter = filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    let installed = match config.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
    installed.map_err(|err| Error::Logger(err.to_string()))
}
