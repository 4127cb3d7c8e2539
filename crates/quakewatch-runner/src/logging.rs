//! Tracing subscriber setup.

use quakewatch_core::config::LoggingConfig;
use tracing_subscriber::EnvFilter;

use crate::error::RefreshError;

/// Build the log filter: `RUST_LOG` if set, otherwise the configured level.
pub fn build_filter(config: &LoggingConfig) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level))
}

/// Install the global subscriber, as JSON lines or human-readable text.
///
/// # Errors
///
/// Returns [`RefreshError::Logging`] if a global subscriber is already set.
pub fn init_tracing(config: &LoggingConfig) -> Result<(), RefreshError> {
    let builder = tracing_subscriber::fmt()
        .with_env_filter(build_filter(config))
        .with_target(true);

    let result = if config.json {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| RefreshError::Logging {
        message: e.to_string(),
    })
}
