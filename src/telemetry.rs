//! # Telemetry
//!
//! Installs the global `tracing` subscriber from [`LogConfig`].
//!
//! `RUST_LOG` takes precedence over the configured level when set.

use crate::config::{LogConfig, LogFormat};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

/// Subscriber installation error.
#[derive(Debug, Error)]
pub enum TelemetryError {
    /// The configured level is not a valid filter directive.
    #[error("invalid log filter '{directive}': {message}")]
    InvalidFilter {
        /// Directive as configured.
        directive: String,
        /// Parser message.
        message: String,
    },

    /// A global subscriber is already installed.
    #[error("failed to install tracing subscriber: {0}")]
    Install(String),
}

/// Builds the event filter for `config`.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidFilter` if neither `RUST_LOG` nor the
/// configured level parse.
pub fn env_filter(config: &LogConfig) -> Result<EnvFilter, TelemetryError> {
    EnvFilter::try_from_default_env().or_else(|_| {
        EnvFilter::try_new(&config.level).map_err(|e| TelemetryError::InvalidFilter {
            directive: config.level.clone(),
            message: e.to_string(),
        })
    })
}

/// Installs a JSON or pretty fmt subscriber.
///
/// # Errors
///
/// Returns an error if the filter is invalid or a subscriber is already
/// installed.
pub fn init_tracing(config: &LogConfig) -> Result<(), TelemetryError> {
    let filter = env_filter(config)?;
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.include_target);

    let installed = match config.format {
        LogFormat::Json => builder
            .json()
            .with_current_span(config.include_spans)
            .with_span_list(config.include_spans)
            .try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
    };
    installed.map_err(|e| TelemetryError::Install(e.to_string()))
}
