//! # Telemetry Setup
//!
//! Installs the global `tracing` subscriber for applications built on this
//! library: a human-readable console layer, optionally paired with a daily
//! rolling JSON file layer. Library code only emits events; installing a
//! subscriber is always the application's call.

use std::fs;
use std::path::PathBuf;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::{non_blocking, rolling};
use tracing_subscriber::{fmt, layer::SubscriberExt, prelude::*, EnvFilter};

#[derive(Debug, Error)]
/// # Telemetry Error
///
/// Defines the failures that can occur while installing the global tracing
/// subscriber.
pub enum TelemetryError {
    /// The filter directive could not be parsed.
    #[error("Invalid log filter directive: {0}")]
    InvalidFilter(String),

    /// The log directory could not be created.
    #[error("I/O error occurred: {0}")]
    IoError(#[from] std::io::Error),

    /// A global subscriber was already installed.
    #[error("Failed to install the global subscriber: {0}")]
    Install(String),
}

#[derive(Debug, Clone)]
/// # Telemetry Options
///
/// Controls the filter level, the optional rolling log file and its format.
pub struct TelemetryOptions {
    /// Fallback filter directive when `RUST_LOG` is not set (e.g. `"info"`).
    pub filter: String,
    /// Directory for daily rolling log files. `None` disables file output.
    pub log_dir: Option<PathBuf>,
    /// Prefix of the rolling log file names.
    pub file_prefix: String,
    /// Write the file layer as JSON lines instead of plain text.
    pub json: bool,
}

impl Default for TelemetryOptions {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            log_dir: None,
            file_prefix: "ontario_data".to_string(),
            json: true,
        }
    }
}

/// Installs the global tracing subscriber.
///
/// The filter honors `RUST_LOG` when set and falls back to
/// `options.filter` otherwise. When a log directory is configured the
/// returned [`WorkerGuard`] must be kept alive for the lifetime of the
/// program, or buffered log lines are lost on shutdown.
///
/// # Arguments
/// * `options` - Filter, file output and format settings.
///
/// # Returns
/// The appender guard when file output is enabled, `None` otherwise.
pub fn init(options: TelemetryOptions) -> Result<Option<WorkerGuard>, TelemetryError> {
    // 1. Build the filter: environment first, configured fallback second.
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&options.filter))
        .map_err(|e| TelemetryError::InvalidFilter(e.to_string()))?;

    // 2. Console layer for stdout.
    let console_layer = fmt::layer().with_target(true).with_ansi(true);

    let registry = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    // 3. Optional daily rolling file layer.
    if let Some(log_dir) = options.log_dir {
        fs::create_dir_all(&log_dir)?;
        let file_appender = rolling::daily(&log_dir, &options.file_prefix);
        let (non_blocking_appender, guard) = non_blocking(file_appender);

        if options.json {
            registry
                .with(
                    fmt::layer()
                        .with_ansi(false)
                        .with_writer(non_blocking_appender)
                        .json(),
                )
                .try_init()
                .map_err(|e| TelemetryError::Install(e.to_string()))?;
        } else {
            registry
                .with(
                    fmt::layer()
                        .with_ansi(false)
                        .with_writer(non_blocking_appender),
                )
                .try_init()
                .map_err(|e| TelemetryError::Install(e.to_string()))?;
        }
        return Ok(Some(guard));
    }

    registry
        .try_init()
        .map_err(|e| TelemetryError::Install(e.to_string()))?;
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;

    // The subscriber is process-global, so every scenario runs in order
    // inside one test.
    #[test]
    fn test_init_lifecycle() {
        std::env::remove_var("RUST_LOG");

        // An unparsable directive fails before anything is installed.
        let bad = TelemetryOptions {
            filter: "===".to_string(),
            ..TelemetryOptions::default()
        };
        assert!(matches!(init(bad), Err(TelemetryError::InvalidFilter(_))));

        // File output returns a guard and creates the directory.
        let dir = tempfile::tempdir().unwrap();
        let log_dir = dir.path().join("logs");
        let options = TelemetryOptions {
            log_dir: Some(log_dir.clone()),
            ..TelemetryOptions::default()
        };
        let guard = init(options).unwrap();
        assert!(guard.is_some());
        assert!(log_dir.is_dir());

        // A second install is refused.
        let err = init(TelemetryOptions::default()).unwrap_err();
        assert!(matches!(err, TelemetryError::Install(_)));
    }
}
