//! Process logging.
//!
//! Structured logs via `tracing`, initialized once at startup. The output
//! format is selectable; `RUST_LOG` overrides the default filter. Log
//! shipping and rotation are left to the surrounding collector.

use std::env;
use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Compact single-line format (default)
    #[default]
    Compact,
    /// Human-readable multi-line format for development
    Pretty,
    /// JSON format for log aggregation
    Json,
}

impl LogFormat {
    /// Read the format from `LOG_FORMAT` ("compact", "pretty", "json").
    pub fn from_env() -> Self {
        match env::var("LOG_FORMAT").as_deref() {
            Ok("pretty") => Self::Pretty,
            Ok("json") => Self::Json,
            _ => Self::Compact,
        }
    }
}

/// Logging initialization errors.
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter: {0}")]
    Filter(String),
    #[error("failed to initialize tracing: {0}")]
    Init(String),
}

/// Initialize the tracing subscriber.
///
/// `default_filter` applies when `RUST_LOG` is unset. Must be called once;
/// a second call fails (tests ignore the result).
pub fn init(format: LogFormat, default_filter: &str) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))
        .map_err(|e| LoggingError::Filter(e.to_string()))?;

    let subscriber = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Compact => subscriber
            .with(fmt::layer().compact().with_target(true))
            .try_init(),
        LogFormat::Pretty => subscriber
            .with(
                fmt::layer()
                    .pretty()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .try_init(),
        LogFormat::Json => subscriber
            .with(fmt::layer().json().with_target(true))
            .try_init(),
    }
    .map_err(|e| LoggingError::Init(e.to_string()))
}
