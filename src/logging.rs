//! Logging configuration and initialization.
//!
//! Human-readable output on stderr by default; JSON structured logging and
//! a file destination are available for driving the harness from batch
//! schedulers.

use std::path::PathBuf;
use thiserror::Error;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Human-readable output (default for an interactive CLI run).
    #[default]
    Pretty,
    /// JSON structured logging (for scheduled batch runs).
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Output format.
    pub format: LogFormat,
    /// Log level filter (e.g., "info", "debug", "voice_bench=trace").
    pub level: String,
    /// Optional file path for log output. If None, logs to stderr.
    pub output_path: Option<PathBuf>,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            format: LogFormat::default(),
            level: "info".to_string(),
            output_path: None,
        }
    }
}

/// Errors that can occur during logging initialization.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("invalid log filter: {0}")]
    InvalidFilter(String),
    #[error("failed to open log file: {0}")]
    FileOpen(String),
    #[error("subscriber already initialized")]
    AlreadyInitialized,
}

/// Initialize the tracing subscriber with the given configuration.
///
/// Called once at startup, before the config is loaded, so that loading
/// itself is logged.
pub fn init_logging(config: &LogConfig) -> Result<(), LogError> {
    let filter =
        EnvFilter::try_new(&config.level).map_err(|e| LogError::InvalidFilter(e.to_string()))?;

    match &config.output_path {
        Some(path) => {
            let file = std::fs::File::create(path)
                .map_err(|e| LogError::FileOpen(e.to_string()))?;
            let writer = std::sync::Mutex::new(file);
            let registry = tracing_subscriber::registry().with(filter);
            match config.format {
                LogFormat::Json => registry
                    .with(fmt::layer().json().with_writer(writer))
                    .try_init()
                    .map_err(|_| LogError::AlreadyInitialized),
                LogFormat::Pretty => registry
                    .with(fmt::layer().with_ansi(false).with_writer(writer))
                    .try_init()
                    .map_err(|_| LogError::AlreadyInitialized),
            }
        }
        None => {
            let registry = tracing_subscriber::registry().with(filter);
            match config.format {
                LogFormat::Json => registry
                    .with(fmt::layer().json().with_writer(std::io::stderr))
                    .try_init()
                    .map_err(|_| LogError::AlreadyInitialized),
                LogFormat::Pretty => registry
                    .with(fmt::layer().with_writer(std::io::stderr))
                    .try_init()
                    .map_err(|_| LogError::AlreadyInitialized),
            }
        }
    }
}
