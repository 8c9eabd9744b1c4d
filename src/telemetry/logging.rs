//! Logging configuration and initialization
//!
//! Structured logging with tracing: compact console output for development,
//! JSON for log aggregation, and an optional non-blocking log file.

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

use crate::config::LoggingConfig;

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Enable console output (default: true)
    pub console_enabled: bool,
    /// Enable file logging (default: false)
    pub file_enabled: bool,
    /// Path for the log file (default: gesture-stream.log in the working directory)
    pub file_path: Option<PathBuf>,
    /// Use JSON format for logs (default: false)
    pub json_format: bool,
    /// Default log level filter (default: "info")
    pub default_level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            console_enabled: true,
            file_enabled: false,
            file_path: None,
            json_format: false,
            default_level: "info".to_string(),
        }
    }
}

impl From<&LoggingConfig> for LogConfig {
    fn from(config: &LoggingConfig) -> Self {
        Self {
            console_enabled: true,
            file_enabled: config.file_enabled,
            file_path: config.file_path.clone(),
            json_format: config.json_format,
            default_level: config.default_level.clone(),
        }
    }
}

impl LogConfig {
    fn log_path(&self) -> PathBuf {
        self.file_path
            .clone()
            .unwrap_or_else(|| PathBuf::from("gesture-stream.log"))
    }
}

/// Initialize the logging system with the given configuration
///
/// Returns a guard that must be kept alive for the duration of the program
/// so the log file is flushed.
///
/// # Environment Variables
///
/// - `GESTURE_LOG`: log level filter (e.g. "debug", "info,gesture_stream=trace")
/// - `GESTURE_LOG_FORMAT`: set to "json" for JSON output
pub fn init_logging(
    config: &LogConfig,
) -> Result<Option<WorkerGuard>, Box<dyn std::error::Error + Send + Sync>> {
    // GESTURE_LOG first, then RUST_LOG, then the configured default
    let env_filter = EnvFilter::try_from_env("GESTURE_LOG")
        .or_else(|_| EnvFilter::try_from_env("RUST_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(&config.default_level));

    let use_json = json_requested(std::env::var("GESTURE_LOG_FORMAT").ok(), config.json_format);

    let subscriber = tracing_subscriber::registry().with(env_filter);

    let console_layer = config.console_enabled.then(|| {
        if use_json {
            fmt::layer()
                .json()
                .with_target(true)
                .with_thread_names(true)
                .with_file(true)
                .with_line_number(true)
                .boxed()
        } else {
            fmt::layer()
                .with_target(true)
                .with_thread_names(true)
                .compact()
                .boxed()
        }
    });

    let mut file_guard = None;
    let file_layer = if config.file_enabled {
        let log_path = config.log_path();
        let file = std::fs::File::create(&log_path)?;
        let (non_blocking, guard) = tracing_appender::non_blocking(file);
        file_guard = Some(guard);
        eprintln!("Logging to file: {}", log_path.display());

        Some(
            fmt::layer()
                .with_writer(non_blocking)
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .with_ansi(false),
        )
    } else {
        None
    };

    subscriber.with(console_layer).with(file_layer).try_init()?;

    tracing::info!(
        target: "gesture_stream",
        version = env!("CARGO_PKG_VERSION"),
        json_format = use_json,
        file_enabled = config.file_enabled,
        "Logging initialized"
    );

    Ok(file_guard)
}

fn json_requested(env_value: Option<String>, configured: bool) -> bool {
    env_value
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(configured)
}

// Re-export WorkerGuard so callers can store it
pub use tracing_appender::non_blocking::WorkerGuard as LogGuard;
