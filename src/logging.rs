use crate::config::LoggingConfig;
use crate::error::{PanelError, Result};
use std::fs;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initializes the logging system with both console and file output.
///
/// Console output goes to stderr so exported panels on stdout stay clean.
/// The returned guard must be held until exit to flush the file writer.
pub fn init_logging(config: &LoggingConfig) -> Result<WorkerGuard> {
    // Ensure logs directory exists
    fs::create_dir_all(&config.dir)?;

    // Create a non-blocking file appender for daily log rotation
    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix(&config.file_prefix)
        .build(&config.dir)
        .map_err(|e| PanelError::Logging(format!("log directory {}: {}", config.dir, e)))?;
    let (non_blocking_writer, guard) = tracing_appender::non_blocking(file_appender);

    // Create a JSON layer for file logging
    let file_layer = fmt::layer().json().with_writer(non_blocking_writer);

    let console_layer = fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    // Respect RUST_LOG if set; otherwise info for our crate
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("il_case_panel=info,warn"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .with(console_layer)
        .try_init()
        .map_err(|e| PanelError::Logging(e.to_string()))?;

    Ok(guard)
}
