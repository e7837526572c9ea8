//! Logging system initialization
//!
//! Sets up tracing-based logging to daily log files in
//! %APPDATA%\WinregHelpers\logs, keeping the most recent `MAX_LOG_FILES` files.

use crate::config::manager::APP_DIR_NAME;
use crate::error::{AssocError, Result};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{EnvFilter, fmt};

/// Number of daily log files kept on disk
pub const MAX_LOG_FILES: usize = 7;

/// Default log directory: %APPDATA%\WinregHelpers\logs
pub fn log_dir() -> PathBuf {
    log_dir_from(std::env::var_os("APPDATA"))
}

fn log_dir_from(appdata: Option<OsString>) -> PathBuf {
    appdata
        .map_or_else(|| PathBuf::from("."), PathBuf::from)
        .join(APP_DIR_NAME)
        .join("logs")
}

/// Initialize the logging system in the default log directory
///
/// Log level defaults to INFO but can be configured via `RUST_LOG` environment variable.
pub fn init_logging() -> Result<()> {
    init_logging_in(&log_dir())
}

/// Initialize the logging system writing to `log_dir`
///
/// Fails if a global subscriber has already been installed.
pub fn init_logging_in(log_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(log_dir)?;

    let file_appender = RollingFileAppender::builder()
        .rotation(Rotation::DAILY)
        .filename_prefix("winreg-helpers")
        .filename_suffix("log")
        .max_log_files(MAX_LOG_FILES)
        .build(log_dir)
        .map_err(|e| AssocError::ConfigError(Box::new(e)))?;

    let subscriber = fmt()
        .with_writer(file_appender)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| AssocError::ConfigError(Box::new(e)))?;

    tracing::info!("winreg-helpers v{} started", env!("CARGO_PKG_VERSION"));

    Ok(())
}
