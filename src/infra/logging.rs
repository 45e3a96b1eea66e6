use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing_subscriber::EnvFilter;

pub const LOG_ENV_VAR: &str = "TWINPANE_LOG";

#[derive(Debug, Error)]
pub enum InitLoggingError {
    #[error("failed to open log file {path}: {source}")]
    OpenLogFile {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to install log subscriber: {0}")]
    Subscriber(String),
}

pub fn log_file_path(state_dir: &Path) -> PathBuf {
    state_dir.join("twinpane.log")
}

/// Routes `tracing` output to an append-only file in `state_dir`. The terminal
/// belongs to the UI, so nothing is ever written to stdout or stderr.
pub fn init_logging(state_dir: &Path) -> Result<PathBuf, InitLoggingError> {
    let path = log_file_path(state_dir);
    let open_error = |source| InitLoggingError::OpenLogFile {
        path: path.display().to_string(),
        source,
    };
    fs::create_dir_all(state_dir).map_err(open_error)?;
    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(open_error)?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_env(LOG_ENV_VAR).unwrap_or_else(|_| "info".into()))
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(log_file))
        .try_init()
        .map_err(|error| InitLoggingError::Subscriber(error.to_string()))?;

    Ok(path)
}
