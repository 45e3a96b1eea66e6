use crate::domain::{DEFAULT_MARGIN_ROWS, FilterKind, SortKey};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1500;
const MIN_POLL_INTERVAL_MS: u64 = 100;

#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default)]
pub struct Settings {
    pub poll_interval_ms: u64,
    pub show_hidden: bool,
    pub sort_key: SortKey,
    pub filter_kind: FilterKind,
    pub margin_rows: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
            show_hidden: false,
            sort_key: SortKey::Name,
            filter_kind: FilterKind::Subsequence,
            margin_rows: DEFAULT_MARGIN_ROWS,
        }
    }
}

impl Settings {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(MIN_POLL_INTERVAL_MS))
    }
}

#[derive(Debug, Error)]
pub enum ResolveStateDirError {
    #[error("home directory not found")]
    HomeDirNotFound,
}

pub fn resolve_state_dir() -> Result<PathBuf, ResolveStateDirError> {
    if let Some(override_dir) = std::env::var_os("TWINPANE_STATE_DIR") {
        return Ok(PathBuf::from(override_dir));
    }
    let Some(home) = dirs::home_dir() else {
        return Err(ResolveStateDirError::HomeDirNotFound);
    };
    Ok(home.join(".twinpane"))
}

pub fn resolve_config_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("TWINPANE_CONFIG") {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("twinpane").join("config.json"))
}

#[derive(Debug, Error)]
pub enum LoadSettingsError {
    #[error("failed to read settings: {0}")]
    Read(#[from] io::Error),

    #[error("failed to parse settings: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Missing file means defaults; unreadable or malformed content is an error.
pub fn load_settings(path: &Path) -> Result<Settings, LoadSettingsError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            return Ok(Settings::default());
        }
        Err(error) => return Err(error.into()),
    };
    Ok(serde_json::from_str(&raw)?)
}
