//! Persisted server settings.
//!
//! `config.json` in the data directory holds the settings a server starts
//! with. A missing file is written out with the defaults so it can be
//! edited in place. Command-line flags and environment variables override
//! whatever the file says.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::worker::DEFAULT_RESCAN_INTERVAL;

/// Settings file name inside the data directory.
pub const SETTINGS_FILE: &str = "config.json";

/// Default API bind address.
pub const DEFAULT_BIND: &str = "0.0.0.0:6969";

/// Errors writing settings.
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Failed to write settings {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Settings read from `config.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    /// Address the API server binds.
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Library root. Relative paths resolve against the data directory;
    /// unset means `library` under it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub library_dir: Option<PathBuf>,

    /// Seconds between periodic rescans; 0 disables them.
    #[serde(default = "default_rescan_interval_secs")]
    pub rescan_interval_secs: u64,
}

fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

fn default_rescan_interval_secs() -> u64 {
    DEFAULT_RESCAN_INTERVAL.as_secs()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            library_dir: None,
            rescan_interval_secs: default_rescan_interval_secs(),
        }
    }
}

impl Settings {
    /// Location of the settings file for `data_dir`.
    pub fn path(data_dir: &Path) -> PathBuf {
        data_dir.join(SETTINGS_FILE)
    }

    /// Load settings from `data_dir`, writing the defaults if the file does
    /// not exist. An unreadable or malformed file is reported and the
    /// defaults are used without touching it.
    pub fn load_or_init(data_dir: &Path) -> Result<Self, SettingsError> {
        let path = Self::path(data_dir);

        match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(settings) => {
                    debug!(path = %path.display(), "Loaded settings");
                    Ok(settings)
                }
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Invalid settings file, using defaults");
                    Ok(Self::default())
                }
            },
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                let settings = Self::default();
                settings.save(data_dir)?;
                info!(path = %path.display(), "Wrote default settings");
                Ok(settings)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read settings, using defaults");
                Ok(Self::default())
            }
        }
    }

    /// Write settings to `data_dir`.
    pub fn save(&self, data_dir: &Path) -> Result<(), SettingsError> {
        let path = Self::path(data_dir);
        let write_error = |source| SettingsError::Write {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(data_dir).map_err(write_error)?;
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content).map_err(write_error)?;

        Ok(())
    }

    /// Library root for `data_dir`.
    pub fn library_dir(&self, data_dir: &Path) -> PathBuf {
        match &self.library_dir {
            Some(dir) => data_dir.join(dir),
            None => data_dir.join("library"),
        }
    }

    pub fn rescan_interval(&self) -> Duration {
        Duration::from_secs(self.rescan_interval_secs)
    }
}
