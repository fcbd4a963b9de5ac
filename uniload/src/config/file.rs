//! The `config.ini` file.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ini::Ini;
use thiserror::Error;

use super::keys::ConfigKey;
use crate::client::{DEFAULT_SERVICE_BASE, DEFAULT_TIMEOUT_SECS};
use crate::model::{MediaFormat, Quality};
use crate::progress::{
    ProgressConfig, DEFAULT_CEILING, DEFAULT_MAX_INCREMENT, DEFAULT_TICK_INTERVAL_MS,
};

/// Result alias for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors from loading, saving or editing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {message}")]
    Read { path: PathBuf, message: String },

    #[error("failed to write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),

    #[error("invalid value '{value}' for {key}: {reason}")]
    InvalidValue {
        key: String,
        value: String,
        reason: String,
    },
}

/// `[service]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct ServiceSettings {
    /// Root URL of the conversion service.
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_SERVICE_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// `[progress]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct ProgressSettings {
    pub interval_ms: u64,
    pub max_increment: f64,
    pub ceiling: f64,
}

impl Default for ProgressSettings {
    fn default() -> Self {
        Self {
            interval_ms: DEFAULT_TICK_INTERVAL_MS,
            max_increment: DEFAULT_MAX_INCREMENT,
            ceiling: DEFAULT_CEILING,
        }
    }
}

/// `[defaults]` section: used when the CLI gets no `--format`/`--quality`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DefaultSettings {
    pub format: MediaFormat,
    pub quality: Quality,
}

/// Parsed contents of `config.ini`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ConfigFile {
    pub service: ServiceSettings,
    pub progress: ProgressSettings,
    pub defaults: DefaultSettings,
}

impl ConfigFile {
    /// Load from the default location, or defaults if no file exists.
    pub fn load() -> ConfigResult<Self> {
        let path = config_file_path();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load from `path`. Keys that are absent keep their defaults; unknown
    /// keys are ignored.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Read {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let mut config = Self::default();
        for key in ConfigKey::all() {
            if let Some(value) = ini.get_from(Some(key.section()), key.key_name()) {
                key.set(&mut config, value)?;
            }
        }

        tracing::debug!(path = %path.display(), "Loaded config file");
        Ok(config)
    }

    /// Save to the default location.
    pub fn save(&self) -> ConfigResult<()> {
        self.save_to(&config_file_path())
    }

    /// Save to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let write_error = |source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(write_error)?;
        }

        let mut ini = Ini::new();
        for key in ConfigKey::all() {
            ini.with_section(Some(key.section()))
                .set(key.key_name(), key.get(self));
        }
        ini.write_to_file(path).map_err(write_error)?;

        tracing::info!(path = %path.display(), "Saved config file");
        Ok(())
    }

    /// Estimator tuning from the `[progress]` section.
    pub fn to_progress_config(&self) -> ProgressConfig {
        ProgressConfig::default()
            .with_interval(Duration::from_millis(self.progress.interval_ms))
            .with_max_increment(self.progress.max_increment)
            .with_ceiling(self.progress.ceiling)
    }

    /// HTTP timeout from the `[service]` section.
    pub fn service_timeout(&self) -> Duration {
        Duration::from_secs(self.service.timeout_secs)
    }
}

/// Directory holding `config.ini`.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("uniload")
}

/// Location of `config.ini`.
pub fn config_file_path() -> PathBuf {
    config_dir().join("config.ini")
}
