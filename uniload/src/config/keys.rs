//! `section.key` addressing for configuration values.

use std::fmt;
use std::str::FromStr;

use super::file::{ConfigError, ConfigFile, ConfigResult};
use crate::model::{MediaFormat, Quality};
use crate::progress::MAX_CEILING;

/// Every setting that can be read or written by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKey {
    ServiceBaseUrl,
    ServiceTimeoutSecs,
    ProgressIntervalMs,
    ProgressMaxIncrement,
    ProgressCeiling,
    DefaultsFormat,
    DefaultsQuality,
}

const ALL_KEYS: &[ConfigKey] = &[
    ConfigKey::ServiceBaseUrl,
    ConfigKey::ServiceTimeoutSecs,
    ConfigKey::ProgressIntervalMs,
    ConfigKey::ProgressMaxIncrement,
    ConfigKey::ProgressCeiling,
    ConfigKey::DefaultsFormat,
    ConfigKey::DefaultsQuality,
];

impl ConfigKey {
    /// All keys in file order.
    pub fn all() -> &'static [ConfigKey] {
        ALL_KEYS
    }

    /// Full `section.key` name.
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::ServiceBaseUrl => "service.base_url",
            ConfigKey::ServiceTimeoutSecs => "service.timeout_secs",
            ConfigKey::ProgressIntervalMs => "progress.interval_ms",
            ConfigKey::ProgressMaxIncrement => "progress.max_increment",
            ConfigKey::ProgressCeiling => "progress.ceiling",
            ConfigKey::DefaultsFormat => "defaults.format",
            ConfigKey::DefaultsQuality => "defaults.quality",
        }
    }

    /// INI section.
    pub fn section(&self) -> &'static str {
        self.split().0
    }

    /// Key within its section.
    pub fn key_name(&self) -> &'static str {
        self.split().1
    }

    fn split(&self) -> (&'static str, &'static str) {
        let name = self.name();
        name.split_once('.').unwrap_or(("", name))
    }

    /// Current value as it would be written to the file.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::ServiceBaseUrl => config.service.base_url.clone(),
            ConfigKey::ServiceTimeoutSecs => config.service.timeout_secs.to_string(),
            ConfigKey::ProgressIntervalMs => config.progress.interval_ms.to_string(),
            ConfigKey::ProgressMaxIncrement => config.progress.max_increment.to_string(),
            ConfigKey::ProgressCeiling => config.progress.ceiling.to_string(),
            ConfigKey::DefaultsFormat => config.defaults.format.to_string(),
            ConfigKey::DefaultsQuality => config.defaults.quality.to_string(),
        }
    }

    /// Validate `value` and store it.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> ConfigResult<()> {
        let value = value.trim();
        match self {
            ConfigKey::ServiceBaseUrl => {
                let lowered = value.to_ascii_lowercase();
                if !(lowered.starts_with("http://") || lowered.starts_with("https://")) {
                    return Err(self.invalid(value, "must start with http:// or https://"));
                }
                config.service.base_url = value.trim_end_matches('/').to_string();
            }
            ConfigKey::ServiceTimeoutSecs => {
                config.service.timeout_secs = self.parse_positive(value)?;
            }
            ConfigKey::ProgressIntervalMs => {
                config.progress.interval_ms = self.parse_positive(value)?;
            }
            ConfigKey::ProgressMaxIncrement => {
                let parsed = self.parse_float(value)?;
                if parsed < 0.0 {
                    return Err(self.invalid(value, "must not be negative"));
                }
                config.progress.max_increment = parsed;
            }
            ConfigKey::ProgressCeiling => {
                let parsed = self.parse_float(value)?;
                if !(0.0..=MAX_CEILING).contains(&parsed) {
                    let reason = format!("must be between 0 and {}", MAX_CEILING);
                    return Err(self.invalid(value, &reason));
                }
                config.progress.ceiling = parsed;
            }
            ConfigKey::DefaultsFormat => {
                config.defaults.format =
                    MediaFormat::from_str(value).map_err(|reason| self.invalid(value, &reason))?;
            }
            ConfigKey::DefaultsQuality => {
                config.defaults.quality =
                    Quality::from_str(value).map_err(|reason| self.invalid(value, &reason))?;
            }
        }
        Ok(())
    }

    fn parse_positive(&self, value: &str) -> ConfigResult<u64> {
        match value.parse::<u64>() {
            Ok(0) => Err(self.invalid(value, "must be greater than zero")),
            Ok(n) => Ok(n),
            Err(e) => Err(self.invalid(value, &e.to_string())),
        }
    }

    fn parse_float(&self, value: &str) -> ConfigResult<f64> {
        let parsed = value
            .parse::<f64>()
            .map_err(|e| self.invalid(value, &e.to_string()))?;
        if !parsed.is_finite() {
            return Err(self.invalid(value, "must be a finite number"));
        }
        Ok(parsed)
    }

    fn invalid(&self, value: &str, reason: &str) -> ConfigError {
        ConfigError::InvalidValue {
            key: self.name().to_string(),
            value: value.to_string(),
            reason: reason.to_string(),
        }
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ALL_KEYS
            .iter()
            .copied()
            .find(|key| key.name() == wanted)
            .ok_or_else(|| ConfigError::UnknownKey(s.to_string()))
    }
}
