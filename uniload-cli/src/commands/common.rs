//! Common types and utilities shared across CLI commands.

use clap::ValueEnum;
use uniload::config::{ConfigFile, ConfigKey};
use uniload::model::{MediaFormat, Quality};

use crate::error::CliError;

/// Output format selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum FormatArg {
    /// Video with audio (MP4)
    Mp4,
    /// Audio only (MP3)
    Mp3,
}

impl From<FormatArg> for MediaFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Mp4 => MediaFormat::Video,
            FormatArg::Mp3 => MediaFormat::Audio,
        }
    }
}

/// Video resolution selection for CLI arguments.
#[derive(Debug, Clone, Copy, ValueEnum, PartialEq)]
pub enum QualityArg {
    /// 2160p
    #[value(name = "4k")]
    Ultra,
    #[value(name = "1080p")]
    High,
    #[value(name = "720p")]
    Medium,
    #[value(name = "480p")]
    Low,
}

impl From<QualityArg> for Quality {
    fn from(arg: QualityArg) -> Self {
        match arg {
            QualityArg::Ultra => Quality::Ultra,
            QualityArg::High => Quality::High,
            QualityArg::Medium => Quality::Medium,
            QualityArg::Low => Quality::Low,
        }
    }
}

/// Resolve the output format: CLI, then config.
pub fn resolve_format(cli_format: Option<FormatArg>, config: &ConfigFile) -> MediaFormat {
    cli_format
        .map(MediaFormat::from)
        .unwrap_or(config.defaults.format)
}

/// Resolve the video quality: CLI, then config.
pub fn resolve_quality(cli_quality: Option<QualityArg>, config: &ConfigFile) -> Quality {
    cli_quality
        .map(Quality::from)
        .unwrap_or(config.defaults.quality)
}

/// Resolve the service base URL: CLI, then config.
///
/// A CLI value goes through the same validation as `config set`.
pub fn resolve_service_base(
    cli_base: Option<String>,
    config: &ConfigFile,
) -> Result<String, CliError> {
    match cli_base {
        Some(base) => {
            let mut scratch = config.clone();
            ConfigKey::ServiceBaseUrl
                .set(&mut scratch, &base)
                .map_err(|e| CliError::Config(e.to_string()))?;
            Ok(scratch.service.base_url)
        }
        None => Ok(config.service.base_url.clone()),
    }
}
