//! Tracing subscriber setup.
//!
//! Two outputs are installed:
//! - a daily rolling file under the log directory, at `info` (or `debug`
//!   when verbose)
//! - stderr, at `warn` unless verbose so progress output stays readable
//!
//! `RUST_LOG` overrides both levels.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::fmt::time::UtcTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Prefix of the rolling log files.
pub const LOG_FILE_PREFIX: &str = "uniload.log";

/// Errors from [`init_logging`].
#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("failed to create log directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to install tracing subscriber: {0}")]
    Install(String),
}

/// Keeps the background log writer alive. Hold it until the process exits.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Default log directory: `<data dir>/uniload/logs`.
pub fn default_log_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("uniload")
        .join("logs")
}

fn env_filter(verbose: bool) -> EnvFilter {
    let fallback = if verbose { "debug" } else { "info" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

/// Fixed stderr level used when neither `--verbose` nor `RUST_LOG` asks for
/// more. `None` means stderr follows the shared env filter.
fn stderr_override(verbose: bool, rust_log_set: bool) -> Option<LevelFilter> {
    if verbose || rust_log_set {
        None
    } else {
        Some(LevelFilter::WARN)
    }
}

/// Install the global subscriber.
///
/// With `log_dir` set, records are also written to a daily rolling file in
/// that directory.
pub fn init_logging(verbose: bool, log_dir: Option<&Path>) -> Result<LoggingGuard, LoggingError> {
    let (file_layer, file_guard) = match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir).map_err(|source| LoggingError::CreateDir {
                path: dir.to_path_buf(),
                source,
            })?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_timer(UtcTime::rfc_3339())
                .with_filter(env_filter(verbose));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let rust_log_set = std::env::var_os("RUST_LOG").is_some();
    let stderr_filter = match stderr_override(verbose, rust_log_set) {
        Some(level) => EnvFilter::default().add_directive(level.into()),
        None => env_filter(verbose),
    };
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(verbose)
        .with_filter(stderr_filter);

    tracing_subscriber::registry()
        .with(file_layer)
        .with(stderr_layer)
        .try_init()
        .map_err(|e| LoggingError::Install(e.to_string()))?;

    tracing::debug!(verbose, log_dir = ?log_dir, "Logging initialized");
    Ok(LoggingGuard { _file: file_guard })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_log_dir() {
        assert!(default_log_dir().ends_with("uniload/logs"));
    }

    #[test]
    fn test_stderr_quiet_by_default() {
        assert_eq!(stderr_override(false, false), Some(LevelFilter::WARN));
        assert_eq!(stderr_override(true, false), None);
        assert_eq!(stderr_override(false, true), None);
    }

    #[test]
    fn test_init_writes_rolling_file() {
        let dir = TempDir::new().unwrap();
        let log_dir = dir.path().join("logs");

        let guard = init_logging(false, Some(&log_dir)).unwrap();
        tracing::info!("hello from test");
        drop(guard);

        let names: Vec<String> = std::fs::read_dir(&log_dir)
            .unwrap()
            .filter_map(|e| e.ok())
            .map(|e| e.file_name().to_string_lossy().into_owned())
            .collect();
        assert!(names.iter().any(|n| n.starts_with(LOG_FILE_PREFIX)));

        assert!(matches!(
            init_logging(false, None),
            Err(LoggingError::Install(_))
        ));
    }
}
