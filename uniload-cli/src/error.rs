//! CLI error type.

use std::fmt;

use uniload::client::{ServiceError, TransportError};
use uniload::config::ConfigError;
use uniload::logging::LoggingError;
use uniload::orchestrator::ControllerError;

/// Errors surfaced by CLI commands.
#[derive(Debug)]
pub enum CliError {
    /// Invalid configuration or arguments.
    Config(String),
    /// Reading or writing `config.ini` failed.
    ConfigFile(ConfigError),
    /// Logging could not be set up.
    Logging(LoggingError),
    /// The Ctrl+C handler could not be installed.
    SignalHandler(String),
    /// The Tokio runtime could not be built.
    RuntimeCreation(std::io::Error),
    /// The HTTP client could not be built.
    HttpClient(TransportError),
    /// A direct service call failed.
    Service(ServiceError),
    /// The controller stopped unexpectedly.
    Controller(ControllerError),
    /// The orchestration cycle ended in failure.
    DownloadFailed(String),
    /// Interrupted by Ctrl+C.
    Interrupted,
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::ConfigFile(e) => write!(f, "Configuration error: {}", e),
            CliError::Logging(e) => write!(f, "Logging error: {}", e),
            CliError::SignalHandler(msg) => write!(f, "Failed to set signal handler: {}", msg),
            CliError::RuntimeCreation(e) => write!(f, "Failed to create async runtime: {}", e),
            CliError::HttpClient(e) => write!(f, "Failed to create HTTP client: {}", e),
            CliError::Service(e) => write!(f, "{}", e.user_message()),
            CliError::Controller(e) => write!(f, "Controller error: {}", e),
            CliError::DownloadFailed(msg) => write!(f, "{}", msg),
            CliError::Interrupted => write!(f, "Interrupted"),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::ConfigFile(e) => Some(e),
            CliError::Logging(e) => Some(e),
            CliError::RuntimeCreation(e) => Some(e),
            CliError::HttpClient(e) => Some(e),
            CliError::Service(e) => Some(e),
            CliError::Controller(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::ConfigFile(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}

impl From<ServiceError> for CliError {
    fn from(e: ServiceError) -> Self {
        CliError::Service(e)
    }
}

impl From<ControllerError> for CliError {
    fn from(e: ControllerError) -> Self {
        CliError::Controller(e)
    }
}

impl CliError {
    /// Process exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::Interrupted => 130,
            CliError::Config(_) | CliError::ConfigFile(_) => 2,
            _ => 1,
        }
    }
}
