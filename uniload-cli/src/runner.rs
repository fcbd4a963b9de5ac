//! Shared setup for commands that talk to the service.

use tokio::runtime::Runtime;
use uniload::client::{HttpRemoteService, ReqwestClient};
use uniload::config::ConfigFile;
use uniload::logging::{default_log_dir, init_logging, LoggingGuard};

use crate::error::CliError;

/// Loaded configuration, logging and an async runtime.
pub struct CliRunner {
    config: ConfigFile,
    runtime: Runtime,
    _logging: LoggingGuard,
}

impl CliRunner {
    /// Load config, start logging and build the runtime.
    pub fn new(verbose: bool) -> Result<Self, CliError> {
        let logging = init_logging(verbose, Some(&default_log_dir()))?;
        let config = ConfigFile::load()?;
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("uniload-worker")
            .build()
            .map_err(CliError::RuntimeCreation)?;

        Ok(Self {
            config,
            runtime,
            _logging: logging,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    /// Log the command being run.
    pub fn log_startup(&self, command: &str) {
        tracing::info!(
            version = uniload::VERSION,
            command,
            service = %self.config.service.base_url,
            "UniLoad starting"
        );
    }

    /// Build the HTTP service adapter rooted at `base_url`.
    pub fn create_service(
        &self,
        base_url: &str,
    ) -> Result<HttpRemoteService<ReqwestClient>, CliError> {
        let client = ReqwestClient::with_timeout(self.config.service_timeout())
            .map_err(CliError::HttpClient)?;
        Ok(HttpRemoteService::new(client, base_url))
    }
}
