//! Error types for the remote service client.

use thiserror::Error;

use crate::model::Phase;

/// Result type for remote service calls.
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failure of the underlying HTTP transport, before any response arrived.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// The HTTP client could not be built.
    #[error("Failed to create HTTP client: {0}")]
    ClientBuild(String),

    /// Connection or request failure.
    #[error("Request failed: {0}")]
    Request(String),

    /// The request exceeded the configured timeout.
    #[error("Request to {url} timed out after {timeout_secs}s")]
    Timeout { url: String, timeout_secs: u64 },

    /// The response body could not be read.
    #[error("Failed to read response: {0}")]
    Body(String),
}

/// Errors returned by [`RemoteService`](super::RemoteService) calls.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ServiceError {
    /// The call never reached the service.
    #[error("{phase} request failed: {source}")]
    Network {
        phase: Phase,
        #[source]
        source: TransportError,
    },

    /// The service answered with a non-success status.
    #[error("{phase} request returned HTTP {status}")]
    Http {
        phase: Phase,
        status: u16,
        /// `error` field from the body, if one could be read.
        message: Option<String>,
    },

    /// The service answered successfully but reported an error in the payload.
    #[error("{phase} request rejected: {message}")]
    Application { phase: Phase, message: String },

    /// The payload was not the JSON we expected.
    #[error("{phase} response could not be parsed: {reason}")]
    Parse { phase: Phase, reason: String },
}

impl ServiceError {
    /// Which call failed.
    pub fn phase(&self) -> Phase {
        match self {
            ServiceError::Network { phase, .. }
            | ServiceError::Http { phase, .. }
            | ServiceError::Application { phase, .. }
            | ServiceError::Parse { phase, .. } => *phase,
        }
    }

    /// Message for the user.
    ///
    /// Service-supplied text wins; otherwise the phase's generic message.
    pub fn user_message(&self) -> String {
        match self {
            ServiceError::Application { message, .. } => message.clone(),
            ServiceError::Http {
                message: Some(message),
                ..
            } => message.clone(),
            other => other.phase().fallback_message().to_string(),
        }
    }
}
