//! Client for the remote metadata/conversion service.
//!
//! The orchestrator consumes the [`RemoteService`] contract. The shipped
//! implementation, [`HttpRemoteService`], speaks JSON over an injectable
//! [`AsyncHttpClient`] transport:
//!
//! ```text
//! HttpRemoteService ──► AsyncHttpClient (trait)
//!                           ├── ReqwestClient        (production)
//!                           └── MockAsyncHttpClient  (tests)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use uniload::client::{HttpRemoteService, ReqwestClient, RemoteService};
//!
//! let service = HttpRemoteService::new(ReqwestClient::new()?, "http://localhost:5000");
//! let metadata = service.fetch_metadata("https://youtu.be/abc").await?;
//! ```

mod error;
mod http;
mod service;
mod wire;

pub use error::{ServiceError, ServiceResult, TransportError};
pub use http::{AsyncHttpClient, HttpResponse, ReqwestClient, DEFAULT_TIMEOUT_SECS};
pub use service::{HttpRemoteService, RemoteService, DEFAULT_SERVICE_BASE};

#[cfg(test)]
pub use http::tests::{MockAsyncHttpClient, RecordedRequest};
