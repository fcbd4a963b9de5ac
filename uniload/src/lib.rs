//! UniLoad - download orchestration for a remote video conversion service
//!
//! The library turns a source URL into a converted file hosted by the
//! service. It detects the originating platform, fetches metadata, requests
//! the conversion and shows an estimated progress value while the service
//! works, all driven by one state machine per controller.
//!
//! # Modules
//!
//! - [`platform`]: URL to platform label
//! - [`model`]: requests, metadata and error records
//! - [`client`]: the remote service contract and its HTTP adapter
//! - [`progress`]: timer-driven progress estimate
//! - [`orchestrator`]: state machine and async controller
//! - [`config`]: `config.ini` handling
//! - [`logging`]: tracing subscriber setup

pub mod client;
pub mod config;
pub mod logging;
pub mod model;
pub mod orchestrator;
pub mod platform;
pub mod progress;

pub use client::{HttpRemoteService, RemoteService, ReqwestClient, ServiceError};
pub use model::{DownloadRequest, MediaFormat, Quality, VideoMetadata};
pub use orchestrator::{
    ControllerConfig, ControllerHandle, DownloadController, OrchestrationState, Snapshot,
    SubmitOutcome,
};
pub use platform::Platform;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
