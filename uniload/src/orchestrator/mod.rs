//! Download orchestration.
//!
//! [`OrchestrationMachine`] holds the transition table as a pure reducer;
//! [`DownloadController`] owns one machine, executes its effects against a
//! [`RemoteService`](crate::client::RemoteService) and the progress estimator,
//! and publishes a [`Snapshot`] after every change.

mod controller;
mod machine;
mod state;

pub use controller::{
    ControllerConfig, ControllerError, ControllerHandle, DownloadController, SubmitOutcome,
    DEFAULT_COMMAND_CAPACITY,
};
pub use machine::{Effect, Event, OrchestrationMachine};
pub use state::{Epoch, OrchestrationState, Snapshot};
