//! Orchestration state and the snapshot published to observers.

use std::fmt;

use crate::model::{DownloadRequest, ErrorInfo, VideoMetadata};

/// Where a controller is in its cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum OrchestrationState {
    /// Waiting for a request.
    #[default]
    Idle,
    /// `/api/info` is outstanding.
    FetchingMetadata,
    /// `/api/download` is outstanding; the estimator is running.
    Downloading,
    /// The file is ready at the retrieval target.
    Completed,
    /// One of the two calls failed.
    Failed,
}

impl OrchestrationState {
    /// Whether a remote call is outstanding.
    pub fn is_in_flight(&self) -> bool {
        matches!(
            self,
            OrchestrationState::FetchingMetadata | OrchestrationState::Downloading
        )
    }

    /// Whether the current cycle has ended.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OrchestrationState::Completed | OrchestrationState::Failed
        )
    }

    /// Status line for the presentation layer.
    pub fn caption(&self) -> &'static str {
        match self {
            OrchestrationState::Idle => "Ready",
            OrchestrationState::FetchingMetadata => "Fetching Metadata...",
            OrchestrationState::Downloading => "Downloading on Server...",
            OrchestrationState::Completed => "File downloaded successfully.",
            OrchestrationState::Failed => "Download failed.",
        }
    }
}

impl fmt::Display for OrchestrationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrchestrationState::Idle => write!(f, "idle"),
            OrchestrationState::FetchingMetadata => write!(f, "fetching-metadata"),
            OrchestrationState::Downloading => write!(f, "downloading"),
            OrchestrationState::Completed => write!(f, "completed"),
            OrchestrationState::Failed => write!(f, "failed"),
        }
    }
}

/// Identifier of one accepted submission.
///
/// Asynchronous completions carry the epoch they were issued under; anything
/// tagged with an older epoch is stale and ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Epoch(u64);

impl Epoch {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    /// The epoch following this one.
    pub fn next(&self) -> Self {
        Self(self.0.wrapping_add(1))
    }
}

impl fmt::Display for Epoch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Point-in-time copy of a controller's record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Snapshot {
    pub state: OrchestrationState,
    /// Last submitted request; kept after a cycle so its fields can be edited.
    pub request: Option<DownloadRequest>,
    pub metadata: Option<VideoMetadata>,
    /// Percent in `[0, 100]`.
    pub progress: f64,
    pub error: Option<ErrorInfo>,
    /// Set only in [`OrchestrationState::Completed`].
    pub retrieval_target: Option<String>,
    pub epoch: Epoch,
}

impl Snapshot {
    /// Progress rounded for display.
    pub fn progress_percent(&self) -> u64 {
        self.progress.clamp(0.0, 100.0).round() as u64
    }

    /// Whether this snapshot ends the cycle started under `epoch`.
    ///
    /// A snapshot from a later epoch also counts, since the earlier cycle
    /// can no longer make progress.
    pub fn settles(&self, epoch: Epoch) -> bool {
        self.epoch > epoch || (self.epoch == epoch && self.state.is_terminal())
    }
}
