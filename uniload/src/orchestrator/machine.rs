//! Transition table for one download controller.
//!
//! [`OrchestrationMachine`] is a pure reducer: [`apply`](OrchestrationMachine::apply)
//! mutates the record for one [`Event`] and returns the [`Effect`]s the caller
//! must carry out. It performs no I/O and never fails; any event that does not
//! fit the current state is ignored.
//!
//! ```text
//!            submit                 metadataReceived            downloadReceived
//!   Idle ────────────► Fetching ───────────────────► Downloading ─────────────► Completed
//!    ▲                 Metadata                          │                          │
//!    │                    │ metadataFailed               │ downloadFailed           │
//!    │                    ▼                              ▼                          │
//!    └──── urlEdited ─── Failed ◄────────────────────────┘                          │
//!    └──── urlEdited ───────────────────────────────────────────────────────────────┘
//! ```

use crate::model::{DownloadRequest, DownloadTicket, ErrorInfo, Phase, VideoMetadata};
use crate::platform;
use crate::progress::{advance_estimate, DEFAULT_CEILING, MAX_CEILING};

use super::state::{Epoch, OrchestrationState, Snapshot};

/// Inputs to the state machine.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    /// The user asked to start a cycle.
    Submit(DownloadRequest),
    MetadataReceived {
        epoch: Epoch,
        metadata: VideoMetadata,
    },
    MetadataFailed {
        epoch: Epoch,
        message: String,
    },
    DownloadReceived {
        epoch: Epoch,
        ticket: DownloadTicket,
    },
    DownloadFailed {
        epoch: Epoch,
        message: String,
    },
    /// One estimator tick proposing `increment` percent.
    ProgressTick {
        epoch: Epoch,
        increment: f64,
    },
    /// The user changed the URL field.
    UrlEdited(String),
}

impl Event {
    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Submit(_) => "submit",
            Event::MetadataReceived { .. } => "metadata-received",
            Event::MetadataFailed { .. } => "metadata-failed",
            Event::DownloadReceived { .. } => "download-received",
            Event::DownloadFailed { .. } => "download-failed",
            Event::ProgressTick { .. } => "progress-tick",
            Event::UrlEdited(_) => "url-edited",
        }
    }

    /// Epoch carried by asynchronous completions.
    fn epoch(&self) -> Option<Epoch> {
        match self {
            Event::MetadataReceived { epoch, .. }
            | Event::MetadataFailed { epoch, .. }
            | Event::DownloadReceived { epoch, .. }
            | Event::DownloadFailed { epoch, .. }
            | Event::ProgressTick { epoch, .. } => Some(*epoch),
            Event::Submit(_) | Event::UrlEdited(_) => None,
        }
    }
}

/// Work the owner of the machine must perform after a transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Call `fetch_metadata` and report back under `epoch`.
    FetchMetadata { epoch: Epoch, url: String },
    /// Start the progress estimator, tagging ticks with `epoch`.
    StartProgress { epoch: Epoch },
    /// Call `request_download` and report back under `epoch`.
    RequestDownload {
        epoch: Epoch,
        request: DownloadRequest,
    },
    /// Cancel the progress estimator.
    StopProgress,
}

/// The orchestration record and its transition function.
#[derive(Debug, Clone)]
pub struct OrchestrationMachine {
    state: OrchestrationState,
    request: Option<DownloadRequest>,
    metadata: Option<VideoMetadata>,
    progress: f64,
    error: Option<ErrorInfo>,
    retrieval_target: Option<String>,
    epoch: Epoch,
    progress_ceiling: f64,
}

impl Default for OrchestrationMachine {
    fn default() -> Self {
        Self::new(DEFAULT_CEILING)
    }
}

impl OrchestrationMachine {
    /// Create an idle machine whose estimate stalls at `progress_ceiling`.
    pub fn new(progress_ceiling: f64) -> Self {
        Self {
            state: OrchestrationState::Idle,
            request: None,
            metadata: None,
            progress: 0.0,
            error: None,
            retrieval_target: None,
            epoch: Epoch::default(),
            progress_ceiling: progress_ceiling.clamp(0.0, MAX_CEILING),
        }
    }

    pub fn state(&self) -> OrchestrationState {
        self.state
    }

    pub fn progress(&self) -> f64 {
        self.progress
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn metadata(&self) -> Option<&VideoMetadata> {
        self.metadata.as_ref()
    }

    pub fn error(&self) -> Option<&ErrorInfo> {
        self.error.as_ref()
    }

    /// Copy of the current record.
    pub fn snapshot(&self) -> Snapshot {
        Snapshot {
            state: self.state,
            request: self.request.clone(),
            metadata: self.metadata.clone(),
            progress: self.progress,
            error: self.error.clone(),
            retrieval_target: self.retrieval_target.clone(),
            epoch: self.epoch,
        }
    }

    /// Apply one event and return the effects to execute, in order.
    pub fn apply(&mut self, event: Event) -> Vec<Effect> {
        use OrchestrationState as S;

        let before = self.state;
        let name = event.name();

        if let Some(epoch) = event.epoch() {
            if epoch != self.epoch {
                tracing::debug!(event = name, stale = %epoch, current = %self.epoch, "Ignoring stale completion");
                return Vec::new();
            }
        }

        let effects = match (self.state, event) {
            (state, Event::Submit(request)) => self.on_submit(state, request),
            (S::FetchingMetadata, Event::MetadataReceived { metadata, .. }) => {
                self.on_metadata_received(metadata)
            }
            (S::FetchingMetadata, Event::MetadataFailed { message, .. }) => {
                self.fail(Phase::Metadata, message);
                Vec::new()
            }
            (S::Downloading, Event::DownloadReceived { ticket, .. }) => {
                self.progress = 100.0;
                self.retrieval_target = Some(ticket.retrieval_target);
                self.state = S::Completed;
                vec![Effect::StopProgress]
            }
            (S::Downloading, Event::DownloadFailed { message, .. }) => {
                self.fail(Phase::Download, message);
                vec![Effect::StopProgress]
            }
            (S::Downloading, Event::ProgressTick { increment, .. }) => {
                self.progress = advance_estimate(self.progress, increment, self.progress_ceiling);
                Vec::new()
            }
            (S::Completed | S::Failed, Event::UrlEdited(url)) => {
                self.on_url_edited(url);
                Vec::new()
            }
            (state, _) => {
                tracing::trace!(event = name, %state, "Event does not apply");
                Vec::new()
            }
        };

        if before != self.state {
            tracing::info!(
                from = %before,
                to = %self.state,
                epoch = %self.epoch,
                event = name,
                "Orchestration transition"
            );
        }

        effects
    }

    fn on_submit(&mut self, state: OrchestrationState, request: DownloadRequest) -> Vec<Effect> {
        if !request.is_submittable() {
            tracing::debug!(%state, "Ignoring submit with empty URL");
            return Vec::new();
        }
        if state.is_in_flight() {
            tracing::debug!(%state, epoch = %self.epoch, "Ignoring submit while a request is in flight");
            return Vec::new();
        }

        let url = request.trimmed_url().to_string();
        let request = DownloadRequest {
            url: url.clone(),
            ..request
        };

        self.epoch = self.epoch.next();
        self.request = Some(request);
        self.metadata = None;
        self.error = None;
        self.retrieval_target = None;
        self.progress = 0.0;
        self.state = OrchestrationState::FetchingMetadata;

        vec![Effect::FetchMetadata {
            epoch: self.epoch,
            url,
        }]
    }

    fn on_metadata_received(&mut self, mut metadata: VideoMetadata) -> Vec<Effect> {
        let Some(request) = self.request.clone() else {
            tracing::warn!("Metadata arrived without a request; ignoring");
            return Vec::new();
        };

        if metadata.platform_label.trim().is_empty() {
            metadata.platform_label = platform::detect(&request.url).to_string();
        }
        tracing::debug!(
            title = metadata.display_title(),
            platform = %metadata.platform_label,
            "Metadata received"
        );

        self.metadata = Some(metadata);
        self.state = OrchestrationState::Downloading;

        vec![
            Effect::StartProgress { epoch: self.epoch },
            Effect::RequestDownload {
                epoch: self.epoch,
                request,
            },
        ]
    }

    fn fail(&mut self, phase: Phase, message: String) {
        tracing::warn!(%phase, message = %message, epoch = %self.epoch, "Orchestration failed");
        self.error = Some(ErrorInfo::new(phase, message));
        self.state = OrchestrationState::Failed;
    }

    fn on_url_edited(&mut self, url: String) {
        if let Some(request) = self.request.as_mut() {
            request.url = url;
        }
        self.metadata = None;
        self.error = None;
        self.retrieval_target = None;
        self.progress = 0.0;
        self.state = OrchestrationState::Idle;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{MediaFormat, Quality};

    fn request(url: &str) -> DownloadRequest {
        DownloadRequest::video(url, Quality::High)
    }

    fn meta(platform: &str) -> VideoMetadata {
        VideoMetadata {
            title: Some("Clip".to_string()),
            platform_label: platform.to_string(),
            ..Default::default()
        }
    }

    fn ticket() -> DownloadTicket {
        DownloadTicket {
            retrieval_target: "http://localhost:5000/downloads/1.mp4".to_string(),
        }
    }

    /// Drive a machine into Downloading and return it with its epoch.
    fn downloading() -> (OrchestrationMachine, Epoch) {
        let mut m = OrchestrationMachine::default();
        m.apply(Event::Submit(request("https://youtu.be/abc")));
        let epoch = m.epoch();
        m.apply(Event::MetadataReceived {
            epoch,
            metadata: meta("Youtube"),
        });
        assert_eq!(m.state(), OrchestrationState::Downloading);
        (m, epoch)
    }

    #[test]
    fn test_initial_state() {
        let m = OrchestrationMachine::default();
        assert_eq!(m.state(), OrchestrationState::Idle);
        assert_eq!(m.progress(), 0.0);
        assert_eq!(m.epoch(), Epoch::default());
    }

    #[test]
    fn test_submit_empty_url_is_noop() {
        let mut m = OrchestrationMachine::default();
        assert!(m.apply(Event::Submit(request(""))).is_empty());
        assert!(m.apply(Event::Submit(request("   "))).is_empty());
        assert_eq!(m.state(), OrchestrationState::Idle);
        assert_eq!(m.epoch(), Epoch::default());
    }

    #[test]
    fn test_submit_starts_fetch() {
        let mut m = OrchestrationMachine::default();
        let effects = m.apply(Event::Submit(request("  https://youtu.be/abc ")));

        assert_eq!(m.state(), OrchestrationState::FetchingMetadata);
        assert_eq!(
            effects,
            vec![Effect::FetchMetadata {
                epoch: Epoch::new(1),
                url: "https://youtu.be/abc".to_string(),
            }]
        );
        assert_eq!(m.snapshot().request.unwrap().url, "https://youtu.be/abc");
    }

    #[test]
    fn test_happy_path() {
        let mut m = OrchestrationMachine::default();
        m.apply(Event::Submit(request("https://youtu.be/abc")));
        let epoch = m.epoch();

        let effects = m.apply(Event::MetadataReceived {
            epoch,
            metadata: meta("Youtube"),
        });
        assert_eq!(m.state(), OrchestrationState::Downloading);
        assert_eq!(
            effects,
            vec![
                Effect::StartProgress { epoch },
                Effect::RequestDownload {
                    epoch,
                    request: request("https://youtu.be/abc"),
                },
            ]
        );

        m.apply(Event::ProgressTick {
            epoch,
            increment: 1.5,
        });
        assert_eq!(m.progress(), 1.5);

        let effects = m.apply(Event::DownloadReceived {
            epoch,
            ticket: ticket(),
        });
        assert_eq!(effects, vec![Effect::StopProgress]);
        assert_eq!(m.state(), OrchestrationState::Completed);
        assert_eq!(m.progress(), 100.0);
        assert_eq!(
            m.snapshot().retrieval_target.as_deref(),
            Some("http://localhost:5000/downloads/1.mp4")
        );
    }

    #[test]
    fn test_metadata_failure() {
        let mut m = OrchestrationMachine::default();
        m.apply(Event::Submit(request("https://nope")));
        let epoch = m.epoch();

        let effects = m.apply(Event::MetadataFailed {
            epoch,
            message: "bad url".to_string(),
        });

        assert!(effects.is_empty(), "estimator was never started");
        assert_eq!(m.state(), OrchestrationState::Failed);
        let error = m.error().unwrap();
        assert_eq!(error.message, "bad url");
        assert_eq!(error.phase, Phase::Metadata);
    }

    #[test]
    fn test_download_failure_stops_estimator() {
        let (mut m, epoch) = downloading();
        let effects = m.apply(Event::DownloadFailed {
            epoch,
            message: "Server Error: boom".to_string(),
        });

        assert_eq!(effects, vec![Effect::StopProgress]);
        assert_eq!(m.state(), OrchestrationState::Failed);
        assert_eq!(m.error().unwrap().phase, Phase::Download);
        assert!(m.metadata().is_some(), "metadata kept for display");
    }

    #[test]
    fn test_submit_while_in_flight_is_ignored() {
        let mut m = OrchestrationMachine::default();
        m.apply(Event::Submit(request("https://youtu.be/a")));
        let before = m.snapshot();

        assert!(m.apply(Event::Submit(request("https://youtu.be/b"))).is_empty());
        assert_eq!(m.snapshot(), before);

        let (mut m, _) = downloading();
        let before = m.snapshot();
        assert!(m.apply(Event::Submit(request("https://youtu.be/b"))).is_empty());
        assert_eq!(m.snapshot(), before);
    }

    #[test]
    fn test_platform_detected_when_service_omits_it() {
        let mut m = OrchestrationMachine::default();
        m.apply(Event::Submit(request("https://tiktok.com/@x/video/1")));
        let epoch = m.epoch();
        m.apply(Event::MetadataReceived {
            epoch,
            metadata: meta(""),
        });
        assert_eq!(m.metadata().unwrap().platform_label, "TikTok");
    }

    #[test]
    fn test_service_platform_label_is_kept() {
        let (m, _) = downloading();
        assert_eq!(m.metadata().unwrap().platform_label, "Youtube");
    }

    #[test]
    fn test_progress_stalls_below_ceiling() {
        let (mut m, epoch) = downloading();
        for _ in 0..200 {
            m.apply(Event::ProgressTick {
                epoch,
                increment: 1.9,
            });
        }
        assert_eq!(m.progress(), DEFAULT_CEILING);
        assert!(m.progress() < 100.0);
    }

    #[test]
    fn test_url_edited_returns_to_idle() {
        let mut m = OrchestrationMachine::default();
        m.apply(Event::Submit(DownloadRequest::new(
            "https://nope",
            MediaFormat::Audio,
            Quality::Low,
        )));
        let epoch = m.epoch();
        m.apply(Event::MetadataFailed {
            epoch,
            message: "bad url".to_string(),
        });

        m.apply(Event::UrlEdited("https://youtu.be/fixed".to_string()));

        let snapshot = m.snapshot();
        assert_eq!(snapshot.state, OrchestrationState::Idle);
        assert!(snapshot.error.is_none());
        assert!(snapshot.metadata.is_none());
        let kept = snapshot.request.unwrap();
        assert_eq!(kept.url, "https://youtu.be/fixed");
        assert_eq!(kept.format, MediaFormat::Audio);
        assert_eq!(kept.quality, Quality::Low);
    }

    #[test]
    fn test_url_edited_after_completion() {
        let (mut m, epoch) = downloading();
        m.apply(Event::DownloadReceived {
            epoch,
            ticket: ticket(),
        });
        m.apply(Event::UrlEdited(String::new()));
        assert_eq!(m.state(), OrchestrationState::Idle);
        assert!(m.snapshot().retrieval_target.is_none());
    }

    #[test]
    fn test_url_edited_is_ignored_outside_terminal_states() {
        let mut m = OrchestrationMachine::default();
        m.apply(Event::UrlEdited("x".to_string()));
        assert_eq!(m.state(), OrchestrationState::Idle);

        let (mut m, _) = downloading();
        m.apply(Event::UrlEdited("x".to_string()));
        assert_eq!(m.state(), OrchestrationState::Downloading);
    }

    #[test]
    fn test_resubmit_from_terminal_state_starts_new_epoch() {
        let (mut m, epoch) = downloading();
        m.apply(Event::DownloadFailed {
            epoch,
            message: "boom".to_string(),
        });

        let effects = m.apply(Event::Submit(request("https://youtu.be/again")));
        assert_eq!(m.state(), OrchestrationState::FetchingMetadata);
        assert_eq!(m.epoch(), epoch.next());
        assert_eq!(m.progress(), 0.0);
        assert!(m.error().is_none());
        assert_eq!(effects.len(), 1);
    }

    #[test]
    fn test_stale_completions_are_ignored() {
        let (mut m, old_epoch) = downloading();
        m.apply(Event::DownloadFailed {
            epoch: old_epoch,
            message: "boom".to_string(),
        });
        m.apply(Event::Submit(request("https://youtu.be/again")));
        let before = m.snapshot();

        for event in [
            Event::MetadataReceived {
                epoch: old_epoch,
                metadata: meta("Old"),
            },
            Event::MetadataFailed {
                epoch: old_epoch,
                message: "old".to_string(),
            },
            Event::ProgressTick {
                epoch: old_epoch,
                increment: 1.0,
            },
        ] {
            assert!(m.apply(event).is_empty());
        }
        assert_eq!(m.snapshot(), before);
    }

    #[test]
    fn test_unlisted_pairs_are_noops() {
        let mut m = OrchestrationMachine::default();
        let epoch = m.epoch();
        let events = [
            Event::MetadataReceived {
                epoch,
                metadata: meta("x"),
            },
            Event::DownloadReceived {
                epoch,
                ticket: ticket(),
            },
            Event::DownloadFailed {
                epoch,
                message: "x".to_string(),
            },
            Event::ProgressTick {
                epoch,
                increment: 5.0,
            },
        ];
        for event in events {
            assert!(m.apply(event).is_empty());
            assert_eq!(m.state(), OrchestrationState::Idle);
            assert_eq!(m.progress(), 0.0);
        }

        // Download completion while still fetching metadata.
        m.apply(Event::Submit(request("https://youtu.be/a")));
        let epoch = m.epoch();
        assert!(m
            .apply(Event::DownloadReceived {
                epoch,
                ticket: ticket(),
            })
            .is_empty());
        assert_eq!(m.state(), OrchestrationState::FetchingMetadata);
    }

    #[test]
    fn test_ceiling_is_clamped_below_completion() {
        let mut m = OrchestrationMachine::new(250.0);
        m.apply(Event::Submit(request("https://youtu.be/a")));
        let epoch = m.epoch();
        m.apply(Event::MetadataReceived {
            epoch,
            metadata: meta("x"),
        });
        m.apply(Event::ProgressTick {
            epoch,
            increment: 500.0,
        });
        assert_eq!(m.progress(), MAX_CEILING);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn progress_never_decreases_or_completes_early(
                increments in proptest::collection::vec(-5.0f64..10.0, 0..300)
            ) {
                let (mut m, epoch) = downloading();
                let mut last = m.progress();
                for increment in increments {
                    m.apply(Event::ProgressTick { epoch, increment });
                    prop_assert!(m.progress() >= last);
                    prop_assert!(m.progress() < 100.0);
                    last = m.progress();
                }
                m.apply(Event::DownloadReceived { epoch, ticket: ticket() });
                prop_assert_eq!(m.progress(), 100.0);
            }
        }
    }
}
