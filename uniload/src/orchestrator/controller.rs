//! Async owner of one [`OrchestrationMachine`].
//!
//! The [`DownloadController`] runs a single event loop. Commands from
//! [`ControllerHandle`]s and completions from spawned remote calls and the
//! progress estimator all arrive as messages, so the orchestration record is
//! only ever touched by the loop and needs no lock.
//!
//! ```text
//!   ControllerHandle ──Command──►┐
//!                                │     ┌──────────────────────┐
//!   remote call task ──Event────►├────►│ OrchestrationMachine │──► Effects
//!   estimator task   ──Event────►┘     └──────────┬───────────┘
//!                                                 ▼
//!                                    watch::Sender<Snapshot> ──► observers
//! ```
//!
//! # Example
//!
//! ```ignore
//! let (controller, handle) = DownloadController::new(service, ControllerConfig::default());
//! let shutdown = CancellationToken::new();
//! tokio::spawn(controller.run(shutdown.clone()));
//!
//! if let SubmitOutcome::Accepted { epoch } = handle.submit(request).await? {
//!     let last = handle.follow_cycle(epoch, |s| println!("{}", s.state.caption())).await?;
//! }
//! ```

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::client::RemoteService;
use crate::model::DownloadRequest;
use crate::progress::{ProgressConfig, ProgressEstimator};

use super::machine::{Effect, Event, OrchestrationMachine};
use super::state::{Epoch, Snapshot};

/// Default capacity of the command channel.
pub const DEFAULT_COMMAND_CAPACITY: usize = 16;

/// Errors returned by a [`ControllerHandle`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ControllerError {
    /// The controller's event loop has exited.
    #[error("download controller has shut down")]
    Shutdown,
}

/// Configuration for a [`DownloadController`].
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Estimator tuning; its ceiling also bounds the machine's estimate.
    pub progress: ProgressConfig,

    /// Command channel capacity.
    pub command_capacity: usize,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            progress: ProgressConfig::default(),
            command_capacity: DEFAULT_COMMAND_CAPACITY,
        }
    }
}

/// Result of a submit command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// A new cycle started under `epoch`.
    Accepted { epoch: Epoch },
    /// The URL was empty or a cycle is already in flight.
    Ignored,
}

/// Messages from handles to the controller.
#[derive(Debug)]
enum Command {
    Submit {
        request: DownloadRequest,
        reply: oneshot::Sender<SubmitOutcome>,
    },
    EditUrl(String),
}

/// Event loop driving one orchestration record.
pub struct DownloadController<S: RemoteService> {
    machine: OrchestrationMachine,
    service: Arc<S>,
    estimator: ProgressEstimator,
    events_tx: mpsc::UnboundedSender<Event>,
    events_rx: mpsc::UnboundedReceiver<Event>,
    commands_rx: mpsc::Receiver<Command>,
    snapshot_tx: watch::Sender<Snapshot>,
    #[cfg(test)]
    ticks_emitted: Arc<std::sync::atomic::AtomicUsize>,
}

impl<S: RemoteService> DownloadController<S> {
    /// Creates a controller and the first handle to it.
    ///
    /// Nothing happens until [`run`](Self::run) is awaited.
    pub fn new(service: S, config: ControllerConfig) -> (Self, ControllerHandle) {
        Self::with_shared(Arc::new(service), config)
    }

    /// Like [`new`](Self::new) for a service that is already shared.
    pub fn with_shared(service: Arc<S>, config: ControllerConfig) -> (Self, ControllerHandle) {
        let machine = OrchestrationMachine::new(config.progress.ceiling);
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (commands_tx, commands_rx) = mpsc::channel(config.command_capacity.max(1));
        let (snapshot_tx, snapshot_rx) = watch::channel(machine.snapshot());

        let controller = Self {
            machine,
            service,
            estimator: ProgressEstimator::new(config.progress),
            events_tx,
            events_rx,
            commands_rx,
            snapshot_tx,
            #[cfg(test)]
            ticks_emitted: Arc::default(),
        };
        let handle = ControllerHandle {
            commands_tx,
            snapshot_rx,
        };

        (controller, handle)
    }

    /// Runs until `shutdown` is cancelled or every handle is dropped.
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("Download controller starting");

        loop {
            tokio::select! {
                biased;

                _ = shutdown.cancelled() => {
                    info!("Download controller shutting down");
                    break;
                }

                Some(event) = self.events_rx.recv() => {
                    self.dispatch(event);
                }

                command = self.commands_rx.recv() => match command {
                    Some(command) => self.handle_command(command),
                    None => {
                        debug!("All controller handles dropped");
                        break;
                    }
                },
            }
        }

        self.estimator.stop();
        info!(state = %self.machine.state(), "Download controller stopped");
    }

    /// Counter bumped by every estimator tick this controller receives.
    #[cfg(test)]
    fn tick_counter(&self) -> Arc<std::sync::atomic::AtomicUsize> {
        Arc::clone(&self.ticks_emitted)
    }

    fn handle_command(&mut self, command: Command) {
        match command {
            Command::Submit { request, reply } => {
                let before = self.machine.epoch();
                self.dispatch(Event::Submit(request));
                let epoch = self.machine.epoch();

                let outcome = if epoch != before {
                    SubmitOutcome::Accepted { epoch }
                } else {
                    SubmitOutcome::Ignored
                };
                // The caller may have stopped waiting; the cycle runs regardless.
                let _ = reply.send(outcome);
            }
            Command::EditUrl(url) => self.dispatch(Event::UrlEdited(url)),
        }
    }

    /// Apply one event, run its effects and publish the new snapshot.
    fn dispatch(&mut self, event: Event) {
        let effects = self.machine.apply(event);
        for effect in effects {
            self.execute(effect);
        }
        self.publish();
    }

    fn execute(&mut self, effect: Effect) {
        match effect {
            Effect::FetchMetadata { epoch, url } => {
                let service = Arc::clone(&self.service);
                let events_tx = self.events_tx.clone();
                tokio::spawn(async move {
                    let event = match service.fetch_metadata(&url).await {
                        Ok(metadata) => Event::MetadataReceived { epoch, metadata },
                        Err(e) => {
                            warn!(%epoch, error = %e, "Metadata request failed");
                            Event::MetadataFailed {
                                epoch,
                                message: e.user_message(),
                            }
                        }
                    };
                    post(&events_tx, event);
                });
            }
            Effect::RequestDownload { epoch, request } => {
                let service = Arc::clone(&self.service);
                let events_tx = self.events_tx.clone();
                tokio::spawn(async move {
                    let result = service
                        .request_download(&request.url, request.format, request.quality)
                        .await;
                    let event = match result {
                        Ok(ticket) => Event::DownloadReceived { epoch, ticket },
                        Err(e) => {
                            warn!(%epoch, error = %e, "Download request failed");
                            Event::DownloadFailed {
                                epoch,
                                message: e.user_message(),
                            }
                        }
                    };
                    post(&events_tx, event);
                });
            }
            Effect::StartProgress { epoch } => {
                let events_tx = self.events_tx.clone();
                #[cfg(test)]
                let ticks = Arc::clone(&self.ticks_emitted);
                self.estimator.start(Box::new(move |increment| {
                    #[cfg(test)]
                    ticks.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                    post(&events_tx, Event::ProgressTick { epoch, increment });
                }));
            }
            Effect::StopProgress => {
                self.estimator.stop();
            }
        }
    }

    fn publish(&self) {
        let next = self.machine.snapshot();
        self.snapshot_tx.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}

fn post(events_tx: &mpsc::UnboundedSender<Event>, event: Event) {
    if events_tx.send(event).is_err() {
        debug!("Controller stopped before completion was delivered");
    }
}

/// Cloneable handle for issuing commands and observing snapshots.
#[derive(Debug, Clone)]
pub struct ControllerHandle {
    commands_tx: mpsc::Sender<Command>,
    snapshot_rx: watch::Receiver<Snapshot>,
}

impl ControllerHandle {
    /// Ask the controller to start a cycle for `request`.
    pub async fn submit(
        &self,
        request: DownloadRequest,
    ) -> Result<SubmitOutcome, ControllerError> {
        let (reply, outcome) = oneshot::channel();
        self.commands_tx
            .send(Command::Submit { request, reply })
            .await
            .map_err(|_| ControllerError::Shutdown)?;
        outcome.await.map_err(|_| ControllerError::Shutdown)
    }

    /// Report that the user edited the URL field.
    pub async fn edit_url(&self, url: impl Into<String>) -> Result<(), ControllerError> {
        self.commands_tx
            .send(Command::EditUrl(url.into()))
            .await
            .map_err(|_| ControllerError::Shutdown)
    }

    /// A new receiver of published snapshots.
    pub fn subscribe(&self) -> watch::Receiver<Snapshot> {
        self.snapshot_rx.clone()
    }

    /// The most recently published snapshot.
    pub fn snapshot(&self) -> Snapshot {
        self.snapshot_rx.borrow().clone()
    }

    /// Wait until the cycle started under `epoch` settles.
    ///
    /// `observer` sees the current snapshot and then every change. Returns
    /// the settling snapshot, or [`ControllerError::Shutdown`] if the
    /// controller exits first.
    pub async fn follow_cycle<F>(
        &self,
        epoch: Epoch,
        mut observer: F,
    ) -> Result<Snapshot, ControllerError>
    where
        F: FnMut(&Snapshot),
    {
        let mut rx = self.subscribe();
        loop {
            let snapshot = rx.borrow_and_update().clone();
            observer(&snapshot);
            if snapshot.settles(epoch) {
                return Ok(snapshot);
            }
            rx.changed().await.map_err(|_| ControllerError::Shutdown)?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::{ServiceError, ServiceResult};
    use crate::model::{DownloadTicket, MediaFormat, Phase, Quality, VideoMetadata};
    use crate::orchestrator::OrchestrationState;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;

    /// Service that replays scripted results after fixed delays.
    struct ScriptedService {
        metadata: Mutex<VecDeque<ServiceResult<VideoMetadata>>>,
        downloads: Mutex<VecDeque<ServiceResult<DownloadTicket>>>,
        metadata_delay: Duration,
        download_delay: Duration,
        metadata_calls: AtomicUsize,
        download_calls: AtomicUsize,
    }

    impl ScriptedService {
        fn new() -> Self {
            Self {
                metadata: Mutex::new(VecDeque::new()),
                downloads: Mutex::new(VecDeque::new()),
                metadata_delay: Duration::from_millis(200),
                download_delay: Duration::from_secs(10),
                metadata_calls: AtomicUsize::new(0),
                download_calls: AtomicUsize::new(0),
            }
        }

        fn with_metadata(self, result: ServiceResult<VideoMetadata>) -> Self {
            self.metadata.lock().unwrap().push_back(result);
            self
        }

        fn with_download(self, result: ServiceResult<DownloadTicket>) -> Self {
            self.downloads.lock().unwrap().push_back(result);
            self
        }
    }

    impl RemoteService for ScriptedService {
        async fn fetch_metadata(&self, _url: &str) -> ServiceResult<VideoMetadata> {
            self.metadata_calls.fetch_add(1, Ordering::SeqCst);
            let result = self.metadata.lock().unwrap().pop_front();
            tokio::time::sleep(self.metadata_delay).await;
            result.unwrap_or_else(|| Ok(VideoMetadata::default()))
        }

        async fn request_download(
            &self,
            _url: &str,
            _format: MediaFormat,
            _quality: Quality,
        ) -> ServiceResult<DownloadTicket> {
            self.download_calls.fetch_add(1, Ordering::SeqCst);
            let result = self.downloads.lock().unwrap().pop_front();
            tokio::time::sleep(self.download_delay).await;
            result.unwrap_or_else(|| {
                Ok(DownloadTicket {
                    retrieval_target: "http://localhost:5000/downloads/x.mp4".to_string(),
                })
            })
        }
    }

    fn clip() -> VideoMetadata {
        VideoMetadata {
            title: Some("Clip".to_string()),
            duration: Some("3:45".to_string()),
            platform_label: "Youtube".to_string(),
            ..Default::default()
        }
    }

    fn start(
        service: ScriptedService,
    ) -> (Arc<ScriptedService>, ControllerHandle, CancellationToken) {
        let service = Arc::new(service);
        let (controller, handle) =
            DownloadController::with_shared(Arc::clone(&service), ControllerConfig::default());
        let shutdown = CancellationToken::new();
        tokio::spawn(controller.run(shutdown.clone()));
        (service, handle, shutdown)
    }

    /// Like [`start`], also returning the controller's tick counter.
    fn start_counting(
        service: ScriptedService,
    ) -> (
        ControllerHandle,
        CancellationToken,
        Arc<AtomicUsize>,
        tokio::task::JoinHandle<()>,
    ) {
        let (controller, handle) = DownloadController::new(service, ControllerConfig::default());
        let ticks = controller.tick_counter();
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(controller.run(shutdown.clone()));
        (handle, shutdown, ticks, task)
    }

    /// Asserts no further estimator ticks arrive.
    async fn assert_ticks_stopped(ticks: &AtomicUsize) {
        let seen = ticks.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), seen, "estimator still ticking");
    }

    fn accepted(outcome: SubmitOutcome) -> Epoch {
        match outcome {
            SubmitOutcome::Accepted { epoch } => epoch,
            SubmitOutcome::Ignored => panic!("submit was ignored"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_happy_path() {
        let (service, handle, shutdown) = start(
            ScriptedService::new()
                .with_metadata(Ok(clip()))
                .with_download(Ok(DownloadTicket {
                    retrieval_target: "http://localhost:5000/downloads/1.mp4".to_string(),
                })),
        );

        let epoch = accepted(
            handle
                .submit(DownloadRequest::video("https://youtu.be/abc", Quality::High))
                .await
                .unwrap(),
        );

        let mut states = Vec::new();
        let mut downloading_progress = Vec::new();
        let last = handle
            .follow_cycle(epoch, |s| {
                if states.last() != Some(&s.state) {
                    states.push(s.state);
                }
                if s.state == OrchestrationState::Downloading {
                    downloading_progress.push(s.progress);
                }
            })
            .await
            .unwrap();

        assert_eq!(
            states,
            vec![
                OrchestrationState::FetchingMetadata,
                OrchestrationState::Downloading,
                OrchestrationState::Completed,
            ]
        );
        assert_eq!(last.progress, 100.0);
        assert_eq!(
            last.retrieval_target.as_deref(),
            Some("http://localhost:5000/downloads/1.mp4")
        );
        assert_eq!(last.metadata.unwrap().display_title(), "Clip");
        assert!(downloading_progress.windows(2).all(|w| w[1] >= w[0]));
        assert!(downloading_progress.iter().all(|p| *p < 100.0));
        assert_eq!(service.metadata_calls.load(Ordering::SeqCst), 1);
        assert_eq!(service.download_calls.load(Ordering::SeqCst), 1);

        shutdown.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_empty_submit_is_ignored() {
        let (service, handle, shutdown) = start(ScriptedService::new());

        let outcome = handle.submit(DownloadRequest::audio("   ")).await.unwrap();
        assert_eq!(outcome, SubmitOutcome::Ignored);
        assert_eq!(handle.snapshot().state, OrchestrationState::Idle);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(service.metadata_calls.load(Ordering::SeqCst), 0);

        shutdown.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_resubmit_while_in_flight_is_ignored() {
        let (service, handle, shutdown) = start(ScriptedService::new().with_metadata(Ok(clip())));

        let request = DownloadRequest::video("https://youtu.be/abc", Quality::Medium);
        let epoch = accepted(handle.submit(request.clone()).await.unwrap());
        assert_eq!(handle.submit(request).await.unwrap(), SubmitOutcome::Ignored);

        let last = handle.follow_cycle(epoch, |_| {}).await.unwrap();
        assert_eq!(last.state, OrchestrationState::Completed);
        assert_eq!(service.metadata_calls.load(Ordering::SeqCst), 1);
        assert_eq!(service.download_calls.load(Ordering::SeqCst), 1);

        shutdown.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_metadata_failure_skips_download() {
        let (service, handle, shutdown) = start(ScriptedService::new().with_metadata(Err(
            ServiceError::Application {
                phase: Phase::Metadata,
                message: "bad url".to_string(),
            },
        )));

        let epoch = accepted(handle.submit(DownloadRequest::audio("https://nope")).await.unwrap());
        let last = handle.follow_cycle(epoch, |_| {}).await.unwrap();

        assert_eq!(last.state, OrchestrationState::Failed);
        let error = last.error.unwrap();
        assert_eq!(error.message, "bad url");
        assert_eq!(error.phase, Phase::Metadata);
        assert_eq!(service.download_calls.load(Ordering::SeqCst), 0);

        shutdown.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_download_failure_stops_progress() {
        let (handle, shutdown, ticks, _task) = start_counting(
            ScriptedService::new()
                .with_metadata(Ok(clip()))
                .with_download(Err(ServiceError::Http {
                    phase: Phase::Download,
                    status: 500,
                    message: None,
                })),
        );

        let epoch = accepted(
            handle
                .submit(DownloadRequest::video("https://youtu.be/abc", Quality::Ultra))
                .await
                .unwrap(),
        );
        let last = handle.follow_cycle(epoch, |_| {}).await.unwrap();
        assert_eq!(last.state, OrchestrationState::Failed);
        assert_eq!(
            last.error.as_ref().unwrap().message,
            "Download failed from server."
        );
        assert!(ticks.load(Ordering::SeqCst) > 0);

        assert_ticks_stopped(&ticks).await;
        assert_eq!(handle.snapshot().progress, last.progress);

        shutdown.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_completion_stops_progress() {
        let (handle, shutdown, ticks, _task) =
            start_counting(ScriptedService::new().with_metadata(Ok(clip())));

        let epoch = accepted(
            handle
                .submit(DownloadRequest::video("https://youtu.be/abc", Quality::High))
                .await
                .unwrap(),
        );
        let last = handle.follow_cycle(epoch, |_| {}).await.unwrap();
        assert_eq!(last.state, OrchestrationState::Completed);
        // Ten seconds of download at 800ms per tick.
        assert!(ticks.load(Ordering::SeqCst) >= 10);

        assert_ticks_stopped(&ticks).await;

        shutdown.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_while_downloading_stops_progress() {
        let (handle, shutdown, ticks, task) =
            start_counting(ScriptedService::new().with_metadata(Ok(clip())));

        accepted(
            handle
                .submit(DownloadRequest::audio("https://youtu.be/abc"))
                .await
                .unwrap(),
        );
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(handle.snapshot().state, OrchestrationState::Downloading);
        assert!(ticks.load(Ordering::SeqCst) > 0);

        shutdown.cancel();
        task.await.unwrap();

        assert_ticks_stopped(&ticks).await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_edit_url_after_failure_resets() {
        let (_service, handle, shutdown) = start(ScriptedService::new().with_metadata(Err(
            ServiceError::Application {
                phase: Phase::Metadata,
                message: "bad url".to_string(),
            },
        )));

        let epoch = accepted(handle.submit(DownloadRequest::audio("https://nope")).await.unwrap());
        handle.follow_cycle(epoch, |_| {}).await.unwrap();

        let mut rx = handle.subscribe();
        rx.borrow_and_update();
        handle.edit_url("https://youtu.be/fixed").await.unwrap();
        rx.changed().await.unwrap();

        let snapshot = rx.borrow().clone();
        assert_eq!(snapshot.state, OrchestrationState::Idle);
        assert!(snapshot.error.is_none());
        assert_eq!(snapshot.request.unwrap().url, "https://youtu.be/fixed");

        shutdown.cancel();
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_rejects_commands() {
        let service = ScriptedService::new();
        let (controller, handle) = DownloadController::new(service, ControllerConfig::default());
        let shutdown = CancellationToken::new();
        let task = tokio::spawn(controller.run(shutdown.clone()));

        shutdown.cancel();
        task.await.unwrap();

        let err = handle
            .submit(DownloadRequest::audio("https://youtu.be/abc"))
            .await
            .unwrap_err();
        assert_eq!(err, ControllerError::Shutdown);
    }

    #[tokio::test(start_paused = true)]
    async fn test_follow_cycle_reports_shutdown() {
        let (_service, handle, shutdown) = start(ScriptedService::new());

        let epoch = accepted(
            handle
                .submit(DownloadRequest::audio("https://youtu.be/abc"))
                .await
                .unwrap(),
        );
        let follower = handle.clone();
        let follow = tokio::spawn(async move { follower.follow_cycle(epoch, |_| {}).await });

        tokio::time::sleep(Duration::from_millis(500)).await;
        shutdown.cancel();

        assert_eq!(follow.await.unwrap(), Err(ControllerError::Shutdown));
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_exits_when_handles_dropped() {
        let (controller, handle) =
            DownloadController::new(ScriptedService::new(), ControllerConfig::default());
        let task = tokio::spawn(controller.run(CancellationToken::new()));

        drop(handle);
        tokio::time::timeout(Duration::from_secs(1), task)
            .await
            .expect("controller should stop")
            .unwrap();
    }
}
