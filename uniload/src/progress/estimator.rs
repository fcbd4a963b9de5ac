//! Synthetic progress for remote work that reports none.
//!
//! The conversion service answers the download call only once the file is
//! ready. While that call is pending, [`ProgressEstimator`] runs a background
//! task that proposes small random increments at a fixed interval. The owner
//! folds those into the displayed value with [`advance_estimate`], which caps
//! the result at a ceiling below 100 so the bar stalls until the real
//! completion arrives.

use std::time::Duration;

use rand::Rng;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;

/// Default tick interval in milliseconds.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 800;

/// Default upper bound (exclusive) of a single increment, in percent.
pub const DEFAULT_MAX_INCREMENT: f64 = 2.0;

/// Default value the estimate stalls at.
pub const DEFAULT_CEILING: f64 = 90.0;

/// Highest ceiling accepted. 100 is reserved for real completion.
pub const MAX_CEILING: f64 = 99.0;

/// Callback invoked with each proposed increment.
pub type TickCallback = Box<dyn Fn(f64) + Send + Sync>;

/// Tuning for the estimator.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProgressConfig {
    /// Time between ticks.
    pub interval: Duration,
    /// Exclusive upper bound of one increment.
    pub max_increment: f64,
    /// Value the estimate never exceeds.
    pub ceiling: f64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
            max_increment: DEFAULT_MAX_INCREMENT,
            ceiling: DEFAULT_CEILING,
        }
    }
}

impl ProgressConfig {
    /// Set the tick interval. Zero is raised to one millisecond.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval.max(Duration::from_millis(1));
        self
    }

    /// Set the maximum increment. Negative values become zero.
    pub fn with_max_increment(mut self, max_increment: f64) -> Self {
        self.max_increment = max_increment.max(0.0);
        self
    }

    /// Set the ceiling, clamped to `[0, MAX_CEILING]`.
    pub fn with_ceiling(mut self, ceiling: f64) -> Self {
        self.ceiling = ceiling.clamp(0.0, MAX_CEILING);
        self
    }
}

/// Fold one increment into the current estimate.
///
/// The result never decreases and never exceeds `ceiling`.
pub fn advance_estimate(current: f64, increment: f64, ceiling: f64) -> f64 {
    if !increment.is_finite() || increment <= 0.0 {
        return current;
    }
    (current + increment).min(ceiling).max(current)
}

fn sample_increment(max_increment: f64) -> f64 {
    if max_increment <= 0.0 {
        return 0.0;
    }
    rand::rng().random_range(0.0..max_increment)
}

/// Handle to the running tick task.
struct RunningTicker {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

/// Periodic increment generator with an explicit start/stop lifecycle.
///
/// At most one tick task runs at a time. Dropping the estimator cancels it.
pub struct ProgressEstimator {
    config: ProgressConfig,
    running: Option<RunningTicker>,
}

impl ProgressEstimator {
    /// Create a stopped estimator.
    pub fn new(config: ProgressConfig) -> Self {
        Self {
            config,
            running: None,
        }
    }

    /// The estimator's configuration.
    pub fn config(&self) -> &ProgressConfig {
        &self.config
    }

    /// Whether a tick task is currently running.
    pub fn is_running(&self) -> bool {
        self.running.is_some()
    }

    /// Start ticking, replacing any task that is already running.
    ///
    /// Must be called from within a Tokio runtime. The first tick fires one
    /// full interval after start.
    pub fn start(&mut self, on_tick: TickCallback) {
        if self.stop() {
            tracing::warn!("Progress estimator restarted while running");
        }

        let cancel = CancellationToken::new();
        let task_cancel = cancel.clone();
        let period = self.config.interval;
        let max_increment = self.config.max_increment;

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    _ = task_cancel.cancelled() => break,
                    _ = ticker.tick() => on_tick(sample_increment(max_increment)),
                }
            }
        });

        tracing::debug!(
            interval_ms = period.as_millis() as u64,
            max_increment,
            "Progress estimator started"
        );
        self.running = Some(RunningTicker { cancel, handle });
    }

    /// Stop ticking. Returns `true` if a task was running.
    pub fn stop(&mut self) -> bool {
        match self.running.take() {
            Some(running) => {
                running.cancel.cancel();
                running.handle.abort();
                tracing::debug!("Progress estimator stopped");
                true
            }
            None => false,
        }
    }
}

impl Default for ProgressEstimator {
    fn default() -> Self {
        Self::new(ProgressConfig::default())
    }
}

impl Drop for ProgressEstimator {
    fn drop(&mut self) {
        self.stop();
    }
}
