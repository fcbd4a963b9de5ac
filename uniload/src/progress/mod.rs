//! Locally estimated progress for the download phase.
//!
//! The service offers no progress channel, so progress shown while a
//! conversion runs is an approximation driven by a timer (see
//! [`ProgressEstimator`]).

mod estimator;

pub use estimator::{
    advance_estimate, ProgressConfig, ProgressEstimator, TickCallback, DEFAULT_CEILING,
    DEFAULT_MAX_INCREMENT, DEFAULT_TICK_INTERVAL_MS, MAX_CEILING,
};
