//! Bounded-concurrency submission pipeline
//!
//! Takes normalized rows in file order and issues them as asynchronous
//! insertion requests with a bounded in-flight window, folding every
//! completion into the failure tracker exactly once.
//!
//! - [`tracker`] - Run state machine (Running/Aborting/Drained) and counters
//! - [`submitter`] - The submission loop with backpressure and drain

pub mod submitter;
pub mod tracker;

pub use submitter::run_submissions;
pub use tracker::{FailureTracker, RunState, TrackerSnapshot};
