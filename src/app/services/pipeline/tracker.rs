//! Failure tracking and the abort protocol
//!
//! The tracker owns the run's counters and its state machine. Completion
//! notifications arrive concurrently, so every counter update and the
//! Running→Aborting transition happen under one mutex; the abort decision is
//! therefore made exactly once, on the completion that crosses the
//! threshold.

use std::sync::Mutex;
use tracing::{debug, warn};

use crate::app::models::{FailedTuple, Rejection, SubmissionOutcome, SubmitOutcome};
use crate::constants::MAX_ITEMIZED_ERRORS;

/// Run lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Accepting new rows for submission
    Running,

    /// Threshold crossed: no new submissions; outstanding requests drain
    /// and their outcomes still count
    Aborting,

    /// Terminal: producer stopped and no requests outstanding
    Drained,
}

/// Snapshot of the counters, taken once the run has drained
#[derive(Debug, Clone)]
pub struct TrackerSnapshot {
    pub acknowledged: u64,
    pub failed: u64,
    pub rejected: u64,
    pub truncated: u64,
    pub aborted: bool,
    pub rejections: Vec<Rejection>,
    pub failures: Vec<FailedTuple>,
}

#[derive(Debug)]
struct Inner {
    state: RunState,
    acknowledged: u64,
    failed: u64,
    rejected: u64,
    truncated: u64,
    aborted: bool,
    rejections: Vec<Rejection>,
    failures: Vec<FailedTuple>,
}

/// Single writer for the run's counters and state transitions
#[derive(Debug)]
pub struct FailureTracker {
    abort_threshold: u64,
    inner: Mutex<Inner>,
}

impl FailureTracker {
    pub fn new(abort_threshold: u64) -> Self {
        Self {
            abort_threshold,
            inner: Mutex::new(Inner {
                state: RunState::Running,
                acknowledged: 0,
                failed: 0,
                rejected: 0,
                truncated: 0,
                aborted: false,
                rejections: Vec::new(),
                failures: Vec::new(),
            }),
        }
    }

    /// Whether the producer may still submit new rows
    pub fn is_accepting(&self) -> bool {
        self.inner.lock().unwrap().state == RunState::Running
    }

    /// Whether the run crossed the abort threshold at any point
    pub fn was_aborted(&self) -> bool {
        self.inner.lock().unwrap().aborted
    }

    /// Count a parse- or normalization-time rejection.
    ///
    /// Rejections never reach the store and do not count toward the abort
    /// threshold.
    pub fn record_rejection(&self, rejection: Rejection) {
        debug!(
            "Rejected line {}: {}",
            rejection.line_number, rejection.reason
        );
        let mut inner = self.inner.lock().unwrap();
        inner.rejected += 1;
        if inner.rejections.len() < MAX_ITEMIZED_ERRORS {
            inner.rejections.push(rejection);
        }
    }

    /// Count one submission outcome and return the state after recording.
    ///
    /// The failure that reaches the threshold performs the
    /// Running→Aborting transition; later failures from already-outstanding
    /// requests still count but cannot transition again.
    pub fn record_outcome(&self, outcome: SubmissionOutcome) -> RunState {
        let mut inner = self.inner.lock().unwrap();
        match outcome.outcome {
            SubmitOutcome::Accepted => {
                inner.acknowledged += 1;
            }
            SubmitOutcome::Failed(reason) => {
                inner.failed += 1;
                debug!("Line {} failed at the store: {}", outcome.line_number, reason);
                if inner.failures.len() < MAX_ITEMIZED_ERRORS {
                    inner.failures.push(FailedTuple {
                        line_number: outcome.line_number,
                        reason,
                    });
                }
                if inner.state == RunState::Running && inner.failed >= self.abort_threshold {
                    inner.state = RunState::Aborting;
                    inner.aborted = true;
                    warn!(
                        "Abort threshold of {} submission failures reached; no new rows will be submitted",
                        self.abort_threshold
                    );
                }
            }
        }
        inner.state
    }

    /// Count rows never attempted because the run aborted first
    pub fn record_truncated(&self, rows: u64) {
        self.inner.lock().unwrap().truncated += rows;
    }

    /// Terminal transition, once the producer has stopped and all
    /// outstanding requests have resolved
    pub fn mark_drained(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.state = RunState::Drained;
        debug!(
            "Drained: {} acknowledged, {} failed, {} rejected",
            inner.acknowledged, inner.failed, inner.rejected
        );
    }

    pub fn snapshot(&self) -> TrackerSnapshot {
        let inner = self.inner.lock().unwrap();
        TrackerSnapshot {
            acknowledged: inner.acknowledged,
            failed: inner.failed,
            rejected: inner.rejected,
            truncated: inner.truncated,
            aborted: inner.aborted,
            rejections: inner.rejections.clone(),
            failures: inner.failures.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::{RejectReason, Rejection};
    use std::sync::Arc;

    fn accepted(line: u64) -> SubmissionOutcome {
        SubmissionOutcome {
            line_number: line,
            outcome: SubmitOutcome::Accepted,
        }
    }

    fn failed(line: u64) -> SubmissionOutcome {
        SubmissionOutcome {
            line_number: line,
            outcome: SubmitOutcome::Failed("refused".to_string()),
        }
    }

    #[test]
    fn counts_accepted_and_failed_outcomes() {
        let tracker = FailureTracker::new(10);
        tracker.record_outcome(accepted(1));
        tracker.record_outcome(failed(2));
        tracker.record_outcome(accepted(3));

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.acknowledged, 2);
        assert_eq!(snapshot.failed, 1);
        assert_eq!(snapshot.failures[0].line_number, 2);
        assert!(!snapshot.aborted);
    }

    #[test]
    fn aborts_at_threshold_and_keeps_counting() {
        let tracker = FailureTracker::new(2);
        assert_eq!(tracker.record_outcome(failed(1)), RunState::Running);
        assert_eq!(tracker.record_outcome(failed(2)), RunState::Aborting);
        assert!(!tracker.is_accepting());

        // Outcomes of already-outstanding requests still count
        assert_eq!(tracker.record_outcome(failed(3)), RunState::Aborting);
        assert_eq!(tracker.record_outcome(accepted(4)), RunState::Aborting);

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.failed, 3);
        assert_eq!(snapshot.acknowledged, 1);
        assert!(snapshot.aborted);
    }

    #[test]
    fn rejections_do_not_trigger_abort() {
        let tracker = FailureTracker::new(1);
        for line in 1..=5 {
            tracker.record_rejection(Rejection::new(line, "", RejectReason::MalformedQuoting));
        }
        assert!(tracker.is_accepting());
        assert_eq!(tracker.snapshot().rejected, 5);
    }

    #[test]
    fn drained_is_terminal_state() {
        let tracker = FailureTracker::new(2);
        tracker.record_outcome(accepted(1));
        tracker.mark_drained();
        assert!(!tracker.is_accepting());
        assert!(!tracker.was_aborted());
    }

    #[test]
    fn no_increment_is_lost_under_concurrent_completions() {
        let tracker = Arc::new(FailureTracker::new(u64::MAX));
        let mut handles = Vec::new();
        for t in 0..8 {
            let tracker = Arc::clone(&tracker);
            handles.push(std::thread::spawn(move || {
                for i in 0..1000 {
                    if i % 2 == 0 {
                        tracker.record_outcome(accepted(t * 1000 + i));
                    } else {
                        tracker.record_outcome(failed(t * 1000 + i));
                    }
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.acknowledged, 4000);
        assert_eq!(snapshot.failed, 4000);
    }

    #[test]
    fn itemized_errors_are_capped() {
        let tracker = FailureTracker::new(u64::MAX);
        for line in 0..(MAX_ITEMIZED_ERRORS as u64 + 50) {
            tracker.record_outcome(failed(line));
        }
        let snapshot = tracker.snapshot();
        assert_eq!(snapshot.failures.len(), MAX_ITEMIZED_ERRORS);
        assert_eq!(snapshot.failed, MAX_ITEMIZED_ERRORS as u64 + 50);
    }
}
