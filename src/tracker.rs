//! # Batch Progress Tracker Module
//!
//! Process-wide counters for in-flight batch state: whether a batch is
//! running and how many images are still awaiting a terminal outcome.
//!
//! `try_start` is the duplicate-run guard: a second batch attempt while one
//! is running is rejected with the current pending count so the caller can
//! report it. The guard is cooperative; if a batch crashes before reaching
//! `finish`, the tracker stays `Running` and an explicit `reset` is the only
//! recovery (no heartbeat or staleness timeout exists).

use std::sync::Arc;
use tokio::sync::Mutex;

/// Batch status as seen by callers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Idle,
    Running,
}

#[derive(Debug)]
struct BatchState {
    status: BatchStatus,
    pending: usize,
}

/// Result of a `try_start` attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartAttempt {
    /// The tracker switched to `Running`; the caller owns the batch.
    Started,
    /// A batch is already in flight; `pending` images still await compression.
    AlreadyRunning { pending: usize },
}

/// Tracks whether a batch is in flight and how many images remain
#[derive(Clone)]
pub struct ProgressTracker {
    state: Arc<Mutex<BatchState>>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    /// Create a new tracker at rest (`Idle`, nothing pending)
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(BatchState {
                status: BatchStatus::Idle,
                pending: 0,
            })),
        }
    }

    /// Atomically claim the tracker for a new batch of `total` images.
    /// Returns `AlreadyRunning` with the current pending count when a batch
    /// is already in flight; the caller must not proceed in that case.
    pub async fn try_start(&self, total: usize) -> StartAttempt {
        let mut state = self.state.lock().await;

        if state.status == BatchStatus::Running {
            return StartAttempt::AlreadyRunning {
                pending: state.pending,
            };
        }

        state.status = BatchStatus::Running;
        state.pending = total;
        StartAttempt::Started
    }

    /// Record one image reaching a terminal outcome. Reaching zero does not
    /// flip the status back to `Idle`; batch completion is signalled by
    /// `finish`, since a batch of zero images finishes without any
    /// decrement.
    pub async fn decrement(&self) {
        let mut state = self.state.lock().await;
        state.pending = state.pending.saturating_sub(1);
    }

    /// Mark the batch as finished, independent of the pending count.
    pub async fn finish(&self) {
        let mut state = self.state.lock().await;
        state.status = BatchStatus::Idle;
    }

    /// Force the tracker back to rest. Recovery hook for stale `Running`
    /// state left behind by a crashed batch.
    pub async fn reset(&self) {
        let mut state = self.state.lock().await;
        state.status = BatchStatus::Idle;
        state.pending = 0;
    }

    /// Current status
    pub async fn status(&self) -> BatchStatus {
        self.state.lock().await.status
    }

    /// Images still awaiting a terminal outcome
    pub async fn pending(&self) -> usize {
        self.state.lock().await.pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_try_start_claims_idle_tracker() {
        let tracker = ProgressTracker::new();
        assert_eq!(tracker.status().await, BatchStatus::Idle);

        assert_eq!(tracker.try_start(3).await, StartAttempt::Started);
        assert_eq!(tracker.status().await, BatchStatus::Running);
        assert_eq!(tracker.pending().await, 3);
    }

    #[tokio::test]
    async fn test_try_start_rejects_while_running() {
        let tracker = ProgressTracker::new();
        assert_eq!(tracker.try_start(5).await, StartAttempt::Started);

        // Second attempt is rejected and reports the current pending count
        assert_eq!(
            tracker.try_start(2).await,
            StartAttempt::AlreadyRunning { pending: 5 }
        );
        // The rejected attempt must not disturb the running batch
        assert_eq!(tracker.pending().await, 5);

        tracker.decrement().await;
        assert_eq!(
            tracker.try_start(2).await,
            StartAttempt::AlreadyRunning { pending: 4 }
        );
    }

    #[tokio::test]
    async fn test_pending_zero_does_not_flip_status() {
        let tracker = ProgressTracker::new();
        tracker.try_start(1).await;
        tracker.decrement().await;

        assert_eq!(tracker.pending().await, 0);
        assert_eq!(tracker.status().await, BatchStatus::Running);

        tracker.finish().await;
        assert_eq!(tracker.status().await, BatchStatus::Idle);
    }

    #[tokio::test]
    async fn test_finish_is_independent_of_pending() {
        let tracker = ProgressTracker::new();
        tracker.try_start(4).await;
        tracker.decrement().await;

        tracker.finish().await;
        assert_eq!(tracker.status().await, BatchStatus::Idle);
        // finish only flips the status
        assert_eq!(tracker.pending().await, 3);

        // A new batch can start again afterwards
        assert_eq!(tracker.try_start(2).await, StartAttempt::Started);
        assert_eq!(tracker.pending().await, 2);
    }

    #[tokio::test]
    async fn test_reset_recovers_stale_running_state() {
        let tracker = ProgressTracker::new();
        tracker.try_start(7).await;

        // Simulated crash: finish never ran
        tracker.reset().await;
        assert_eq!(tracker.status().await, BatchStatus::Idle);
        assert_eq!(tracker.pending().await, 0);
        assert_eq!(tracker.try_start(1).await, StartAttempt::Started);
    }

    #[tokio::test]
    async fn test_decrement_saturates_at_zero() {
        let tracker = ProgressTracker::new();
        tracker.try_start(0).await;
        tracker.decrement().await;
        assert_eq!(tracker.pending().await, 0);
    }
}
