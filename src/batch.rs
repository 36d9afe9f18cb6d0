//! # Batch Orchestrator Module
//!
//! Drives a collection of images through the compression worker under a
//! concurrency cap and aggregates the outcomes.
//!
//! ## Flow:
//! 1. Precondition: an API key must be configured (abort, nothing mutated)
//! 2. Claim the progress tracker; reject when a batch is already running,
//!    reporting the pending count
//! 3. Partition the images into windows of at most `concurrency` and
//!    process each window concurrently; the next window never starts
//!    before the previous one fully completes, which bounds peak
//!    concurrency at exactly the configured cap
//! 4. Count each terminal outcome and decrement the tracker per image
//! 5. Release the tracker and report the three summary counts
//!
//! There is no cancellation: once a window is dispatched the orchestrator
//! awaits all of it.

use anyhow::Result;
use futures::future::join_all;
use std::fmt;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::error::CompressError;
use crate::progress::ProgressManager;
use crate::storage::Asset;
use crate::tracker::{ProgressTracker, StartAttempt};
use crate::worker::{CompressionWorker, Outcome};

/// Aggregated outcome counts for one batch
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Summary {
    pub compressed: usize,
    pub already_compressed: usize,
    pub failed: usize,
}

impl Summary {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Compressed => self.compressed += 1,
            Outcome::AlreadyCompressed => self.already_compressed += 1,
            Outcome::Failed => self.failed += 1,
        }
    }

    /// Total number of images that reached a terminal outcome
    pub fn total(&self) -> usize {
        self.compressed + self.already_compressed + self.failed
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Compression complete. Success: {}, Ignored: {}, Failed: {}",
            self.compressed, self.already_compressed, self.failed
        )
    }
}

/// Orchestrates one batch of images under a concurrency cap
pub struct BatchCompressor {
    worker: Arc<CompressionWorker>,
    tracker: ProgressTracker,
    api_key: String,
    concurrency: usize,
}

impl BatchCompressor {
    pub fn new(config: &Config, worker: CompressionWorker, tracker: ProgressTracker) -> Self {
        Self {
            worker: Arc::new(worker),
            tracker,
            api_key: config.api_key.clone(),
            concurrency: config.concurrency.max(1),
        }
    }

    /// Run the batch. Returns the aggregated summary, or an error when the
    /// batch could not start at all (missing API key, batch in flight).
    pub async fn run(&self, assets: &[Asset]) -> Result<Summary> {
        if self.api_key.is_empty() {
            return Err(CompressError::MissingApiKey.into());
        }

        match self.tracker.try_start(assets.len()).await {
            StartAttempt::AlreadyRunning { pending } => {
                return Err(CompressError::BatchInProgress { pending }.into());
            }
            StartAttempt::Started => {}
        }

        info!(
            "Compressing {} images, {} at a time",
            assets.len(),
            self.concurrency
        );

        let progress = ProgressManager::new(assets.len() as u64);
        let mut summary = Summary::default();

        for window in assets.chunks(self.concurrency) {
            let outcomes = join_all(window.iter().map(|asset| {
                let worker = self.worker.clone();
                let tracker = self.tracker.clone();
                let progress = progress.clone();
                async move {
                    let outcome = worker.process(asset).await;
                    tracker.decrement().await;

                    let label = match outcome {
                        Outcome::Compressed => "[OK]",
                        Outcome::AlreadyCompressed => "[SKIP]",
                        Outcome::Failed => "[ERROR]",
                    };
                    progress.update(&format!("{} {}", label, asset.name));
                    outcome
                }
            }))
            .await;

            for outcome in outcomes {
                summary.record(outcome);
            }
        }

        self.tracker.finish().await;
        progress.finish(&summary.to_string());
        info!("{}", summary);

        Ok(summary)
    }
}
