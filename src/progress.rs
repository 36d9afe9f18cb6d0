//! # Progress Reporting Module
//!
//! Visual feedback for a running batch: an `indicatif` progress bar with a
//! per-image status message and a final summary line.
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:00:42] [=====================>------------------] 78/150 (52%) [OK] photo.png: compressed
//! ```

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Manages the progress bar for a batch run
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a new progress manager for a batch of `total_images`
    pub fn new(total_images: u64) -> Self {
        let bar = ProgressBar::new(total_images);

        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );

        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Advance by one image with a status message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Finish with a final summary message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}
