//! # Batch Image Compressor Library
//!
//! Batch-compresses images through a Tinify-compatible service while
//! skipping content that was already compressed on a previous run.
//!
//! ## Module architecture:
//! - `config`: settings, validation and obfuscated persistence
//! - `error`: error taxonomy
//! - `hasher`: content fingerprints and legacy cache keys
//! - `cache`: persisted idempotency cache with legacy-key migration
//! - `tracker`: duplicate-run guard and pending counter
//! - `remote`: compression service interface and HTTP client
//! - `storage`: asset abstraction and local directory store
//! - `worker`: single-image compression workflow
//! - `batch`: windowed concurrent orchestration
//! - `progress`: progress bar feedback
//!
//! ## Usage:
//! ```rust,no_run
//! use std::sync::Arc;
//! use tokio::sync::Mutex;
//! use image_batch_compressor::{
//!     AssetStore, BatchCompressor, CompressionCache, CompressionWorker, Config,
//!     LocalAssetStore, ProgressTracker, TinifyClient,
//! };
//!
//! # async fn run() -> anyhow::Result<()> {
//! let config = Config { api_key: "key".into(), ..Default::default() };
//! let store = Arc::new(LocalAssetStore::new("/images".as_ref(), &config));
//! let remote = Arc::new(TinifyClient::new(&config.base_url, &config.api_key)?);
//! let cache = Arc::new(Mutex::new(
//!     CompressionCache::open("/images/.image-compressor-cache.json".as_ref()).await?,
//! ));
//!
//! let worker = CompressionWorker::new(remote, store.clone(), cache);
//! let batch = BatchCompressor::new(&config, worker, ProgressTracker::new());
//!
//! let assets = store.list().await?;
//! let summary = batch.run(&assets).await?;
//! println!("{}", summary);
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod cache;
pub mod config;
pub mod error;
pub mod hasher;
pub mod obfuscate;
pub mod progress;
pub mod remote;
pub mod storage;
pub mod tracker;
pub mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use batch::{BatchCompressor, Summary};
pub use cache::{CompletionStatus, CompressionCache};
pub use config::Config;
pub use error::CompressError;
pub use remote::{RemoteCompressor, TinifyClient};
pub use storage::{Asset, AssetStore, LocalAssetStore};
pub use tracker::{BatchStatus, ProgressTracker, StartAttempt};
pub use worker::{CompressionWorker, Outcome};
