//! # Compression Worker Module
//!
//! Single-image workflow: cache lookup → remote compression → content
//! replacement → cache update.
//!
//! ## Per-image flow:
//! 1. Read the stored bytes and compute the content fingerprint
//! 2. Cache hit (fingerprint or legacy key) → `AlreadyCompressed`, no
//!    remote call, no mutation
//! 3. Submit to the compression service; no output reference → `Failed`
//! 4. Fetch the compressed bytes and replace the stored content
//! 5. Record the fingerprint in the cache → `Compressed`
//!
//! The worker never propagates an error past its own boundary: any failure
//! at any step is logged and mapped to `Outcome::Failed`, so one broken
//! image never aborts its siblings.

use anyhow::Result;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::cache::CompressionCache;
use crate::hasher;
use crate::remote::RemoteCompressor;
use crate::storage::{Asset, AssetStore};

/// Terminal outcome of processing one image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Compressed, replaced in storage and recorded in the cache
    Compressed,
    /// The cache already records this content; nothing was done
    AlreadyCompressed,
    /// Compression did not complete; the stored bytes are untouched
    Failed,
}

/// Performs the single-image compression workflow
pub struct CompressionWorker {
    remote: Arc<dyn RemoteCompressor>,
    store: Arc<dyn AssetStore>,
    cache: Arc<Mutex<CompressionCache>>,
}

impl CompressionWorker {
    pub fn new(
        remote: Arc<dyn RemoteCompressor>,
        store: Arc<dyn AssetStore>,
        cache: Arc<Mutex<CompressionCache>>,
    ) -> Self {
        Self {
            remote,
            store,
            cache,
        }
    }

    /// Process one image. Always returns an outcome; errors never escape.
    pub async fn process(&self, asset: &Asset) -> Outcome {
        match self.try_process(asset).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Compression failed for {}: {}", asset.name, e);
                Outcome::Failed
            }
        }
    }

    async fn try_process(&self, asset: &Asset) -> Result<Outcome> {
        let content = self.store.read(asset).await?;

        // The cache is keyed on the content at check time: it records that
        // this logical image has been handled, not that these exact bytes
        // exist afterwards.
        let fingerprint = hasher::fingerprint(&content);
        let legacy_key = hasher::legacy_key(&asset.name, asset.size);

        if self
            .cache
            .lock()
            .await
            .is_compressed(&fingerprint, &legacy_key)
            .await?
        {
            debug!("Already compressed, skipping: {}", asset.name);
            return Ok(Outcome::AlreadyCompressed);
        }

        let Some(output_url) = self.remote.compress(&content).await? else {
            warn!(
                "Compression service returned no output for {}",
                asset.name
            );
            return Ok(Outcome::Failed);
        };

        let compressed = self.remote.download(&output_url).await?;
        self.store.write(asset, &compressed).await?;
        self.cache.lock().await.mark_compressed(&fingerprint).await?;

        debug!(
            "Compressed {}: {} -> {} bytes",
            asset.name,
            content.len(),
            compressed.len()
        );
        Ok(Outcome::Compressed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeRemote, FakeStore};
    use std::sync::atomic::Ordering;
    use tempfile::TempDir;

    async fn new_cache(temp_dir: &TempDir) -> Arc<Mutex<CompressionCache>> {
        let path = temp_dir.path().join("cache.json");
        Arc::new(Mutex::new(CompressionCache::open(&path).await.unwrap()))
    }

    #[tokio::test]
    async fn test_process_compresses_and_records() {
        let temp_dir = TempDir::new().unwrap();
        let cache = new_cache(&temp_dir).await;
        let remote = Arc::new(FakeRemote::new());
        let store = Arc::new(FakeStore::new());
        let asset = store.insert("photo.png", b"original bytes");

        let worker = CompressionWorker::new(remote.clone(), store.clone(), cache.clone());
        assert_eq!(worker.process(&asset).await, Outcome::Compressed);

        // Content replaced with the fetched output
        assert_eq!(
            store.contents(&asset),
            FakeRemote::compressed_bytes_for(b"original bytes")
        );

        // Cache keyed by the pre-compression fingerprint
        let fingerprint = hasher::fingerprint(b"original bytes");
        assert!(cache.lock().await.contains(&fingerprint));
        assert_eq!(remote.compress_calls.load(Ordering::SeqCst), 1);
        assert_eq!(remote.download_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let temp_dir = TempDir::new().unwrap();
        let cache = new_cache(&temp_dir).await;
        let remote = Arc::new(FakeRemote::new());
        let store = Arc::new(FakeStore::new());
        let asset = store.insert("photo.png", b"stable bytes");

        let worker = CompressionWorker::new(remote.clone(), store.clone(), cache);

        assert_eq!(worker.process(&asset).await, Outcome::Compressed);

        // Restore the original content so the fingerprint is unchanged
        store.insert("photo.png", b"stable bytes");

        assert_eq!(worker.process(&asset).await, Outcome::AlreadyCompressed);
        // No second remote request
        assert_eq!(remote.compress_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_cached_fingerprint_skips_remote_entirely() {
        let temp_dir = TempDir::new().unwrap();
        let cache = new_cache(&temp_dir).await;
        let remote = Arc::new(FakeRemote::new());
        let store = Arc::new(FakeStore::new());
        let asset = store.insert("photo.png", b"known bytes");

        cache
            .lock()
            .await
            .mark_compressed(&hasher::fingerprint(b"known bytes"))
            .await
            .unwrap();

        let worker = CompressionWorker::new(remote.clone(), store.clone(), cache);
        assert_eq!(worker.process(&asset).await, Outcome::AlreadyCompressed);

        assert_eq!(remote.compress_calls.load(Ordering::SeqCst), 0);
        assert_eq!(store.contents(&asset), b"known bytes");
    }

    #[tokio::test]
    async fn test_legacy_cache_entry_counts_as_handled() {
        let temp_dir = TempDir::new().unwrap();
        let cache = new_cache(&temp_dir).await;
        let remote = Arc::new(FakeRemote::new());
        let store = Arc::new(FakeStore::new());
        let asset = store.insert("old photo.png", b"legacy bytes");

        // Entry written by an older cache version, keyed by name and size
        cache
            .lock()
            .await
            .mark_compressed(&hasher::legacy_key("old photo.png", asset.size))
            .await
            .unwrap();

        let worker = CompressionWorker::new(remote.clone(), store.clone(), cache.clone());
        assert_eq!(worker.process(&asset).await, Outcome::AlreadyCompressed);

        // No duplicate remote call, and the entry was upgraded in place
        assert_eq!(remote.compress_calls.load(Ordering::SeqCst), 0);
        assert!(cache
            .lock()
            .await
            .contains(&hasher::fingerprint(b"legacy bytes")));
    }

    #[tokio::test]
    async fn test_missing_output_reference_fails_without_mutation() {
        let temp_dir = TempDir::new().unwrap();
        let cache = new_cache(&temp_dir).await;
        let remote = Arc::new(FakeRemote::rejecting(b"unlucky bytes"));
        let store = Arc::new(FakeStore::new());
        let asset = store.insert("photo.png", b"unlucky bytes");

        let worker = CompressionWorker::new(remote.clone(), store.clone(), cache.clone());
        assert_eq!(worker.process(&asset).await, Outcome::Failed);

        // Bytes untouched, nothing recorded
        assert_eq!(store.contents(&asset), b"unlucky bytes");
        assert!(cache.lock().await.is_empty());
        assert_eq!(remote.download_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_storage_write_failure_maps_to_failed() {
        let temp_dir = TempDir::new().unwrap();
        let cache = new_cache(&temp_dir).await;
        let remote = Arc::new(FakeRemote::new());
        let store = Arc::new(FakeStore::failing_writes());
        let asset = store.insert("photo.png", b"doomed bytes");

        let worker = CompressionWorker::new(remote, store, cache.clone());
        assert_eq!(worker.process(&asset).await, Outcome::Failed);

        // The cache must not claim success for an unwritten replacement
        assert!(cache.lock().await.is_empty());
    }

    #[tokio::test]
    async fn test_cache_write_failure_maps_to_failed() {
        let temp_dir = TempDir::new().unwrap();
        let cache_path = temp_dir.path().join("cache.json");
        let cache = Arc::new(Mutex::new(
            CompressionCache::open(&cache_path).await.unwrap(),
        ));
        let remote = Arc::new(FakeRemote::new());
        let store = Arc::new(FakeStore::new());
        let asset = store.insert("photo.png", b"uncachable bytes");

        // A directory now occupies the cache path, so recording the
        // fingerprint cannot be persisted
        tokio::fs::remove_file(&cache_path).await.unwrap();
        tokio::fs::create_dir(&cache_path).await.unwrap();

        let worker = CompressionWorker::new(remote, store, cache.clone());
        assert_eq!(worker.process(&asset).await, Outcome::Failed);
    }
}
