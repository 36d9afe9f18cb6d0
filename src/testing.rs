//! Manual fakes for the remote and storage collaborators.
//!
//! The collaborator traits are async, so the fakes are written by hand with
//! concrete behavior instead of generated mocks: an in-memory byte store and
//! a remote that answers deterministically, counts calls and records the
//! high-water mark of concurrently in-flight submissions (used to verify the
//! concurrency cap).

use anyhow::Result;
use async_trait::async_trait;
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::hasher;
use crate::remote::RemoteCompressor;
use crate::storage::{Asset, AssetStore};

/// Fake compression service.
///
/// `compress` answers with a synthetic result descriptor derived from the
/// input fingerprint; `download` derives the compressed bytes from that
/// descriptor, so tests can check exactly what was written back.
pub(crate) struct FakeRemote {
    pub compress_calls: AtomicUsize,
    pub download_calls: AtomicUsize,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    /// Payload for which the service reports no output reference
    reject_payload: Option<Vec<u8>>,
    /// Simulated service latency, keeps windows overlapping
    delay: Duration,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self {
            compress_calls: AtomicUsize::new(0),
            download_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
            reject_payload: None,
            delay: Duration::ZERO,
        }
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            ..Self::new()
        }
    }

    /// Report no output reference whenever this exact payload is submitted.
    pub fn rejecting(payload: &[u8]) -> Self {
        Self {
            reject_payload: Some(payload.to_vec()),
            ..Self::new()
        }
    }

    pub fn compressed_bytes_for(original: &[u8]) -> Vec<u8> {
        format!("compressed:{}", hasher::fingerprint(original)).into_bytes()
    }
}

#[async_trait]
impl RemoteCompressor for FakeRemote {
    async fn compress(&self, bytes: &[u8]) -> Result<Option<String>> {
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        self.compress_calls.fetch_add(1, Ordering::SeqCst);

        if self.reject_payload.as_deref() == Some(bytes) {
            return Ok(None);
        }

        Ok(Some(format!("fake://output/{}", hasher::fingerprint(bytes))))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        let fingerprint = url.rsplit('/').next().unwrap_or_default();
        Ok(format!("compressed:{}", fingerprint).into_bytes())
    }
}

/// In-memory asset store.
pub(crate) struct FakeStore {
    files: Mutex<HashMap<PathBuf, Vec<u8>>>,
    pub fail_writes: bool,
}

impl FakeStore {
    pub fn new() -> Self {
        Self {
            files: Mutex::new(HashMap::new()),
            fail_writes: false,
        }
    }

    pub fn failing_writes() -> Self {
        Self {
            fail_writes: true,
            ..Self::new()
        }
    }

    /// Add an asset with the given content, returning its descriptor.
    pub fn insert(&self, name: &str, bytes: &[u8]) -> Asset {
        let path = PathBuf::from(name);
        self.files
            .lock()
            .unwrap()
            .insert(path.clone(), bytes.to_vec());

        Asset {
            name: name.to_string(),
            path,
            size: bytes.len() as u64,
        }
    }

    /// Current stored content of an asset.
    pub fn contents(&self, asset: &Asset) -> Vec<u8> {
        self.files
            .lock()
            .unwrap()
            .get(&asset.path)
            .cloned()
            .unwrap_or_default()
    }
}

#[async_trait]
impl AssetStore for FakeStore {
    async fn list(&self) -> Result<Vec<Asset>> {
        let files = self.files.lock().unwrap();
        let mut assets: Vec<Asset> = files
            .iter()
            .map(|(path, bytes)| Asset {
                name: path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default(),
                path: path.clone(),
                size: bytes.len() as u64,
            })
            .collect();
        assets.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(assets)
    }

    async fn read(&self, asset: &Asset) -> Result<Vec<u8>> {
        self.files
            .lock()
            .unwrap()
            .get(&asset.path)
            .cloned()
            .ok_or_else(|| anyhow::anyhow!("No such asset: {}", asset.path.display()))
    }

    async fn write(&self, asset: &Asset, bytes: &[u8]) -> Result<()> {
        if self.fail_writes {
            return Err(anyhow::anyhow!(
                "Write failure injected for {}",
                asset.path.display()
            ));
        }

        self.files
            .lock()
            .unwrap()
            .insert(asset.path.clone(), bytes.to_vec());
        Ok(())
    }
}
