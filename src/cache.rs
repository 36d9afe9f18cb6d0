//! # Compression Cache Module
//!
//! Tracks which images have already been compressed so repeat runs skip
//! them instead of burning API quota.
//!
//! ## Persistence:
//! - A single JSON file: a flat `{ "<key>": <status code> }` mapping
//! - Created as `{}` on first access
//! - Every mutation rewrites the full snapshot
//!
//! ## Key schemes:
//! - New entries are always keyed by content fingerprint (SHA-256 hex)
//! - Caches written by older versions keyed entries by
//!   `urlencode(name)-size`; those still resolve on lookup and are migrated
//!   to the fingerprint key the first time they hit (migration-on-read)
//!
//! ## Concurrency:
//! The cache itself is not synchronized. Concurrent workers share it behind
//! `Arc<tokio::sync::Mutex<CompressionCache>>` so each read-modify-write,
//! including the snapshot save, runs under one guard and entries cannot be
//! lost between a read and a write.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

use crate::error::CompressError;

/// Completion status recorded per cache entry. Serialized as the numeric
/// code `0`; any recorded entry counts as compressed on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum CompletionStatus {
    Compressed,
}

impl From<u8> for CompletionStatus {
    fn from(_: u8) -> Self {
        Self::Compressed
    }
}

impl From<CompletionStatus> for u8 {
    fn from(_: CompletionStatus) -> Self {
        0
    }
}

/// Persisted mapping from cache key to completion status
#[derive(Debug)]
pub struct CompressionCache {
    cache_file_path: PathBuf,
    entries: HashMap<String, CompletionStatus>,
}

impl CompressionCache {
    /// Open the cache at the given path, creating an empty one if the file
    /// does not exist yet. An unreadable or unparsable cache file is an
    /// error: silently starting empty would re-compress everything.
    pub async fn open(cache_file_path: &Path) -> Result<Self> {
        let entries = if cache_file_path.exists() {
            let content = fs::read_to_string(cache_file_path)
                .await
                .map_err(CompressError::Io)?;
            serde_json::from_str(&content).map_err(|e| {
                CompressError::Cache(format!(
                    "Corrupt cache file {}: {}",
                    cache_file_path.display(),
                    e
                ))
            })?
        } else {
            if let Some(parent) = cache_file_path.parent() {
                if !parent.as_os_str().is_empty() {
                    fs::create_dir_all(parent).await.map_err(CompressError::Io)?;
                }
            }
            fs::write(cache_file_path, "{}")
                .await
                .map_err(CompressError::Io)?;
            HashMap::new()
        };

        Ok(Self {
            cache_file_path: cache_file_path.to_path_buf(),
            entries,
        })
    }

    /// Persist the full cache snapshot. A write failure is surfaced instead
    /// of letting the in-memory record pass as saved.
    async fn save(&self) -> Result<()> {
        let content = serde_json::to_string(&self.entries)?;
        fs::write(&self.cache_file_path, content)
            .await
            .map_err(|e| {
                CompressError::Cache(format!(
                    "Failed to write cache file {}: {}",
                    self.cache_file_path.display(),
                    e
                ))
            })?;
        Ok(())
    }

    /// Check whether an image has already been compressed, looking up the
    /// fingerprint first and falling back to the legacy key.
    ///
    /// A legacy hit upgrades the entry in place: the fingerprint key is
    /// written and the legacy key removed, so the "compressed" fact is never
    /// dropped and the upgrade is idempotent.
    pub async fn is_compressed(&mut self, fingerprint: &str, legacy_key: &str) -> Result<bool> {
        if self.entries.contains_key(fingerprint) {
            return Ok(true);
        }

        if self.entries.contains_key(legacy_key) {
            debug!("Migrating legacy cache entry {} -> {}", legacy_key, fingerprint);
            self.entries
                .insert(fingerprint.to_string(), CompletionStatus::Compressed);
            self.entries.remove(legacy_key);
            self.save().await?;
            return Ok(true);
        }

        Ok(false)
    }

    /// Record an image as compressed, keyed by its content fingerprint.
    /// New writes never use the legacy key.
    pub async fn mark_compressed(&mut self, fingerprint: &str) -> Result<()> {
        self.entries
            .insert(fingerprint.to_string(), CompletionStatus::Compressed);
        self.save().await
    }

    /// Replace the entire cache with an empty mapping. Irreversible.
    pub async fn clear(&mut self) -> Result<()> {
        self.entries.clear();
        self.save().await
    }

    /// Whether a key (fingerprint or legacy) is currently recorded.
    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
