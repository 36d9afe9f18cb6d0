//! # Asset Storage Module
//!
//! Abstraction over where image bytes live, plus the local-directory
//! implementation used by the CLI.
//!
//! ## Responsibilities:
//! - Recursive discovery of candidate images under a root directory
//! - Extension filtering (png/jpg/jpeg plus configured extras)
//! - Folder allow/deny rules: the deny list always wins; when
//!   `compress_allowed_folders_only` is set the image must live under an
//!   allowed folder
//! - Reading and replacing image bytes
//!
//! The core never owns asset storage: workers read bytes, receive the
//! compressed replacement and write it back through this interface.

use anyhow::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use walkdir::WalkDir;

use crate::config::Config;

/// An image asset, identified by name, size and its path relative to the
/// store root. Content is read and written through the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Asset {
    pub name: String,
    pub path: PathBuf,
    pub size: u64,
}

/// Storage collaborator for image assets
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Enumerate candidate assets.
    async fn list(&self) -> Result<Vec<Asset>>;

    /// Read the raw bytes of an asset.
    async fn read(&self, asset: &Asset) -> Result<Vec<u8>>;

    /// Replace the stored content of an asset.
    async fn write(&self, asset: &Asset, bytes: &[u8]) -> Result<()>;
}

/// Local filesystem store rooted at a directory
pub struct LocalAssetStore {
    root: PathBuf,
    extensions: Vec<String>,
    ignored_folders: Vec<String>,
    allowed_folders: Vec<String>,
    allowed_only: bool,
}

impl LocalAssetStore {
    pub fn new(root: &Path, config: &Config) -> Self {
        Self {
            root: root.to_path_buf(),
            extensions: config.image_extensions(),
            ignored_folders: config.ignored_folders.clone(),
            allowed_folders: config.allowed_folders.clone(),
            allowed_only: config.compress_allowed_folders_only,
        }
    }

    /// Whether a root-relative path passes the extension and folder rules.
    fn is_candidate(&self, relative: &Path) -> bool {
        let Some(extension) = relative.extension() else {
            return false;
        };
        let extension = extension.to_string_lossy().to_lowercase();
        if !self.extensions.iter().any(|e| e == &extension) {
            return false;
        }

        if self
            .ignored_folders
            .iter()
            .any(|folder| relative.starts_with(folder))
        {
            return false;
        }

        if self.allowed_only
            && !self
                .allowed_folders
                .iter()
                .any(|folder| relative.starts_with(folder))
        {
            return false;
        }

        true
    }

    /// Build an `Asset` for a single file, given either a root-relative or
    /// an absolute path under the root. Used by the single-image command.
    pub async fn asset_at(&self, path: &Path) -> Result<Asset> {
        let absolute = if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        };

        let metadata = fs::metadata(&absolute).await?;
        let relative = absolute
            .strip_prefix(&self.root)
            .unwrap_or(&absolute)
            .to_path_buf();
        let name = relative
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        Ok(Asset {
            name,
            path: relative,
            size: metadata.len(),
        })
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    async fn list(&self) -> Result<Vec<Asset>> {
        let mut assets = Vec::new();

        for entry in WalkDir::new(&self.root)
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            let Ok(relative) = path.strip_prefix(&self.root) else {
                continue;
            };

            if !self.is_candidate(relative) {
                continue;
            }

            let metadata = entry.metadata()?;
            assets.push(Asset {
                name: relative
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default(),
                path: relative.to_path_buf(),
                size: metadata.len(),
            });
        }

        // Stable order for reporting; windows still run concurrently.
        assets.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(assets)
    }

    async fn read(&self, asset: &Asset) -> Result<Vec<u8>> {
        Ok(fs::read(self.root.join(&asset.path)).await?)
    }

    async fn write(&self, asset: &Asset, bytes: &[u8]) -> Result<()> {
        fs::write(self.root.join(&asset.path), bytes).await?;
        Ok(())
    }
}
