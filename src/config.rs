//! # Configuration Management Module
//!
//! Settings for the compression pipeline: credentials, service endpoint,
//! concurrency cap, cache location and asset-selection rules.
//!
//! ## Parameters:
//! - `api_key`: Tinify API credential (required for batches)
//! - `base_url`: service base URL (default: `https://api.tinify.com`)
//! - `concurrency`: images compressed concurrently per window (default: 5)
//! - `cache_file_path`: compression cache location, relative to the root
//! - `ignored_folders` / `allowed_folders`: asset selection rules
//! - `compress_allowed_folders_only`: restrict to the allow list
//! - `extra_image_formats`: comma-separated extensions beyond png/jpg/jpeg
//! - `compress_on_create`: recognized toggle for compress-on-create hosts
//!
//! ## Persistence:
//! The settings file is stored obfuscated (see `obfuscate`). Loading merges
//! a versioned, validated structure; any decode or validation failure falls
//! back to defaults instead of partially trusting the input.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::warn;
use url::Url;

use crate::error::CompressError;
use crate::obfuscate::{self, ObfuscatedConfig};

/// Current settings schema version.
pub const CONFIG_VERSION: u32 = 1;

/// Default cache file name, relative to the image root.
pub const DEFAULT_CACHE_FILE: &str = ".image-compressor-cache.json";

/// Configuration for batch image compression
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Settings schema version
    pub version: u32,
    /// Tinify API key
    pub api_key: String,
    /// Base URL of the compression service
    pub base_url: String,
    /// Number of images compressed concurrently (one window)
    pub concurrency: usize,
    /// Path of the persisted compression cache, relative to the image root
    pub cache_file_path: PathBuf,
    /// Folders whose images are never compressed
    pub ignored_folders: Vec<String>,
    /// Folders whose images may be compressed when the allow list is enforced
    pub allowed_folders: Vec<String>,
    /// Only compress images under `allowed_folders`
    pub compress_allowed_folders_only: bool,
    /// Extra image extensions beyond png/jpg/jpeg, comma separated
    pub extra_image_formats: String,
    /// Compress newly created images (recognized by embedding hosts)
    pub compress_on_create: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION,
            api_key: String::new(),
            base_url: "https://api.tinify.com".to_string(),
            concurrency: 5,
            cache_file_path: PathBuf::from(DEFAULT_CACHE_FILE),
            ignored_folders: Vec::new(),
            allowed_folders: Vec::new(),
            compress_allowed_folders_only: false,
            extra_image_formats: "png,webp".to_string(),
            compress_on_create: false,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.version > CONFIG_VERSION {
            return Err(CompressError::Validation(format!(
                "Unsupported settings version: {}",
                self.version
            ))
            .into());
        }

        if self.concurrency == 0 {
            return Err(
                CompressError::Validation("Concurrency must be greater than 0".to_string()).into(),
            );
        }

        if Url::parse(&self.base_url).is_err() {
            return Err(CompressError::Validation(format!(
                "Invalid base URL: {}",
                self.base_url
            ))
            .into());
        }

        if self.cache_file_path.as_os_str().is_empty() {
            return Err(
                CompressError::Validation("Cache file path must not be empty".to_string()).into(),
            );
        }

        Ok(())
    }

    /// Image extensions accepted for compression: png/jpg/jpeg plus
    /// everything listed in `extra_image_formats`.
    pub fn image_extensions(&self) -> Vec<String> {
        let mut extensions = vec!["png".to_string(), "jpg".to_string(), "jpeg".to_string()];

        for format in self.extra_image_formats.split(',') {
            let format = format.trim().to_lowercase();
            if !format.is_empty() && !extensions.contains(&format) {
                extensions.push(format);
            }
        }

        extensions
    }

    /// Load configuration from an obfuscated settings file.
    ///
    /// Any failure along the way (missing file aside, which is normal on
    /// first run) falls back to defaults rather than trusting a partially
    /// decoded structure.
    pub async fn load_or_default(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }

        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) => {
                warn!("Failed to read settings file {}: {}", path.display(), e);
                return Self::default();
            }
        };

        let Ok(obfuscated) = serde_json::from_str::<ObfuscatedConfig>(&content) else {
            warn!("Failed to parse settings, using defaults.");
            return Self::default();
        };

        let Some(plain) = obfuscate::deobfuscate(&obfuscated) else {
            warn!("Failed to deobfuscate settings, using defaults.");
            return Self::default();
        };

        let Ok(config) = serde_json::from_str::<Config>(&plain) else {
            warn!("Failed to parse settings, using defaults.");
            return Self::default();
        };

        if let Err(e) = config.validate() {
            warn!("Invalid settings ({}), using defaults.", e);
            return Self::default();
        }

        config
    }

    /// Save configuration to an obfuscated settings file.
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let plain = serde_json::to_string(self)?;
        let obfuscated = obfuscate::obfuscate(&plain);
        let content = serde_json::to_string_pretty(&obfuscated)?;

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}
