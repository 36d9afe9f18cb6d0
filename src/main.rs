//! # Batch Image Compressor - Main Entry Point
//!
//! ## Execution flow:
//! 1. Parse CLI arguments (image root, overrides, single-file mode)
//! 2. Configure logging (INFO, or DEBUG with the verbose flag)
//! 3. Load the obfuscated settings file, falling back to defaults, and
//!    apply the CLI overrides
//! 4. Open the compression cache and wire the collaborators explicitly
//! 5. Run the requested action: clear the cache, compress one image, or
//!    run a full batch
//!
//! ## Usage:
//! ```bash
//! image-compressor /path/to/images --api-key KEY --concurrency 5
//! image-compressor /path/to/images --file notes/photo.png
//! image-compressor /path/to/images --clear-cache
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use image_batch_compressor::{
    AssetStore, BatchCompressor, CompressError, CompressionCache, CompressionWorker, Config,
    LocalAssetStore, Outcome, ProgressTracker, TinifyClient,
};

#[derive(Parser)]
#[command(name = "image-compressor")]
#[command(about = "Compress images through the Tinify API, skipping already-compressed content")]
struct Args {
    /// Directory containing the images to compress
    image_directory: PathBuf,

    /// Compress a single image (path relative to the image directory)
    #[arg(long)]
    file: Option<PathBuf>,

    /// Clear the compression cache and exit
    #[arg(long)]
    clear_cache: bool,

    /// Tinify API key (overrides the settings file)
    #[arg(long)]
    api_key: Option<String>,

    /// Images compressed concurrently (overrides the settings file)
    #[arg(short, long)]
    concurrency: Option<usize>,

    /// Cache file path, relative to the image directory
    #[arg(long)]
    cache_file: Option<PathBuf>,

    /// Settings file location
    #[arg(long)]
    config: Option<PathBuf>,

    /// Persist the effective settings back to the settings file
    #[arg(long)]
    save_settings: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Default settings location: `<config dir>/image-compressor/settings.json`
fn default_settings_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("image-compressor")
        .join("settings.json")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if args.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Validate arguments
    if !args.image_directory.exists() {
        return Err(anyhow::anyhow!(
            "Image directory does not exist: {}",
            args.image_directory.display()
        ));
    }

    // Load settings and apply CLI overrides
    let settings_path = args.config.clone().unwrap_or_else(default_settings_path);
    let mut config = Config::load_or_default(&settings_path).await;

    if let Some(api_key) = args.api_key {
        config.api_key = api_key;
    }
    if let Some(concurrency) = args.concurrency {
        config.concurrency = concurrency;
    }
    if let Some(cache_file) = args.cache_file {
        config.cache_file_path = cache_file;
    }
    config.validate()?;

    if args.save_settings {
        config.save_to_file(&settings_path).await?;
        info!("Settings saved to {}", settings_path.display());
    }

    // Wire the collaborators explicitly
    let cache_path = if config.cache_file_path.is_absolute() {
        config.cache_file_path.clone()
    } else {
        args.image_directory.join(&config.cache_file_path)
    };
    let cache = Arc::new(Mutex::new(CompressionCache::open(&cache_path).await?));

    if args.clear_cache {
        let mut cache = cache.lock().await;
        let entries = cache.len();
        cache.clear().await?;
        info!("Compression cache cleared ({} entries removed)", entries);
        return Ok(());
    }

    let store = Arc::new(LocalAssetStore::new(&args.image_directory, &config));
    let remote = Arc::new(TinifyClient::new(&config.base_url, &config.api_key)?);
    let worker = CompressionWorker::new(remote, store.clone(), cache);

    if let Some(file) = args.file {
        if config.api_key.is_empty() {
            return Err(CompressError::MissingApiKey.into());
        }

        let asset = store.asset_at(&file).await?;
        match worker.process(&asset).await {
            Outcome::Compressed => info!("Compression successful: {}", asset.name),
            Outcome::AlreadyCompressed => {
                info!("Compression aborted, already compressed: {}", asset.name)
            }
            Outcome::Failed => warn!("Compression failed: {}", asset.name),
        }
        return Ok(());
    }

    let batch = BatchCompressor::new(&config, worker, ProgressTracker::new());
    let assets = store.list().await?;
    info!(
        "Found {} candidate images in {}",
        assets.len(),
        args.image_directory.display()
    );

    match batch.run(&assets).await {
        Ok(_summary) => Ok(()),
        Err(e) => match e.downcast_ref::<CompressError>() {
            Some(CompressError::MissingApiKey) => {
                Err(anyhow::anyhow!("Please enter an API key in the settings."))
            }
            Some(CompressError::BatchInProgress { pending }) => Err(anyhow::anyhow!(
                "There are {} images awaiting compression.",
                pending
            )),
            _ => Err(e),
        },
    }
}
