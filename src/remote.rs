//! # Remote Compression Service Module
//!
//! Interface to the lossy compression service and its Tinify-compatible
//! HTTP implementation.
//!
//! ## Wire contract:
//! 1. `POST {base}/shrink` with the raw image bytes as the body and HTTP
//!    basic auth (`api` / API key); the JSON response carries the result
//!    descriptor under `output.url`
//! 2. A second authenticated `GET` on that URL fetches the compressed bytes
//!
//! A missing or empty `output.url` is not a transport error: it is reported
//! as `Ok(None)` and the worker maps it to a per-image failure. Timeouts and
//! retries are delegated to the HTTP client.

use anyhow::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;
use url::Url;

use crate::error::CompressError;

/// Remote lossy-compression collaborator
#[async_trait]
pub trait RemoteCompressor: Send + Sync {
    /// Submit raw image bytes for compression. Returns the result
    /// descriptor (URL of the compressed output), or `None` when the
    /// service produced no output.
    async fn compress(&self, bytes: &[u8]) -> Result<Option<String>>;

    /// Fetch the compressed bytes from a result descriptor.
    async fn download(&self, url: &str) -> Result<Vec<u8>>;
}

#[derive(Debug, Deserialize)]
struct ShrinkResponse {
    output: Option<ShrinkOutput>,
}

#[derive(Debug, Deserialize)]
struct ShrinkOutput {
    url: Option<String>,
}

/// Tinify-compatible HTTP client
pub struct TinifyClient {
    http: Client,
    shrink_url: Url,
    api_key: String,
}

impl TinifyClient {
    pub fn new(base_url: &str, api_key: &str) -> Result<Self> {
        // Appended textually so a base URL carrying a path segment
        // (e.g. a proxy prefix) keeps it.
        let shrink_url = format!("{}/shrink", base_url.trim_end_matches('/'));
        let shrink_url = Url::parse(&shrink_url)
            .map_err(|e| CompressError::Validation(format!("Invalid base URL: {}", e)))?;

        Ok(Self {
            http: Client::new(),
            shrink_url,
            api_key: api_key.to_string(),
        })
    }
}

#[async_trait]
impl RemoteCompressor for TinifyClient {
    async fn compress(&self, bytes: &[u8]) -> Result<Option<String>> {
        debug!("Submitting {} bytes to {}", bytes.len(), self.shrink_url);

        let response = self
            .http
            .post(self.shrink_url.clone())
            .basic_auth("api", Some(&self.api_key))
            .body(bytes.to_vec())
            .send()
            .await
            .map_err(CompressError::Http)?;

        if !response.status().is_success() {
            return Err(CompressError::InvalidResponse(format!(
                "Shrink request failed with status {}",
                response.status()
            ))
            .into());
        }

        let shrink: ShrinkResponse = response.json().await.map_err(CompressError::Http)?;
        Ok(shrink
            .output
            .and_then(|output| output.url)
            .filter(|url| !url.is_empty()))
    }

    async fn download(&self, url: &str) -> Result<Vec<u8>> {
        debug!("Fetching compressed output from {}", url);

        let response = self
            .http
            .get(url)
            .basic_auth("api", Some(&self.api_key))
            .send()
            .await
            .map_err(CompressError::Http)?;

        if !response.status().is_success() {
            return Err(CompressError::InvalidResponse(format!(
                "Output fetch failed with status {}",
                response.status()
            ))
            .into());
        }

        Ok(response
            .bytes()
            .await
            .map_err(CompressError::Http)?
            .to_vec())
    }
}
