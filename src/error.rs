//! # Error Types Module
//!
//! Custom error types for the compression pipeline.
//!
//! ## Categories:
//! - `Io`: filesystem errors opening or creating the cache file
//! - `Http`: transport errors talking to the compression service
//! - `Cache`: cache persistence problems that must not pass as success
//! - `MissingApiKey`: batch precondition failure, nothing is mutated
//! - `BatchInProgress`: a batch is already running, new attempt rejected
//! - `InvalidResponse`: the service answered with something unusable
//! - `Validation`: configuration validation errors
//!
//! Per-asset failures are recovered at the worker boundary and mapped to
//! `Outcome::Failed`; only batch-level preconditions surface as errors to
//! the caller.

/// Custom error types for batch image compression
#[derive(thiserror::Error, Debug)]
pub enum CompressError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Cache error: {0}")]
    Cache(String),

    #[error("No API key configured")]
    MissingApiKey,

    #[error("A batch is already running ({pending} images awaiting compression)")]
    BatchInProgress { pending: usize },

    #[error("Invalid response from compression service: {0}")]
    InvalidResponse(String),

    #[error("Configuration validation error: {0}")]
    Validation(String),
}
