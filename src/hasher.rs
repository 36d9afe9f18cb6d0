//! # Content Hashing Module
//!
//! Computes the cache keys used to decide whether an image has already been
//! compressed.
//!
//! ## Key schemes:
//! - **Fingerprint**: SHA-256 over the raw bytes, lowercase hex. Canonical
//!   key for all new cache writes.
//! - **Legacy key**: `urlencode(name) + "-" + size`. Written by older
//!   versions of the cache; kept for backward-compatible lookups only.
//!
//! Both functions are pure and deterministic: identical input always yields
//! the same key, across calls and across process restarts.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use sha2::{Digest, Sha256};

/// Characters left unescaped by `encodeURIComponent`, which produced the
/// legacy keys: alphanumerics plus `- _ . ! ~ * ' ( )`.
const LEGACY_KEY_ESCAPE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

/// Compute the content fingerprint for an image: SHA-256 of the raw bytes,
/// hex encoded.
pub fn fingerprint(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

/// Build the legacy cache key for an image from its name and byte size.
pub fn legacy_key(name: &str, size: u64) -> String {
    format!("{}-{}", utf8_percent_encode(name, LEGACY_KEY_ESCAPE), size)
}
