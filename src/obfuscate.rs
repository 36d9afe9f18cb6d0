//! # Configuration Obfuscation Module
//!
//! The settings file carries the API key, so it is persisted in an
//! obfuscated form rather than plain JSON: the serialized settings are XORed
//! with a fixed key, reversed, and hex encoded. This keeps the credential
//! out of casual greps and accidental pastes; it is obfuscation, not
//! encryption.
//!
//! A failed round-trip (truncated file, bad hex, stale key) is reported as
//! `None` and the caller falls back to default settings.

use serde::{Deserialize, Serialize};

const CONFIG_OBFUSCATION_KEY: &[u8] = b"image-batch-compressor";

/// On-disk wrapper around the obfuscated settings payload.
#[derive(Debug, Serialize, Deserialize)]
pub struct ObfuscatedConfig {
    #[serde(rename = "_NOTICE", default)]
    pub notice: String,

    /// Hex-encoded obfuscated settings JSON.
    pub j: String,
}

const NOTICE: &str = "DO NOT MODIFY THIS CONFIGURATION OR SHARE IT WITH ANYONE. \
IT SHOULD BE KEPT SECRET AND SECURE AT ALL TIMES. \
FAILURE TO COMPLY MAY DISRUPT THE FUNCTIONALITY OF THE SYSTEM.";

fn xor_cipher(bytes: &[u8], key: &[u8]) -> Vec<u8> {
    bytes
        .iter()
        .enumerate()
        .map(|(i, b)| b ^ key[i % key.len()])
        .collect()
}

/// Obfuscate a serialized settings string for persistence.
pub fn obfuscate(plain: &str) -> ObfuscatedConfig {
    let mut bytes = xor_cipher(plain.as_bytes(), CONFIG_OBFUSCATION_KEY);
    bytes.reverse();

    ObfuscatedConfig {
        notice: NOTICE.to_string(),
        j: hex::encode(bytes),
    }
}

/// Recover the serialized settings string from its obfuscated form.
/// Returns `None` when the payload cannot be decoded.
pub fn deobfuscate(config: &ObfuscatedConfig) -> Option<String> {
    if config.j.is_empty() {
        return None;
    }

    let mut bytes = hex::decode(&config.j).ok()?;
    bytes.reverse();

    let plain = xor_cipher(&bytes, CONFIG_OBFUSCATION_KEY);
    String::from_utf8(plain).ok()
}
