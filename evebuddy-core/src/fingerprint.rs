// SPDX-FileCopyrightText: 2026 Mattia Egloff <mattia.egloff@pm.me>
//
// SPDX-License-Identifier: GPL-3.0-or-later

//! Content fingerprints for fetched payloads
//!
//! A payload is serialized to canonical JSON (object keys sorted at every
//! level) and hashed with SHA-256. Two payloads that are structurally equal
//! produce the same fingerprint regardless of map iteration order, which lets
//! the updater skip writing data that did not change.

use ring::digest::{Context, SHA256};
use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

/// Prefix of every fingerprint, naming the digest algorithm.
pub const FINGERPRINT_PREFIX: &str = "sha256:";

/// Computes the fingerprint of a payload.
///
/// # Returns
/// * `Ok(String)` in format "sha256:hexstring"
/// * `Err(FingerprintError)` if the payload cannot be serialized
///
/// # Example
/// ```
/// use std::collections::HashMap;
/// use evebuddy_core::fingerprint::fingerprint;
///
/// let a: HashMap<&str, i32> = [("x", 1), ("y", 2)].into_iter().collect();
/// let b: HashMap<&str, i32> = [("y", 2), ("x", 1)].into_iter().collect();
/// assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
/// ```
pub fn fingerprint<T: Serialize + ?Sized>(payload: &T) -> Result<String, FingerprintError> {
    let bytes = canonical_bytes(payload)?;
    Ok(digest(&bytes))
}

/// Serializes a payload to canonical JSON bytes.
pub fn canonical_bytes<T: Serialize + ?Sized>(payload: &T) -> Result<Vec<u8>, FingerprintError> {
    let value = serde_json::to_value(payload)?;
    let bytes = serde_json::to_vec(&canonicalize(value))?;
    Ok(bytes)
}

/// Computes the SHA-256 fingerprint of raw bytes.
pub fn digest(data: &[u8]) -> String {
    let mut context = Context::new(&SHA256);
    context.update(data);
    let digest = context.finish();
    format!("{}{}", FINGERPRINT_PREFIX, hex::encode(digest.as_ref()))
}

// Rebuilds objects with their keys inserted in sorted order, so the output
// is canonical even when serde_json preserves insertion order.
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            let mut sorted = Map::new();
            for (key, value) in entries {
                sorted.insert(key, canonicalize(value));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Errors that can occur while fingerprinting a payload.
#[derive(Debug, Error)]
pub enum FingerprintError {
    /// The payload could not be encoded as JSON (e.g. a map with non-string keys).
    #[error("payload cannot be encoded: {0}")]
    Encoding(#[from] serde_json::Error),
}
