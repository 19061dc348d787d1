//! Dedup fingerprint computation for case correlation.
//!
//! The fingerprint is the case-attachment protocol's dedup key (`Case.title`):
//! a stable SHA-256 hash of `(source, payload)` under canonical JSON, so the
//! same alert submitted twice maps to the same case regardless of how the
//! producer ordered its payload's object keys.

use serde_json::Value as Json;
use sha2::{Digest, Sha256};

use crate::types::Source;

/// Compute the dedup hash for an alert's `(source, payload)` pair.
///
/// `serde_json`'s default `Map` implementation is a `BTreeMap`, so
/// `serde_json::to_string` already emits object keys in lexicographic order
/// with compact (no-whitespace) separators -- exactly the canonical form the
/// protocol requires.
#[must_use]
pub fn dedup_hash(source: Source, payload: &Json) -> String {
    let canonical = serde_json::json!({
        "source": source.to_string(),
        "payload": payload,
    });
    let bytes = serde_json::to_vec(&canonical).expect("Value serialization cannot fail");

    let mut hasher = Sha256::new();
    hasher.update(&bytes);
    hex::encode(hasher.finalize())
}
