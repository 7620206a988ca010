//! # Digests
//!
//! Deterministic content digests of chart values and release records.
//! Used for history keying and event metadata, not for integrity guarantees.

use super::Release;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::warn;

/// Digest of the values, independent of key order
pub fn digest_values(values: &Value) -> String {
    digest_value(values)
}

/// Digest of a release record as written to storage
///
/// A record that does not serialize is digested from its debug form, so
/// distinct records never collapse onto one digest.
pub fn digest_release(release: &Release) -> String {
    match serde_json::to_value(release) {
        Ok(value) => digest_value(&value),
        Err(e) => {
            warn!(
                "Failed to serialize release {}/{}.v{} for digest: {}",
                release.namespace, release.name, release.version, e
            );
            digest_bytes(format!("{release:?}").as_bytes())
        }
    }
}

fn digest_value(value: &Value) -> String {
    // Display of a Value is compact JSON and cannot fail
    digest_bytes(canonical(value).to_string().as_bytes())
}

fn digest_bytes(bytes: &[u8]) -> String {
    format!("sha256:{:x}", Sha256::digest(bytes))
}

/// Copy of the value with object keys sorted at every level
fn canonical(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = Map::new();
            for (key, value) in entries {
                sorted.insert(key.clone(), canonical(value));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonical).collect()),
        other => other.clone(),
    }
}
