//! SHA-256 hashing over a canonical JSON encoding.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

/// Hash arbitrary data with SHA-256 and return the lowercase hex digest.
pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Encode a JSON value canonically.
///
/// Object keys are written in lexicographic order at every nesting level and
/// no insignificant whitespace is emitted, so two logically equal values
/// always encode to the same bytes regardless of how their maps were built.
pub fn canonical_json(value: &Value) -> Vec<u8> {
    let mut out = Vec::new();
    write_canonical(value, &mut out);
    out
}

// Sorts keys itself: serde_json's `preserve_order` may be enabled by feature
// unification, in which case `Map` keeps insertion order.
fn write_canonical(value: &Value, out: &mut Vec<u8>) {
    match value {
        Value::Array(items) => {
            out.push(b'[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                write_canonical(item, out);
            }
            out.push(b']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));

            out.push(b'{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(b',');
                }
                out.extend_from_slice(Value::from(key.as_str()).to_string().as_bytes());
                out.push(b':');
                write_canonical(item, out);
            }
            out.push(b'}');
        }
        // Scalars already have a single compact JSON form.
        scalar => out.extend_from_slice(scalar.to_string().as_bytes()),
    }
}

/// Hash a JSON value under the canonical encoding.
pub fn hash_value(value: &Value) -> String {
    sha256_hex(&canonical_json(value))
}

/// Serialize any value to JSON and hash it canonically.
pub fn hash_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    Ok(hash_value(&serde_json::to_value(value)?))
}
