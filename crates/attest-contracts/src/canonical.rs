//! Canonical JSON encoding.
//!
//! Signatures and chain values are computed over bytes, so every logical
//! value must map to exactly one byte string. The canonical form is:
//!
//! - object keys sorted lexicographically (byte order) at every depth
//! - no insignificant whitespace
//! - numbers and strings as emitted by `serde_json`
//!
//! Keys are sorted here, not by `serde_json::Map`, whose iteration order
//! depends on the `preserve_order` feature.

use serde::Serialize;
use serde_json::Value;

use crate::error::AttestResult;

/// Encode `value` as canonical JSON bytes.
pub fn to_canonical_bytes<T: Serialize + ?Sized>(value: &T) -> AttestResult<Vec<u8>> {
    let value = serde_json::to_value(value)?;
    Ok(serde_json::to_vec(&canonicalize(value))?)
}

/// Encode `value` as a canonical JSON string.
pub fn to_canonical_string<T: Serialize + ?Sized>(value: &T) -> AttestResult<String> {
    let value = serde_json::to_value(value)?;
    Ok(serde_json::to_string(&canonicalize(value))?)
}

/// Rebuild `value` with every object's keys in sorted order.
pub fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut fields: Vec<(String, Value)> = map.into_iter().collect();
            fields.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(
                fields
                    .into_iter()
                    .map(|(key, inner)| (key, canonicalize(inner)))
                    .collect(),
            )
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}
