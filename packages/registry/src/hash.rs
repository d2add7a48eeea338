//! Deterministic configuration checksums.
//!
//! A checksum is CRC32 over the canonical JSON form of a value (object keys
//! sorted recursively, no whitespace), rendered as 8 lowercase hex digits.
//! Equal configurations always hash equal, independent of catalog key order.

use crc32fast::Hasher;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Canonical JSON text of a value
pub fn canonical_json<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .map(canonicalize)
        .map(|v| v.to_string())
        .unwrap_or_default()
}

/// CRC32 checksum of the canonical JSON form
pub fn checksum<T: Serialize>(value: &T) -> String {
    let mut hasher = Hasher::new();
    hasher.update(canonical_json(value).as_bytes());
    format!("{:08x}", hasher.finalize())
}

fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let sorted: BTreeMap<String, Value> = map
                .into_iter()
                .map(|(k, v)| (k, canonicalize(v)))
                .collect();
            Value::Object(sorted.into_iter().collect::<Map<String, Value>>())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_order_does_not_matter() {
        let a = json!({ "b": 1, "a": { "y": [1, 2], "x": null } });
        let b = json!({ "a": { "x": null, "y": [1, 2] }, "b": 1 });
        assert_eq!(canonical_json(&a), r#"{"a":{"x":null,"y":[1,2]},"b":1}"#);
        assert_eq!(checksum(&a), checksum(&b));
    }

    #[test]
    fn test_checksum_is_fixed_width_hex() {
        let sum = checksum(&json!({ "width": 1440 }));
        assert_eq!(sum.len(), 8);
        assert!(sum.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(sum, checksum(&json!({ "width": 1280 })));
    }
}
