//! Request fingerprinting
//!
//! Produces a stable sha256 digest over (method, path, body). The body is
//! serialized canonically: object keys sorted by code point, arrays in order,
//! primitives in their literal JSON form. Two structurally equal bodies
//! always produce the same digest regardless of key insertion order.
//!
//! No normalization is applied to values: the JSON number `1` and the string
//! `"1"` are different bodies and produce different fingerprints.

use serde_json::Value;
use sha2::{Digest, Sha256};

/// Canonical serialization of a JSON value.
///
/// Equivalent to `serde_json::to_string` except that object keys are emitted
/// in sorted order at every nesting level.
fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(b) => out.push_str(if *b { "true" } else { "false" }),
        Value::Number(n) => out.push_str(&n.to_string()),
        Value::String(s) => {
            // serde_json handles escaping; a String never fails to serialize
            out.push_str(&serde_json::to_string(s).expect("string serialization"));
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key).expect("string serialization"));
                out.push(':');
                write_canonical(&map[*key], out);
            }
            out.push('}');
        }
    }
}

pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

/// Fingerprint a request: `UPPERCASE(method) | path | canonical(body)`,
/// sha256, lowercase hex (64 chars). `path` must already have its query
/// stripped by the caller.
pub fn fingerprint(method: &str, path: &str, body: &Value) -> String {
    let composed = format!(
        "{}|{}|{}",
        method.to_uppercase(),
        path,
        canonical_json(body)
    );
    let mut hasher = Sha256::new();
    hasher.update(composed.as_bytes());
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_key_order_does_not_matter() {
        let a: Value = serde_json::from_str(r#"{"userId":"u1","amount":"100","assetCode":"GOLD_COINS"}"#).unwrap();
        let b: Value = serde_json::from_str(r#"{"assetCode":"GOLD_COINS","amount":"100","userId":"u1"}"#).unwrap();
        assert_eq!(
            fingerprint("POST", "/wallet/topup", &a),
            fingerprint("POST", "/wallet/topup", &b)
        );
    }

    #[test]
    fn test_nested_key_order_does_not_matter() {
        let a = json!({"outer": {"x": 1, "y": [ {"b": 2, "a": 1} ]}});
        let b: Value =
            serde_json::from_str(r#"{"outer":{"y":[{"a":1,"b":2}],"x":1}}"#).unwrap();
        assert_eq!(fingerprint("POST", "/p", &a), fingerprint("POST", "/p", &b));
    }

    #[test]
    fn test_array_order_matters() {
        let a = json!({"items": [1, 2]});
        let b = json!({"items": [2, 1]});
        assert_ne!(fingerprint("POST", "/p", &a), fingerprint("POST", "/p", &b));
    }

    #[test]
    fn test_number_and_string_differ() {
        // No-normalization policy: 1 and "1" are different request bodies.
        let a = json!({"amount": 1});
        let b = json!({"amount": "1"});
        assert_ne!(fingerprint("POST", "/p", &a), fingerprint("POST", "/p", &b));
    }

    #[test]
    fn test_method_is_case_insensitive() {
        let body = json!({"k": "v"});
        assert_eq!(
            fingerprint("post", "/p", &body),
            fingerprint("POST", "/p", &body)
        );
    }

    #[test]
    fn test_path_and_body_change_digest() {
        let body = json!({"k": "v"});
        assert_ne!(
            fingerprint("POST", "/wallet/topup", &body),
            fingerprint("POST", "/wallet/spend", &body)
        );
        assert_ne!(
            fingerprint("POST", "/p", &json!({"k": "v"})),
            fingerprint("POST", "/p", &json!({"k": "w"}))
        );
    }

    #[test]
    fn test_digest_shape() {
        let fp = fingerprint("POST", "/wallet/topup", &json!({}));
        assert_eq!(fp.len(), 64);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_canonical_primitives() {
        assert_eq!(canonical_json(&json!(null)), "null");
        assert_eq!(canonical_json(&json!(true)), "true");
        assert_eq!(canonical_json(&json!("a\"b")), r#""a\"b""#);
        assert_eq!(canonical_json(&json!({"b": 1, "a": [null, false]})), r#"{"a":[null,false],"b":1}"#);
    }
}
