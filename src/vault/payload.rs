//! # Backend Payloads
//!
//! The untyped key/value representation of what is stored in (and read back
//! from) the backend at a given path, plus the typed decode primitives and
//! the equivalence check that decides whether a write is needed.
//!
//! Values are limited to the alphabet the auth engine API actually uses:
//! strings, booleans, and lists of strings. Decode is fallible and typed:
//! a missing required key or a value of the wrong kind is a [`DecodeError`],
//! never a silent default or a crash.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// A single backend value: string, boolean, or list of strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PayloadValue {
    /// Boolean flag, e.g. `disable_iss_validation`
    Bool(bool),
    /// Plain string, e.g. `kubernetes_host`
    Str(String),
    /// Ordered list of strings, e.g. `pem_keys`
    List(Vec<String>),
}

impl PayloadValue {
    /// Whether this value is the empty representation of its kind.
    ///
    /// Used by the equivalence rule: the backend may omit a key entirely
    /// where the desired payload carries an explicit empty string or list.
    fn is_empty(&self) -> bool {
        match self {
            PayloadValue::Bool(_) => false,
            PayloadValue::Str(s) => s.is_empty(),
            PayloadValue::List(l) => l.is_empty(),
        }
    }
}

impl From<&str> for PayloadValue {
    fn from(value: &str) -> Self {
        PayloadValue::Str(value.to_string())
    }
}

impl From<String> for PayloadValue {
    fn from(value: String) -> Self {
        PayloadValue::Str(value)
    }
}

impl From<bool> for PayloadValue {
    fn from(value: bool) -> Self {
        PayloadValue::Bool(value)
    }
}

impl From<Vec<String>> for PayloadValue {
    fn from(value: Vec<String>) -> Self {
        PayloadValue::List(value)
    }
}

/// Typed decode failure for a backend payload.
///
/// Replaces unchecked dynamic casts: malformed backend state surfaces as a
/// data-integrity condition instead of aborting the reconcile loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// A required key is absent from the payload
    #[error("required key '{0}' is missing from backend payload")]
    MissingKey(String),
    /// A key is present but its value is not the expected kind
    #[error("key '{key}' has the wrong kind: expected {expected}")]
    TypeMismatch {
        key: String,
        expected: &'static str,
    },
}

/// Untyped mapping stored at a backend path.
///
/// Keyed by the backend's documented snake_case field names. `BTreeMap`
/// keeps iteration (and therefore serialization) order stable.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendPayload(pub BTreeMap<String, PayloadValue>);

impl BackendPayload {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Insert a value under its backend key name.
    pub fn insert(&mut self, key: &str, value: impl Into<PayloadValue>) {
        self.0.insert(key.to_string(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&PayloadValue> {
        self.0.get(key)
    }

    /// Required string field. Absent → `MissingKey`, wrong kind → `TypeMismatch`.
    pub fn require_str(&self, key: &str) -> Result<String, DecodeError> {
        match self.0.get(key) {
            Some(PayloadValue::Str(s)) => Ok(s.clone()),
            Some(_) => Err(DecodeError::TypeMismatch {
                key: key.to_string(),
                expected: "string",
            }),
            None => Err(DecodeError::MissingKey(key.to_string())),
        }
    }

    /// Optional string field. Absent decodes as empty (omitted ≡ empty).
    pub fn opt_str(&self, key: &str) -> Result<String, DecodeError> {
        match self.0.get(key) {
            Some(PayloadValue::Str(s)) => Ok(s.clone()),
            Some(_) => Err(DecodeError::TypeMismatch {
                key: key.to_string(),
                expected: "string",
            }),
            None => Ok(String::new()),
        }
    }

    /// Optional boolean field. Absent decodes as `false`.
    pub fn opt_bool(&self, key: &str) -> Result<bool, DecodeError> {
        match self.0.get(key) {
            Some(PayloadValue::Bool(b)) => Ok(*b),
            Some(_) => Err(DecodeError::TypeMismatch {
                key: key.to_string(),
                expected: "bool",
            }),
            None => Ok(false),
        }
    }

    /// Optional list-of-strings field. Absent decodes as empty (omitted ≡ empty).
    pub fn opt_string_list(&self, key: &str) -> Result<Vec<String>, DecodeError> {
        match self.0.get(key) {
            Some(PayloadValue::List(l)) => Ok(l.clone()),
            Some(_) => Err(DecodeError::TypeMismatch {
                key: key.to_string(),
                expected: "list of strings",
            }),
            None => Ok(Vec::new()),
        }
    }

    /// Convert a raw JSON object (the backend read response `data` envelope)
    /// into a payload.
    ///
    /// Values outside the string/bool/list-of-strings alphabet are skipped:
    /// they can only belong to backend-added fields no codec covers, and the
    /// codecs ignore unknown keys anyway.
    pub fn from_json_map(map: &serde_json::Map<String, serde_json::Value>) -> Self {
        let mut payload = BackendPayload::new();
        for (key, value) in map {
            match json_to_payload_value(value) {
                Some(v) => {
                    payload.0.insert(key.clone(), v);
                }
                None => {
                    tracing::debug!(key = %key, "skipping backend field with unmodeled value kind");
                }
            }
        }
        payload
    }

    /// Render the payload as a JSON object for the backend write body.
    pub fn to_json_map(&self) -> serde_json::Map<String, serde_json::Value> {
        let mut map = serde_json::Map::new();
        for (key, value) in &self.0 {
            let json = match value {
                PayloadValue::Str(s) => serde_json::Value::String(s.clone()),
                PayloadValue::Bool(b) => serde_json::Value::Bool(*b),
                PayloadValue::List(l) => serde_json::Value::Array(
                    l.iter().cloned().map(serde_json::Value::String).collect(),
                ),
            };
            map.insert(key.clone(), json);
        }
        map
    }
}

fn json_to_payload_value(value: &serde_json::Value) -> Option<PayloadValue> {
    match value {
        serde_json::Value::String(s) => Some(PayloadValue::Str(s.clone())),
        serde_json::Value::Bool(b) => Some(PayloadValue::Bool(*b)),
        serde_json::Value::Array(items) => {
            let mut list = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    serde_json::Value::String(s) => list.push(s.clone()),
                    _ => return None,
                }
            }
            Some(PayloadValue::List(list))
        }
        _ => None,
    }
}

/// Decide whether a desired payload is semantically identical to an observed
/// payload.
///
/// Structural deep equality over the mapping, with list values compared by
/// ordered element-wise equality. One canonical rule beyond plain equality:
/// a key omitted on one side is equivalent to an explicit empty string or
/// empty list on the other. The backend omits empty collections on read, so
/// without this rule a spec declaring `pem_keys: []` would be flagged as
/// drifted on every reconcile.
pub fn is_equivalent(desired: &BackendPayload, actual: &BackendPayload) -> bool {
    for (key, desired_value) in &desired.0 {
        match actual.0.get(key) {
            Some(actual_value) => {
                if desired_value != actual_value {
                    return false;
                }
            }
            None => {
                if !desired_value.is_empty() {
                    return false;
                }
            }
        }
    }
    // Keys present only on the actual side count as drift unless empty
    for (key, actual_value) in &actual.0 {
        if !desired.0.contains_key(key) && !actual_value.is_empty() {
            return false;
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(entries: &[(&str, PayloadValue)]) -> BackendPayload {
        let mut p = BackendPayload::new();
        for (k, v) in entries {
            p.insert(k, v.clone());
        }
        p
    }

    #[test]
    fn test_equivalence_is_reflexive() {
        let p = payload(&[
            ("kubernetes_host", "https://10.0.0.1:6443".into()),
            ("pem_keys", vec!["k1".to_string()].into()),
            ("disable_iss_validation", false.into()),
        ]);
        assert!(is_equivalent(&p, &p));
    }

    #[test]
    fn test_equivalence_omitted_key_equals_empty_list() {
        let desired = payload(&[
            ("kubernetes_host", "https://10.0.0.1:6443".into()),
            ("pem_keys", Vec::<String>::new().into()),
        ]);
        let actual = payload(&[("kubernetes_host", "https://10.0.0.1:6443".into())]);
        assert!(is_equivalent(&desired, &actual));
        assert!(is_equivalent(&actual, &desired));
    }

    #[test]
    fn test_equivalence_omitted_key_equals_empty_string() {
        let desired = payload(&[
            ("kubernetes_host", "h".into()),
            ("issuer", "".into()),
        ]);
        let actual = payload(&[("kubernetes_host", "h".into())]);
        assert!(is_equivalent(&desired, &actual));
    }

    #[test]
    fn test_equivalence_detects_value_drift() {
        let desired = payload(&[("kubernetes_host", "https://new".into())]);
        let actual = payload(&[("kubernetes_host", "https://old".into())]);
        assert!(!is_equivalent(&desired, &actual));
    }

    #[test]
    fn test_equivalence_list_order_matters() {
        let desired = payload(&[("pem_keys", vec!["a".to_string(), "b".to_string()].into())]);
        let actual = payload(&[("pem_keys", vec!["b".to_string(), "a".to_string()].into())]);
        assert!(!is_equivalent(&desired, &actual));
    }

    #[test]
    fn test_equivalence_extra_nonempty_actual_key_is_drift() {
        let desired = payload(&[("kubernetes_host", "h".into())]);
        let actual = payload(&[
            ("kubernetes_host", "h".into()),
            ("issuer", "kubernetes/serviceaccount".into()),
        ]);
        assert!(!is_equivalent(&desired, &actual));
    }

    #[test]
    fn test_require_str_missing_key() {
        let p = BackendPayload::new();
        assert_eq!(
            p.require_str("kubernetes_host"),
            Err(DecodeError::MissingKey("kubernetes_host".to_string()))
        );
    }

    #[test]
    fn test_require_str_type_mismatch() {
        let p = payload(&[("kubernetes_host", true.into())]);
        assert_eq!(
            p.require_str("kubernetes_host"),
            Err(DecodeError::TypeMismatch {
                key: "kubernetes_host".to_string(),
                expected: "string",
            })
        );
    }

    #[test]
    fn test_opt_accessors_default_when_absent() {
        let p = BackendPayload::new();
        assert_eq!(p.opt_str("issuer").unwrap(), "");
        assert!(!p.opt_bool("disable_iss_validation").unwrap());
        assert!(p.opt_string_list("pem_keys").unwrap().is_empty());
    }

    #[test]
    fn test_opt_list_type_mismatch() {
        let p = payload(&[("pem_keys", "not-a-list".into())]);
        assert!(matches!(
            p.opt_string_list("pem_keys"),
            Err(DecodeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_from_json_map_skips_unmodeled_kinds() {
        let raw = serde_json::json!({
            "kubernetes_host": "https://10.0.0.1:6443",
            "disable_iss_validation": false,
            "pem_keys": ["k1"],
            "token_ttl": 3600,
            "metadata": {"nested": true}
        });
        let map = raw.as_object().unwrap();
        let p = BackendPayload::from_json_map(map);
        assert_eq!(p.require_str("kubernetes_host").unwrap(), "https://10.0.0.1:6443");
        assert_eq!(p.opt_string_list("pem_keys").unwrap(), vec!["k1".to_string()]);
        assert!(p.get("token_ttl").is_none());
        assert!(p.get("metadata").is_none());
    }

    #[test]
    fn test_json_round_trip() {
        let p = payload(&[
            ("kubernetes_host", "h".into()),
            ("disable_local_ca_jwt", true.into()),
            ("pem_keys", vec!["k1".to_string(), "k2".to_string()].into()),
        ]);
        let round_tripped = BackendPayload::from_json_map(&p.to_json_map());
        assert_eq!(p, round_tripped);
    }
}
