//! # Payload Codec Tests
//!
//! End-to-end checks of the encode/decode contract and the equivalence
//! rules across the boundary shapes a real backend produces.

use vault_engine_controller::crd::KubeAuthEngineConfig;
use vault_engine_controller::vault::path::{build_path, cleanse_path};
use vault_engine_controller::vault::payload::{is_equivalent, BackendPayload, DecodeError};

#[test]
fn spec_encodes_to_documented_backend_keys() {
    let config = KubeAuthEngineConfig {
        kubernetes_host: "https://10.0.0.1:6443".to_string(),
        pem_keys: vec![],
        ..KubeAuthEngineConfig::default()
    };
    let payload = config.to_payload();

    assert_eq!(
        payload.require_str("kubernetes_host").unwrap(),
        "https://10.0.0.1:6443"
    );
    assert_eq!(payload.opt_string_list("pem_keys").unwrap(), Vec::<String>::new());
    assert!(!payload.opt_bool("disable_iss_validation").unwrap());
    assert!(!payload.opt_bool("disable_local_ca_jwt").unwrap());
}

#[test]
fn backend_omitting_empty_pem_keys_is_equivalent() {
    // Desired payload encodes pem_keys: []; the backend omits the key.
    // Must converge as NoChange, never as perpetual drift.
    let config = KubeAuthEngineConfig {
        kubernetes_host: "https://10.0.0.1:6443".to_string(),
        pem_keys: vec![],
        ..KubeAuthEngineConfig::default()
    };
    let desired = config.to_payload();

    let mut actual = desired.clone();
    actual.0.remove("pem_keys");

    assert!(is_equivalent(&desired, &actual));
}

#[test]
fn decode_of_backend_read_json_round_trips() {
    let raw = serde_json::json!({
        "kubernetes_host": "https://10.0.0.1:6443",
        "kubernetes_ca_cert": "",
        "token_reviewer_jwt": "",
        "issuer": "",
        "pem_keys": [],
        "disable_iss_validation": false,
        "disable_local_ca_jwt": false
    });
    let payload = BackendPayload::from_json_map(raw.as_object().unwrap());
    let decoded = KubeAuthEngineConfig::from_payload(&payload).unwrap();

    assert_eq!(decoded.kubernetes_host, "https://10.0.0.1:6443");
    assert_eq!(decoded.to_payload(), payload);
}

#[test]
fn decode_missing_host_reports_missing_key() {
    let raw = serde_json::json!({
        "pem_keys": ["k1"],
        "disable_iss_validation": true
    });
    let payload = BackendPayload::from_json_map(raw.as_object().unwrap());

    assert_eq!(
        KubeAuthEngineConfig::from_payload(&payload),
        Err(DecodeError::MissingKey("kubernetes_host".to_string()))
    );
}

#[test]
fn decode_tolerates_backend_added_fields() {
    let raw = serde_json::json!({
        "kubernetes_host": "https://10.0.0.1:6443",
        "some_new_backend_field": "value",
        "token_ttl": 3600
    });
    let payload = BackendPayload::from_json_map(raw.as_object().unwrap());
    let decoded = KubeAuthEngineConfig::from_payload(&payload).unwrap();
    assert_eq!(decoded.kubernetes_host, "https://10.0.0.1:6443");
}

#[test]
fn canonical_path_matches_backend_layout() {
    assert_eq!(
        build_path("auth", "kube1", "config", "my-config"),
        "auth/kube1/config/my-config"
    );
    assert_eq!(
        build_path("auth", "kube1", "role", "reader"),
        "auth/kube1/role/reader"
    );
}

#[test]
fn path_normalization_is_idempotent() {
    for raw in [
        "auth//kube1/config/my-config",
        "/auth/kube1/config/my-config",
        "auth/kube1///role//reader",
    ] {
        let once = cleanse_path(raw);
        assert_eq!(cleanse_path(&once), once);
    }
}
