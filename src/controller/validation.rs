//! # Validation
//!
//! Resource-kind-specific semantic validation beyond schema validation.
//! Invalid specs surface as `InvalidSpec` conditions and are not retried by
//! the driver.

use crate::crd::{KubernetesAuthEngineConfigSpec, KubernetesAuthEngineRoleSpec};
use anyhow::Result;
use regex::Regex;

/// Validate a KubernetesAuthEngineConfig spec.
pub fn validate_auth_engine_config(spec: &KubernetesAuthEngineConfigSpec) -> Result<()> {
    validate_engine_path(&spec.path)?;
    validate_kubernetes_host(&spec.config.kubernetes_host)?;

    if let Some(ref selector) = spec.token_reviewer_jwt_from_secret {
        if selector.name.trim().is_empty() || selector.key.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "tokenReviewerJwtFromSecret requires both name and key"
            ));
        }
        if !spec.config.token_reviewer_jwt.is_empty() {
            return Err(anyhow::anyhow!(
                "tokenReviewerJWT and tokenReviewerJwtFromSecret are mutually exclusive"
            ));
        }
    }
    Ok(())
}

/// Validate a KubernetesAuthEngineRole spec.
///
/// A role with no bound service accounts or no policies is schema-valid but
/// semantically useless, and the backend would accept it silently; reject it
/// here instead.
pub fn validate_auth_engine_role(spec: &KubernetesAuthEngineRoleSpec) -> Result<()> {
    validate_engine_path(&spec.path)?;

    if spec.role.bound_service_account_names.is_empty() {
        return Err(anyhow::anyhow!(
            "boundServiceAccountNames must declare at least one service account"
        ));
    }
    if spec.role.bound_service_account_namespaces.is_empty() {
        return Err(anyhow::anyhow!(
            "boundServiceAccountNamespaces must declare at least one namespace"
        ));
    }
    if spec.role.token_policies.is_empty() {
        return Err(anyhow::anyhow!(
            "tokenPolicies must declare at least one policy"
        ));
    }
    Ok(())
}

/// Validate an engine mount path fragment.
///
/// Must be non-empty, relative (no leading slash), and composed of
/// slash-separated segments of alphanumerics, hyphens, and underscores.
pub fn validate_engine_path(path: &str) -> Result<()> {
    let path_trimmed = path.trim();

    if path_trimmed.is_empty() {
        return Err(anyhow::anyhow!("spec.path cannot be empty"));
    }
    if path_trimmed.starts_with('/') {
        return Err(anyhow::anyhow!(
            "spec.path '{path_trimmed}' must be relative to the auth mount (no leading slash)"
        ));
    }

    let segment_regex = Regex::new(r"^[a-zA-Z0-9_-]+(/[a-zA-Z0-9_-]+)*$")
        .map_err(|e| anyhow::anyhow!("Failed to compile regex: {e}"))?;
    if !segment_regex.is_match(path_trimmed) {
        return Err(anyhow::anyhow!(
            "spec.path '{path_trimmed}' must be slash-separated segments of alphanumerics, hyphens, and underscores"
        ));
    }
    Ok(())
}

/// Validate the kubernetes host field.
///
/// Accepts a URL (`http://` or `https://`), a bare host, or a host:port
/// pair, matching what the backend's config endpoint accepts.
pub fn validate_kubernetes_host(host: &str) -> Result<()> {
    let host_trimmed = host.trim();

    if host_trimmed.is_empty() {
        return Err(anyhow::anyhow!("kubernetesHost is required but is empty"));
    }

    let url_regex = Regex::new(r"^https?://[^\s/$.?#].[^\s]*$")
        .map_err(|e| anyhow::anyhow!("Failed to compile regex: {e}"))?;
    let host_port_regex = Regex::new(r"^[a-zA-Z0-9.-]+(:\d{1,5})?$")
        .map_err(|e| anyhow::anyhow!("Failed to compile regex: {e}"))?;

    if url_regex.is_match(host_trimmed) || host_port_regex.is_match(host_trimmed) {
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "kubernetesHost '{host_trimmed}' must be a host, host:port pair, or http(s) URL"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::{KubeAuthEngineConfig, KubeAuthEngineRole, VaultAuthentication};

    fn config_spec(path: &str, host: &str) -> KubernetesAuthEngineConfigSpec {
        KubernetesAuthEngineConfigSpec {
            authentication: VaultAuthentication::default(),
            path: path.to_string(),
            token_reviewer_jwt_from_secret: None,
            config: KubeAuthEngineConfig {
                kubernetes_host: host.to_string(),
                ..KubeAuthEngineConfig::default()
            },
        }
    }

    #[test]
    fn test_valid_config_spec() {
        assert!(validate_auth_engine_config(&config_spec("kube1", "https://10.0.0.1:6443")).is_ok());
        assert!(validate_auth_engine_config(&config_spec("kube1", "10.0.0.1:6443")).is_ok());
    }

    #[test]
    fn test_empty_host_rejected() {
        assert!(validate_auth_engine_config(&config_spec("kube1", "")).is_err());
    }

    #[test]
    fn test_absolute_engine_path_rejected() {
        assert!(validate_auth_engine_config(&config_spec("/kube1", "https://h")).is_err());
    }

    #[test]
    fn test_engine_path_with_empty_segment_rejected() {
        assert!(validate_engine_path("kube1//nested").is_err());
        assert!(validate_engine_path("kube1/nested").is_ok());
    }

    #[test]
    fn test_role_requires_bindings_and_policies() {
        let mut spec = KubernetesAuthEngineRoleSpec {
            authentication: VaultAuthentication::default(),
            path: "kube1".to_string(),
            role: KubeAuthEngineRole {
                bound_service_account_names: vec!["reader".to_string()],
                bound_service_account_namespaces: vec!["team-a".to_string()],
                token_policies: vec!["read-secrets".to_string()],
                audience: String::new(),
            },
        };
        assert!(validate_auth_engine_role(&spec).is_ok());

        spec.role.token_policies.clear();
        assert!(validate_auth_engine_role(&spec).is_err());
    }
}
