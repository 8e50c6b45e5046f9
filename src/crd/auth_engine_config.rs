//! # KubernetesAuthEngineConfig
//!
//! CRD for the kube auth engine configuration object stored at
//! `auth/{spec.path}/config/{metadata.name}`, its backend codec, and its
//! resource-contract implementation.

use crate::controller::contract::{PrepareContext, VaultResource};
use crate::controller::status::HasVaultStatus;
use crate::controller::validation;
use crate::crd::authentication::VaultAuthentication;
use crate::crd::conditions::VaultResourceStatus;
use crate::vault::path::build_path;
use crate::vault::payload::{BackendPayload, DecodeError};
use anyhow::Context;
use async_trait::async_trait;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Reference to a key inside a Kubernetes Secret
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct SecretKeySelector {
    /// Secret name, resolved in the resource's namespace
    pub name: String,
    /// Key within the secret's data
    pub key: String,
}

/// KubernetesAuthEngineConfig Custom Resource Definition
///
/// Declares the desired configuration of a kube auth engine mount. The
/// controller converges the backend object at
/// `auth/{spec.path}/config/{metadata.name}` toward this spec.
///
/// # Example
///
/// ```yaml
/// apiVersion: vaultengine.dev/v1alpha1
/// kind: KubernetesAuthEngineConfig
/// metadata:
///   name: my-config
///   namespace: vault-admin
/// spec:
///   authentication:
///     path: kubernetes
///     role: vault-engine-controller
///   path: kube1
///   kubernetesHost: https://10.0.0.1:6443
///   pemKeys: []
/// ```
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "KubernetesAuthEngineConfig",
    group = "vaultengine.dev",
    version = "v1alpha1",
    namespaced,
    status = "VaultResourceStatus",
    shortname = "kaec",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}, {"name":"Reason", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].reason"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesAuthEngineConfigSpec {
    /// Authentication used to execute backend requests for this resource
    #[serde(default)]
    pub authentication: VaultAuthentication,
    /// Engine mount path fragment. The final backend path is
    /// `auth/{spec.path}/config/{metadata.name}`.
    pub path: String,
    /// Resolve the token reviewer JWT from a Secret instead of declaring it
    /// inline. Resolved during reconciliation, before payload computation.
    #[serde(default)]
    pub token_reviewer_jwt_from_secret: Option<SecretKeySelector>,
    #[serde(flatten)]
    pub config: KubeAuthEngineConfig,
}

/// Declared configuration fields of the kube auth engine mount.
///
/// Each field maps to exactly one backend key (snake_case, the backend's
/// documented names); the codec below owns that mapping in both directions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KubeAuthEngineConfig {
    /// Host string, host:port pair, or URL to the base of the Kubernetes
    /// API server the backend should validate tokens against
    pub kubernetes_host: String,
    /// PEM encoded CA cert for the TLS client used to talk with the
    /// Kubernetes API
    #[serde(default)]
    pub kubernetes_ca_cert: String,
    /// Service account JWT used to access the TokenReview API. If not set,
    /// the JWT submitted in the login payload is used instead.
    #[serde(default)]
    pub token_reviewer_jwt: String,
    /// PEM-formatted public keys or certificates used to verify service
    /// account JWT signatures
    #[serde(default)]
    pub pem_keys: Vec<String>,
    /// JWT issuer override. Empty selects the backend's default issuer.
    #[serde(default)]
    pub issuer: String,
    /// Disable JWT issuer validation
    #[serde(default)]
    pub disable_iss_validation: bool,
    /// Disable defaulting to the local CA cert and service account JWT when
    /// the backend itself runs in a Kubernetes pod
    #[serde(default)]
    pub disable_local_ca_jwt: bool,
}

impl KubeAuthEngineConfig {
    /// Encode the declared fields into the backend payload. Total: every
    /// field is emitted under its backend key, including empty values.
    pub fn to_payload(&self) -> BackendPayload {
        let mut payload = BackendPayload::new();
        payload.insert("kubernetes_host", self.kubernetes_host.clone());
        payload.insert("kubernetes_ca_cert", self.kubernetes_ca_cert.clone());
        payload.insert("token_reviewer_jwt", self.token_reviewer_jwt.clone());
        payload.insert("pem_keys", self.pem_keys.clone());
        payload.insert("issuer", self.issuer.clone());
        payload.insert("disable_iss_validation", self.disable_iss_validation);
        payload.insert("disable_local_ca_jwt", self.disable_local_ca_jwt);
        payload
    }

    /// Decode a backend payload into typed configuration.
    ///
    /// `kubernetes_host` is required; all other keys default per the
    /// omitted ≡ empty rule. Unknown extra keys are ignored. A covered key
    /// of the wrong kind is a [`DecodeError::TypeMismatch`].
    pub fn from_payload(payload: &BackendPayload) -> Result<Self, DecodeError> {
        Ok(Self {
            kubernetes_host: payload.require_str("kubernetes_host")?,
            kubernetes_ca_cert: payload.opt_str("kubernetes_ca_cert")?,
            token_reviewer_jwt: payload.opt_str("token_reviewer_jwt")?,
            pem_keys: payload.opt_string_list("pem_keys")?,
            issuer: payload.opt_str("issuer")?,
            disable_iss_validation: payload.opt_bool("disable_iss_validation")?,
            disable_local_ca_jwt: payload.opt_bool("disable_local_ca_jwt")?,
        })
    }
}

#[async_trait]
impl VaultResource for KubernetesAuthEngineConfig {
    fn path(&self) -> String {
        let name = self.metadata.name.as_deref().unwrap_or_default();
        build_path("auth", &self.spec.path, "config", name)
    }

    fn desired_payload(&self) -> BackendPayload {
        self.spec.config.to_payload()
    }

    fn decode_observed(&self, observed: &BackendPayload) -> Result<(), DecodeError> {
        KubeAuthEngineConfig::from_payload(observed).map(|_| ())
    }

    fn is_initialized(&self) -> bool {
        self.spec.authentication.is_initialized()
    }

    async fn prepare_internal_values(&mut self, ctx: &PrepareContext) -> anyhow::Result<()> {
        let Some(selector) = self.spec.token_reviewer_jwt_from_secret.clone() else {
            return Ok(());
        };
        let client = ctx
            .client
            .clone()
            .context("tokenReviewerJwtFromSecret is set but no Kubernetes client is available")?;
        self.spec.config.token_reviewer_jwt =
            resolve_secret_value(&client, &ctx.namespace, &selector).await?;
        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        validation::validate_auth_engine_config(&self.spec)
    }
}

impl HasVaultStatus for KubernetesAuthEngineConfig {
    fn vault_status(&self) -> Option<&VaultResourceStatus> {
        self.status.as_ref()
    }
}

/// Fetch a referenced secret value from the resource's namespace.
async fn resolve_secret_value(
    client: &kube::Client,
    namespace: &str,
    selector: &SecretKeySelector,
) -> anyhow::Result<String> {
    use k8s_openapi::api::core::v1::Secret;

    let api: kube::Api<Secret> = kube::Api::namespaced(client.clone(), namespace);
    let secret = api
        .get(&selector.name)
        .await
        .with_context(|| format!("failed to fetch secret '{}/{}'", namespace, selector.name))?;
    let data = secret
        .data
        .with_context(|| format!("secret '{}/{}' has no data", namespace, selector.name))?;
    let value = data.get(&selector.key).with_context(|| {
        format!(
            "secret '{}/{}' has no key '{}'",
            namespace, selector.name, selector.key
        )
    })?;
    String::from_utf8(value.0.clone()).with_context(|| {
        format!(
            "secret '{}/{}' key '{}' is not valid UTF-8",
            namespace, selector.name, selector.key
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vault::payload::PayloadValue;

    fn sample_config() -> KubeAuthEngineConfig {
        KubeAuthEngineConfig {
            kubernetes_host: "https://10.0.0.1:6443".to_string(),
            kubernetes_ca_cert: "-----BEGIN CERTIFICATE-----\nabc\n-----END CERTIFICATE-----\n"
                .to_string(),
            token_reviewer_jwt: "eyJhbGciOi".to_string(),
            pem_keys: vec!["-----BEGIN PUBLIC KEY-----".to_string()],
            issuer: "kubernetes/serviceaccount".to_string(),
            disable_iss_validation: true,
            disable_local_ca_jwt: false,
        }
    }

    #[test]
    fn test_codec_round_trip() {
        let config = sample_config();
        let decoded = KubeAuthEngineConfig::from_payload(&config.to_payload()).unwrap();
        assert_eq!(config, decoded);
    }

    #[test]
    fn test_codec_round_trip_with_empty_optionals() {
        let config = KubeAuthEngineConfig {
            kubernetes_host: "https://10.0.0.1:6443".to_string(),
            ..KubeAuthEngineConfig::default()
        };
        let decoded = KubeAuthEngineConfig::from_payload(&config.to_payload()).unwrap();
        assert_eq!(config, decoded);
    }

    #[test]
    fn test_encode_emits_every_backend_key() {
        let payload = sample_config().to_payload();
        for key in [
            "kubernetes_host",
            "kubernetes_ca_cert",
            "token_reviewer_jwt",
            "pem_keys",
            "issuer",
            "disable_iss_validation",
            "disable_local_ca_jwt",
        ] {
            assert!(payload.get(key).is_some(), "missing backend key {key}");
        }
    }

    #[test]
    fn test_decode_missing_host_fails() {
        let mut payload = sample_config().to_payload();
        payload.0.remove("kubernetes_host");
        assert_eq!(
            KubeAuthEngineConfig::from_payload(&payload),
            Err(DecodeError::MissingKey("kubernetes_host".to_string()))
        );
    }

    #[test]
    fn test_decode_wrong_kind_fails() {
        let mut payload = sample_config().to_payload();
        payload.insert("pem_keys", PayloadValue::Bool(true));
        assert!(matches!(
            KubeAuthEngineConfig::from_payload(&payload),
            Err(DecodeError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn test_decode_ignores_unknown_keys() {
        let mut payload = sample_config().to_payload();
        payload.insert("some_future_backend_field", "anything");
        assert_eq!(
            KubeAuthEngineConfig::from_payload(&payload).unwrap(),
            sample_config()
        );
    }
}
