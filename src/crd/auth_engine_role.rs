//! # KubernetesAuthEngineRole
//!
//! CRD for a kube auth engine role stored at
//! `auth/{spec.path}/role/{metadata.name}`. Second managed kind; exercises
//! the same generic driver through its own contract implementation.

use crate::controller::contract::{PrepareContext, VaultResource};
use crate::controller::status::HasVaultStatus;
use crate::controller::validation;
use crate::crd::authentication::VaultAuthentication;
use crate::crd::conditions::VaultResourceStatus;
use crate::vault::path::build_path;
use crate::vault::payload::{BackendPayload, DecodeError};
use async_trait::async_trait;
use kube::CustomResource;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// KubernetesAuthEngineRole Custom Resource Definition
///
/// Declares a role on a kube auth engine mount, binding service accounts to
/// backend policies.
#[derive(CustomResource, Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[kube(
    kind = "KubernetesAuthEngineRole",
    group = "vaultengine.dev",
    version = "v1alpha1",
    namespaced,
    status = "VaultResourceStatus",
    shortname = "kaer",
    printcolumn = r#"{"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}, {"name":"Reason", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].reason"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct KubernetesAuthEngineRoleSpec {
    /// Authentication used to execute backend requests for this resource
    #[serde(default)]
    pub authentication: VaultAuthentication,
    /// Engine mount path fragment. The final backend path is
    /// `auth/{spec.path}/role/{metadata.name}`.
    pub path: String,
    #[serde(flatten)]
    pub role: KubeAuthEngineRole,
}

/// Declared fields of a kube auth engine role
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KubeAuthEngineRole {
    /// Service account names able to access this role
    #[serde(default)]
    pub bound_service_account_names: Vec<String>,
    /// Namespaces allowed to access this role
    #[serde(default)]
    pub bound_service_account_namespaces: Vec<String>,
    /// Policies attached to tokens issued against this role
    #[serde(default)]
    pub token_policies: Vec<String>,
    /// Optional audience claim to verify in the JWT
    #[serde(default)]
    pub audience: String,
}

impl KubeAuthEngineRole {
    pub fn to_payload(&self) -> BackendPayload {
        let mut payload = BackendPayload::new();
        payload.insert(
            "bound_service_account_names",
            self.bound_service_account_names.clone(),
        );
        payload.insert(
            "bound_service_account_namespaces",
            self.bound_service_account_namespaces.clone(),
        );
        payload.insert("token_policies", self.token_policies.clone());
        payload.insert("audience", self.audience.clone());
        payload
    }

    /// No key is hard-required on decode: a half-written role reads back as
    /// drift, not as a decode failure. Non-emptiness of the desired spec is
    /// validation's job.
    pub fn from_payload(payload: &BackendPayload) -> Result<Self, DecodeError> {
        Ok(Self {
            bound_service_account_names: payload.opt_string_list("bound_service_account_names")?,
            bound_service_account_namespaces: payload
                .opt_string_list("bound_service_account_namespaces")?,
            token_policies: payload.opt_string_list("token_policies")?,
            audience: payload.opt_str("audience")?,
        })
    }
}

#[async_trait]
impl VaultResource for KubernetesAuthEngineRole {
    fn path(&self) -> String {
        let name = self.metadata.name.as_deref().unwrap_or_default();
        build_path("auth", &self.spec.path, "role", name)
    }

    fn desired_payload(&self) -> BackendPayload {
        self.spec.role.to_payload()
    }

    fn decode_observed(&self, observed: &BackendPayload) -> Result<(), DecodeError> {
        KubeAuthEngineRole::from_payload(observed).map(|_| ())
    }

    fn is_initialized(&self) -> bool {
        self.spec.authentication.is_initialized()
    }

    async fn prepare_internal_values(&mut self, _ctx: &PrepareContext) -> anyhow::Result<()> {
        Ok(())
    }

    fn validate(&self) -> anyhow::Result<()> {
        validation::validate_auth_engine_role(&self.spec)
    }
}

impl HasVaultStatus for KubernetesAuthEngineRole {
    fn vault_status(&self) -> Option<&VaultResourceStatus> {
        self.status.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_role() -> KubeAuthEngineRole {
        KubeAuthEngineRole {
            bound_service_account_names: vec!["reader".to_string()],
            bound_service_account_namespaces: vec!["team-a".to_string(), "team-b".to_string()],
            token_policies: vec!["read-secrets".to_string()],
            audience: String::new(),
        }
    }

    #[test]
    fn test_codec_round_trip() {
        let role = sample_role();
        let decoded = KubeAuthEngineRole::from_payload(&role.to_payload()).unwrap();
        assert_eq!(role, decoded);
    }

    #[test]
    fn test_decode_of_empty_payload_yields_default() {
        let decoded = KubeAuthEngineRole::from_payload(&BackendPayload::new()).unwrap();
        assert_eq!(decoded, KubeAuthEngineRole::default());
    }
}
