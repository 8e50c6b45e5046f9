//! # Vault Authentication Reference
//!
//! How a managed resource authenticates its requests to the backend: the
//! kube auth mount and role the controller's token was issued against. Also
//! carries the initialization gate: a resource is not reconcilable until
//! its auth method mount exists.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Kube auth configuration used to execute backend requests for a resource
#[derive(Debug, Clone, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VaultAuthentication {
    /// Path of the kube auth method mount used to authenticate
    #[serde(default = "default_auth_path")]
    pub path: String,
    /// Role bound to the controller's service account on that mount.
    /// Empty until the auth method mount has been provisioned.
    #[serde(default)]
    pub role: String,
    /// Service account whose token is presented at login.
    /// Defaults to the controller's own service account.
    #[serde(default)]
    pub service_account_name: Option<String>,
}

impl Default for VaultAuthentication {
    fn default() -> Self {
        Self {
            path: default_auth_path(),
            role: String::new(),
            service_account_name: None,
        }
    }
}

impl VaultAuthentication {
    /// True once the prerequisite auth method mount exists and a role has
    /// been bound. Reconciliation must not start before this holds.
    pub fn is_initialized(&self) -> bool {
        !self.path.is_empty() && !self.role.is_empty()
    }
}

fn default_auth_path() -> String {
    "kubernetes".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_not_initialized() {
        assert!(!VaultAuthentication::default().is_initialized());
    }

    #[test]
    fn test_initialized_once_role_bound() {
        let auth = VaultAuthentication {
            role: "vault-engine-controller".to_string(),
            ..VaultAuthentication::default()
        };
        assert!(auth.is_initialized());
    }
}
