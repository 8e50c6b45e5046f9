//! # Custom Resource Definitions
//!
//! CRD types for the Vault Engine Controller: the managed resource kinds,
//! the shared authentication block, and status conditions.

pub mod auth_engine_config;
pub mod auth_engine_role;
pub mod authentication;
pub mod conditions;

pub use auth_engine_config::{
    KubeAuthEngineConfig, KubernetesAuthEngineConfig, KubernetesAuthEngineConfigSpec,
    SecretKeySelector,
};
pub use auth_engine_role::{
    KubeAuthEngineRole, KubernetesAuthEngineRole, KubernetesAuthEngineRoleSpec,
};
pub use authentication::VaultAuthentication;
pub use conditions::{merge_condition, Condition, VaultResourceStatus};
