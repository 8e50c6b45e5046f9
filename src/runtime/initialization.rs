//! # Initialization
//!
//! Controller startup: rustls setup, tracing subscriber, environment
//! configuration, backend transport, and Kubernetes client creation.

use crate::constants;
use crate::controller::reconciler::ControllerContext;
use crate::crd::{KubernetesAuthEngineConfig, KubernetesAuthEngineRole};
use crate::vault::transport::VaultClient;
use anyhow::{Context, Result};
use kube::api::{Api, ListParams};
use kube::{Client, ResourceExt};
use std::sync::Arc;
use tracing::{info, warn};

/// Everything the watch loop needs, assembled once at startup.
pub struct InitializationResult {
    pub configs: Api<KubernetesAuthEngineConfig>,
    pub roles: Api<KubernetesAuthEngineRole>,
    pub context: Arc<ControllerContext>,
}

impl std::fmt::Debug for InitializationResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InitializationResult").finish_non_exhaustive()
    }
}

/// Initialize the controller runtime.
pub async fn initialize() -> Result<InitializationResult> {
    // Configure rustls crypto provider FIRST, before any client is built.
    // Required for rustls 0.23+ when no default provider is set via features.
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| constants::DEFAULT_LOG_FILTER.into()),
        )
        .init();

    info!("Starting Vault Engine Controller");

    let vault_addr = std::env::var(constants::ENV_VAULT_ADDR)
        .unwrap_or_else(|_| constants::DEFAULT_VAULT_ADDR.to_string());
    let vault_token = std::env::var(constants::ENV_VAULT_TOKEN)
        .with_context(|| format!("{} must be set", constants::ENV_VAULT_TOKEN))?;
    let transport =
        VaultClient::new(&vault_addr, &vault_token).context("failed to build backend transport")?;
    info!(address = %vault_addr, "backend transport configured");

    let client = Client::try_default().await?;

    // Watch all namespaces: resources may be declared wherever teams own them
    let configs: Api<KubernetesAuthEngineConfig> = Api::all(client.clone());
    let roles: Api<KubernetesAuthEngineRole> = Api::all(client.clone());

    let context = Arc::new(ControllerContext::new(client, Arc::new(transport)));

    log_existing_resources(&configs, "KubernetesAuthEngineConfig").await;
    log_existing_resources(&roles, "KubernetesAuthEngineRole").await;

    info!("controller initialized, starting watch loops");
    Ok(InitializationResult {
        configs,
        roles,
        context,
    })
}

/// Summarize pre-existing resources at startup. The watch reconciles them
/// all anyway; this gives operators visibility into what will be driven.
async fn log_existing_resources<K>(api: &Api<K>, kind: &str)
where
    K: kube::Resource<DynamicType = ()>
        + Clone
        + serde::de::DeserializeOwned
        + std::fmt::Debug,
{
    match api.list(&ListParams::default()).await {
        Ok(list) => {
            info!(kind = kind, count = list.items.len(), "existing resources found");
            for item in &list.items {
                info!(
                    kind = kind,
                    resource.name = %item.name_any(),
                    resource.namespace = %item.namespace().unwrap_or_else(|| "default".to_string()),
                    "will reconcile existing resource"
                );
            }
        }
        Err(e) => {
            warn!(kind = kind, error = %e, "CRD is not queryable; is the CRD installed?");
            warn!("Installation: cargo run --bin crdgen | kubectl apply -f -");
        }
    }
}
