//! # Reconciler
//!
//! Glue between the controller runtime and the generic driver: one
//! reconcile entry point parameterized over the resource kind. Runs the
//! driver, reports the outcome as a status condition, and maps the outcome
//! to a requeue action. Retry on failure is the error-policy layer's job.

use crate::constants;
use crate::controller::contract::{PrepareContext, VaultResource};
use crate::controller::driver::{converge, Outcome, ReconcileError};
use crate::controller::status::{
    error_condition, next_status, outcome_condition, patch_status, HasVaultStatus,
};
use crate::vault::transport::VaultTransport;
use k8s_openapi::NamespaceResourceScope;
use kube::api::Api;
use kube::{Client, Resource, ResourceExt};
use kube_runtime::controller::Action;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::{info, warn, Instrument};

/// Shared context handed to every reconcile invocation.
pub struct ControllerContext {
    pub client: Client,
    pub transport: Arc<dyn VaultTransport>,
    /// Consecutive error count per resource key, consumed by the error
    /// policy's backoff and reset on success.
    pub error_counts: Mutex<HashMap<String, u32>>,
}

impl std::fmt::Debug for ControllerContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ControllerContext").finish_non_exhaustive()
    }
}

impl ControllerContext {
    pub fn new(client: Client, transport: Arc<dyn VaultTransport>) -> Self {
        Self {
            client,
            transport,
            error_counts: Mutex::new(HashMap::new()),
        }
    }

    fn clear_error_count(&self, key: &str) {
        if let Ok(mut counts) = self.error_counts.lock() {
            counts.remove(key);
        }
    }
}

/// Reconciler failure surfaced to the controller runtime.
#[derive(Debug, Error)]
pub enum ReconcilerError {
    #[error(transparent)]
    Reconcile(#[from] ReconcileError),
    #[error("failed to patch status: {0}")]
    StatusUpdate(#[source] kube::Error),
}

/// Bound alias for kinds the generic reconcile function can drive.
pub trait ManagedResource:
    VaultResource
    + HasVaultStatus
    + kube::Resource<DynamicType = (), Scope = NamespaceResourceScope>
    + Clone
    + DeserializeOwned
    + Serialize
    + std::fmt::Debug
    + Send
    + Sync
    + 'static
{
}

impl<K> ManagedResource for K where
    K: VaultResource
        + HasVaultStatus
        + kube::Resource<DynamicType = (), Scope = NamespaceResourceScope>
        + Clone
        + DeserializeOwned
        + Serialize
        + std::fmt::Debug
        + Send
        + Sync
        + 'static
{
}

/// Reconcile one resource instance of kind `K`.
pub async fn reconcile<K: ManagedResource>(
    obj: Arc<K>,
    ctx: Arc<ControllerContext>,
) -> Result<Action, ReconcilerError> {
    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_else(|| "default".to_string());

    let span = tracing::span!(
        tracing::Level::INFO,
        "controller.reconcile",
        resource.name = %name,
        resource.namespace = %namespace,
    );

    // Instrument the future instead of holding an entered guard: the runtime
    // polls many reconcile futures on one task, and a guard held across an
    // await leaves the span entered while other resources run.
    async move {
        let resource_key = format!("{namespace}/{name}");

        let api: Api<K> = Api::namespaced(ctx.client.clone(), &namespace);
        let prepare_ctx = PrepareContext {
            client: Some(ctx.client.clone()),
            namespace: namespace.clone(),
        };

        // The watch handed us an immutable snapshot; the driver mutates its
        // own copy when it resolves internal values.
        let mut resource = (*obj).clone();
        let result = converge(&mut resource, ctx.transport.as_ref(), &prepare_ctx).await;

        let condition = match &result {
            Ok(outcome) => outcome_condition(outcome),
            Err(error) => error_condition(error),
        };
        let status = next_status(obj.vault_status(), condition, obj.meta().generation);
        patch_status(&api, &name, obj.vault_status(), &status)
            .await
            .map_err(ReconcilerError::StatusUpdate)?;

        match result {
            Ok(Outcome::Updated) => {
                info!("reconciled: backend updated");
                ctx.clear_error_count(&resource_key);
                Ok(Action::requeue(std::time::Duration::from_secs(
                    constants::DEFAULT_RECONCILE_INTERVAL_SECS,
                )))
            }
            Ok(Outcome::NoChange) => {
                info!("reconciled: no change");
                ctx.clear_error_count(&resource_key);
                Ok(Action::requeue(std::time::Duration::from_secs(
                    constants::DEFAULT_RECONCILE_INTERVAL_SECS,
                )))
            }
            Ok(Outcome::Waiting { message }) => {
                // Not an error: requeue on a short interval without touching
                // the error counts
                warn!(message = %message, "waiting on prerequisite");
                Ok(Action::requeue(std::time::Duration::from_secs(
                    constants::WAITING_REQUEUE_SECS,
                )))
            }
            Err(error) => Err(ReconcilerError::Reconcile(error)),
        }
    }
    .instrument(span)
    .await
}
