//! # Watch Loop
//!
//! Runs one `kube_runtime::Controller` per managed kind. The runtime owns
//! the work queue, per-key serialization, and re-invocation after the
//! requeue/backoff actions the reconciler and error policy return.

use crate::controller::reconciler::{reconcile, ControllerContext, ManagedResource};
use crate::crd::{KubernetesAuthEngineConfig, KubernetesAuthEngineRole};
use crate::runtime::error_policy::handle_reconciliation_error;
use anyhow::Result;
use futures::StreamExt;
use kube::api::Api;
use kube::ResourceExt;
use kube_runtime::watcher;
use kube_runtime::Controller;
use std::sync::Arc;
use tracing::{info, warn};

/// Run the watch loops for both managed kinds until shutdown.
pub async fn run_watch_loop(
    configs: Api<KubernetesAuthEngineConfig>,
    roles: Api<KubernetesAuthEngineRole>,
    context: Arc<ControllerContext>,
) -> Result<()> {
    tokio::join!(
        run_controller(configs, context.clone(), "KubernetesAuthEngineConfig"),
        run_controller(roles, context, "KubernetesAuthEngineRole"),
    );
    Ok(())
}

async fn run_controller<K: ManagedResource>(api: Api<K>, context: Arc<ControllerContext>, kind: &str) {
    Controller::new(api, watcher::Config::default())
        .shutdown_on_signal()
        .run(reconcile::<K>, handle_reconciliation_error::<K>, context)
        .for_each(|result| async move {
            match result {
                Ok((object, _action)) => {
                    info!(kind = kind, resource.name = %object.name, "reconciliation completed");
                }
                Err(e) => {
                    warn!(kind = kind, error = %e, "reconciliation stream error");
                }
            }
        })
        .await;
    info!(kind = kind, "watch loop stopped");
}
