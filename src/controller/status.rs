//! # Status Management
//!
//! Maps driver outcomes and failures onto Ready conditions with stable
//! reason codes, and patches the status subresource. Patches are skipped
//! when the status is unchanged so reconciles do not churn watch events.

use crate::controller::driver::{Outcome, ReconcileError};
use crate::crd::conditions::{merge_condition, Condition, VaultResourceStatus};
use kube::api::{Api, Patch, PatchParams};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::constants;

/// Read access to the shared status type, implemented by every managed kind.
pub trait HasVaultStatus {
    fn vault_status(&self) -> Option<&VaultResourceStatus>;
}

/// Ready condition for a successful reconciliation outcome.
///
/// `Updated` and `NoChange` are both success conditions, distinguished by
/// reason for observability only. `Waiting` is Ready=False but carries a
/// non-error reason.
pub fn outcome_condition(outcome: &Outcome) -> Condition {
    let (status, reason, message) = match outcome {
        Outcome::Updated => (
            "True",
            "ReconciliationSucceeded",
            "backend updated to desired state".to_string(),
        ),
        Outcome::NoChange => (
            "True",
            "ReconciliationSucceededNoChange",
            "backend already matches desired state".to_string(),
        ),
        Outcome::Waiting { message } => ("False", "WaitingForPrerequisites", message.clone()),
    };
    Condition {
        r#type: "Ready".to_string(),
        status: status.to_string(),
        last_transition_time: Some(chrono::Utc::now().to_rfc3339()),
        reason: Some(reason.to_string()),
        message: Some(message),
    }
}

/// Ready=False condition for a reconciliation failure.
pub fn error_condition(error: &ReconcileError) -> Condition {
    Condition {
        r#type: "Ready".to_string(),
        status: "False".to_string(),
        last_transition_time: Some(chrono::Utc::now().to_rfc3339()),
        reason: Some(error.reason().to_string()),
        message: Some(error.to_string()),
    }
}

/// Merge a new Ready observation into the existing status.
pub fn next_status(
    existing: Option<&VaultResourceStatus>,
    condition: Condition,
    observed_generation: Option<i64>,
) -> VaultResourceStatus {
    let mut status = existing.cloned().unwrap_or_default();
    merge_condition(&mut status.conditions, condition);
    status.observed_generation = observed_generation;
    status.last_reconcile_time = Some(chrono::Utc::now().to_rfc3339());
    status
}

/// Patch the status subresource, skipping the call when conditions and
/// observed generation are unchanged.
pub async fn patch_status<K>(
    api: &Api<K>,
    name: &str,
    current: Option<&VaultResourceStatus>,
    status: &VaultResourceStatus,
) -> Result<(), kube::Error>
where
    K: Clone + DeserializeOwned + std::fmt::Debug,
{
    if let Some(current) = current {
        if current.conditions == status.conditions
            && current.observed_generation == status.observed_generation
        {
            debug!(
                resource.name = name,
                "skipping status patch, conditions unchanged"
            );
            return Ok(());
        }
    }

    let patch = serde_json::json!({ "status": status });
    api.patch_status(
        name,
        &PatchParams::apply(constants::FIELD_MANAGER),
        &Patch::Merge(patch),
    )
    .await?;
    Ok(())
}
