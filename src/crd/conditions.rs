//! # Status Conditions
//!
//! Shared status type and the merge-by-type condition set.
//!
//! Conditions are an ordered mapping keyed by condition type, not an append
//! log: a new observation replaces the entry of matching type and preserves
//! all others, and iteration order stays stable for serialization.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Condition represents a condition of a resource
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Type of condition
    pub r#type: String,
    /// Status of the condition (True, False, Unknown)
    pub status: String,
    /// Last transition time
    #[serde(default)]
    pub last_transition_time: Option<String>,
    /// Reason for the condition
    #[serde(default)]
    pub reason: Option<String>,
    /// Message describing the condition
    #[serde(default)]
    pub message: Option<String>,
}

/// Status shared by all Vault engine resource kinds
///
/// Tracks the last terminal reconciliation outcome via conditions.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct VaultResourceStatus {
    /// Conditions represent the latest available observations
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Observed generation
    #[serde(default)]
    pub observed_generation: Option<i64>,
    /// Last reconciliation time (RFC3339)
    #[serde(default)]
    pub last_reconcile_time: Option<String>,
}

/// Merge a new observation into a condition set, keyed by condition type.
///
/// Replaces the existing entry of matching type in place (preserving list
/// order); appends when the type is new. When the existing entry is
/// identical apart from `lastTransitionTime`, the original transition time
/// is kept so unchanged statuses do not churn.
pub fn merge_condition(conditions: &mut Vec<Condition>, mut incoming: Condition) {
    if let Some(existing) = conditions.iter_mut().find(|c| c.r#type == incoming.r#type) {
        let unchanged = existing.status == incoming.status
            && existing.reason == incoming.reason
            && existing.message == incoming.message;
        if unchanged {
            incoming.last_transition_time = existing.last_transition_time.clone();
        }
        *existing = incoming;
    } else {
        conditions.push(incoming);
    }
}
