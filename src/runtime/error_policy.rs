//! # Error Policy
//!
//! Backoff for failed reconciliations. The driver never retries; every
//! failure lands here and is requeued with Fibonacci backoff tracked per
//! resource so one failing resource cannot starve the others.

use crate::constants;
use crate::controller::reconciler::{ControllerContext, ManagedResource, ReconcilerError};
use kube::ResourceExt;
use kube_runtime::controller::Action;
use std::sync::Arc;
use tracing::{error, warn};

/// Handle a reconciliation error for one resource of kind `K`.
pub fn handle_reconciliation_error<K: ManagedResource>(
    obj: Arc<K>,
    error: &ReconcilerError,
    ctx: Arc<ControllerContext>,
) -> Action {
    let name = obj.name_any();
    let namespace = obj.namespace().unwrap_or_else(|| "default".to_string());
    let resource_key = format!("{namespace}/{name}");

    error!(
        resource.name = %name,
        resource.namespace = %namespace,
        error = %error,
        "reconciliation error"
    );

    let backoff = match ctx.error_counts.lock() {
        Ok(mut counts) => {
            let count = counts.entry(resource_key).or_insert(0);
            let backoff = calculate_progressive_backoff(*count);
            *count += 1;
            backoff
        }
        Err(e) => {
            warn!("failed to lock error counts: {e}, using default backoff");
            std::time::Duration::from_secs(constants::DEFAULT_ERROR_REQUEUE_SECS)
        }
    };

    warn!(
        resource.name = %name,
        backoff_secs = backoff.as_secs(),
        "requeueing with backoff"
    );
    Action::requeue(backoff)
}

/// Progressive backoff based on consecutive error count, following the
/// Fibonacci sequence in minutes and capped at one hour.
pub fn calculate_progressive_backoff(error_count: u32) -> std::time::Duration {
    let backoff_minutes = match error_count {
        0 => 1,
        1 => 1,
        2 => 2,
        3 => 3,
        4 => 5,
        5 => 8,
        6 => 13,
        7 => 21,
        8 => 34,
        9 => 55,
        _ => 60,
    };
    std::time::Duration::from_secs(backoff_minutes * 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_and_caps() {
        assert_eq!(calculate_progressive_backoff(0).as_secs(), 60);
        assert_eq!(calculate_progressive_backoff(4).as_secs(), 300);
        assert_eq!(calculate_progressive_backoff(25).as_secs(), 3600);
    }
}
