//! # Reconciliation Driver
//!
//! The generic read-compare-write cycle. One driver for every resource kind:
//! build path → check validity and initialization preconditions → resolve
//! internal values → read actual state → compare → write if divergent →
//! report outcome. The driver never retries and never swallows an error;
//! retry belongs to the controller runtime's backoff layer.

use crate::controller::contract::{PrepareContext, VaultResource};
use crate::vault::payload::{BackendPayload, DecodeError};
use crate::vault::transport::{TransportError, VaultTransport};
use thiserror::Error;
use tracing::{debug, info};

/// Internal driver states, in transition order. `Failed` is reachable from
/// every state; `Waiting` terminates out of `Validating`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DriverState {
    Validating,
    Reading,
    Comparing,
    Writing,
}

/// Terminal outcome of a single reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Desired payload was written to the backend
    Updated,
    /// Backend already matched the desired state; no write issued
    NoChange,
    /// A precondition is not yet met. Not an error: signals "retry later".
    Waiting { message: String },
}

/// Reconciliation failure taxonomy. Every variant maps to a stable status
/// condition reason so the runtime's backoff can act on it.
#[derive(Debug, Error)]
pub enum ReconcileError {
    /// Spec fails resource-kind-specific semantic validation
    #[error("invalid spec: {0}")]
    InvalidSpec(String),
    /// Dependency resolution failed before payload computation
    #[error("failed to prepare internal values: {0}")]
    Prepare(#[source] anyhow::Error),
    /// Backend unreachable or rejected the request
    #[error(transparent)]
    Transport(#[from] TransportError),
    /// Observed backend payload is malformed. Surfaced as a data-integrity
    /// condition; never auto-corrected by overwriting.
    #[error("observed backend payload is malformed: {0}")]
    Decode(#[from] DecodeError),
}

impl ReconcileError {
    /// Stable reason code reported in the Ready condition.
    pub fn reason(&self) -> &'static str {
        match self {
            ReconcileError::InvalidSpec(_) => "InvalidSpec",
            ReconcileError::Prepare(_) => "PrepareFailed",
            ReconcileError::Transport(_) => "TransportFailed",
            ReconcileError::Decode(_) => "PayloadDecodeFailed",
        }
    }
}

/// Drive one resource instance toward its declared state.
///
/// Synchronous in sequence: the only suspension points are the backend read
/// and the single (atomic) write. Cancellation threads through those calls.
pub async fn converge<R>(
    resource: &mut R,
    transport: &dyn VaultTransport,
    ctx: &PrepareContext,
) -> Result<Outcome, ReconcileError>
where
    R: VaultResource + ?Sized,
{
    let mut state = DriverState::Validating;
    debug!(state = ?state, "reconciliation started");

    // Validating
    if let Err(e) = resource.validate() {
        return Err(ReconcileError::InvalidSpec(e.to_string()));
    }
    if !resource.is_initialized() {
        debug!("prerequisites not met, reporting waiting outcome");
        return Ok(Outcome::Waiting {
            message: "waiting for prerequisite auth method mount".to_string(),
        });
    }
    resource
        .prepare_internal_values(ctx)
        .await
        .map_err(ReconcileError::Prepare)?;

    state = DriverState::Reading;
    debug!(state = ?state, "reading actual state");
    let path = resource.path();
    // Not found is a valid actual state: the object has simply never been
    // written, and reconciliation proceeds as an initial create.
    let observed = transport
        .read_payload(&path)
        .await?
        .unwrap_or_else(BackendPayload::new);

    // A non-empty observed payload must decode cleanly before it is trusted
    // for comparison. The empty payload skips the gate so initial creates
    // are not blocked on required keys.
    if !observed.is_empty() {
        resource.decode_observed(&observed)?;
    }

    state = DriverState::Comparing;
    debug!(state = ?state, path = %path, "comparing desired and actual payloads");
    if resource.is_equivalent_to_observed(&observed) {
        info!(path = %path, "backend already converged, no write needed");
        return Ok(Outcome::NoChange);
    }

    state = DriverState::Writing;
    debug!(state = ?state, path = %path, "writing desired payload");
    // Full desired payload, never a partial patch
    transport
        .write_payload(&path, &resource.desired_payload())
        .await?;
    info!(path = %path, "backend updated to desired state");
    Ok(Outcome::Updated)
}
