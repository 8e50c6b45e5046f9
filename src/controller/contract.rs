//! # Resource Contract
//!
//! The capability set every manageable resource kind provides. One
//! implementation per CRD kind; the reconciliation driver is generic over
//! this trait and is never duplicated per kind.

use crate::vault::payload::{is_equivalent, BackendPayload, DecodeError};
use async_trait::async_trait;

/// External context handed to [`VaultResource::prepare_internal_values`].
///
/// Carries the Kubernetes client used to resolve references to other
/// managed objects (e.g. a JWT held in a Secret). Tests run without a
/// cluster and pass `client: None`; preparation steps that need the client
/// fail rather than silently skipping.
#[derive(Clone)]
pub struct PrepareContext {
    pub client: Option<kube::Client>,
    /// Namespace of the resource being reconciled
    pub namespace: String,
}

impl std::fmt::Debug for PrepareContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrepareContext")
            .field("client", &self.client.is_some())
            .field("namespace", &self.namespace)
            .finish()
    }
}

impl PrepareContext {
    pub fn detached(namespace: &str) -> Self {
        Self {
            client: None,
            namespace: namespace.to_string(),
        }
    }
}

/// Capabilities a resource kind must provide to be driven by the generic
/// reconciliation driver.
#[async_trait]
pub trait VaultResource: Send + Sync {
    /// Canonical backend storage path for this instance.
    fn path(&self) -> String;

    /// Desired backend payload computed from the declared spec.
    fn desired_payload(&self) -> BackendPayload;

    /// Whether the desired payload is semantically identical to what the
    /// backend holds. Decides whether a write is needed, nothing else.
    fn is_equivalent_to_observed(&self, observed: &BackendPayload) -> bool {
        is_equivalent(&self.desired_payload(), observed)
    }

    /// Typed decode of a non-empty observed payload. A failure here is a
    /// data-integrity problem: the driver surfaces it and does not overwrite
    /// the malformed state.
    fn decode_observed(&self, observed: &BackendPayload) -> Result<(), DecodeError>;

    /// Gate: true only once all prerequisite external state exists. The
    /// driver reports a waiting outcome instead of reconciling before this
    /// holds.
    fn is_initialized(&self) -> bool;

    /// Resolve references to other managed resources before payload
    /// computation. Failures propagate as a reconciliation failure.
    async fn prepare_internal_values(&mut self, ctx: &PrepareContext) -> anyhow::Result<()>;

    /// Resource-kind-specific semantic validation beyond schema validation.
    fn validate(&self) -> anyhow::Result<()>;
}
