//! # Controller Core
//!
//! The desired-state convergence engine: the resource contract, the generic
//! reconciliation driver, validation, status reporting, and the kube glue
//! that wires them to the watch runtime.

pub mod contract;
pub mod driver;
pub mod reconciler;
pub mod status;
pub mod validation;

pub use contract::{PrepareContext, VaultResource};
pub use driver::{converge, Outcome, ReconcileError};
pub use reconciler::{reconcile, ControllerContext, ManagedResource, ReconcilerError};
