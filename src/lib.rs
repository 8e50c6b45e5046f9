//! Vault Engine Controller Library
//!
//! Core functionality for the Vault Engine Controller: the declarative
//! resource convergence engine and its Kubernetes glue. Unit tests live in
//! the module files; driver-level tests under `tests/`.

pub mod constants;
pub mod controller;
pub mod crd;
pub mod runtime;
pub mod vault;

// Re-export CRD types for convenience
pub use crd::*;
