//! # Constants
//!
//! Default intervals, environment variable names, and controller identity.

/// Field manager name used for server-side apply patches
pub const FIELD_MANAGER: &str = "vault-engine-controller";

/// Periodic reconcile interval for converged resources (seconds)
pub const DEFAULT_RECONCILE_INTERVAL_SECS: u64 = 600;

/// Requeue interval while a resource waits on a prerequisite (seconds)
pub const WAITING_REQUEUE_SECS: u64 = 30;

/// Fallback requeue when the per-resource backoff state is unavailable (seconds)
pub const DEFAULT_ERROR_REQUEUE_SECS: u64 = 60;

/// Backend address environment variable
pub const ENV_VAULT_ADDR: &str = "VAULT_ADDR";

/// Backend token environment variable
pub const ENV_VAULT_TOKEN: &str = "VAULT_TOKEN";

/// Default backend address when `VAULT_ADDR` is unset
pub const DEFAULT_VAULT_ADDR: &str = "http://127.0.0.1:8200";

/// Default tracing filter when `RUST_LOG` is unset
pub const DEFAULT_LOG_FILTER: &str = "vault_engine_controller=info";
