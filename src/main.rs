//! # Vault Engine Controller
//!
//! A Kubernetes controller that converges declarative Vault auth-engine
//! configuration against the live state of the backend.
//!
//! ## Overview
//!
//! 1. **Watching custom resources** - `KubernetesAuthEngineConfig` and
//!    `KubernetesAuthEngineRole` across all namespaces
//! 2. **Computing desired state** - each spec encodes to the backend's
//!    key/value payload under its canonical path
//! 3. **Reading actual state** - the stored payload is fetched and decoded;
//!    a missing object is a valid initial state
//! 4. **Converging** - a single full write when desired and actual diverge,
//!    no write when they already match
//! 5. **Reporting** - every terminal outcome lands in the resource's status
//!    conditions with a stable reason code
//!
//! ## Usage
//!
//! See the [README.md](../README.md) for deployment instructions.

use anyhow::Result;

use vault_engine_controller::runtime::initialization::initialize;
use vault_engine_controller::runtime::watch_loop::run_watch_loop;

#[tokio::main]
async fn main() -> Result<()> {
    let init_result = initialize().await?;
    run_watch_loop(init_result.configs, init_result.roles, init_result.context).await?;
    Ok(())
}
