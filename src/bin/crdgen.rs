//! # CRD Generator
//!
//! Prints the CRD manifests for all managed kinds as YAML, separated by
//! document markers, for `kubectl apply`.

use anyhow::Result;
use kube::CustomResourceExt;
use vault_engine_controller::crd::{KubernetesAuthEngineConfig, KubernetesAuthEngineRole};

fn main() -> Result<()> {
    print!("{}", serde_yaml::to_string(&KubernetesAuthEngineConfig::crd())?);
    println!("---");
    print!("{}", serde_yaml::to_string(&KubernetesAuthEngineRole::crd())?);
    Ok(())
}
