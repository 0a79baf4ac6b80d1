/*!

This library installs Kubeflow Pipelines on Google Kubernetes Engine. It wraps the `gcloud` and
`mpdev` command line tools, talks to the cluster's API server, and sequences a full installation
with [`InstallManager`].

!*/

#![deny(
    clippy::expect_used,
    clippy::get_unwrap,
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::panicking_unwrap,
    clippy::unwrap_in_result,
    clippy::unwrap_used
)]

pub use cluster::{ClusterProvisioner, ClusterSpec, CreationPolicy, ProvisionOutcome};
pub use config::InstallConfig;
pub use crd::CrdSource;
pub use deployer::Deployer;
pub use error::{Error, Result};
pub use instance::{ApplicationInstance, ManagedStorage};
pub use k8s::{ClusterApi, KubeClusterApi};
pub use manager::{InstallManager, InstallPlan, InstallSummary, Step};
pub use params::DeployerParameters;
pub use preflight::{preflight, PreflightReport, Requirements};
pub use rbac::BindingOutcome;
pub use status::{PodState, RolloutState, StatusSnapshot, WatchOptions};
pub use tools::{SystemToolRunner, Tool, ToolOutput, ToolRunner};
pub use uninstall::{UninstallOutcome, UninstallReport};
pub use version::K8sVersion;

pub mod cluster;
mod config;
pub mod constants;
pub mod crd;
mod deployer;
mod error;
pub mod instance;
pub mod k8s;
pub mod manager;
pub mod params;
pub mod preflight;
pub mod rbac;
pub mod status;
pub mod system;
pub mod tools;
pub mod uninstall;
mod version;
