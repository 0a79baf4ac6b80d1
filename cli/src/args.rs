use anyhow::{ensure, Context, Result};
use clap::Parser;
use kfp_install_model::constants::{DEFAULT_MACHINE_TYPE, DEFAULT_NUM_NODES};
use kfp_install_model::{ClusterSpec, CreationPolicy, InstallConfig, K8sVersion, ManagedStorage};
use std::path::PathBuf;

/// Identifies the application instance. Unset values come from the config file or the defaults.
#[derive(Debug, Default, Parser)]
pub(crate) struct InstanceArgs {
    /// Name of the application instance [default: kubeflow-pipelines]
    #[clap(long = "name", env = "APP_INSTANCE_NAME")]
    name: Option<String>,

    /// Namespace to install into [default: kubeflow]
    #[clap(long = "namespace", env = "NAMESPACE")]
    namespace: Option<String>,

    /// A service account key JSON file handed to the deployer.
    #[clap(long = "service-account-key")]
    service_account_key: Option<PathBuf>,

    /// CloudSQL instance connection name (`project:region:instance`). Enables managed storage.
    #[clap(long = "managed-storage")]
    managed_storage: Option<String>,

    /// Password of the CloudSQL `root` user when using managed storage.
    #[clap(long = "db-password", requires = "managed-storage")]
    db_password: Option<String>,
}

impl InstanceArgs {
    /// Override the values of `config` with the ones given on the command line.
    pub(crate) fn apply(&self, config: &mut InstallConfig) {
        if let Some(name) = &self.name {
            config.instance.name = name.clone();
        }
        if let Some(namespace) = &self.namespace {
            config.instance.namespace = namespace.clone();
        }
        if let Some(path) = &self.service_account_key {
            config.service_account_key = Some(path.clone());
        }
        if let Some(connection_name) = &self.managed_storage {
            config.managed_storage = Some(ManagedStorage::new(
                connection_name.as_str(),
                self.db_password.clone().unwrap_or_default(),
            ));
        }
    }
}

/// The GKE cluster to create or use.
#[derive(Debug, Default, Parser)]
pub(crate) struct ClusterArgs {
    /// Name of the GKE cluster. Without it the current kubeconfig context is used.
    #[clap(long = "cluster", env = "CLUSTER")]
    cluster: Option<String>,

    /// Compute Engine zone of the cluster.
    #[clap(long = "zone", env = "ZONE")]
    zone: Option<String>,

    /// Machine type of the cluster's nodes, at least 2 vCPUs [default: n1-standard-2]
    #[clap(long = "machine-type", env = "MACHINE_TYPE")]
    machine_type: Option<String>,

    /// Number of nodes, at least 3 [default: 3]
    #[clap(long = "num-nodes")]
    num_nodes: Option<u32>,

    /// Kubernetes version of a new cluster, at least 1.9.
    #[clap(long = "cluster-version")]
    cluster_version: Option<K8sVersion>,

    /// Whether to create the cluster [create|ifNotExists|never]
    #[clap(long = "creation-policy")]
    creation_policy: Option<CreationPolicy>,
}

impl ClusterArgs {
    /// Override the cluster of `config` with the values given on the command line.
    pub(crate) fn apply(&self, config: &mut InstallConfig) -> Result<()> {
        if let Some(policy) = self.creation_policy {
            config.creation_policy = policy;
        }
        let mut spec = match (config.cluster.take(), &self.cluster) {
            (None, None) => {
                ensure!(
                    self.zone.is_none()
                        && self.machine_type.is_none()
                        && self.num_nodes.is_none()
                        && self.cluster_version.is_none(),
                    "'--zone', '--machine-type', '--num-nodes' and '--cluster-version' need a \
                     cluster, use '--cluster' or CLUSTER"
                );
                return Ok(());
            }
            (Some(mut spec), name) => {
                if let Some(name) = name {
                    spec.name = name.clone();
                }
                spec
            }
            (None, Some(name)) => ClusterSpec::new(
                name.as_str(),
                self.zone
                    .clone()
                    .context("A zone is required with '--cluster', use '--zone' or ZONE")?,
            ),
        };
        if let Some(zone) = &self.zone {
            spec.zone = zone.clone();
        }
        if let Some(machine_type) = &self.machine_type {
            spec.machine_type = machine_type.clone();
        }
        if let Some(num_nodes) = self.num_nodes {
            spec.num_nodes = num_nodes;
        }
        if let Some(version) = self.cluster_version {
            spec.cluster_version = Some(version);
        }
        config.cluster = Some(spec);
        Ok(())
    }
}

/// A cluster named on the command line, for commands that need one.
#[derive(Debug, Parser)]
pub(crate) struct ClusterLocation {
    /// Name of the GKE cluster.
    #[clap(long = "cluster", env = "CLUSTER")]
    pub(crate) cluster: String,

    /// Compute Engine zone of the cluster.
    #[clap(long = "zone", env = "ZONE")]
    pub(crate) zone: String,
}

/// The settings of a new cluster.
#[derive(Debug, Parser)]
pub(crate) struct NewCluster {
    #[clap(flatten)]
    pub(crate) location: ClusterLocation,

    /// Machine type of the cluster's nodes, at least 2 vCPUs.
    #[clap(long = "machine-type", env = "MACHINE_TYPE", default_value = DEFAULT_MACHINE_TYPE)]
    machine_type: String,

    /// Number of nodes, at least 3.
    #[clap(long = "num-nodes", default_value_t = DEFAULT_NUM_NODES)]
    num_nodes: u32,

    /// Kubernetes version, at least 1.9. Defaults to the GKE default version.
    #[clap(long = "cluster-version")]
    cluster_version: Option<K8sVersion>,
}

impl NewCluster {
    pub(crate) fn spec(&self) -> ClusterSpec {
        let mut spec = ClusterSpec::new(
            self.location.cluster.as_str(),
            self.location.zone.as_str(),
        );
        spec.machine_type = self.machine_type.clone();
        spec.num_nodes = self.num_nodes;
        spec.cluster_version = self.cluster_version;
        spec
    }
}

/// Read `--config` if given, otherwise start from the defaults.
pub(crate) fn read_config(path: Option<&PathBuf>) -> Result<InstallConfig> {
    match path {
        Some(path) => InstallConfig::from_path(path)
            .context(format!("Unable to read config file '{}'", path.display())),
        None => Ok(InstallConfig::default()),
    }
}
