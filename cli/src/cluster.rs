use crate::args::{ClusterLocation, NewCluster};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kfp_install_model::{
    ClusterProvisioner, ClusterSpec, CreationPolicy, ProvisionOutcome, SystemToolRunner,
};

/// Manage the GKE cluster Kubeflow Pipelines runs on.
#[derive(Debug, Parser)]
pub(crate) struct Cluster {
    #[clap(subcommand)]
    command: ClusterCommand,
}

#[derive(Debug, Subcommand)]
enum ClusterCommand {
    /// Create a cluster that meets the minimum requirements, or check an existing one.
    Create(Create),
    /// Delete a cluster.
    Delete(ClusterLocation),
    /// Point the kubeconfig at a cluster.
    Credentials(ClusterLocation),
}

#[derive(Debug, Parser)]
struct Create {
    #[clap(flatten)]
    cluster: NewCluster,

    /// Fail if the cluster already exists instead of using it.
    #[clap(long = "fail-if-exists")]
    fail_if_exists: bool,
}

impl Cluster {
    pub(crate) async fn run(self, runner: &SystemToolRunner) -> Result<()> {
        let provisioner = ClusterProvisioner::new(runner);
        match self.command {
            ClusterCommand::Create(create) => {
                let spec = create.cluster.spec();
                let policy = if create.fail_if_exists {
                    CreationPolicy::Create
                } else {
                    CreationPolicy::IfNotExists
                };
                let outcome = provisioner
                    .ensure(&spec, policy)
                    .await
                    .context(format!("Unable to create cluster '{}'", spec.name))?;
                match outcome {
                    ProvisionOutcome::Created => println!("Cluster '{}' was created.", spec.name),
                    ProvisionOutcome::Existing => {
                        println!("Cluster '{}' already exists and can be used.", spec.name)
                    }
                }
            }
            ClusterCommand::Delete(location) => {
                let deleted = provisioner
                    .delete(&location.cluster, &location.zone)
                    .await
                    .context(format!("Unable to delete cluster '{}'", location.cluster))?;
                if deleted {
                    println!("Cluster '{}' was deleted.", location.cluster);
                } else {
                    println!("Cluster '{}' does not exist.", location.cluster);
                }
            }
            ClusterCommand::Credentials(location) => {
                let spec = ClusterSpec::new(location.cluster.as_str(), location.zone.as_str());
                provisioner.credentials(&spec).await.context(format!(
                    "Unable to get credentials for cluster '{}'",
                    location.cluster
                ))?;
                println!("kubeconfig now points at cluster '{}'.", location.cluster);
            }
        }
        Ok(())
    }
}
