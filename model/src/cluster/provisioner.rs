use super::{validate_description, ClusterSpec, CreationPolicy};
use crate::error::{self, Result};
use crate::tools::{Gcloud, ToolRunner};
use log::info;
use serde::Serialize;

/// What `ClusterProvisioner::ensure` did.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ProvisionOutcome {
    Created,
    Existing,
}

/// Creates GKE clusters (or checks existing ones) and fetches their credentials with `gcloud`.
pub struct ClusterProvisioner<'a, R: ?Sized> {
    gcloud: Gcloud<'a, R>,
}

impl<'a, R> ClusterProvisioner<'a, R>
where
    R: ToolRunner + ?Sized,
{
    pub fn new(runner: &'a R) -> Self {
        Self {
            gcloud: Gcloud::new(runner),
        }
    }

    /// Make sure a cluster matching `spec` exists, then point the kubeconfig at it.
    pub async fn ensure(
        &self,
        spec: &ClusterSpec,
        policy: CreationPolicy,
    ) -> Result<ProvisionOutcome> {
        spec.validate()?;
        let outcome = match (
            self.gcloud.describe_cluster(&spec.name, &spec.zone).await?,
            policy,
        ) {
            (Some(_), CreationPolicy::Create) => {
                return error::ClusterExistsSnafu {
                    name: &spec.name,
                    zone: &spec.zone,
                }
                .fail()
            }
            (Some(description), _) => {
                info!(
                    "Cluster '{}' already exists (status {})",
                    spec.name,
                    description.status.as_deref().unwrap_or("unknown")
                );
                validate_description(&description)?;
                ProvisionOutcome::Existing
            }
            (None, CreationPolicy::Never) => {
                return error::ClusterNotFoundSnafu {
                    name: &spec.name,
                    zone: &spec.zone,
                }
                .fail()
            }
            (None, _) => {
                self.gcloud.create_cluster(spec).await?;
                ProvisionOutcome::Created
            }
        };
        self.credentials(spec).await?;
        Ok(outcome)
    }

    /// `gcloud container clusters get-credentials` for the cluster.
    pub async fn credentials(&self, spec: &ClusterSpec) -> Result<()> {
        info!("Fetching credentials for cluster '{}'", spec.name);
        self.gcloud.get_credentials(&spec.name, &spec.zone).await
    }

    /// Delete the cluster. A cluster that does not exist is not an error.
    pub async fn delete(&self, name: &str, zone: &str) -> Result<bool> {
        if self.gcloud.describe_cluster(name, zone).await?.is_none() {
            info!("Cluster '{}' does not exist in zone '{}'", name, zone);
            return Ok(false);
        }
        self.gcloud.delete_cluster(name, zone).await?;
        Ok(true)
    }
}
