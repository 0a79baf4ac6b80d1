use super::{to_args, Tool, ToolRunner};
use crate::cluster::ClusterSpec;
use crate::error::{self, Result};
use log::info;
use serde::{Deserialize, Serialize};
use snafu::ResultExt;

/// Typed access to the `gcloud` commands used by the installer.
pub struct Gcloud<'a, R: ?Sized> {
    runner: &'a R,
}

impl<'a, R> Gcloud<'a, R>
where
    R: ToolRunner + ?Sized,
{
    pub fn new(runner: &'a R) -> Self {
        Self { runner }
    }

    /// The account gcloud is currently authenticated as, `None` if it is not logged in.
    pub async fn active_account(&self) -> Result<Option<String>> {
        let output = self
            .runner
            .run(Tool::Gcloud, &to_args(["config", "get-value", "account"]))
            .await?
            .into_result("gcloud config get-value account")?;
        Ok(output
            .trimmed_stdout()
            .filter(|account| *account != "(unset)")
            .map(|account| account.to_string()))
    }

    /// `gcloud auth configure-docker` registers gcloud as the docker credential helper for gcr.io.
    pub async fn configure_docker(&self) -> Result<()> {
        self.runner
            .run(
                Tool::Gcloud,
                &to_args(["auth", "configure-docker", "--quiet"]),
            )
            .await?
            .into_result("gcloud auth configure-docker")?;
        Ok(())
    }

    /// Describe a cluster, `None` if it does not exist.
    pub async fn describe_cluster(
        &self,
        name: &str,
        zone: &str,
    ) -> Result<Option<ClusterDescription>> {
        let output = self
            .runner
            .run(
                Tool::Gcloud,
                &to_args([
                    "container",
                    "clusters",
                    "describe",
                    name,
                    "--zone",
                    zone,
                    "--format=json",
                ]),
            )
            .await?;
        if !output.success() && is_not_found(&output.stderr) {
            return Ok(None);
        }
        let output = output.into_result(format!("gcloud container clusters describe {}", name))?;
        serde_json::from_str(&output.stdout)
            .context(error::JsonParseSnafu {
                what: format!("description of cluster '{}'", name),
            })
            .map(Some)
    }

    pub async fn create_cluster(&self, spec: &ClusterSpec) -> Result<()> {
        let num_nodes = spec.num_nodes.to_string();
        let mut args = to_args([
            "container",
            "clusters",
            "create",
            spec.name.as_str(),
            "--zone",
            spec.zone.as_str(),
            "--machine-type",
            spec.machine_type.as_str(),
            "--num-nodes",
            num_nodes.as_str(),
            "--scopes",
            spec.scopes.as_str(),
        ]);
        if let Some(version) = &spec.cluster_version {
            args.push("--cluster-version".to_string());
            args.push(version.full_version_without_v());
        }
        info!("Creating cluster '{}' in zone '{}'", spec.name, spec.zone);
        self.runner
            .run_attached(Tool::Gcloud, &args)
            .await?
            .into_result(format!("gcloud container clusters create {}", spec.name))?;
        Ok(())
    }

    /// Write credentials for the cluster to the kubeconfig and make it the current context.
    pub async fn get_credentials(&self, name: &str, zone: &str) -> Result<()> {
        self.runner
            .run(
                Tool::Gcloud,
                &to_args([
                    "container",
                    "clusters",
                    "get-credentials",
                    name,
                    "--zone",
                    zone,
                ]),
            )
            .await?
            .into_result(format!("gcloud container clusters get-credentials {}", name))?;
        Ok(())
    }

    pub async fn delete_cluster(&self, name: &str, zone: &str) -> Result<()> {
        info!("Deleting cluster '{}' in zone '{}'", name, zone);
        self.runner
            .run_attached(
                Tool::Gcloud,
                &to_args([
                    "container",
                    "clusters",
                    "delete",
                    name,
                    "--zone",
                    zone,
                    "--quiet",
                ]),
            )
            .await?
            .into_result(format!("gcloud container clusters delete {}", name))?;
        Ok(())
    }
}

fn is_not_found(stderr: &str) -> bool {
    stderr.contains("NOT_FOUND") || stderr.contains("was not found")
}

/// The subset of `gcloud container clusters describe --format=json` the installer reads.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterDescription {
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub current_master_version: Option<String>,
    #[serde(default)]
    pub current_node_count: Option<u32>,
    #[serde(default)]
    pub node_config: Option<NodeConfig>,
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeConfig {
    #[serde(default)]
    pub machine_type: Option<String>,
}

#[test]
fn parse_cluster_description() {
    let json = r#"{
        "name": "kfp",
        "location": "us-central1-a",
        "status": "RUNNING",
        "currentMasterVersion": "1.24.10-gke.2300",
        "currentNodeCount": 3,
        "nodeConfig": { "machineType": "n1-standard-2", "diskSizeGb": 100 },
        "selfLink": "ignored"
    }"#;
    let description: ClusterDescription = serde_json::from_str(json).unwrap();
    assert_eq!(Some(3), description.current_node_count);
    assert_eq!(
        Some("n1-standard-2".to_string()),
        description.node_config.unwrap().machine_type
    );
}
