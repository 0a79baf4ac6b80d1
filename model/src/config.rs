use crate::cluster::{ClusterSpec, CreationPolicy};
use crate::constants::{APPLICATION_CRD_URL, DEFAULT_DEPLOYER_IMAGE};
use crate::error::{self, Result};
use crate::instance::{ApplicationInstance, ManagedStorage};
use serde::{Deserialize, Serialize};
use snafu::ResultExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// The installation settings read from `--config`. Every key is optional.
///
/// ```yaml
/// cluster:
///   name: kfp
///   zone: us-central1-a
///   machineType: n1-standard-4
/// instance:
///   name: kubeflow-pipelines
///   namespace: kubeflow
/// managedStorage:
///   enabled: true
///   cloudsqlInstanceConnectionName: my-project:us-central1:kfp-db
///   dbPassword: secret
/// waitTimeoutSecs: 1200
/// ```
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallConfig {
    /// The cluster to install into. Without it the current kubeconfig context is used.
    #[serde(default)]
    pub cluster: Option<ClusterSpec>,
    #[serde(default)]
    pub creation_policy: CreationPolicy,
    #[serde(default)]
    pub instance: ApplicationInstance,
    #[serde(default)]
    pub managed_storage: Option<ManagedStorage>,
    /// A service account key JSON file, passed to the deployer base64 encoded.
    #[serde(default)]
    pub service_account_key: Option<PathBuf>,
    #[serde(default = "default_deployer_image")]
    pub deployer_image: String,
    #[serde(default = "default_application_crd_url")]
    pub application_crd_url: String,
    #[serde(default = "default_wait_timeout_secs")]
    pub wait_timeout_secs: u64,
}

fn default_deployer_image() -> String {
    DEFAULT_DEPLOYER_IMAGE.to_string()
}

fn default_application_crd_url() -> String {
    APPLICATION_CRD_URL.to_string()
}

fn default_wait_timeout_secs() -> u64 {
    30 * 60
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            cluster: None,
            creation_policy: CreationPolicy::default(),
            instance: ApplicationInstance::default(),
            managed_storage: None,
            service_account_key: None,
            deployer_image: default_deployer_image(),
            application_crd_url: default_application_crd_url(),
            wait_timeout_secs: default_wait_timeout_secs(),
        }
    }
}

impl InstallConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).context(error::FileSnafu { path })?;
        serde_yaml::from_reader(file).context(error::SerdeYamlSnafu {
            action: format!("parse config file '{}'", path.display()),
        })
    }

    pub fn wait_timeout(&self) -> Duration {
        Duration::from_secs(self.wait_timeout_secs)
    }
}
