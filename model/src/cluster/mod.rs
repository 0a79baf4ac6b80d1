/*!

GKE cluster settings and the checks a cluster has to pass before Kubeflow Pipelines can be
installed on it.

!*/

mod provisioner;

pub use provisioner::{ClusterProvisioner, ProvisionOutcome};

use crate::constants::{
    DEFAULT_MACHINE_TYPE, DEFAULT_NUM_NODES, DEFAULT_SCOPES, MIN_K8S_MAJOR, MIN_K8S_MINOR,
    MIN_NODES, MIN_VCPUS,
};
use crate::error::{self, Result};
use crate::tools::ClusterDescription;
use crate::K8sVersion;
use serde::{Deserialize, Serialize};
use serde_plain::{derive_display_from_serialize, derive_fromstr_from_deserialize};

/// The cluster the application is installed into.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSpec {
    pub name: String,
    pub zone: String,
    #[serde(default = "default_machine_type")]
    pub machine_type: String,
    #[serde(default = "default_num_nodes")]
    pub num_nodes: u32,
    /// Version of the cluster master, GKE picks its default when this is `None`.
    #[serde(default)]
    pub cluster_version: Option<K8sVersion>,
    #[serde(default = "default_scopes")]
    pub scopes: String,
}

fn default_machine_type() -> String {
    DEFAULT_MACHINE_TYPE.to_string()
}

fn default_num_nodes() -> u32 {
    DEFAULT_NUM_NODES
}

fn default_scopes() -> String {
    DEFAULT_SCOPES.to_string()
}

impl ClusterSpec {
    pub fn new<S1, S2>(name: S1, zone: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self {
            name: name.into(),
            zone: zone.into(),
            machine_type: default_machine_type(),
            num_nodes: default_num_nodes(),
            cluster_version: None,
            scopes: default_scopes(),
        }
    }

    /// Check against the minimum cluster requirements: 3 nodes, 2 vCPUs per node and Kubernetes
    /// 1.9.
    pub fn validate(&self) -> Result<()> {
        let mut reasons = Vec::new();
        if self.name.trim().is_empty() {
            reasons.push("the cluster name is empty".to_string());
        }
        if self.zone.trim().is_empty() {
            reasons.push("the zone is empty".to_string());
        }
        if let Some(reason) = check_nodes(self.num_nodes) {
            reasons.push(reason);
        }
        if let Some(reason) = check_machine_type(&self.machine_type) {
            reasons.push(reason);
        }
        if let Some(reason) = self.cluster_version.and_then(check_version) {
            reasons.push(reason);
        }
        requirements_result(&self.name, reasons)
    }
}

/// Check a running cluster's description against the minimum requirements. Values gcloud did
/// not report are not checked.
pub fn validate_description(description: &ClusterDescription) -> Result<()> {
    let mut reasons = Vec::new();
    if let Some(reason) = description.current_node_count.and_then(check_nodes) {
        reasons.push(reason);
    }
    if let Some(machine_type) = description
        .node_config
        .as_ref()
        .and_then(|config| config.machine_type.as_ref())
    {
        if let Some(reason) = check_machine_type(machine_type) {
            reasons.push(reason);
        }
    }
    if let Some(version) = &description.current_master_version {
        match K8sVersion::parse(version) {
            Ok(version) => reasons.extend(check_version(version)),
            Err(e) => reasons.push(e),
        }
    }
    requirements_result(&description.name, reasons)
}

fn requirements_result(name: &str, reasons: Vec<String>) -> Result<()> {
    if reasons.is_empty() {
        Ok(())
    } else {
        error::ClusterRequirementsSnafu { name, reasons }.fail()
    }
}

fn check_nodes(num_nodes: u32) -> Option<String> {
    (num_nodes < MIN_NODES).then(|| {
        format!(
            "{} nodes requested but at least {} are required",
            num_nodes, MIN_NODES
        )
    })
}

fn check_machine_type(machine_type: &str) -> Option<String> {
    match machine_type_vcpus(machine_type) {
        None => Some(format!(
            "unable to determine the vCPU count of machine type '{}'",
            machine_type
        )),
        Some(vcpus) if vcpus < MIN_VCPUS => Some(format!(
            "machine type '{}' has {} vCPU(s) but at least {} are required",
            machine_type, vcpus, MIN_VCPUS
        )),
        Some(_) => None,
    }
}

fn check_version(version: K8sVersion) -> Option<String> {
    let minimum = K8sVersion::new(MIN_K8S_MAJOR, MIN_K8S_MINOR, None);
    (version < minimum).then(|| {
        format!(
            "Kubernetes {} is older than the minimum {}",
            version, minimum
        )
    })
}

/// The number of vCPUs of a Compute Engine machine type, derived from its name.
///
/// - Predefined types end with the vCPU count: `n1-standard-2`, `e2-highmem-16`.
/// - Custom types carry it after `custom`: `custom-4-16384`, `n2-custom-8-32768`.
/// - Shared core types are listed explicitly.
pub fn machine_type_vcpus(machine_type: &str) -> Option<u32> {
    let machine_type = machine_type.trim();
    match machine_type {
        "f1-micro" | "g1-small" => return Some(1),
        "e2-micro" | "e2-small" | "e2-medium" => return Some(2),
        _ => {}
    }
    let parts: Vec<&str> = machine_type.split('-').collect();
    if let Some(position) = parts.iter().position(|part| *part == "custom") {
        return parts
            .get(position + 1)
            .and_then(|vcpus| vcpus.parse::<u32>().ok());
    }
    if parts.len() < 3 {
        return None;
    }
    parts.last().and_then(|vcpus| vcpus.parse::<u32>().ok())
}

/// Whether the installer creates the cluster.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CreationPolicy {
    /// Create the cluster, fail if it already exists.
    Create,
    /// Create the cluster only if it does not exist.
    IfNotExists,
    /// Never create the cluster, fail if it does not exist.
    Never,
}

impl Default for CreationPolicy {
    fn default() -> Self {
        Self::IfNotExists
    }
}

derive_display_from_serialize!(CreationPolicy);
derive_fromstr_from_deserialize!(CreationPolicy);
