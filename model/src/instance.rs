use crate::constants::{DEFAULT_APP_INSTANCE_NAME, DEFAULT_NAMESPACE};
use crate::error::{self, Result};
use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Debug, Formatter};

/// RFC 1123 label, the format Kubernetes requires for namespaces and most object names.
const DNS_LABEL_REGEX: &str = r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$";

lazy_static! {
    static ref DNS_LABEL: Regex = {
        #[allow(clippy::unwrap_used)]
        Regex::new(DNS_LABEL_REGEX).unwrap()
    };
}

const DNS_LABEL_MAX_LEN: usize = 63;

/// Identifies one installation of Kubeflow Pipelines.
#[derive(Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationInstance {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_namespace")]
    pub namespace: String,
    /// Base64 encoded service account key JSON handed to the deployer.
    #[serde(default)]
    pub service_account_credential: Option<String>,
}

fn default_name() -> String {
    DEFAULT_APP_INSTANCE_NAME.to_string()
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

impl Default for ApplicationInstance {
    fn default() -> Self {
        Self {
            name: default_name(),
            namespace: default_namespace(),
            service_account_credential: None,
        }
    }
}

impl Debug for ApplicationInstance {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApplicationInstance")
            .field("name", &self.name)
            .field("namespace", &self.namespace)
            .field(
                "service_account_credential",
                &self.service_account_credential.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

impl ApplicationInstance {
    pub fn validate(&self) -> Result<()> {
        validate_dns_label("application instance name", &self.name)?;
        validate_dns_label("namespace", &self.namespace)
    }
}

/// Check that `value` can be used as a Kubernetes name.
pub fn validate_dns_label(what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return error::InvalidSnafu {
            what,
            reason: "the value is empty",
        }
        .fail();
    }
    if value.len() > DNS_LABEL_MAX_LEN {
        return error::InvalidSnafu {
            what,
            reason: format!(
                "'{}' is longer than {} characters",
                value, DNS_LABEL_MAX_LEN
            ),
        }
        .fail();
    }
    if !DNS_LABEL.is_match(value) {
        return error::InvalidSnafu {
            what,
            reason: format!(
                "'{}' must consist of lower case alphanumeric characters or '-', and must start \
                and end with an alphanumeric character",
                value
            ),
        }
        .fail();
    }
    Ok(())
}

/// Settings for storing pipeline metadata and artifacts in CloudSQL instead of in-cluster storage.
#[derive(Clone, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedStorage {
    #[serde(default)]
    pub enabled: bool,
    /// `project:region:instance`
    #[serde(default)]
    pub cloudsql_instance_connection_name: String,
    #[serde(default)]
    pub db_password: String,
}

impl Debug for ManagedStorage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedStorage")
            .field("enabled", &self.enabled)
            .field(
                "cloudsql_instance_connection_name",
                &self.cloudsql_instance_connection_name,
            )
            .field("db_password", &"<redacted>")
            .finish()
    }
}

impl ManagedStorage {
    pub fn new<S1, S2>(connection_name: S1, db_password: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self {
            enabled: true,
            cloudsql_instance_connection_name: connection_name.into(),
            db_password: db_password.into(),
        }
    }

    /// Disabled settings are always valid.
    pub fn validate(&self) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }
        let parts: Vec<&str> = self.cloudsql_instance_connection_name.split(':').collect();
        if parts.len() != 3 || parts.iter().any(|part| part.trim().is_empty()) {
            return error::InvalidSnafu {
                what: "CloudSQL instance connection name",
                reason: format!(
                    "'{}' is not of the form 'project:region:instance'",
                    self.cloudsql_instance_connection_name
                ),
            }
            .fail();
        }
        Ok(())
    }
}
