use crate::error::{self, Result};
use crate::instance::{ApplicationInstance, ManagedStorage};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use snafu::ResultExt;
use std::fmt::{Display, Formatter};
use std::path::Path;

/// The parameters object handed to the deployer image with `mpdev --parameters`.
///
/// The deployer expects flat keys, the managed storage settings are passed as
/// `managedstorage.enabled` etc. rather than as a nested object.
#[derive(Clone, Eq, PartialEq)]
pub struct DeployerParameters {
    instance: ApplicationInstance,
    managed_storage: Option<ManagedStorage>,
}

impl DeployerParameters {
    /// Validates both parts before accepting them.
    pub fn new(
        instance: ApplicationInstance,
        managed_storage: Option<ManagedStorage>,
    ) -> Result<Self> {
        instance.validate()?;
        if let Some(storage) = &managed_storage {
            storage.validate()?;
        }
        Ok(Self {
            instance,
            managed_storage: managed_storage.filter(|storage| storage.enabled),
        })
    }

    pub fn instance(&self) -> &ApplicationInstance {
        &self.instance
    }

    pub fn managed_storage(&self) -> Option<&ManagedStorage> {
        self.managed_storage.as_ref()
    }

    /// The JSON text for `--parameters`. Contains secrets.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self).context(error::JsonSerializeSnafu)
    }

    /// JSON with the credential and password replaced, safe for printing.
    pub fn to_redacted_json(&self) -> Result<String> {
        let mut redacted = self.clone();
        if redacted.instance.service_account_credential.is_some() {
            redacted.instance.service_account_credential = Some(REDACTED.to_string());
        }
        if let Some(storage) = redacted.managed_storage.as_mut() {
            storage.db_password = REDACTED.to_string();
        }
        serde_json::to_string_pretty(&redacted).context(error::JsonSerializeSnafu)
    }
}

const REDACTED: &str = "<redacted>";

impl Serialize for DeployerParameters {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(None)?;
        map.serialize_entry("name", &self.instance.name)?;
        map.serialize_entry("namespace", &self.instance.namespace)?;
        if let Some(credential) = &self.instance.service_account_credential {
            map.serialize_entry("serviceAccountCredential", credential)?;
        }
        if let Some(storage) = &self.managed_storage {
            map.serialize_entry("managedstorage.enabled", &storage.enabled)?;
            map.serialize_entry(
                "managedstorage.cloudsqlInstanceConnectionName",
                &storage.cloudsql_instance_connection_name,
            )?;
            map.serialize_entry("managedstorage.dbPassword", &storage.db_password)?;
        }
        map.end()
    }
}

impl Display for DeployerParameters {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "name={} namespace={} serviceAccountCredential={} managedstorage={}",
            self.instance.name,
            self.instance.namespace,
            if self.instance.service_account_credential.is_some() {
                REDACTED
            } else {
                "none"
            },
            self.managed_storage
                .as_ref()
                .map(|storage| storage.cloudsql_instance_connection_name.as_str())
                .unwrap_or("disabled")
        )
    }
}

impl std::fmt::Debug for DeployerParameters {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "DeployerParameters({})", self)
    }
}

/// Read a service account key file and encode it the way the deployer expects it.
pub fn encode_service_account_key(path: &Path) -> Result<String> {
    let key = std::fs::read(path).context(error::FileSnafu { path })?;
    // Catch a wrong file before it reaches the deployer.
    serde_json::from_slice::<serde_json::Value>(&key).context(error::JsonParseSnafu {
        what: format!("service account key '{}'", path.display()),
    })?;
    Ok(base64::encode(key))
}
