use crate::constants::{APPLICATION_CRD_NAME, APPLICATION_CRD_URL};
use crate::error::{self, Result};
use crate::k8s::ClusterApi;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::ResourceExt;
use log::info;
use snafu::{ensure, ResultExt};
use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// Where the Application CRD manifest comes from.
#[derive(Debug, Clone, Eq, PartialEq)]
pub enum CrdSource {
    Url(String),
    File(PathBuf),
}

impl Default for CrdSource {
    fn default() -> Self {
        Self::Url(APPLICATION_CRD_URL.to_string())
    }
}

impl Display for CrdSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            CrdSource::Url(url) => write!(f, "{}", url),
            CrdSource::File(path) => write!(f, "{}", path.display()),
        }
    }
}

impl From<&str> for CrdSource {
    /// `http://` and `https://` locations are URLs, anything else is a local path.
    fn from(location: &str) -> Self {
        if location.starts_with("https://") || location.starts_with("http://") {
            Self::Url(location.to_string())
        } else {
            Self::File(PathBuf::from(location))
        }
    }
}

impl CrdSource {
    /// Read the manifest text.
    pub async fn read(&self) -> Result<String> {
        match self {
            CrdSource::Url(url) => {
                info!("Downloading the Application CRD from '{}'", url);
                reqwest::get(url)
                    .await
                    .and_then(|response| response.error_for_status())
                    .context(error::FetchSnafu { url })?
                    .text()
                    .await
                    .context(error::FetchSnafu { url })
            }
            CrdSource::File(path) => tokio::fs::read_to_string(path)
                .await
                .context(error::FileSnafu { path }),
        }
    }
}

/// Parse the manifest and make sure it is the Application CRD.
pub fn parse_application_crd(manifest: &str) -> Result<CustomResourceDefinition> {
    let crd: CustomResourceDefinition =
        serde_yaml::from_str(manifest).context(error::SerdeYamlSnafu {
            action: "parse the Application CRD manifest",
        })?;
    let name = crd.name_any();
    ensure!(
        name == APPLICATION_CRD_NAME,
        error::UnexpectedCrdSnafu {
            expected: APPLICATION_CRD_NAME,
            found: name,
        }
    );
    Ok(crd)
}

/// Install the Kubernetes Application CRD. Running it again updates the CRD in place.
pub async fn install_application_crd<C>(client: &C, source: &CrdSource) -> Result<()>
where
    C: ClusterApi + ?Sized,
{
    let crd = parse_application_crd(&source.read().await?)?;
    client.apply_crd(&crd).await?;
    info!("Applied the '{}' CRD", APPLICATION_CRD_NAME);
    Ok(())
}

#[cfg(test)]
pub(crate) const TEST_CRD: &str = r#"
apiVersion: apiextensions.k8s.io/v1
kind: CustomResourceDefinition
metadata:
  name: applications.app.k8s.io
  annotations:
    controller-gen.kubebuilder.io/version: v0.4.0
spec:
  group: app.k8s.io
  names:
    kind: Application
    listKind: ApplicationList
    plural: applications
    singular: application
  scope: Namespaced
  versions:
  - name: v1beta1
    served: true
    storage: true
    schema:
      openAPIV3Schema:
        type: object
        x-kubernetes-preserve-unknown-fields: true
"#;
