/*!

Access to the Kubernetes API server of the target cluster. The workflow only talks to the cluster
through [`ClusterApi`] so that it can be tested without one.

!*/

mod http_status_code;
mod kube_api;

pub use http_status_code::{HttpStatusCode, StatusCode};
pub use kube_api::KubeClusterApi;

use crate::constants::{APPLICATION_GROUP, APPLICATION_KIND, APPLICATION_VERSION};
use crate::error::Result;
use k8s_openapi::api::core::v1::{ConfigMap, Namespace, Pod};
use k8s_openapi::api::rbac::v1::ClusterRoleBinding;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::{ApiResource, DynamicObject, GroupVersionKind};

#[async_trait::async_trait]
pub trait ClusterApi: Send + Sync {
    /// Create the CRD or merge it into the existing one.
    async fn apply_crd(&self, crd: &CustomResourceDefinition) -> Result<()>;

    async fn namespace_exists(&self, name: &str) -> Result<bool>;

    /// Create the namespace and wait until the API server returns it.
    async fn create_namespace(&self, namespace: &Namespace) -> Result<()>;

    async fn cluster_role_binding(&self, name: &str) -> Result<Option<ClusterRoleBinding>>;

    async fn create_cluster_role_binding(&self, binding: &ClusterRoleBinding) -> Result<()>;

    async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>>;

    async fn config_map(&self, namespace: &str, name: &str) -> Result<Option<ConfigMap>>;

    /// The `applications.app.k8s.io` object named `name`.
    async fn application(&self, namespace: &str, name: &str) -> Result<Option<DynamicObject>>;

    /// Returns `false` if there was nothing to delete.
    async fn delete_application(&self, namespace: &str, name: &str) -> Result<bool>;

    /// Returns `false` if there was nothing to delete.
    async fn delete_namespace(&self, name: &str) -> Result<bool>;
}

/// The `ApiResource` of the `Application` kind, which has no Rust type of its own.
pub fn application_resource() -> ApiResource {
    let mut resource = ApiResource::from_gvk(&GroupVersionKind::gvk(
        APPLICATION_GROUP,
        APPLICATION_VERSION,
        APPLICATION_KIND,
    ));
    resource.plural = "applications".to_string();
    resource
}

#[test]
fn application_resource_plural() {
    use crate::constants::APPLICATION_API_VERSION;
    let resource = application_resource();
    assert_eq!(APPLICATION_API_VERSION, resource.api_version);
    assert_eq!("applications", resource.plural);
}
