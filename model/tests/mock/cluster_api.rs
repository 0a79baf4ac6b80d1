use k8s_openapi::api::core::v1::{ConfigMap, Namespace, Pod};
use k8s_openapi::api::rbac::v1::ClusterRoleBinding;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kfp_install_model::k8s::application_resource;
use kfp_install_model::{ClusterApi, Result};
use kube::api::{DynamicObject, ObjectMeta};
use kube::ResourceExt;
use maplit::btreemap;
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use std::sync::Mutex;

/// An in-memory [`ClusterApi`] so the workflow can be tested without Kubernetes.
#[derive(Default)]
pub(crate) struct MockClusterApi {
    pub(crate) crds: Mutex<Vec<String>>,
    pub(crate) namespaces: Mutex<BTreeSet<String>>,
    pub(crate) bindings: Mutex<BTreeMap<String, ClusterRoleBinding>>,
    pub(crate) config_maps: Mutex<BTreeMap<(String, String), ConfigMap>>,
    pub(crate) applications: Mutex<BTreeSet<(String, String)>>,
    /// Each `list_pods` call returns the next entry. The last one is repeated.
    pods: Mutex<VecDeque<Vec<Pod>>>,
}

impl MockClusterApi {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn with_namespace(self, name: &str) -> Self {
        self.namespaces.lock().unwrap().insert(name.to_string());
        self
    }

    pub(crate) fn with_binding(self, binding: ClusterRoleBinding) -> Self {
        self.bindings
            .lock()
            .unwrap()
            .insert(binding.name_any(), binding);
        self
    }

    pub(crate) fn with_application(self, namespace: &str, name: &str) -> Self {
        self.applications
            .lock()
            .unwrap()
            .insert((namespace.to_string(), name.to_string()));
        self
    }

    pub(crate) fn with_proxy_hostname(self, namespace: &str, hostname: &str) -> Self {
        let config_map = ConfigMap {
            metadata: ObjectMeta {
                name: Some("inverse-proxy-config".to_string()),
                namespace: Some(namespace.to_string()),
                ..Default::default()
            },
            data: Some(btreemap! { "Hostname".to_string() => hostname.to_string() }),
            ..Default::default()
        };
        self.config_maps.lock().unwrap().insert(
            (namespace.to_string(), "inverse-proxy-config".to_string()),
            config_map,
        );
        self
    }

    /// Queue the pods returned by the next `list_pods` call.
    pub(crate) fn then_pods(self, pods: Vec<Pod>) -> Self {
        self.pods.lock().unwrap().push_back(pods);
        self
    }
}

#[async_trait::async_trait]
impl ClusterApi for MockClusterApi {
    async fn apply_crd(&self, crd: &CustomResourceDefinition) -> Result<()> {
        self.crds.lock().unwrap().push(crd.name_any());
        Ok(())
    }

    async fn namespace_exists(&self, name: &str) -> Result<bool> {
        Ok(self.namespaces.lock().unwrap().contains(name))
    }

    async fn create_namespace(&self, namespace: &Namespace) -> Result<()> {
        self.namespaces.lock().unwrap().insert(namespace.name_any());
        Ok(())
    }

    async fn cluster_role_binding(&self, name: &str) -> Result<Option<ClusterRoleBinding>> {
        Ok(self.bindings.lock().unwrap().get(name).cloned())
    }

    async fn create_cluster_role_binding(&self, binding: &ClusterRoleBinding) -> Result<()> {
        self.bindings
            .lock()
            .unwrap()
            .insert(binding.name_any(), binding.clone());
        Ok(())
    }

    async fn list_pods(&self, _namespace: &str) -> Result<Vec<Pod>> {
        let mut pods = self.pods.lock().unwrap();
        if pods.len() > 1 {
            Ok(pods.pop_front().unwrap_or_default())
        } else {
            Ok(pods.front().cloned().unwrap_or_default())
        }
    }

    async fn config_map(&self, namespace: &str, name: &str) -> Result<Option<ConfigMap>> {
        Ok(self
            .config_maps
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn application(&self, namespace: &str, name: &str) -> Result<Option<DynamicObject>> {
        let exists = self
            .applications
            .lock()
            .unwrap()
            .contains(&(namespace.to_string(), name.to_string()));
        Ok(exists.then(|| DynamicObject::new(name, &application_resource()).within(namespace)))
    }

    async fn delete_application(&self, namespace: &str, name: &str) -> Result<bool> {
        Ok(self
            .applications
            .lock()
            .unwrap()
            .remove(&(namespace.to_string(), name.to_string())))
    }

    async fn delete_namespace(&self, name: &str) -> Result<bool> {
        Ok(self.namespaces.lock().unwrap().remove(name))
    }
}
