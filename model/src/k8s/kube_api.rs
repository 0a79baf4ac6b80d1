use super::http_status_code::AllowNotFound;
use super::{application_resource, ClusterApi};
use crate::error::{self, Result};
use k8s_openapi::api::core::v1::{ConfigMap, Namespace, Pod};
use k8s_openapi::api::rbac::v1::ClusterRoleBinding;
use k8s_openapi::apiextensions_apiserver::pkg::apis::apiextensions::v1::CustomResourceDefinition;
use kube::api::{DeleteParams, DynamicObject, ListParams, Patch, PatchParams, PostParams};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::core::NamespaceResourceScope;
use kube::{Api, Client, Config, Resource as KubeResource, ResourceExt};
use log::{debug, info};
use serde::de::DeserializeOwned;
use serde::Serialize;
use snafu::ResultExt;
use std::fmt::Debug;
use std::path::{Path, PathBuf};
use tokio::sync::OnceCell;

/// [`ClusterApi`] backed by a `kube::Client`.
///
/// The client is created on first use. An installation that fetches cluster credentials first
/// therefore talks to the cluster those credentials point at.
pub struct KubeClusterApi {
    kubeconfig: Option<PathBuf>,
    k8s_client: OnceCell<Client>,
}

impl KubeClusterApi {
    /// Retry attempts for creating or updating an object.
    const MAX_RETRIES: i32 = 3;
    /// Timeout for object creation/update retries.
    const BACKOFF_MS: u64 = 500;
    /// Polls while waiting for a new namespace to become readable.
    const SETTLE_ATTEMPTS: i32 = 20;

    /// Use the kubeconfig at `kubeconfig`, or the default kube configuration if `None`.
    pub fn new(kubeconfig: Option<PathBuf>) -> Self {
        Self {
            kubeconfig,
            k8s_client: OnceCell::new(),
        }
    }

    pub fn from_client(client: Client) -> Self {
        Self {
            kubeconfig: None,
            k8s_client: OnceCell::new_with(Some(client)),
        }
    }

    /// The `kube::Client`, created if this is the first call.
    pub async fn client(&self) -> Result<Client> {
        self.k8s_client
            .get_or_try_init(|| Self::connect(self.kubeconfig.as_deref()))
            .await
            .map(Clone::clone)
    }

    async fn connect(kubeconfig: Option<&Path>) -> Result<Client> {
        match kubeconfig {
            Some(kubeconfig_path) => {
                debug!("Creating client from '{}'", kubeconfig_path.display());
                let kubeconfig =
                    Kubeconfig::read_from(kubeconfig_path).context(error::ConfigReadSnafu)?;
                let config =
                    Config::from_custom_kubeconfig(kubeconfig, &KubeConfigOptions::default())
                        .await
                        .context(error::ClientCreateKubeconfigSnafu)?;
                config.try_into().context(error::KubeSnafu {
                    action: "create client from `Kubeconfig`",
                })
            }
            None => Client::try_default().await.context(error::KubeSnafu {
                action: "create client from `Kubeconfig`",
            }),
        }
    }

    /// Create or update an existing k8s object
    async fn create_or_update<T>(&self, api: &Api<T>, data: &T, what: &str) -> Result<()>
    where
        T: KubeResource + Clone + DeserializeOwned + Serialize + Debug,
    {
        let mut error = None;

        for _ in 0..Self::MAX_RETRIES {
            match Self::create_or_update_internal(api, data, what).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    debug!("Attempt to create {} failed: {}", what, e);
                    error = Some(e)
                }
            }
            tokio::time::sleep(tokio::time::Duration::from_millis(Self::BACKOFF_MS)).await;
        }
        match error {
            None => Ok(()),
            Some(error) => Err(error),
        }
    }

    async fn create_or_update_internal<T>(api: &Api<T>, data: &T, what: &str) -> Result<()>
    where
        T: KubeResource + Clone + DeserializeOwned + Serialize + Debug,
    {
        // If the data already exists, update it with the new one using a `Patch`. If not create a
        // new one.
        match api.get(&data.name_any()).await {
            Ok(existing) => {
                api.patch(
                    &existing.name_any(),
                    &PatchParams::default(),
                    &Patch::Merge(data),
                )
                .await
            }
            Err(_err) => api.create(&PostParams::default(), data).await,
        }
        .context(error::CreateSnafu { what })?;

        Ok(())
    }

    /// Creates a non namespaced api of type `T`
    async fn api<T>(&self) -> Result<Api<T>>
    where
        T: KubeResource,
        <T as KubeResource>::DynamicType: Default,
    {
        Ok(Api::<T>::all(self.client().await?))
    }

    /// Creates a namespaced api of type `T`
    async fn namespaced_api<T>(&self, namespace: &str) -> Result<Api<T>>
    where
        T: KubeResource<Scope = NamespaceResourceScope>,
        <T as KubeResource>::DynamicType: Default,
    {
        Ok(Api::<T>::namespaced(self.client().await?, namespace))
    }

    async fn application_api(&self, namespace: &str) -> Result<Api<DynamicObject>> {
        Ok(Api::namespaced_with(
            self.client().await?,
            namespace,
            &application_resource(),
        ))
    }
}

#[async_trait::async_trait]
impl ClusterApi for KubeClusterApi {
    async fn apply_crd(&self, crd: &CustomResourceDefinition) -> Result<()> {
        self.create_or_update(
            &self.api::<CustomResourceDefinition>().await?,
            crd,
            &format!("CRD '{}'", crd.name_any()),
        )
        .await
    }

    async fn namespace_exists(&self, name: &str) -> Result<bool> {
        Ok(self
            .api::<Namespace>()
            .await?
            .get(name)
            .await
            .allow_not_found()
            .context(error::KubeSnafu {
                action: format!("get namespace '{}'", name),
            })?
            .is_some())
    }

    async fn create_namespace(&self, namespace: &Namespace) -> Result<()> {
        let name = namespace.name_any();
        let api = self.api::<Namespace>().await?;
        api.create(&PostParams::default(), namespace)
            .await
            .context(error::CreateSnafu {
                what: format!("namespace '{}'", name),
            })?;

        // Give the object enough time to settle.
        let mut sleep_count = 0;
        while api.get(&name).await.is_err() && sleep_count < Self::SETTLE_ATTEMPTS {
            tokio::time::sleep(tokio::time::Duration::from_millis(50)).await;
            sleep_count += 1;
        }

        api.get(&name).await.context(error::CreateSnafu {
            what: format!("namespace '{}'", name),
        })?;
        info!("Created namespace '{}'", name);
        Ok(())
    }

    async fn cluster_role_binding(&self, name: &str) -> Result<Option<ClusterRoleBinding>> {
        self.api::<ClusterRoleBinding>()
            .await?
            .get(name)
            .await
            .allow_not_found()
            .context(error::KubeSnafu {
                action: format!("get cluster role binding '{}'", name),
            })
    }

    async fn create_cluster_role_binding(&self, binding: &ClusterRoleBinding) -> Result<()> {
        self.api::<ClusterRoleBinding>()
            .await?
            .create(&PostParams::default(), binding)
            .await
            .context(error::CreateSnafu {
                what: format!("cluster role binding '{}'", binding.name_any()),
            })?;
        Ok(())
    }

    async fn list_pods(&self, namespace: &str) -> Result<Vec<Pod>> {
        Ok(self
            .namespaced_api::<Pod>(namespace)
            .await?
            .list(&ListParams::default())
            .await
            .context(error::KubeSnafu {
                action: format!("list pods in namespace '{}'", namespace),
            })?
            .items)
    }

    async fn config_map(&self, namespace: &str, name: &str) -> Result<Option<ConfigMap>> {
        self.namespaced_api::<ConfigMap>(namespace)
            .await?
            .get(name)
            .await
            .allow_not_found()
            .context(error::KubeSnafu {
                action: format!("get config map '{}'", name),
            })
    }

    async fn application(&self, namespace: &str, name: &str) -> Result<Option<DynamicObject>> {
        self.application_api(namespace)
            .await?
            .get(name)
            .await
            .allow_not_found()
            .context(error::KubeSnafu {
                action: format!("get application '{}'", name),
            })
    }

    async fn delete_application(&self, namespace: &str, name: &str) -> Result<bool> {
        Ok(self
            .application_api(namespace)
            .await?
            .delete(name, &DeleteParams::default())
            .await
            .allow_not_found()
            .context(error::KubeSnafu {
                action: format!("delete application '{}'", name),
            })?
            .is_some())
    }

    async fn delete_namespace(&self, name: &str) -> Result<bool> {
        Ok(self
            .api::<Namespace>()
            .await?
            .delete(name, &DeleteParams::default())
            .await
            .allow_not_found()
            .context(error::KubeSnafu {
                action: format!("delete namespace '{}'", name),
            })?
            .is_some())
    }
}
