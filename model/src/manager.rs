/*!

The install manager runs every step of an installation in order and stops at the first failure.
The failed step is named in the returned [`Error::Step`](crate::Error::Step).

!*/

use crate::cluster::{ClusterProvisioner, ClusterSpec, CreationPolicy, ProvisionOutcome};
use crate::config::InstallConfig;
use crate::crd::{install_application_crd, CrdSource};
use crate::deployer::Deployer;
use crate::error::{self, Error, Result};
use crate::k8s::ClusterApi;
use crate::params::{encode_service_account_key, DeployerParameters};
use crate::preflight::{preflight, Requirements};
use crate::rbac::{bind_cluster_admin, BindingOutcome};
use crate::status::{proxy_hostname, proxy_url, watch, StatusSnapshot, WatchOptions};
use crate::system::application_namespace;
use crate::tools::{Gcloud, ToolRunner};
use log::info;
use serde::Serialize;
use serde_plain::derive_display_from_serialize;
use snafu::{OptionExt, ResultExt};
use std::future::Future;

/// The steps of an installation, in the order they run.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Step {
    Validate,
    Preflight,
    Cluster,
    Crd,
    Rbac,
    Namespace,
    Deploy,
    Wait,
    Proxy,
}

derive_display_from_serialize!(Step);

/// Everything an installation needs.
#[derive(Debug, Clone)]
pub struct InstallPlan {
    /// Create or reuse this cluster. `None` installs into the current kubeconfig context.
    pub cluster: Option<ClusterSpec>,
    pub creation_policy: CreationPolicy,
    pub requirements: Requirements,
    /// The identity bound to cluster-admin. Defaults to the active gcloud account.
    pub account: Option<String>,
    pub crd_source: CrdSource,
    pub parameters: DeployerParameters,
    pub deployer_image: String,
    /// Wait for the rollout to finish. `None` returns once the deployer is done.
    pub wait: Option<WatchOptions>,
}

impl InstallPlan {
    /// A plan that waits with the config's timeout. Reads the service account key if the config
    /// names one.
    pub fn from_config(config: &InstallConfig) -> Result<Self> {
        let mut instance = config.instance.clone();
        if let Some(path) = &config.service_account_key {
            instance.service_account_credential = Some(encode_service_account_key(path)?);
        }
        Ok(Self {
            cluster: config.cluster.clone(),
            creation_policy: config.creation_policy,
            requirements: Requirements::default(),
            account: None,
            crd_source: CrdSource::from(config.application_crd_url.as_str()),
            parameters: DeployerParameters::new(instance, config.managed_storage.clone())?,
            deployer_image: config.deployer_image.clone(),
            wait: Some(WatchOptions {
                timeout: config.wait_timeout(),
                ..Default::default()
            }),
        })
    }
}

/// What an installation did.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstallSummary {
    pub cluster: Option<ProvisionOutcome>,
    pub binding: BindingOutcome,
    pub namespace_created: bool,
    pub rollout: Option<StatusSnapshot>,
    /// The inverse proxy hostname of the Pipelines UI, if it was registered by the end.
    pub proxy_hostname: Option<String>,
}

pub struct InstallManager<R, C> {
    runner: R,
    client: C,
}

impl<R, C> InstallManager<R, C>
where
    R: ToolRunner,
    C: ClusterApi,
{
    pub fn new(runner: R, client: C) -> Self {
        Self { runner, client }
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Run every step of `plan`.
    pub async fn install(&self, plan: &InstallPlan) -> Result<InstallSummary> {
        run_step(Step::Validate, async {
            if let Some(cluster) = &plan.cluster {
                cluster.validate()?;
            }
            plan.parameters.instance().validate()?;
            if let Some(storage) = plan.parameters.managed_storage() {
                storage.validate()?;
            }
            Ok::<(), Error>(())
        })
        .await?;

        let report = run_step(Step::Preflight, async {
            preflight(&self.runner, &plan.requirements)
                .await?
                .into_result()
        })
        .await?;

        let cluster = match &plan.cluster {
            Some(spec) => Some(
                run_step(Step::Cluster, async {
                    ClusterProvisioner::new(&self.runner)
                        .ensure(spec, plan.creation_policy)
                        .await
                })
                .await?,
            ),
            None => None,
        };

        run_step(Step::Crd, async {
            install_application_crd(&self.client, &plan.crd_source).await
        })
        .await?;

        let binding = run_step(Step::Rbac, async {
            let account = match plan.account.clone().or_else(|| report.account.clone()) {
                Some(account) => account,
                None => Gcloud::new(&self.runner)
                    .active_account()
                    .await?
                    .context(error::MissingAccountSnafu)?,
            };
            bind_cluster_admin(&self.client, &account).await
        })
        .await?;

        let namespace = plan.parameters.instance().namespace.as_str();
        let namespace_created = run_step(Step::Namespace, async {
            self.ensure_namespace(namespace).await
        })
        .await?;

        run_step(Step::Deploy, async {
            Deployer::new(&self.runner, plan.deployer_image.as_str())
                .install(&plan.parameters)
                .await
        })
        .await?;

        let rollout = match plan.wait {
            Some(options) => Some(
                run_step(Step::Wait, async {
                    watch(&self.client, namespace, options).await
                })
                .await?,
            ),
            None => None,
        };

        let proxy_hostname = run_step(Step::Proxy, async {
            proxy_hostname(&self.client, namespace).await
        })
        .await?;
        match &proxy_hostname {
            Some(hostname) => info!("The Pipelines UI is available at {}", proxy_url(hostname)),
            None => info!(
                "The inverse proxy has not registered yet, run 'proxy-url' to look up the UI address later"
            ),
        }

        Ok(InstallSummary {
            cluster,
            binding,
            namespace_created,
            rollout,
            proxy_hostname,
        })
    }

    /// Create the namespace unless it exists. Returns `true` if it was created.
    pub async fn ensure_namespace(&self, name: &str) -> Result<bool> {
        if self.client.namespace_exists(name).await? {
            info!("Namespace '{}' already exists", name);
            return Ok(false);
        }
        self.client
            .create_namespace(&application_namespace(name))
            .await?;
        Ok(true)
    }
}

async fn run_step<T, F>(step: Step, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    info!("Starting step '{}'", step);
    let result = fut.await.context(error::StepSnafu {
        step: step.to_string(),
    })?;
    info!("Done with step '{}'", step);
    Ok(result)
}

#[test]
fn step_names() {
    assert_eq!("preflight", Step::Preflight.to_string());
    assert_eq!("deploy", Step::Deploy.to_string());
}
