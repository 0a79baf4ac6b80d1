use crate::args::{read_config, ClusterArgs, InstanceArgs};
use crate::status::terminal_width;
use anyhow::{Context, Result};
use clap::Parser;
use kfp_install_model::status::proxy_url;
use kfp_install_model::{InstallManager, InstallPlan, KubeClusterApi, SystemToolRunner};
use std::path::PathBuf;

/// The install subcommand runs every installation step: preflight checks, cluster creation,
/// the Application CRD, cluster-admin binding, namespace creation and the deployer.
#[derive(Debug, Parser)]
pub(crate) struct Install {
    /// Path to an install config file. Command line values override its values.
    #[clap(long = "config")]
    config: Option<PathBuf>,

    #[clap(flatten)]
    cluster: ClusterArgs,

    #[clap(flatten)]
    instance: InstanceArgs,

    /// The account to bind cluster-admin to. Defaults to the active gcloud account.
    #[clap(long = "account")]
    account: Option<String>,

    /// The deployer image to run.
    #[clap(long = "deployer-image")]
    deployer_image: Option<String>,

    /// URL or local path of the Application CRD manifest.
    #[clap(long = "crd-source")]
    crd_source: Option<String>,

    /// Do not run `gcloud auth configure-docker`.
    #[clap(long = "skip-docker-config")]
    skip_docker_config: bool,

    /// Return once the deployer finished instead of waiting for all pods to be ready.
    #[clap(long = "no-wait")]
    no_wait: bool,

    /// Seconds to wait for all pods to be ready.
    #[clap(long = "timeout")]
    timeout: Option<u64>,

    /// Output the summary in JSON format.
    #[clap(long = "json")]
    json: bool,
}

impl Install {
    pub(crate) async fn run(self, runner: SystemToolRunner, client: KubeClusterApi) -> Result<()> {
        let mut plan = self.plan()?;
        plan.account = self.account;
        plan.requirements.configure_docker = !self.skip_docker_config;
        if self.no_wait {
            plan.wait = None;
        }

        let manager = InstallManager::new(runner, client);
        let summary = manager
            .install(&plan)
            .await
            .context("Unable to install Kubeflow Pipelines")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&summary)
                    .context("Could not create string from install summary.")?
            );
            return Ok(());
        }
        if let Some(rollout) = &summary.rollout {
            println!("{}", rollout.to_table(terminal_width()));
        }
        println!(
            "Kubeflow Pipelines '{}' was installed in namespace '{}'.",
            plan.parameters.instance().name,
            plan.parameters.instance().namespace
        );
        match &summary.proxy_hostname {
            Some(hostname) => println!("The Pipelines UI is available at {}", proxy_url(hostname)),
            None => println!(
                "The UI address is not registered yet. Run 'proxy-url --namespace {}' in a few minutes.",
                plan.parameters.instance().namespace
            ),
        }
        Ok(())
    }

    fn plan(&self) -> Result<InstallPlan> {
        let mut config = read_config(self.config.as_ref())?;
        self.cluster.apply(&mut config)?;
        self.instance.apply(&mut config);
        if let Some(image) = &self.deployer_image {
            config.deployer_image = image.clone();
        }
        if let Some(source) = &self.crd_source {
            config.application_crd_url = source.clone();
        }
        if let Some(timeout) = self.timeout {
            config.wait_timeout_secs = timeout;
        }
        InstallPlan::from_config(&config).context("Invalid install settings")
    }
}
