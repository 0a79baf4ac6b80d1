use anyhow::{Context, Result};
use clap::Parser;
use kfp_install_model::constants::{DEFAULT_APP_INSTANCE_NAME, DEFAULT_NAMESPACE};
use kfp_install_model::uninstall::uninstall;
use kfp_install_model::{KubeClusterApi, UninstallOutcome};

/// The uninstall subcommand deletes the application, which removes everything the deployer
/// created.
#[derive(Debug, Parser)]
pub(crate) struct Uninstall {
    /// Name of the application instance.
    #[clap(long = "name", env = "APP_INSTANCE_NAME", default_value = DEFAULT_APP_INSTANCE_NAME)]
    name: String,

    /// Namespace of the installation.
    #[clap(long = "namespace", env = "NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    namespace: String,

    /// Delete the namespace as well.
    #[clap(long = "delete-namespace")]
    delete_namespace: bool,
}

impl Uninstall {
    pub(crate) async fn run(self, client: &KubeClusterApi) -> Result<()> {
        let report = uninstall(client, &self.namespace, &self.name, self.delete_namespace)
            .await
            .context(
                "Unable to uninstall Kubeflow Pipelines. (Some artifacts may be left behind)",
            )?;

        match report.application {
            UninstallOutcome::Deleted => println!(
                "Application '{}' was deleted from namespace '{}'.",
                self.name, self.namespace
            ),
            UninstallOutcome::NotFound => println!(
                "Application '{}' was not found in namespace '{}'.",
                self.name, self.namespace
            ),
        }
        if report.namespace_deleted {
            println!("Namespace '{}' was deleted.", self.namespace);
        }
        Ok(())
    }
}
