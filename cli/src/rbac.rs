use anyhow::{Context, Result};
use clap::Parser;
use kfp_install_model::constants::CLUSTER_ADMIN_BINDING;
use kfp_install_model::rbac::bind_cluster_admin;
use kfp_install_model::tools::Gcloud;
use kfp_install_model::{BindingOutcome, KubeClusterApi, SystemToolRunner};

/// Bind the cluster-admin role to an account, which the deployer needs.
#[derive(Debug, Parser)]
pub(crate) struct Rbac {
    /// The account to bind. Defaults to the active gcloud account.
    #[clap(long = "account")]
    account: Option<String>,
}

impl Rbac {
    pub(crate) async fn run(
        self,
        runner: &SystemToolRunner,
        client: &KubeClusterApi,
    ) -> Result<()> {
        let account = match self.account {
            Some(account) => account,
            None => Gcloud::new(runner)
                .active_account()
                .await
                .context("Unable to read the active gcloud account")?
                .context("No active gcloud account, run 'gcloud auth login' or use '--account'")?,
        };
        let outcome = bind_cluster_admin(client, &account)
            .await
            .context(format!("Unable to bind cluster-admin to '{}'", account))?;
        match outcome {
            BindingOutcome::Created => println!(
                "Created '{}' for '{}'.",
                CLUSTER_ADMIN_BINDING, account
            ),
            BindingOutcome::AlreadyBound => println!(
                "'{}' already grants '{}' cluster-admin.",
                CLUSTER_ADMIN_BINDING, account
            ),
            BindingOutcome::ExistsForOther { subjects } => println!(
                "'{}' exists for {} and was left unchanged.",
                CLUSTER_ADMIN_BINDING,
                subjects.join(", ")
            ),
            BindingOutcome::BindsOtherRole { role } => println!(
                "'{}' binds role '{}' instead of cluster-admin and was left unchanged.",
                CLUSTER_ADMIN_BINDING, role
            ),
        }
        Ok(())
    }
}
