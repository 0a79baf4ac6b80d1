use anyhow::{Context, Result};
use clap::Parser;
use kfp_install_model::constants::{DEFAULT_APP_INSTANCE_NAME, DEFAULT_NAMESPACE};
use kfp_install_model::status::{application_exists, snapshot, watch};
use kfp_install_model::{KubeClusterApi, WatchOptions};
use log::warn;
use std::time::Duration;
use terminal_size::{Height, Width};

/// Check the status of the pods of an installation.
#[derive(Debug, Parser)]
pub(crate) struct Status {
    /// Name of the application instance.
    #[clap(long = "name", env = "APP_INSTANCE_NAME", default_value = DEFAULT_APP_INSTANCE_NAME)]
    name: String,

    /// Namespace of the installation.
    #[clap(long = "namespace", env = "NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    namespace: String,

    /// Wait until all pods are ready or one of them fails.
    #[clap(long = "wait")]
    wait: bool,

    /// Seconds to wait with `--wait`.
    #[clap(long = "timeout", default_value = "1800")]
    timeout: u64,

    /// Output the results in JSON format.
    #[clap(long = "json")]
    json: bool,
}

impl Status {
    pub(crate) async fn run(self, client: &KubeClusterApi) -> Result<()> {
        if !application_exists(client, &self.namespace, &self.name)
            .await
            .context(format!("Unable to look up application '{}'", self.name))?
        {
            warn!(
                "Application '{}' was not found in namespace '{}'",
                self.name, self.namespace
            );
        }
        let status = if self.wait {
            let options = WatchOptions {
                timeout: Duration::from_secs(self.timeout),
                ..Default::default()
            };
            watch(client, &self.namespace, options).await
        } else {
            snapshot(client, &self.namespace).await
        }
        .context(format!("Unable to get the status of '{}'", self.namespace))?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&status)
                    .context("Could not create string from status.")?
            );
        } else {
            println!("{}", status.to_table(terminal_width()));
        }
        Ok(())
    }
}

pub(crate) fn terminal_width() -> usize {
    let (Width(width), _) = terminal_size::terminal_size().unwrap_or((Width(120), Height(0)));
    width as usize
}
