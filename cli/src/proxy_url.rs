use anyhow::{Context, Result};
use clap::Parser;
use kfp_install_model::constants::DEFAULT_NAMESPACE;
use kfp_install_model::status::{proxy_hostname, proxy_url};
use kfp_install_model::KubeClusterApi;

/// Print the URL of the Pipelines UI, read from the inverse proxy config map.
#[derive(Debug, Parser)]
pub(crate) struct ProxyUrl {
    /// Namespace of the installation.
    #[clap(long = "namespace", env = "NAMESPACE", default_value = DEFAULT_NAMESPACE)]
    namespace: String,
}

impl ProxyUrl {
    pub(crate) async fn run(self, client: &KubeClusterApi) -> Result<()> {
        let hostname = proxy_hostname(client, &self.namespace)
            .await
            .context("Unable to read the inverse proxy config")?
            .context(format!(
                "The inverse proxy in namespace '{}' has not registered yet, try again in a few minutes",
                self.namespace
            ))?;
        println!("{}", proxy_url(&hostname));
        Ok(())
    }
}
