use anyhow::{Context, Result};
use clap::Parser;
use kfp_install_model::constants::APPLICATION_CRD_URL;
use kfp_install_model::crd::install_application_crd;
use kfp_install_model::{CrdSource, KubeClusterApi};

/// Install the Application CRD. Safe to run more than once.
#[derive(Debug, Parser)]
pub(crate) struct Crd {
    /// URL or local path of the CRD manifest.
    #[clap(long = "source", default_value = APPLICATION_CRD_URL)]
    source: String,
}

impl Crd {
    pub(crate) async fn run(self, client: &KubeClusterApi) -> Result<()> {
        let source = CrdSource::from(self.source.as_str());
        install_application_crd(client, &source)
            .await
            .context(format!("Unable to install the Application CRD from '{}'", source))?;
        println!("The Application CRD is installed.");
        Ok(())
    }
}
