use crate::args::{read_config, InstanceArgs};
use anyhow::{Context, Result};
use clap::Parser;
use kfp_install_model::InstallPlan;
use std::path::PathBuf;

/// Print the JSON passed to `mpdev scripts/install --parameters`.
#[derive(Debug, Parser)]
pub(crate) struct Parameters {
    /// Path to an install config file.
    #[clap(long = "config")]
    config: Option<PathBuf>,

    #[clap(flatten)]
    instance: InstanceArgs,

    /// Print the database password and service account key instead of redacting them.
    #[clap(long = "show-secrets")]
    show_secrets: bool,
}

impl Parameters {
    pub(crate) fn run(self) -> Result<()> {
        let mut config = read_config(self.config.as_ref())?;
        self.instance.apply(&mut config);
        let parameters = InstallPlan::from_config(&config)
            .context("Invalid deployer parameters")?
            .parameters;
        let json = if self.show_secrets {
            parameters.to_json()
        } else {
            parameters.to_redacted_json()
        }
        .context("Unable to serialize the deployer parameters")?;
        println!("{}", json);
        Ok(())
    }
}
