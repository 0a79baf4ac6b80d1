use anyhow::{Context, Result};
use clap::Parser;
use kfp_install_model::{preflight, Requirements, SystemToolRunner};

/// Check the local environment before installing.
#[derive(Debug, Parser)]
pub(crate) struct Preflight {
    /// Output the results in JSON format.
    #[clap(long = "json")]
    json: bool,

    /// Do not run `gcloud auth configure-docker`.
    #[clap(long = "skip-docker-config")]
    skip_docker_config: bool,
}

impl Preflight {
    pub(crate) async fn run(self, runner: &SystemToolRunner) -> Result<()> {
        let requirements = Requirements {
            configure_docker: !self.skip_docker_config,
            ..Default::default()
        };
        let report = preflight(runner, &requirements)
            .await
            .context("Unable to run preflight checks")?;

        if self.json {
            println!(
                "{}",
                serde_json::to_string_pretty(&report)
                    .context("Could not create string from preflight report.")?
            );
        } else {
            println!("{}", report.to_table());
        }
        report.into_result().context("The environment is not ready")?;
        Ok(())
    }
}
