use anyhow::{Context, Result};
use clap::Parser;
use kfp_install_model::constants::DEFAULT_DEPLOYER_IMAGE;
use kfp_install_model::{Deployer, SystemToolRunner};

/// Install into a scratch namespace with `mpdev scripts/verify`, run the deployer's tests and
/// remove the installation again.
#[derive(Debug, Parser)]
pub(crate) struct Verify {
    /// The deployer image to verify.
    #[clap(long = "deployer-image", default_value = DEFAULT_DEPLOYER_IMAGE)]
    deployer_image: String,
}

impl Verify {
    pub(crate) async fn run(self, runner: &SystemToolRunner) -> Result<()> {
        Deployer::new(runner, self.deployer_image.as_str())
            .verify()
            .await
            .context(format!("Verification of '{}' failed", self.deployer_image))?;
        println!("Deployer '{}' passed verification.", self.deployer_image);
        Ok(())
    }
}
