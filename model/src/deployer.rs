use crate::constants::DEFAULT_DEPLOYER_IMAGE;
use crate::error::Result;
use crate::params::DeployerParameters;
use crate::tools::{Tool, ToolRunner};
use log::info;

/// Invokes the marketplace deployer image through `mpdev`.
pub struct Deployer<'a, R: ?Sized> {
    runner: &'a R,
    image: String,
}

impl<'a, R> Deployer<'a, R>
where
    R: ToolRunner + ?Sized,
{
    pub fn new<S>(runner: &'a R, image: S) -> Self
    where
        S: Into<String>,
    {
        Self {
            runner,
            image: image.into(),
        }
    }

    /// A deployer using the published Kubeflow Pipelines deployer image.
    pub fn with_default_image(runner: &'a R) -> Self {
        Self::new(runner, DEFAULT_DEPLOYER_IMAGE)
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    /// The `mpdev` arguments for an installation. The last argument contains secrets.
    pub fn install_args(&self, parameters: &DeployerParameters) -> Result<Vec<String>> {
        Ok(vec![
            "scripts/install".to_string(),
            format!("--deployer={}", self.image),
            format!("--parameters={}", parameters.to_json()?),
        ])
    }

    /// `mpdev scripts/install`, which runs the deployer image against the current cluster.
    pub async fn install(&self, parameters: &DeployerParameters) -> Result<()> {
        info!(
            "Deploying '{}' with deployer '{}' ({})",
            parameters.instance().name,
            self.image,
            parameters
        );
        self.runner
            .run_attached(Tool::Mpdev, &self.install_args(parameters)?)
            .await?
            .into_result(format!("mpdev scripts/install --deployer={}", self.image))?;
        Ok(())
    }

    /// `mpdev scripts/verify` installs the application in a scratch namespace, runs the
    /// deployer's verification tests and removes it again.
    pub async fn verify(&self) -> Result<()> {
        info!("Verifying deployer '{}'", self.image);
        self.runner
            .run_attached(
                Tool::Mpdev,
                &[
                    "scripts/verify".to_string(),
                    format!("--deployer={}", self.image),
                ],
            )
            .await?
            .into_result(format!("mpdev scripts/verify --deployer={}", self.image))?;
        Ok(())
    }
}
