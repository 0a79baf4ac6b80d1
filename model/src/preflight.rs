use crate::error::{self, Result};
use crate::tools::{Gcloud, Tool, ToolRunner};
use log::{info, warn};
use serde::Serialize;
use serde_plain::derive_display_from_serialize;
use tabled::object::Segment;
use tabled::{Alignment, Modify, Style, Table, Tabled};

/// What the preflight checker looks at.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct Requirements {
    /// Tools that have to be installed.
    pub tools: Vec<Tool>,
    /// Require an authenticated gcloud account.
    pub gcloud_account: bool,
    /// Run `gcloud auth configure-docker` so docker can pull the deployer image.
    pub configure_docker: bool,
}

impl Default for Requirements {
    fn default() -> Self {
        Self {
            tools: Tool::ALL.to_vec(),
            gcloud_account: true,
            configure_docker: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckState {
    Passed,
    Failed,
    Skipped,
}

derive_display_from_serialize!(CheckState);

/// The result of one preflight check.
#[derive(Debug, Clone, Eq, PartialEq, Serialize, Tabled)]
pub struct Check {
    #[tabled(rename = "CHECK")]
    pub name: String,
    #[tabled(rename = "RESULT")]
    pub state: CheckState,
    #[tabled(rename = "DETAIL")]
    pub detail: String,
}

impl Check {
    fn new<S1, S2>(name: S1, state: CheckState, detail: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        Self {
            name: name.into(),
            state,
            detail: detail.into(),
        }
    }
}

/// The outcome of all preflight checks.
#[derive(Debug, Clone, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PreflightReport {
    pub checks: Vec<Check>,
    /// The active gcloud account, if one was found.
    pub account: Option<String>,
}

impl PreflightReport {
    pub fn is_ready(&self) -> bool {
        self.failures().next().is_none()
    }

    pub fn failures(&self) -> impl Iterator<Item = &Check> {
        self.checks
            .iter()
            .filter(|check| check.state == CheckState::Failed)
    }

    /// `Err` listing every failed check if the environment is not ready.
    pub fn into_result(self) -> Result<PreflightReport> {
        let failures: Vec<String> = self
            .failures()
            .map(|check| format!("{}: {}", check.name, check.detail))
            .collect();
        if failures.is_empty() {
            Ok(self)
        } else {
            error::PreflightSnafu { failures }.fail()
        }
    }

    /// Create a table of all checks.
    pub fn to_table(&self) -> String {
        Table::new(self.checks.clone())
            .with(Style::blank())
            .with(Modify::new(Segment::all()).with(Alignment::left()))
            .to_string()
    }
}

/// Verify the local environment can run an installation.
pub async fn preflight<R>(runner: &R, requirements: &Requirements) -> Result<PreflightReport>
where
    R: ToolRunner + ?Sized,
{
    let mut report = PreflightReport::default();

    for tool in &requirements.tools {
        let check = match runner.probe(*tool).await? {
            Some(version) => {
                info!("Found {} {}", tool, version);
                Check::new(tool.binary(), CheckState::Passed, version)
            }
            None => {
                warn!("{} was not found", tool);
                Check::new(tool.binary(), CheckState::Failed, tool.install_hint())
            }
        };
        report.checks.push(check);
    }

    let gcloud_installed = !report
        .failures()
        .any(|check| check.name == Tool::Gcloud.binary());
    let gcloud = Gcloud::new(runner);

    if requirements.gcloud_account {
        let check = if !gcloud_installed {
            Check::new("gcloud account", CheckState::Skipped, "gcloud is not installed")
        } else {
            match gcloud.active_account().await {
                Ok(Some(account)) => {
                    report.account = Some(account.clone());
                    Check::new("gcloud account", CheckState::Passed, account)
                }
                Ok(None) => Check::new(
                    "gcloud account",
                    CheckState::Failed,
                    "no active account, run 'gcloud auth login'",
                ),
                Err(e) => Check::new("gcloud account", CheckState::Failed, e.to_string()),
            }
        };
        report.checks.push(check);
    }

    if requirements.configure_docker {
        let check = if !gcloud_installed {
            Check::new(
                "docker credentials",
                CheckState::Skipped,
                "gcloud is not installed",
            )
        } else {
            match gcloud.configure_docker().await {
                Ok(()) => Check::new(
                    "docker credentials",
                    CheckState::Passed,
                    "gcloud is the docker credential helper",
                ),
                Err(e) => Check::new("docker credentials", CheckState::Failed, e.to_string()),
            }
        };
        report.checks.push(check);
    }

    Ok(report)
}
