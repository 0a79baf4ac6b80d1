/*!

Wrappers for the external command line tools the installation drives. Every invocation goes
through a [`ToolRunner`] so that the workflow can be exercised without `gcloud`, `kubectl`,
`docker` or `mpdev` being present.

!*/

mod gcloud;
mod system;

pub use gcloud::{ClusterDescription, Gcloud, NodeConfig};
pub use system::SystemToolRunner;

use crate::error::{self, Result};
use serde::{Deserialize, Serialize};
use serde_plain::derive_display_from_serialize;

/// The external programs used during an installation.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tool {
    Gcloud,
    Kubectl,
    Docker,
    Mpdev,
}

derive_display_from_serialize!(Tool);

impl Tool {
    pub const ALL: [Tool; 4] = [Tool::Gcloud, Tool::Kubectl, Tool::Docker, Tool::Mpdev];

    /// The name of the executable.
    pub fn binary(&self) -> &'static str {
        match self {
            Tool::Gcloud => "gcloud",
            Tool::Kubectl => "kubectl",
            Tool::Docker => "docker",
            Tool::Mpdev => "mpdev",
        }
    }

    /// Arguments that make the tool print its version without side effects.
    pub fn version_args(&self) -> &'static [&'static str] {
        match self {
            Tool::Gcloud => &["version"],
            Tool::Kubectl => &["version", "--client"],
            Tool::Docker => &["--version"],
            Tool::Mpdev => &["version"],
        }
    }

    /// Where to get the tool when it is missing.
    pub fn install_hint(&self) -> &'static str {
        match self {
            Tool::Gcloud => "Install the Google Cloud SDK: https://cloud.google.com/sdk/docs/install",
            Tool::Kubectl => "Install kubectl with 'gcloud components install kubectl'",
            Tool::Docker => "Install docker: https://docs.docker.com/get-docker/",
            Tool::Mpdev => "Install mpdev: https://github.com/GoogleCloudPlatform/marketplace-k8s-app-tools/blob/master/docs/tool-prerequisites.md",
        }
    }
}

/// The captured result of running a tool.
#[derive(Debug, Clone, Default, Eq, PartialEq)]
pub struct ToolOutput {
    /// The exit code, `None` if the process was terminated by a signal.
    pub code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Convert a non-zero exit into an error. `what` describes the command for the error message
    /// and must not contain secrets.
    pub fn into_result<S>(self, what: S) -> Result<ToolOutput>
    where
        S: Into<String>,
    {
        if self.success() {
            Ok(self)
        } else {
            error::ToolFailedSnafu {
                what: what.into(),
                code: self.code,
                stdout: self.stdout,
                stderr: self.stderr,
            }
            .fail()
        }
    }

    /// The trimmed stdout, `None` if it is empty.
    pub fn trimmed_stdout(&self) -> Option<&str> {
        let trimmed = self.stdout.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }
}

/// Runs external tools. [`SystemToolRunner`] spawns real processes; tests provide their own.
#[async_trait::async_trait]
pub trait ToolRunner: Send + Sync {
    /// Run `tool` with `args`, capturing its output. Returns [`error::Error::ToolMissing`] when
    /// the binary cannot be found. A non-zero exit is not an error at this level.
    async fn run(&self, tool: Tool, args: &[String]) -> Result<ToolOutput>;

    /// Run `tool` with `args` with its output going straight to the terminal. Used for long
    /// running commands whose progress the user wants to see.
    async fn run_attached(&self, tool: Tool, args: &[String]) -> Result<ToolOutput> {
        self.run(tool, args).await
    }

    /// Returns `None` when `tool` is not installed, otherwise the first line of its version
    /// output (which may be empty if the version command failed).
    async fn probe(&self, tool: Tool) -> Result<Option<String>> {
        match self.run(tool, &to_args(tool.version_args())).await {
            Ok(output) => Ok(Some(
                output
                    .success()
                    .then(|| output.stdout.lines().find(|l| !l.trim().is_empty()))
                    .flatten()
                    .unwrap_or_default()
                    .trim()
                    .to_string(),
            )),
            Err(error::Error::ToolMissing { .. }) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Convert a list of string-like values into owned arguments.
pub fn to_args<I, S>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    args.into_iter().map(|s| s.as_ref().to_string()).collect()
}

/// Arguments that carry credentials are replaced before being logged.
pub(crate) fn redact_args(args: &[String]) -> String {
    args.iter()
        .map(|arg| match arg.split_once('=') {
            Some((flag, _)) if flag == "--parameters" => format!("{}=<redacted>", flag),
            _ => arg.clone(),
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[test]
fn redact_parameters() {
    let args = to_args(["scripts/install", "--deployer=image", "--parameters={\"a\":1}"]);
    assert_eq!(
        "scripts/install --deployer=image --parameters=<redacted>",
        redact_args(&args)
    );
}

#[test]
fn tool_failure_is_error() {
    let output = ToolOutput {
        code: Some(2),
        stdout: "out".to_string(),
        stderr: "err".to_string(),
    };
    let message = output.into_result("gcloud version").unwrap_err().to_string();
    assert!(message.contains("gcloud version"));
    assert!(message.contains("'2'"));
    assert!(message.contains("err"));
}
