use super::{redact_args, Tool, ToolOutput, ToolRunner};
use crate::error::{self, Result};
use log::debug;
use snafu::ResultExt;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

/// A [`ToolRunner`] that spawns the tools found on the `PATH`. When a kubeconfig path is given,
/// every tool is run with `KUBECONFIG` pointing at it so that `gcloud` writes credentials to, and
/// `mpdev` deploys through, the same file the installer's client reads.
#[derive(Debug, Clone, Default)]
pub struct SystemToolRunner {
    kubeconfig: Option<PathBuf>,
}

impl SystemToolRunner {
    pub fn new(kubeconfig: Option<PathBuf>) -> Self {
        Self { kubeconfig }
    }

    fn command(&self, tool: Tool, args: &[String]) -> Command {
        debug!("Running '{} {}'", tool.binary(), redact_args(args));
        let mut command = Command::new(tool.binary());
        command.args(args);
        if let Some(kubeconfig) = &self.kubeconfig {
            command.env("KUBECONFIG", kubeconfig);
        }
        command
    }
}

#[async_trait::async_trait]
impl ToolRunner for SystemToolRunner {
    async fn run(&self, tool: Tool, args: &[String]) -> Result<ToolOutput> {
        let output = self
            .command(tool, args)
            .stdin(Stdio::null())
            .output()
            .await;
        let output = match output {
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return error::ToolMissingSnafu {
                    tool: tool.binary(),
                }
                .fail()
            }
            other => other.context(error::ToolSpawnSnafu {
                tool: tool.binary(),
            })?,
        };
        let output = ToolOutput {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        };
        debug!("'{}' exited with {:?}", tool.binary(), output.code);
        Ok(output)
    }

    async fn run_attached(&self, tool: Tool, args: &[String]) -> Result<ToolOutput> {
        let status = self.command(tool, args).status().await;
        let status = match status {
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return error::ToolMissingSnafu {
                    tool: tool.binary(),
                }
                .fail()
            }
            other => other.context(error::ToolSpawnSnafu {
                tool: tool.binary(),
            })?,
        };
        Ok(ToolOutput {
            code: status.code(),
            ..Default::default()
        })
    }
}
