use kfp_install_model::{Error, Result, Tool, ToolOutput, ToolRunner};
use std::collections::HashSet;
use std::sync::Mutex;

/// A [`ToolRunner`] that answers from a script and records every call. Commands without a
/// scripted response succeed with empty output.
#[derive(Default)]
pub(crate) struct MockToolRunner {
    missing: HashSet<Tool>,
    responses: Vec<(Tool, Vec<String>, ToolOutput)>,
    calls: Mutex<Vec<(Tool, Vec<String>)>>,
}

impl MockToolRunner {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Behave as if `tool` is not installed.
    pub(crate) fn missing(mut self, tool: Tool) -> Self {
        self.missing.insert(tool);
        self
    }

    /// Answer calls of `tool` whose arguments start with `prefix`. The first matching response
    /// wins.
    pub(crate) fn respond(mut self, tool: Tool, prefix: &[&str], output: ToolOutput) -> Self {
        self.responses.push((
            tool,
            prefix.iter().map(|s| s.to_string()).collect(),
            output,
        ));
        self
    }

    /// A runner where gcloud is logged in as `account`.
    pub(crate) fn logged_in(account: &str) -> Self {
        Self::new().respond(Tool::Gcloud, &["config", "get-value", "account"], ok(account))
    }

    pub(crate) fn calls(&self) -> Vec<(Tool, Vec<String>)> {
        self.calls.lock().unwrap().clone()
    }

    /// Whether `tool` was called with arguments starting with `prefix`.
    pub(crate) fn called(&self, tool: Tool, prefix: &[&str]) -> bool {
        self.calls()
            .iter()
            .any(|(called, args)| *called == tool && starts_with(args, prefix))
    }
}

#[async_trait::async_trait]
impl ToolRunner for MockToolRunner {
    async fn run(&self, tool: Tool, args: &[String]) -> Result<ToolOutput> {
        self.calls.lock().unwrap().push((tool, args.to_vec()));
        if self.missing.contains(&tool) {
            return Err(Error::ToolMissing {
                tool: tool.binary().to_string(),
            });
        }
        Ok(self
            .responses
            .iter()
            .find(|(t, prefix, _)| *t == tool && starts_with(args, prefix))
            .map(|(_, _, output)| output.clone())
            .unwrap_or_else(|| ok("")))
    }
}

fn starts_with<S: AsRef<str>>(args: &[String], prefix: &[S]) -> bool {
    args.len() >= prefix.len()
        && args
            .iter()
            .zip(prefix.iter())
            .all(|(arg, p)| arg == p.as_ref())
}

pub(crate) fn ok(stdout: &str) -> ToolOutput {
    ToolOutput {
        code: Some(0),
        stdout: stdout.to_string(),
        stderr: String::new(),
    }
}

pub(crate) fn fail(code: i32, stderr: &str) -> ToolOutput {
    ToolOutput {
        code: Some(code),
        stdout: String::new(),
        stderr: stderr.to_string(),
    }
}
