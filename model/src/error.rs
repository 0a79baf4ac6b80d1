use snafu::Snafu;
use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

/// The error type for the installer library.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    #[snafu(display("Unable to create client: {}", source))]
    ClientCreateKubeconfig {
        source: kube::config::KubeconfigError,
    },

    #[snafu(display(
        "Cluster '{}' does not meet the installation requirements: {}",
        name,
        reasons.join("; ")
    ))]
    ClusterRequirements { name: String, reasons: Vec<String> },

    #[snafu(display("Cluster '{}' already exists in zone '{}'", name, zone))]
    ClusterExists { name: String, zone: String },

    #[snafu(display("Cluster '{}' was not found in zone '{}'", name, zone))]
    ClusterNotFound { name: String, zone: String },

    #[snafu(display("Unable to read kubeconfig: {}", source))]
    ConfigRead {
        source: kube::config::KubeconfigError,
    },

    #[snafu(display("Error creating {}: {}", what, source))]
    Create { what: String, source: kube::Error },

    #[snafu(display("Unable to fetch '{}': {}", url, source))]
    Fetch { url: String, source: reqwest::Error },

    #[snafu(display("Unable to read file '{}': {}", path.display(), source))]
    File {
        path: PathBuf,
        source: std::io::Error,
    },

    #[snafu(display("Invalid {}: {}", what, reason))]
    Invalid { what: String, reason: String },

    #[snafu(display("Unable to parse {}: {}", what, source))]
    JsonParse {
        what: String,
        source: serde_json::Error,
    },

    #[snafu(display("Could not serialize object: {}", source))]
    JsonSerialize { source: serde_json::Error },

    #[snafu(display("Unable to {}: {}", action, source))]
    Kube { action: String, source: kube::Error },

    #[snafu(display(
        "No active gcloud account was found, run 'gcloud auth login' or pass an account explicitly"
    ))]
    MissingAccount,

    #[snafu(display("Preflight checks failed: {}", failures.join("; ")))]
    Preflight { failures: Vec<String> },

    #[snafu(display(
        "Rollout in namespace '{}' failed, pods in a failed state: {}",
        namespace,
        pods.join(", ")
    ))]
    RolloutFailed { namespace: String, pods: Vec<String> },

    #[snafu(display("Unable to {}: {}", action, source))]
    SerdeYaml {
        action: String,
        source: serde_yaml::Error,
    },

    #[snafu(display("Step '{}' failed: {}", step, source))]
    Step {
        step: String,
        #[snafu(source(from(Error, Box::new)))]
        source: Box<Error>,
    },

    #[snafu(display(
        "Timed out after {}s waiting for the rollout in namespace '{}'",
        seconds,
        namespace
    ))]
    Timeout { namespace: String, seconds: u64 },

    #[snafu(display(
        "'{}' failed with exit status '{}'\n\n{}\n\n{}",
        what,
        code.map(|c| c.to_string()).unwrap_or_else(|| "signal".to_string()),
        stdout,
        stderr
    ))]
    ToolFailed {
        what: String,
        code: Option<i32>,
        stdout: String,
        stderr: String,
    },

    #[snafu(display("'{}' was not found on the PATH", tool))]
    ToolMissing { tool: String },

    #[snafu(display("Unable to run '{}': {}", tool, source))]
    ToolSpawn {
        tool: String,
        source: std::io::Error,
    },

    #[snafu(display("Expected the '{}' CRD but the manifest defines '{}'", expected, found))]
    UnexpectedCrd { expected: String, found: String },
}
