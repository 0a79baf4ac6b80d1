/*!

This is the command line interface for installing Kubeflow Pipelines on Google Kubernetes Engine.

!*/

mod args;
mod cluster;
mod crd;
mod install;
mod parameters;
mod preflight;
mod proxy_url;
mod rbac;
mod status;
mod uninstall;
mod verify;

use anyhow::Result;
use clap::Parser;
use env_logger::Builder;
use kfp_install_model::{KubeClusterApi, SystemToolRunner};
use log::LevelFilter;
use std::path::PathBuf;

/// The command line interface for installing Kubeflow Pipelines on a GKE cluster.
#[derive(Debug, Parser)]
#[clap(author, version, about)]
struct Args {
    /// Set logging verbosity [trace|debug|info|warn|error]. If the environment variable `RUST_LOG`
    /// is present, it overrides the default logging behavior. See https://docs.rs/env_logger/latest
    #[clap(long = "log-level", default_value = "info")]
    log_level: LevelFilter,
    /// Path to the kubeconfig file. Also can be passed with the KUBECONFIG environment variable.
    #[clap(long = "kubeconfig")]
    kubeconfig: Option<PathBuf>,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Parser)]
enum Command {
    /// Check that gcloud, kubectl, docker and mpdev are ready.
    Preflight(preflight::Preflight),
    /// Create, delete or connect to a GKE cluster.
    Cluster(cluster::Cluster),
    /// Install the Kubernetes Application CRD.
    Crd(crd::Crd),
    /// Grant your account cluster-admin.
    Rbac(rbac::Rbac),
    /// Print the parameters passed to the deployer.
    Parameters(parameters::Parameters),
    /// Install Kubeflow Pipelines.
    Install(install::Install),
    /// Show the pods of an installation.
    Status(status::Status),
    /// Print the URL of the Pipelines UI.
    ProxyUrl(proxy_url::ProxyUrl),
    /// Delete an installation.
    Uninstall(uninstall::Uninstall),
    /// Run the deployer's verification tests in a scratch namespace.
    Verify(verify::Verify),
}

#[tokio::main]
async fn main() {
    let args = Args::parse();
    init_logger(args.log_level);
    if let Err(e) = run(args).await {
        eprintln!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    // Tools use the same kubeconfig as the client so that fetched credentials are picked up.
    let runner = SystemToolRunner::new(args.kubeconfig.clone());
    // The client connects on first use, after any credentials have been fetched.
    let client = KubeClusterApi::new(args.kubeconfig);
    match args.command {
        Command::Preflight(preflight) => preflight.run(&runner).await,
        Command::Cluster(cluster) => cluster.run(&runner).await,
        Command::Crd(crd) => crd.run(&client).await,
        Command::Rbac(rbac) => rbac.run(&runner, &client).await,
        Command::Parameters(parameters) => parameters.run(),
        Command::Install(install) => install.run(runner, client).await,
        Command::Status(status) => status.run(&client).await,
        Command::ProxyUrl(proxy_url) => proxy_url.run(&client).await,
        Command::Uninstall(uninstall) => uninstall.run(&client).await,
        Command::Verify(verify) => verify.run(&runner).await,
    }
}

/// Initialize the logger with the value passed by `--log-level` (or its default) when the
/// `RUST_LOG` environment variable is not present. If present, the `RUST_LOG` environment variable
/// overrides `--log-level`/`level`.
fn init_logger(level: LevelFilter) {
    match std::env::var(env_logger::DEFAULT_FILTER_ENV).ok() {
        Some(_) => {
            // RUST_LOG exists; env_logger will use it.
            Builder::from_default_env().init();
        }
        None => {
            // RUST_LOG does not exist; use default log level for the installer crates only.
            Builder::new()
                .filter(Some(env!("CARGO_CRATE_NAME")), level)
                .filter(Some("kfp_install_model"), level)
                .init();
        }
    }
}
