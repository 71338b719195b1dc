//! k8s-net-test CLI
//!
//! Deploys the probe agents into a cluster, runs the service and direct
//! reachability checks through the ingress and removes the agents again.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use knt_client::output::{print_error, print_info, print_report, print_success, print_warning};
use knt_client::{Checker, Kubectl, Manifest, TestRun};
use knt_core::config::{self, ClientConfig};

#[derive(Parser)]
#[command(name = "k8s-net-test")]
#[command(author, version, about = "Kubernetes network reachability tester")]
struct Cli {
    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Path to the kubeconfig file
    #[arg(long, env = "KUBECONFIG")]
    kubeconfig: Option<PathBuf>,

    /// kubectl command (may include arguments, e.g. "minikube kubectl --")
    #[arg(long)]
    kubectl: Option<String>,

    /// Agent manifest: Deployment, Service and optional Ingress
    #[arg(short, long)]
    manifest: Option<PathBuf>,

    /// Namespace to deploy the agents into
    #[arg(short, long)]
    namespace: Option<String>,

    /// Number of agent replicas
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(1..))]
    replicas: Option<u32>,

    /// Base URL the agents are reachable on
    #[arg(long)]
    ingress_url: Option<String>,

    /// Service probes per replica
    #[arg(long)]
    probes_per_replica: Option<u32>,

    /// Check request timeout in milliseconds
    #[arg(long)]
    request_timeout_ms: Option<u64>,

    /// Give up waiting for the agents after this many seconds
    #[arg(long)]
    readiness_timeout_secs: Option<u64>,

    /// Enable verbose output
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long)]
    quiet: bool,
}

impl Cli {
    /// Apply command-line overrides on top of the loaded configuration
    fn apply(self, config: &mut ClientConfig) {
        if let Some(path) = self.kubeconfig {
            config.kubeconfig = Some(path);
        }
        if let Some(kubectl) = self.kubectl {
            config.kubectl = kubectl;
        }
        if let Some(manifest) = self.manifest {
            config.manifest = manifest;
        }
        if let Some(namespace) = self.namespace {
            config.namespace = namespace;
        }
        if let Some(replicas) = self.replicas {
            config.replicas = replicas;
        }
        if let Some(url) = self.ingress_url {
            config.ingress_url = url;
        }
        if let Some(probes) = self.probes_per_replica {
            config.probes_per_replica = probes;
        }
        if let Some(ms) = self.request_timeout_ms {
            config.request_timeout = Duration::from_millis(ms);
        }
        if let Some(secs) = self.readiness_timeout_secs {
            config.readiness_timeout = Some(Duration::from_secs(secs));
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    let log_level = match (cli.quiet, cli.verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    let mut config: ClientConfig = config::load_or_default(cli.config.as_deref())
        .context("Failed to load configuration")?;
    cli.apply(&mut config);
    config.validate()?;

    let mut manifest = Manifest::load(&config.manifest)?;
    manifest.set_replicas(config.replicas);
    if manifest.ingress().is_none() {
        print_warning("Manifest has no Ingress; the agents must already be reachable on the ingress URL");
    }

    let kubectl = Kubectl::from_config(&config);
    let checker = Checker::new(&config.ingress_url, config.request_timeout)
        .context("Failed to build HTTP client")?;

    let cancel = CancellationToken::new();

    // Interrupts skip ahead to teardown
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Received Ctrl+C, tearing down...");
            cancel_clone.cancel();
        }
    });

    print_info(&format!(
        "Deploying {} agents from {:?} into namespace {}",
        config.replicas, config.manifest, config.namespace
    ));

    let run = TestRun::new(&kubectl, &kubectl, &checker, &config);
    let report = match run.execute(&manifest, &cancel).await {
        Ok(report) => report,
        Err(e) => {
            print_error(&format!("Test run failed: {:#}", e));
            return Err(e);
        }
    };

    print_report(&report);
    if !report.passed() {
        anyhow::bail!("Network checks reported failures");
    }

    print_success("All network checks passed");
    Ok(())
}
