//! k8s-net-test Probe Agent
//!
//! Runs inside the cluster under test, answers `/ping` for its peers and
//! executes service and direct reachability checks on request.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use knt_core::config::{self, PingerConfig};
use knt_pinger::server::PingerServer;
use knt_pinger::{HostInfo, PingerState};

#[derive(Parser)]
#[command(name = "pinger")]
#[command(about = "k8s-net-test probe agent - probes services and peer pods on request")]
#[command(version)]
struct Args {
    /// Listen port
    #[arg(short, long, env = "PINGER_PORT", value_parser = clap::value_parser!(u16).range(1..))]
    port: Option<u16>,

    /// Address to bind to
    #[arg(long)]
    listen_address: Option<String>,

    /// Maximum number of concurrent probes per check
    #[arg(long)]
    pool_bound: Option<usize>,

    /// Per-probe timeout in milliseconds
    #[arg(long)]
    probe_timeout_ms: Option<u64>,

    /// Port peers are probed on (defaults to the listen port)
    #[arg(long)]
    probe_port: Option<u16>,

    /// Path to configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Log every failed probe
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = if args.verbose {
        "debug"
    } else {
        &args.log_level
    };
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| log_level.into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("k8s-net-test pinger starting...");

    // Load configuration
    let mut config: PingerConfig = config::load_or_default(args.config.as_deref())
        .context("Failed to load configuration")?;

    // Apply command-line overrides
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(address) = args.listen_address {
        config.listen_address = address;
    }
    if let Some(bound) = args.pool_bound {
        config.pool_bound = bound;
    }
    if let Some(timeout) = args.probe_timeout_ms {
        config.probe_timeout = std::time::Duration::from_millis(timeout);
    }
    if let Some(port) = args.probe_port {
        config.probe_port = Some(port);
    }
    config.validate()?;

    let host = HostInfo::discover().context("Failed to discover host identity")?;
    let bind_addr = config.bind_address();

    tracing::info!(
        "Pool bound {}, probe timeout {:?}, peer port {}",
        config.pool_bound,
        config.probe_timeout,
        config.peer_port()
    );

    let state = Arc::new(PingerState::new(config, host).context("Failed to build probe client")?);

    let cancel = CancellationToken::new();

    // Setup signal handlers
    let cancel_clone = cancel.clone();
    tokio::spawn(async move {
        let ctrl_c = tokio::signal::ctrl_c();

        #[cfg(unix)]
        let terminate = async {
            match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
                Ok(mut signal) => {
                    signal.recv().await;
                }
                Err(e) => {
                    tracing::warn!("Cannot install SIGTERM handler: {}", e);
                    std::future::pending::<()>().await;
                }
            }
        };

        #[cfg(not(unix))]
        let terminate = std::future::pending::<()>();

        tokio::select! {
            _ = ctrl_c => {
                tracing::info!("Received Ctrl+C, initiating shutdown...");
            }
            _ = terminate => {
                tracing::info!("Received SIGTERM, initiating shutdown...");
            }
        }

        cancel_clone.cancel();
    });

    let server = PingerServer::new(state, cancel);
    server.run(&bind_addr).await?;

    tracing::info!("Pinger shutdown complete");
    Ok(())
}
