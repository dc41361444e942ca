//! # Multicast Coordinator
//!
//! ```text
//! coordinator [CONFIG_FILE] [--port N] [--persistence-secs N]
//! ```
//!
//! 1. Load configuration (defaults, file, `MC_*` env, then CLI flags)
//! 2. Initialize logging and metrics
//! 3. Start the runtime and wait for Ctrl+C

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use coordinator_runtime::{CoordinatorRuntime, NodeConfig};
use mc_telemetry::{init_telemetry, TelemetryConfig};

/// Multicast coordinator
#[derive(Parser, Debug)]
#[command(name = "coordinator")]
#[command(about = "Publish/subscribe coordinator with time-windowed replay")]
struct Args {
    /// Configuration file (two-line legacy format or TOML)
    config: Option<PathBuf>,

    /// Listener port, overrides file and environment
    #[arg(short, long)]
    port: Option<u16>,

    /// Persistence time in seconds, overrides file and environment
    #[arg(long)]
    persistence_secs: Option<u64>,
}

fn load_config(args: &Args) -> Result<NodeConfig> {
    let mut config = match &args.config {
        Some(path) => NodeConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => NodeConfig::default(),
    };
    config
        .apply_env()
        .context("Invalid MC_* environment override")?;

    if let Some(port) = args.port {
        config.listener.port = port;
    }
    if let Some(secs) = args.persistence_secs {
        config.retention.persistence_time_secs = secs;
    }

    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = load_config(&args)?;

    let _telemetry = init_telemetry(TelemetryConfig::for_service("coordinator"))
        .context("Failed to initialize telemetry")?;

    let mut runtime = CoordinatorRuntime::new(config);
    let addr = runtime.start().await?;

    info!(%addr, "Coordinator is running. Press Ctrl+C to stop.");
    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    runtime.shutdown().await;
    Ok(())
}
