//! # Participant
//!
//! ```text
//! participant <CONFIG_FILE> [--advertise-host HOST]
//! ```
//!
//! Reads commands from stdin until `exit` or end of input. Received
//! messages are printed as they arrive and appended to the log file.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use mc_02_participant::{ParticipantConfig, ParticipantSession, Reply, UserCommand};
use mc_telemetry::{init_logging, TelemetryConfig};

/// Multicast participant
#[derive(Parser, Debug)]
#[command(name = "participant")]
#[command(about = "Interactive participant for the multicast coordinator")]
struct Args {
    /// Configuration file (three-line legacy format or TOML)
    config: PathBuf,

    /// Host the coordinator should deliver to
    #[arg(long)]
    advertise_host: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut telemetry = TelemetryConfig::for_service("participant");
    if std::env::var_os("MC_LOG_LEVEL").is_none() && std::env::var_os("RUST_LOG").is_none() {
        // Keep the prompt readable unless asked otherwise.
        telemetry.log_level = "warn".to_string();
    }
    init_logging(&telemetry).context("Failed to initialize logging")?;

    let mut config = ParticipantConfig::load(&args.config)
        .with_context(|| format!("Failed to load config from {}", args.config.display()))?;
    if let Some(host) = args.advertise_host {
        config.advertise_host = host;
    }

    println!("Participant {} started", config.id);
    println!("Coordinator: {}", config.coordinator_addr());
    println!("{}", UserCommand::HELP);

    let (mut session, mut messages) = ParticipantSession::new(config);
    tokio::spawn(async move {
        while let Some(message) = messages.recv().await {
            println!("Received multicast: {}", message.log_entry());
        }
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read stdin")?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            // End of input behaves like `exit`.
            session.exit().await?;
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let result = match UserCommand::parse(&line) {
            Ok(command) => session.execute(command).await,
            Err(e) => Err(e),
        };
        match result {
            Ok(Reply::Exited) => {
                println!("{}", Reply::Exited);
                break;
            }
            Ok(reply) => println!("{reply}"),
            Err(e) => println!("Error: {e}"),
        }
    }

    Ok(())
}
