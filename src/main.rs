//! Energy Market Client - Entry Point
//!
//! Wiring sequence:
//! 1. Parse CLI (operation mode, config path, optional log file)
//! 2. Load config + validate
//! 3. Init tracing (JSON structured logging)
//! 4. Parse the operation mode (usage errors before any RPC)
//! 5. Connect to the node and build the alloy gateway
//! 6. Resolve actors, bind NGT + GroupsManager from their artifacts
//! 7. Spawn the SIGINT listener (forwards every interrupt)
//! 8. Dispatch the command, interruptible, and map its outcome to the exit code

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;

use std::fs::OpenOptions;
use std::path::Path;
use std::process::ExitCode;
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::mpsc;
use tracing::{error, info, warn};
use tracing_subscriber::fmt::writer::BoxMakeWriter;

use energy_market_client::ClientError;
use energy_market_client::adapters::chain::{AlloyGateway, ChainProvider};
use energy_market_client::cli::Cli;
use energy_market_client::config::{self, AppConfig};
use energy_market_client::ports::clock::SystemClock;
use energy_market_client::usecases::{Command, CommandDispatcher, CommandOutcome};

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // ── 1. Load configuration ───────────────────────────────
    let config = config::loader::load_config(&cli.config);

    // ── 2. Initialize structured JSON logging ───────────────
    let log_level = config
        .as_ref()
        .map_or("info", |c| c.client.log_level.as_str());
    if let Err(e) = init_tracing(log_level, cli.log_file.as_deref()) {
        eprintln!("Failed to initialize logging: {e:#}");
        return ExitCode::from(1);
    }

    let result = match config {
        Ok(config) => run(&cli, config).await,
        Err(e) => Err(e),
    };

    match result {
        Ok(outcome) => {
            info!(outcome = ?outcome, "Done");
            ExitCode::from(outcome.exit_code())
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "Client failed");
            ExitCode::from(exit_code_of(&e))
        }
    }
}

async fn run(cli: &Cli, config: AppConfig) -> Result<CommandOutcome> {
    info!(
        name = %config.client.name,
        version = env!("CARGO_PKG_VERSION"),
        operation = %cli.operation,
        "Starting energy market client"
    );
    config.log_loaded(&cli.config);

    // ── 3. Parse the operation mode ─────────────────────────
    let command = Command::parse(&cli.operation)?;

    // ── 4. Connect to the node ──────────────────────────────
    let provider = ChainProvider::connect(&config.provider)
        .await
        .context("Failed to connect to node")?;
    let gateway = Arc::new(AlloyGateway::new(&provider, config.provider.poll_interval()));

    // ── 5. Resolve actors and bind contracts ────────────────
    let dispatcher = CommandDispatcher::from_config(gateway, config, SystemClock).await?;

    // ── 6. Interrupt signal ─────────────────────────────────
    let (interrupt_tx, interrupt_rx) = mpsc::channel::<()>(2);
    let signal_handle = tokio::spawn(async move {
        loop {
            if let Err(e) = signal::ctrl_c().await {
                warn!(error = %e, "Unable to listen for SIGINT");
                break;
            }
            info!("SIGINT received");
            if interrupt_tx.send(()).await.is_err() {
                break;
            }
        }
    });

    // ── 7. Dispatch ─────────────────────────────────────────
    let outcome = dispatcher.dispatch_interruptible(command, interrupt_rx).await;
    signal_handle.abort();

    Ok(outcome?)
}

fn init_tracing(log_level: &str, log_file: Option<&Path>) -> Result<()> {
    let writer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            BoxMakeWriter::new(Mutex::new(file))
        }
        None => BoxMakeWriter::new(std::io::stdout),
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(writer)
        .json()
        .try_init()
        .map_err(|e| anyhow::anyhow!("{e}"))
}

/// Exit code for a failure: the error class when known, 1 otherwise.
fn exit_code_of(error: &anyhow::Error) -> u8 {
    error
        .downcast_ref::<ClientError>()
        .map_or(1, ClientError::exit_code)
}
