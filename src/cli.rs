//! Command-line surface.

use std::path::PathBuf;

use clap::Parser;

/// Operate the energy market contracts from a node-managed account set.
#[derive(Debug, Clone, Parser)]
#[command(name = "energy-market-client", version, about)]
pub struct Cli {
    /// Operation mode: a command and its comma-separated arguments,
    /// e.g. `MINT,1,100`, `ADD_GROUP,0,1`, `PREPARE` or `SIM`.
    #[arg(short = 'o', long = "operation")]
    pub operation: String,

    /// TOML configuration file.
    #[arg(short = 'c', long = "config", default_value = "config.toml")]
    pub config: PathBuf,

    /// Append logs to this file instead of stdout.
    #[arg(short = 'l', long = "log-file")]
    pub log_file: Option<PathBuf>,
}
