//! codebook - train, inspect and apply binary-vector codebooks.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{InfoCommand, QuantizeCommand, TrainCommand};

/// Binary-vector codebook tool.
///
/// Vector files hold one hex-encoded fingerprint vector per line
/// (LSB-first bytes). Blank lines and lines starting with '#' are skipped.
#[derive(Parser)]
#[command(name = "codebook")]
#[command(about = "Train, inspect and apply binary-vector codebooks")]
#[command(version)]
pub struct Cli {
    /// Output as JSON (for piping)
    #[arg(long, global = true)]
    pub json: bool,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train a codebook from a vector file
    Train(TrainCommand),
    /// Print statistics and duplicate centroids of a codebook
    Info(InfoCommand),
    /// Map vectors to their nearest words
    Quantize(QuantizeCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Train(cmd) => cmd.run(&cli),
        Commands::Info(cmd) => cmd.run(&cli),
        Commands::Quantize(cmd) => cmd.run(&cli),
    }
}
