//! Ronda CLI binary.
//!
//! Provides a command-line interface for the Ronda quality screener.

mod cmd;
mod output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cmd::screen::CriteriaArgs;
use output::OutputFormat;

#[derive(Parser)]
#[command(name = "ronda")]
#[command(about = "Fundamental quality screener for listed equities", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file (defaults apply when it does not exist)
    #[arg(short, long, global = true, default_value = "ronda.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Screen the exchange universe and print the ranked results
    Screen {
        #[command(flatten)]
        criteria: CriteriaArgs,

        /// Maximum number of ranked results
        #[arg(short, long)]
        limit: Option<usize>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Score specific symbols, bypassing the screening filters
    Score {
        /// Ticker symbols
        #[arg(required = true, value_delimiter = ',')]
        symbols: Vec<String>,

        /// Output format
        #[arg(long, value_enum, default_value = "text")]
        format: OutputFormat,
    },

    /// Cache maintenance
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand, Clone, Copy)]
enum CacheAction {
    /// Show backend and entry count
    Stats,
    /// Delete expired entries
    Purge,
    /// Delete every entry
    Clear,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("ronda=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = ronda::RondaConfig::load(&cli.config)?;

    match cli.command {
        Commands::Screen {
            criteria,
            limit,
            format,
        } => cmd::screen::run(config, criteria, limit, format).await,
        Commands::Score { symbols, format } => cmd::score::run(config, &symbols, format).await,
        Commands::Cache { action } => cmd::cache::run(&config, action).await,
    }
}
