//! Lotdraw CLI - operator tooling for the lot lottery
//!
//! - Inspect the draw schedule derived from the quota configuration
//! - Look up the next draw for a committed-result count
//! - Run a whole simulated lottery with live channel output

use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;
mod error;
mod fixtures;
mod output;

use crate::commands::{next, schedule, simulate};
use crate::config::LotdrawConfig;
use crate::error::CliResult;

/// Lotdraw CLI
#[derive(Parser)]
#[command(name = "lotdraw")]
#[command(about = "Lotdraw - lot lottery result orchestration", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "LOTDRAW_CONFIG")]
    config: Option<String>,

    /// Log level (overrides the configuration file)
    #[arg(long, env = "LOTDRAW_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long, env = "LOTDRAW_LOG_JSON")]
    log_json: bool,

    /// Output format (table, json)
    #[arg(short, long, default_value = "table")]
    output: output::OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Print the flattened draw schedule
    Schedule,

    /// Show the draw that follows a number of committed results
    Next {
        /// Results committed so far
        #[arg(long, default_value_t = 0)]
        committed: u64,
    },

    /// Run a simulated lottery against in-memory storage
    Simulate(simulate::SimulateArgs),

    /// Show the effective configuration
    Config,
}

fn init_tracing(level: &str, json: bool) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| level.into());

    // Logs go to stderr so that stdout stays machine-readable.
    if json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        output::print_error(&e.to_string());
        std::process::exit(1);
    }
}

async fn run() -> CliResult<()> {
    let cli = Cli::parse();

    let mut config = LotdrawConfig::load(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.log_json;
    init_tracing(&config.logging.level, config.logging.json);

    let quota = Arc::new(config.to_quota_schedule()?);
    tracing::debug!(
        groups = quota.groups().count(),
        slots = quota.total_slots(),
        "Quota schedule loaded"
    );

    match cli.command {
        Commands::Schedule => schedule::execute(quota, cli.output),
        Commands::Next { committed } => next::execute(quota, committed, cli.output),
        Commands::Simulate(args) => simulate::execute(args, &config, quota, cli.output).await,
        Commands::Config => output::print_single(&config),
    }
}
