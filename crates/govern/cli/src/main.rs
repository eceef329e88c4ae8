//! governctl - governance treasury and proposal tooling
//!
//! - `run` executes a scenario file against a fresh in-memory deployment
//! - `config` prints the effective configuration
//! - `quote` computes the credit a deposit would yield

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use govern_runtime::{GovernanceConfig, LoggingConfig};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod output;

use output::OutputFormat;

/// governctl CLI
#[derive(Parser)]
#[command(name = "governctl")]
#[command(about = "Governance treasury and proposal tooling", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, env = "GOVERN_CONFIG")]
    config: Option<String>,

    /// Output format (table, json, yaml)
    #[arg(short, long, default_value = "table")]
    output: OutputFormat,

    /// Log level, overrides the configuration
    #[arg(long, env = "GOVERN_LOG_LEVEL")]
    log_level: Option<String>,

    /// Enable JSON logging
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Run a scenario file
    Run {
        /// Path to the scenario JSON document
        scenario: PathBuf,
    },

    /// Show configuration
    Config,

    /// Compute credit for a deposit at a quote
    Quote {
        /// Deposited quantity in base units
        quantity: u128,

        /// Oracle price
        #[arg(long)]
        price: u128,

        /// Oracle decimals
        #[arg(long, default_value_t = 18)]
        decimals: u8,
    },
}

fn init_tracing(logging: &LoggingConfig) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| logging.level.clone().into());

    let registry = tracing_subscriber::registry().with(env_filter);
    let result = if logging.json {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };
    if let Err(err) = result {
        eprintln!("tracing already initialized: {}", err);
    }
}

fn execute(cli: Cli) -> Result<()> {
    let mut config = GovernanceConfig::load(cli.config.as_deref())?;
    if let Some(level) = cli.log_level {
        config.logging.level = level;
    }
    config.logging.json |= cli.json;
    init_tracing(&config.logging);

    match cli.command {
        Commands::Run { scenario } => commands::run(&config, &scenario, cli.output),
        Commands::Config => commands::show_config(&config, cli.output),
        Commands::Quote {
            quantity,
            price,
            decimals,
        } => commands::quote(quantity, price, decimals, cli.output),
    }
}

fn main() -> ExitCode {
    match execute(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            output::print_error(&format!("{:#}", err));
            ExitCode::FAILURE
        }
    }
}
