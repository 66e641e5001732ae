//! Gauntlet CLI - Benchmark runner for OpenAI-compatible generation endpoints.
//!
//! Gauntlet executes a catalog of test cases against a configured endpoint,
//! retrying transient failures and persisting one JSON record per case
//! (plus extracted HTML or image payloads) for the results website.
//!
//! # Usage
//!
//! ```bash
//! # Run every catalog against the configured endpoint
//! gauntlet run --cases ./cases
//!
//! # Text cases only, results to a custom directory
//! gauntlet run --cases ./cases --modality text --output ./results
//!
//! # View configuration
//! gauntlet config show
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Gauntlet - Benchmark runner for OpenAI-compatible generation endpoints.
#[derive(Parser, Debug)]
#[command(name = "gauntlet")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Execute test case catalogs and persist results
    Run(cli::run::RunArgs),

    /// View and manage configuration
    Config(cli::config::ConfigArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging from config, with CLI verbose override.
    // Note: logging isn't initialized yet, so use eprintln for config warnings.
    let config = match gauntlet_core::Config::load() {
        Ok(config) => config,
        Err(e) => {
            eprintln!(
                "Warning: Failed to load config: {e}\n  \
                 Using default configuration. Check your config file with `gauntlet config path`."
            );
            gauntlet_core::Config::default()
        }
    };
    logging::init(&config.logging, cli.verbose, cli.json_logs);

    tracing::debug!("Gauntlet v{}", gauntlet_core::VERSION);

    // Dispatch to the appropriate command handler
    match cli.command {
        Commands::Run(args) => cli::run::execute(args).await,
        Commands::Config(args) => cli::config::execute(args).await,
    }
}
