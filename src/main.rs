//! Wheelwright - Reproducible build-environment provisioner
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use wheelwright::cli::{Cli, Commands};
use wheelwright::config::ConfigManager;
use wheelwright::error::WheelwrightResult;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::FAILURE
        }
    }
}

async fn run() -> WheelwrightResult<()> {
    let cli = Cli::parse();

    // Initialize logging: 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("wheelwright=warn"),
        1 => EnvFilter::new("wheelwright=info"),
        _ => EnvFilter::new("wheelwright=debug"),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .init();

    // Load configuration
    let config_manager = if let Some(ref path) = cli.config {
        ConfigManager::with_path(path.clone())
    } else {
        ConfigManager::new()
    };
    let config = config_manager.load().await?;

    // Ensure state directories exist
    ConfigManager::ensure_state_dirs().await?;

    // Dispatch to command
    match cli.command {
        Commands::Provision(args) => wheelwright::cli::commands::provision(args, &config).await,
        Commands::Lint(args) => wheelwright::cli::commands::lint(args, &config).await,
        Commands::Test(args) => wheelwright::cli::commands::test(args, &config).await,
        Commands::Status => wheelwright::cli::commands::status(&config).await,
        Commands::Config(args) => wheelwright::cli::commands::config(args, &config).await,
        Commands::Cache(args) => wheelwright::cli::commands::cache(args, &config).await,
    }
}
