//! Futures strategy automation CLI application.

mod cli;
mod strategy;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::path::Path;
use tracing::info;
use trading_config::AppConfig;
use trading_monitor::setup_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let loaded = match &cli.command {
        Commands::ValidateConfig => Some(AppConfig::default()),
        _ => cli::commands::load_if_present(&cli.config)?,
    };
    let missing = loaded.is_none();
    let config = loaded.unwrap_or_default();

    // Setup logging; the guard flushes the log file on exit
    let level = cli
        .log_level
        .map(|level| level.as_str())
        .unwrap_or(config.logging.level.as_str());
    let _guard = setup_logging(
        level,
        cli.json_logs || config.logging.is_json(),
        config.logging.file.as_deref().map(Path::new),
    );
    if missing {
        info!("Config file {:?} not found; using defaults", cli.config);
    }

    // Execute command
    match cli.command {
        Commands::Resolve(args) => cli::commands::resolve::run(args, &config).await,
        Commands::Paper(args) => cli::commands::paper::run(args, &config).await,
        Commands::ValidateConfig => cli::commands::validate::run(&cli.config).await,
    }
}
