//! Tally CLI - expense bot server and reporting tools
//!
//! Usage:
//!   tally serve --port 3000          Start the webhook server
//!   tally summary --view category    Print a spending summary
//!   tally goals                      List open goals
//!   tally check                      Validate config and store access

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging
    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Serve { port, host } => commands::cmd_serve(&host, port).await,
        Commands::Summary { view, period } => commands::cmd_summary(&view, &period).await,
        Commands::Goals => commands::cmd_goals().await,
        Commands::Check => commands::cmd_check().await,
    }
}
