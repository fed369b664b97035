//! CLI argument definitions using clap
//!
//! The actual command implementations live in the `commands` module.

use clap::{Parser, Subcommand};

/// Tally - chat-based expense and goal tracker
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Expense bot server and spreadsheet reporting tools", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Start the webhook server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },

    /// Render a spending summary to stdout
    Summary {
        /// View: overview, category, user, merchant, history
        #[arg(long, default_value = "overview")]
        view: String,

        /// Period: month, last, year, all
        #[arg(long, default_value = "month")]
        period: String,
    },

    /// List open goals
    Goals,

    /// Validate configuration and store reachability
    Check,
}
