//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `serve` - Webhook server command
//! - `reports` - One-shot summary rendering
//! - `goals` - Goal listing
//! - `check` - Configuration and store validation

pub mod check;
pub mod goals;
pub mod reports;
pub mod serve;

// Re-export command functions for main.rs
pub use check::*;
pub use goals::*;
pub use reports::*;
pub use serve::*;

use tally_core::StoreClient;
use tally_server::BotConfig;

/// Build the configured sheet-backed store
pub fn open_store(config: &BotConfig) -> StoreClient {
    StoreClient::sheets(&config.sheet_id, &config.sheet_token)
}
