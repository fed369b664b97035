//! Configuration and store validation command

use anyhow::Result;

use tally_core::{Error, RowStore, EXPENSES_TABLE, GOALS_TABLE};
use tally_server::BotConfig;

use super::open_store;

pub async fn cmd_check() -> Result<()> {
    let config = BotConfig::from_env()?;
    println!("Config OK");
    println!("  bot:           @{}", config.bot_name);
    println!("  sheet:         {}", config.sheet_id);
    println!("  model:         {} @ {}", config.model_name, config.model_host);
    println!("  allowed users: {}", config.allowed_users.len());
    println!("  reject policy: {:?}", config.reject_policy);
    if config.allowed_users.is_empty() {
        println!("  ⚠️ allow list is empty; every update will be rejected");
    }

    let store = open_store(&config);
    for table in [EXPENSES_TABLE, GOALS_TABLE] {
        match store.list_rows(table).await {
            Ok(rows) => println!("  {}: {} data row(s)", table, rows.len().saturating_sub(1)),
            Err(Error::TableNotFound(name)) => {
                println!("  {}: ⚠️ sheet '{}' not found", table, name)
            }
            Err(e) => return Err(e.into()),
        }
    }
    Ok(())
}
