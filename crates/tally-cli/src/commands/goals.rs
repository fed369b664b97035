//! Goal listing command

use anyhow::Result;

use tally_core::goals::{pending_goals, setup_instructions};
use tally_core::{Error, RowStore, GOALS_TABLE};
use tally_server::BotConfig;

use super::open_store;

pub async fn cmd_goals() -> Result<()> {
    let config = BotConfig::from_env()?;
    let store = open_store(&config);

    let rows = match store.list_rows(GOALS_TABLE).await {
        Ok(rows) => rows,
        Err(Error::TableNotFound(_)) => {
            println!("{}", setup_instructions());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let open = pending_goals(&rows);
    if open.is_empty() {
        println!("No open goals.");
        return Ok(());
    }

    println!("Open goals ({}):", open.len());
    for goal in open {
        let mut line = format!("  [{}] {}", goal.id, goal.name);
        if goal.target_amount > 0.0 {
            line.push_str(&format!(" — €{:.2}", goal.target_amount));
        }
        if let Some(date) = goal.target_date {
            line.push_str(&format!(" by {}", date));
        }
        line.push_str(&format!(" (by {})", goal.creator));
        println!("{}", line);
    }
    Ok(())
}
