//! One-shot summary rendering against the configured sheet

use anyhow::{bail, Result};
use chrono::Utc;

use tally_core::{normalize, summarize, Period, RowStore, ViewKind, EXPENSES_TABLE};
use tally_server::BotConfig;

use super::open_store;

pub async fn cmd_summary(view: &str, period: &str) -> Result<()> {
    let view = parse_view(view)?;
    let period = parse_period(period)?;

    let config = BotConfig::from_env()?;
    let store = open_store(&config);
    let rows = store.list_rows(EXPENSES_TABLE).await?;
    let table = normalize(&rows)?;

    let rendered = summarize(&table, view, period, Utc::now().date_naive());
    println!("{}", rendered.text);
    Ok(())
}

fn parse_view(value: &str) -> Result<ViewKind> {
    Ok(match value.to_lowercase().as_str() {
        "overview" => ViewKind::Overview,
        "category" | "categories" => ViewKind::Category,
        "user" | "users" => ViewKind::User,
        "merchant" | "merchants" => ViewKind::Merchant,
        "history" => ViewKind::History,
        other => bail!(
            "Unknown view '{}' (expected overview, category, user, merchant, or history)",
            other
        ),
    })
}

fn parse_period(value: &str) -> Result<Period> {
    Ok(match value.to_lowercase().as_str() {
        "month" | "current" => Period::CurrentMonth,
        "last" | "last-month" => Period::LastMonth,
        "year" => Period::Year,
        "all" => Period::All,
        other => bail!(
            "Unknown period '{}' (expected month, last, year, or all)",
            other
        ),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_view() {
        assert_eq!(parse_view("Merchants").unwrap(), ViewKind::Merchant);
        assert!(parse_view("pie-chart").is_err());
    }

    #[test]
    fn test_parse_period() {
        assert_eq!(parse_period("last-month").unwrap(), Period::LastMonth);
        assert!(parse_period("fortnight").is_err());
    }
}
