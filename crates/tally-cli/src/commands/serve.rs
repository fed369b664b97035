//! Webhook server command

use anyhow::Result;

use tally_server::BotConfig;

pub async fn cmd_serve(host: &str, port: u16) -> Result<()> {
    let config = BotConfig::from_env()?;
    tally_server::serve(config, host, port).await
}
