//! Server configuration from environment variables
//!
//! Configuration is read once at startup and passed by reference. There are
//! no ambient singletons; tests build a `BotConfig` by hand.

use anyhow::{bail, Context, Result};

/// Default model endpoint (Groq's OpenAI-compatible API)
const DEFAULT_MODEL_HOST: &str = "https://api.groq.com/openai";

/// Default model name
const DEFAULT_MODEL_NAME: &str = "llama-3.3-70b-versatile";

/// Default per-expense amount ceiling
pub const DEFAULT_EXPENSE_CEILING: f64 = 10_000.0;

/// Default goal target amount ceiling
pub const DEFAULT_GOAL_CEILING: f64 = 1_000_000.0;

/// What to do with updates from users not on the allow list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RejectPolicy {
    /// Drop the update without responding (no information leak)
    #[default]
    Silent,
    /// Reply with the rejected numeric user id so an operator can add it
    ReplyWithId,
}

impl RejectPolicy {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "silent" => Some(RejectPolicy::Silent),
            "reply" => Some(RejectPolicy::ReplyWithId),
            _ => None,
        }
    }
}

/// Configuration for one bot process
#[derive(Debug, Clone)]
pub struct BotConfig {
    /// Telegram Bot API token
    pub bot_token: String,
    /// Public bot handle, used in the /share deep link
    pub bot_name: String,
    /// Spreadsheet id holding the Expenses and Goals tables
    pub sheet_id: String,
    /// OAuth bearer token for the spreadsheet API
    pub sheet_token: String,
    /// Numeric Telegram user ids allowed to use the bot.
    /// Empty list rejects everyone.
    pub allowed_users: Vec<i64>,
    pub reject_policy: RejectPolicy,
    /// Model endpoint base URL (OpenAI-compatible chat completions)
    pub model_host: String,
    pub model_name: String,
    pub model_api_key: Option<String>,
    /// Maximum accepted expense amount
    pub expense_ceiling: f64,
    /// Maximum accepted goal target amount
    pub goal_ceiling: f64,
}

impl BotConfig {
    /// Load configuration from the process environment.
    ///
    /// `TELEGRAM_BOT_TOKEN`, `SHEET_ID`, and `SHEET_TOKEN` are required;
    /// everything else has a default.
    pub fn from_env() -> Result<Self> {
        let bot_token = required("TELEGRAM_BOT_TOKEN")?;
        let sheet_id = required("SHEET_ID")?;
        let sheet_token = required("SHEET_TOKEN")?;

        let allowed_users = std::env::var("ALLOWED_USERS")
            .ok()
            .map(|raw| parse_allowed_users(&raw))
            .unwrap_or_default();

        let reject_policy = std::env::var("REJECT_POLICY")
            .ok()
            .and_then(|raw| {
                let parsed = RejectPolicy::parse(&raw);
                if parsed.is_none() {
                    tracing::warn!(value = %raw, "Unknown REJECT_POLICY, using silent");
                }
                parsed
            })
            .unwrap_or_default();

        Ok(Self {
            bot_token,
            bot_name: std::env::var("BOT_NAME").unwrap_or_else(|_| "tally_bot".to_string()),
            sheet_id,
            sheet_token,
            allowed_users,
            reject_policy,
            model_host: std::env::var("MODEL_HOST")
                .unwrap_or_else(|_| DEFAULT_MODEL_HOST.to_string()),
            model_name: std::env::var("MODEL_NAME")
                .unwrap_or_else(|_| DEFAULT_MODEL_NAME.to_string()),
            model_api_key: std::env::var("MODEL_API_KEY").ok().filter(|k| !k.is_empty()),
            expense_ceiling: env_f64("EXPENSE_CEILING", DEFAULT_EXPENSE_CEILING),
            goal_ceiling: env_f64("GOAL_CEILING", DEFAULT_GOAL_CEILING),
        })
    }

    pub fn is_allowed(&self, user_id: i64) -> bool {
        self.allowed_users.contains(&user_id)
    }
}

fn required(key: &str) -> Result<String> {
    let value = std::env::var(key).with_context(|| format!("{} is not set", key))?;
    if value.trim().is_empty() {
        bail!("{} is empty", key);
    }
    Ok(value)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// Parse the `ALLOWED_USERS` JSON array. A parse failure yields an empty
/// list, which rejects everyone rather than admitting anyone.
fn parse_allowed_users(raw: &str) -> Vec<i64> {
    match serde_json::from_str::<Vec<i64>>(raw) {
        Ok(ids) => ids,
        Err(e) => {
            tracing::warn!(error = %e, "Failed to parse ALLOWED_USERS, rejecting everyone");
            vec![]
        }
    }
}
