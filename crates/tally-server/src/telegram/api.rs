//! Outbound Telegram Bot API client
//!
//! Send failures are logged and swallowed: a dropped confirmation message
//! must never fail the webhook invocation, because Telegram would retry the
//! whole update and the side effects would run twice.

use std::time::Duration;

use serde::Serialize;
use serde_json::json;
use tracing::{debug, warn};

use tally_core::Button;

/// Telegram API calls time out after this long
const API_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Serialize)]
struct InlineKeyboardButton {
    text: String,
    callback_data: String,
}

#[derive(Serialize)]
struct InlineKeyboardMarkup {
    inline_keyboard: Vec<Vec<InlineKeyboardButton>>,
}

/// One row of labeled intent tokens, rendered as inline buttons
pub type ButtonRow = Vec<(String, String)>;

#[derive(Clone)]
pub struct TelegramApi {
    client: reqwest::Client,
    /// `https://api.telegram.org/bot<token>`
    base: String,
    /// `https://api.telegram.org/file/bot<token>`
    file_base: String,
}

impl TelegramApi {
    pub fn new(token: &str) -> Self {
        Self::with_base("https://api.telegram.org", token)
    }

    /// Point the client at a different API origin (used by tests)
    pub fn with_base(origin: &str, token: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(API_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            client,
            base: format!("{}/bot{}", origin.trim_end_matches('/'), token),
            file_base: format!("{}/file/bot{}", origin.trim_end_matches('/'), token),
        }
    }

    /// Send a Markdown message, optionally with an inline keyboard.
    pub async fn send_message(&self, chat_id: i64, text: &str, buttons: &[ButtonRow]) {
        let mut body = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown",
        });
        if !buttons.is_empty() {
            body["reply_markup"] = serde_json::to_value(markup(buttons)).unwrap_or_default();
        }
        self.call("sendMessage", body).await;
    }

    /// Replace the text and keyboard of an existing message in place.
    /// Used by callback navigation so the summary redraws instead of
    /// stacking new messages.
    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        buttons: &[ButtonRow],
    ) {
        let mut body = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
            "parse_mode": "Markdown",
        });
        if !buttons.is_empty() {
            body["reply_markup"] = serde_json::to_value(markup(buttons)).unwrap_or_default();
        }
        self.call("editMessageText", body).await;
    }

    /// Acknowledge a button click so the client stops its spinner.
    pub async fn answer_callback_query(&self, callback_id: &str, text: Option<&str>) {
        let mut body = json!({ "callback_query_id": callback_id });
        if let Some(t) = text {
            body["text"] = json!(t);
        }
        self.call("answerCallbackQuery", body).await;
    }

    /// Resolve a file id and download its bytes. Returns `None` on any
    /// failure; the caller degrades to a user-facing error message.
    pub async fn download_file(&self, file_id: &str) -> Option<Vec<u8>> {
        let resp = self
            .client
            .post(format!("{}/getFile", self.base))
            .json(&json!({ "file_id": file_id }))
            .send()
            .await
            .ok()?;
        let value: serde_json::Value = resp.json().await.ok()?;
        let path = value.get("result")?.get("file_path")?.as_str()?;

        let bytes = self
            .client
            .get(format!("{}/{}", self.file_base, path))
            .send()
            .await
            .ok()?
            .bytes()
            .await
            .ok()?;
        debug!(file_id, size = bytes.len(), "Downloaded Telegram file");
        Some(bytes.to_vec())
    }

    async fn call(&self, method: &str, body: serde_json::Value) {
        let url = format!("{}/{}", self.base, method);
        match self.client.post(&url).json(&body).send().await {
            Ok(resp) if resp.status().is_success() => {}
            Ok(resp) => {
                let status = resp.status();
                let text = resp.text().await.unwrap_or_default();
                warn!(method, %status, response = %text, "Telegram API call rejected");
            }
            Err(e) => {
                warn!(method, error = %e, "Telegram API call failed");
            }
        }
    }
}

fn markup(rows: &[ButtonRow]) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup {
        inline_keyboard: rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|(label, token)| InlineKeyboardButton {
                        text: label.clone(),
                        callback_data: token.clone(),
                    })
                    .collect()
            })
            .collect(),
    }
}

/// Convert analytics buttons (one per row) into keyboard rows.
pub fn rows_from_buttons(buttons: &[Button]) -> Vec<ButtonRow> {
    buttons
        .iter()
        .map(|b| vec![(b.label.clone(), b.intent.encode())])
        .collect()
}
