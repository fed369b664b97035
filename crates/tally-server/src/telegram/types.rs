//! Telegram Bot API wire types
//!
//! Only the fields this bot reads are modeled; serde ignores the rest of the
//! payload. An incoming `Update` is decoded exactly once at the webhook
//! boundary into an [`InboundEvent`], so downstream code never touches raw
//! JSON.

use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub callback_query: Option<CallbackQuery>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
    pub caption: Option<String>,
    pub photo: Option<Vec<PhotoSize>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl User {
    /// Display name used as the owner column in expense rows
    pub fn display_name(&self) -> String {
        match &self.last_name {
            Some(last) => format!("{} {}", self.first_name, last),
            None => self.first_name.clone(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CallbackQuery {
    pub id: String,
    pub from: User,
    pub message: Option<Message>,
    pub data: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PhotoSize {
    pub file_id: String,
    pub width: i64,
    pub height: i64,
}

/// The closed set of things an update can mean to this bot
#[derive(Debug, Clone)]
pub enum InboundEvent {
    /// Slash command with its argument remainder
    Command {
        chat_id: i64,
        user: User,
        command: String,
        args: String,
    },
    /// Plain text, treated as an expense description
    Freeform {
        chat_id: i64,
        user: User,
        text: String,
    },
    /// Photo message, treated as a receipt
    Photo {
        chat_id: i64,
        user: User,
        file_id: String,
        caption: Option<String>,
    },
    /// Inline button click carrying an intent token
    Callback {
        callback_id: String,
        chat_id: i64,
        message_id: i64,
        user: User,
        token: String,
    },
    /// Anything else (edits, joins, stickers, messages without a sender)
    Ignored,
}

impl InboundEvent {
    pub fn decode(update: &Update) -> Self {
        if let Some(cq) = &update.callback_query {
            let (chat_id, message_id) = match &cq.message {
                Some(m) => (m.chat.id, m.message_id),
                None => return InboundEvent::Ignored,
            };
            let token = match &cq.data {
                Some(d) => d.clone(),
                None => return InboundEvent::Ignored,
            };
            return InboundEvent::Callback {
                callback_id: cq.id.clone(),
                chat_id,
                message_id,
                user: cq.from.clone(),
                token,
            };
        }

        let Some(msg) = &update.message else {
            return InboundEvent::Ignored;
        };
        let Some(user) = &msg.from else {
            return InboundEvent::Ignored;
        };
        let chat_id = msg.chat.id;

        if let Some(photos) = &msg.photo {
            // Sizes are ordered smallest to largest; take the largest
            if let Some(best) = photos.last() {
                return InboundEvent::Photo {
                    chat_id,
                    user: user.clone(),
                    file_id: best.file_id.clone(),
                    caption: msg.caption.clone(),
                };
            }
        }

        let Some(text) = msg.text.as_deref().map(str::trim).filter(|t| !t.is_empty())
        else {
            return InboundEvent::Ignored;
        };

        if let Some(rest) = text.strip_prefix('/') {
            let (word, args) = match rest.split_once(char::is_whitespace) {
                Some((w, a)) => (w, a.trim().to_string()),
                None => (rest, String::new()),
            };
            // "/summary@my_bot" addresses this bot in a group chat
            let command = word.split('@').next().unwrap_or(word).to_lowercase();
            return InboundEvent::Command {
                chat_id,
                user: user.clone(),
                command,
                args,
            };
        }

        InboundEvent::Freeform {
            chat_id,
            user: user.clone(),
            text: text.to_string(),
        }
    }
}
