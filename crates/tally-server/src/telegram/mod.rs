//! Telegram wire types and outbound API client

mod api;
mod types;

pub use api::{rows_from_buttons, ButtonRow, TelegramApi};
pub use types::{CallbackQuery, Chat, InboundEvent, Message, PhotoSize, Update, User};
