//! Event handlers
//!
//! One stateless dispatch per inbound event; all memory lives in the row
//! store and its snapshot caches. Every error is caught here, logged, and
//! turned into a user-facing message where a chat id is known. The webhook
//! response stays 200 either way so Telegram does not replay the update.

mod expenses;
mod goals;
mod summary;

use tracing::{debug, error, info};

use crate::config::RejectPolicy;
use crate::telegram::{InboundEvent, User};
use crate::AppState;

pub async fn handle_event(state: &AppState, event: InboundEvent) {
    let (chat_id, user) = match &event {
        InboundEvent::Command { chat_id, user, .. }
        | InboundEvent::Freeform { chat_id, user, .. }
        | InboundEvent::Photo { chat_id, user, .. }
        | InboundEvent::Callback { chat_id, user, .. } => (*chat_id, user.clone()),
        InboundEvent::Ignored => return,
    };

    if !state.config.is_allowed(user.id) {
        reject(state, chat_id, &user).await;
        return;
    }

    let result = match event {
        InboundEvent::Command {
            command, args, ..
        } => match command.as_str() {
            "start" | "help" => {
                state
                    .telegram
                    .send_message(chat_id, &help_text(&state.config.bot_name), &[])
                    .await;
                Ok(())
            }
            "share" => {
                state
                    .telegram
                    .send_message(chat_id, &share_text(&state.config.bot_name), &[])
                    .await;
                Ok(())
            }
            "summary" => summary::send_summary(state, chat_id).await,
            "undo" => expenses::undo(state, chat_id, &user).await,
            "newgoal" => goals::create(state, chat_id, &user, &args).await,
            "goals" => goals::list(state, chat_id).await,
            other => {
                debug!(command = other, "Ignoring unknown command");
                Ok(())
            }
        },
        InboundEvent::Freeform { text, .. } => {
            expenses::record(state, chat_id, &user, Some(text.as_str()), None).await
        }
        InboundEvent::Photo {
            file_id, caption, ..
        } => {
            expenses::record(state, chat_id, &user, caption.as_deref(), Some(file_id.as_str()))
                .await
        }
        InboundEvent::Callback {
            callback_id,
            message_id,
            token,
            ..
        } => summary::handle_callback(state, chat_id, message_id, &callback_id, &token).await,
        InboundEvent::Ignored => return,
    };

    if let Err(e) = result {
        error!(chat_id, user = %user.display_name(), error = %e, "Handler failed");
        state
            .telegram
            .send_message(
                chat_id,
                "⚠️ Something went wrong, please try again in a moment.",
                &[],
            )
            .await;
    }
}

async fn reject(state: &AppState, chat_id: i64, user: &User) {
    match state.config.reject_policy {
        RejectPolicy::Silent => {
            info!(user_id = user.id, "Dropped update from unauthorized user");
        }
        RejectPolicy::ReplyWithId => {
            info!(user_id = user.id, "Rejected unauthorized user with id reply");
            state
                .telegram
                .send_message(
                    chat_id,
                    &format!(
                        "🚫 You are not on the allow list. Your Telegram id is `{}`.",
                        user.id
                    ),
                    &[],
                )
                .await;
        }
    }
}

fn help_text(bot_name: &str) -> String {
    format!(
        "👋 I track shared expenses and goals.\n\n\
         Just tell me what you spent, like \"45 groceries at Rewe\" or\n\
         \"12,50 lunch\", or send a photo of a receipt.\n\n\
         *Commands*\n\
         /summary — spending overview with interactive views\n\
         /undo — delete your last expense\n\
         /newgoal <text> — add a goal, e.g. /newgoal save 500 for a bike\n\
         /goals — list open goals\n\
         /share — invite others to this bot\n\
         /help — this message\n\n\
         _{}_",
        bot_name
    )
}

fn share_text(bot_name: &str) -> String {
    format!(
        "📨 Share this bot: https://t.me/{}\n\
         New users also need their Telegram id added to the allow list.",
        bot_name
    )
}
