//! Goal creation, listing, and completion

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use tally_core::goals::{new_goal, pending_goals, render_goal_list, setup_instructions};
use tally_core::{
    complete_goal, CompleteOutcome, Error, ModelBackend, RowStore, GOALS_TABLE,
};

use crate::telegram::{rows_from_buttons, User};
use crate::AppState;

pub async fn create(state: &AppState, chat_id: i64, user: &User, args: &str) -> Result<()> {
    if args.trim().is_empty() {
        state
            .telegram
            .send_message(
                chat_id,
                "Tell me the goal too, e.g. /newgoal save 500 for a summer trip",
                &[],
            )
            .await;
        return Ok(());
    }

    let now = Utc::now().naive_utc();
    let extracted = match state.model.extract_goal(args, now.date()).await {
        Ok(g) => g,
        Err(Error::Model(reason)) => {
            warn!(reason = %reason, "Goal extraction failed");
            state
                .telegram
                .send_message(chat_id, "🤷 I couldn't read that as a goal, try rephrasing it.", &[])
                .await;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let goal = match new_goal(extracted, &user.display_name(), now, state.config.goal_ceiling) {
        Ok(g) => g,
        Err(Error::Validation(message)) => {
            state.telegram.send_message(chat_id, &message, &[]).await;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    match state.goals.store().append_row(GOALS_TABLE, &goal.to_row()).await {
        Ok(()) => {}
        Err(Error::TableNotFound(_)) => {
            state
                .telegram
                .send_message(chat_id, &setup_instructions(), &[])
                .await;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    }
    state.goals.invalidate().await;
    info!(goal_id = %goal.id, name = %goal.name, "Goal created");

    let mut reply = format!("🎯 Goal added: *{}*", goal.name);
    if goal.target_amount > 0.0 {
        reply.push_str(&format!(" (€{:.2})", goal.target_amount));
    }
    if let Some(date) = goal.target_date {
        reply.push_str(&format!(" by {}", date));
    }
    state.telegram.send_message(chat_id, &reply, &[]).await;
    Ok(())
}

pub async fn list(state: &AppState, chat_id: i64) -> Result<()> {
    let rows = match state.goals.get(false).await {
        Ok(rows) => rows,
        // A missing Goals sheet is an onboarding state, not an error:
        // reply with the exact columns the operator needs to create.
        Err(Error::TableNotFound(_)) => {
            state
                .telegram
                .send_message(chat_id, &setup_instructions(), &[])
                .await;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let open = pending_goals(&rows);
    let (text, buttons) = render_goal_list(&open);
    state
        .telegram
        .send_message(chat_id, &text, &rows_from_buttons(&buttons))
        .await;
    Ok(())
}

/// Callback path: mark a goal done and redraw the hosting list message.
pub async fn complete(
    state: &AppState,
    chat_id: i64,
    message_id: i64,
    callback_id: &str,
    goal_id: &str,
) -> Result<()> {
    let today = Utc::now().date_naive();
    // The click must be answered even when the store is down, or the
    // client keeps its spinner until the platform times the query out
    let outcome = match complete_goal(&state.goals, goal_id, today).await {
        Ok(outcome) => outcome,
        Err(e) => {
            state
                .telegram
                .answer_callback_query(callback_id, Some("⚠️ Couldn't update the goal, try again."))
                .await;
            return Err(e.into());
        }
    };

    let ack = match &outcome {
        CompleteOutcome::Completed { name } => format!("✅ {} done!", name),
        CompleteOutcome::AlreadyDone { name } => format!("{} was already done.", name),
        CompleteOutcome::NotFound | CompleteOutcome::GoalDeleted => {
            "That goal no longer exists.".to_string()
        }
        CompleteOutcome::Conflict => "The goals changed, please try again.".to_string(),
    };
    state
        .telegram
        .answer_callback_query(callback_id, Some(&ack))
        .await;

    // Redraw the list so the completed goal's button disappears
    let rows = state.goals.get(true).await?;
    let open = pending_goals(&rows);
    let (text, buttons) = render_goal_list(&open);
    state
        .telegram
        .edit_message_text(chat_id, message_id, &text, &rows_from_buttons(&buttons))
        .await;
    Ok(())
}
