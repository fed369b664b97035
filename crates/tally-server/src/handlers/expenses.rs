//! Expense recording and undo

use anyhow::Result;
use chrono::Utc;
use tracing::{info, warn};

use tally_core::{undo_last_expense, Error, ModelBackend, RowStore, UndoOutcome, EXPENSES_TABLE};

use crate::telegram::User;
use crate::AppState;

/// Turn a free-text message or receipt photo into an appended expense row.
/// Extraction and validation failures answer the user directly; only
/// store-level failures bubble to the dispatch error funnel.
pub async fn record(
    state: &AppState,
    chat_id: i64,
    user: &User,
    text: Option<&str>,
    file_id: Option<&str>,
) -> Result<()> {
    let image = match file_id {
        Some(id) => match state.telegram.download_file(id).await {
            Some(bytes) => Some(bytes),
            None => {
                state
                    .telegram
                    .send_message(chat_id, "⚠️ I couldn't download that photo, please resend it.", &[])
                    .await;
                return Ok(());
            }
        },
        None => None,
    };

    let now = Utc::now().naive_utc();
    let extracted = match state
        .model
        .extract_expense(text, image.as_deref(), now.date())
        .await
    {
        Ok(e) => e,
        Err(Error::Model(reason)) => {
            warn!(reason = %reason, "Expense extraction failed");
            state
                .telegram
                .send_message(
                    chat_id,
                    "🤷 I couldn't read that as an expense. Try something like \"45 groceries at Rewe\".",
                    &[],
                )
                .await;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let expense = match extracted.validate(
        &user.display_name(),
        now,
        state.config.expense_ceiling,
    ) {
        Ok(e) => e,
        Err(Error::Validation(message)) => {
            state.telegram.send_message(chat_id, &message, &[]).await;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    state
        .expenses
        .store()
        .append_row(EXPENSES_TABLE, &expense.to_row())
        .await?;
    state.expenses.invalidate().await;
    info!(
        user = %expense.owner,
        amount = expense.amount,
        merchant = %expense.merchant,
        "Expense recorded"
    );

    state
        .telegram
        .send_message(
            chat_id,
            &format!(
                "✅ Recorded €{:.2} at *{}* ({})",
                expense.amount,
                expense.merchant,
                expense.category.as_str()
            ),
            &[],
        )
        .await;
    Ok(())
}

pub async fn undo(state: &AppState, chat_id: i64, user: &User) -> Result<()> {
    let outcome = undo_last_expense(&state.expenses, &user.display_name()).await?;
    let reply = match outcome {
        UndoOutcome::Deleted { amount, merchant } => {
            format!("🗑 Deleted your last expense: €{} at {}.", amount, merchant)
        }
        UndoOutcome::NothingToDelete => "There are no expenses to undo.".to_string(),
        UndoOutcome::NotYours => {
            "The last entry isn't yours, so I left it alone.".to_string()
        }
        UndoOutcome::Conflict => {
            "⚠️ The entries changed while I was looking, please try again.".to_string()
        }
    };
    state.telegram.send_message(chat_id, &reply, &[]).await;
    Ok(())
}
