//! Summary rendering and callback navigation
//!
//! `/summary` sends one message; every later button click edits that same
//! message in place, so a chat never fills up with stale report copies.

use anyhow::Result;
use chrono::Utc;
use tracing::{debug, warn};

use tally_core::{
    drill_user, summarize, CallbackIntent, Error, Period, SummaryView, ViewKind,
};

use crate::telegram::{rows_from_buttons, ButtonRow};
use crate::AppState;

pub async fn send_summary(state: &AppState, chat_id: i64) -> Result<()> {
    let (text, rows) = render_view(state, ViewKind::Overview, Period::CurrentMonth).await?;
    state.telegram.send_message(chat_id, &text, &rows).await;
    Ok(())
}

/// Decode the intent token and act on it. The callback is acknowledged in
/// every branch, including undecodable tokens from long-dead keyboards.
pub async fn handle_callback(
    state: &AppState,
    chat_id: i64,
    message_id: i64,
    callback_id: &str,
    token: &str,
) -> Result<()> {
    let Some(intent) = CallbackIntent::decode(token) else {
        warn!(token, "Undecodable callback token");
        state
            .telegram
            .answer_callback_query(callback_id, Some("This button has expired."))
            .await;
        return Ok(());
    };
    debug!(?intent, "Callback intent");

    match intent {
        CallbackIntent::View { view, period } => {
            state.telegram.answer_callback_query(callback_id, None).await;
            let (text, rows) = render_view(state, view, period).await?;
            state
                .telegram
                .edit_message_text(chat_id, message_id, &text, &rows)
                .await;
        }
        CallbackIntent::DrillUser { prefix, period } => {
            state.telegram.answer_callback_query(callback_id, None).await;
            let (text, rows) = render_drill(state, &prefix, period).await?;
            state
                .telegram
                .edit_message_text(chat_id, message_id, &text, &rows)
                .await;
        }
        CallbackIntent::CompleteGoal { id } => {
            super::goals::complete(state, chat_id, message_id, callback_id, &id).await?;
        }
    }
    Ok(())
}

async fn render_view(
    state: &AppState,
    view: ViewKind,
    period: Period,
) -> Result<(String, Vec<ButtonRow>)> {
    let now = Utc::now().date_naive();
    match state.expenses.get(false).await {
        Ok(snapshot) => Ok(match snapshot.table() {
            Some(table) => {
                let rendered = summarize(table, view, period, now);
                assemble(rendered, view, period)
            }
            None => (broken_sheet_text(&snapshot), vec![]),
        }),
        Err(Error::TableNotFound(name)) => Ok((
            format!("⚠️ The *{}* sheet is missing from the spreadsheet.", name),
            vec![],
        )),
        Err(e) => Err(e.into()),
    }
}

async fn render_drill(
    state: &AppState,
    prefix: &str,
    period: Period,
) -> Result<(String, Vec<ButtonRow>)> {
    let now = Utc::now().date_naive();
    let snapshot = state.expenses.get(false).await?;
    Ok(match snapshot.table() {
        Some(table) => {
            let rendered = drill_user(table, prefix, period, now);
            // Drill view keeps only its own back button plus the period row
            let mut rows = rows_from_buttons(&rendered.buttons);
            rows.push(period_row(ViewKind::User, period));
            (rendered.text, rows)
        }
        None => (broken_sheet_text(&snapshot), vec![]),
    })
}

fn broken_sheet_text(snapshot: &tally_core::Snapshot) -> String {
    match snapshot {
        tally_core::Snapshot::Invalid(reason) => {
            format!("⚠️ The expenses sheet cannot be read: {}", reason)
        }
        tally_core::Snapshot::Valid(_) => unreachable!("called only on invalid snapshots"),
    }
}

/// View-specific buttons first (per-user drill-down), then the two
/// navigation rows: sibling views and periods.
fn assemble(rendered: SummaryView, view: ViewKind, period: Period) -> (String, Vec<ButtonRow>) {
    let mut rows = rows_from_buttons(&rendered.buttons);
    rows.push(view_row(view, period));
    rows.push(period_row(view, period));
    (rendered.text, rows)
}

/// Sibling views under the same period; the active view is omitted.
fn view_row(active: ViewKind, period: Period) -> ButtonRow {
    [
        ViewKind::Overview,
        ViewKind::Category,
        ViewKind::User,
        ViewKind::Merchant,
        ViewKind::History,
    ]
    .into_iter()
    .filter(|v| *v != active)
    .map(|view| {
        (
            view.label().to_string(),
            CallbackIntent::View { view, period }.encode(),
        )
    })
    .collect()
}

/// Same view across the other periods
fn period_row(view: ViewKind, active: Period) -> ButtonRow {
    [
        Period::CurrentMonth,
        Period::LastMonth,
        Period::Year,
        Period::All,
    ]
    .into_iter()
    .filter(|p| *p != active)
    .map(|period| {
        (
            period.label().to_string(),
            CallbackIntent::View { view, period }.encode(),
        )
    })
    .collect()
}
