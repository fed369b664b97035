//! Optimistic-concurrency mutations
//!
//! The row store has no transactions and no locks, but multiple webhook
//! invocations can run against it concurrently. Destructive single-row
//! operations therefore follow one pattern: read, capture a fingerprint
//! (the row's creation-timestamp cell), re-read, compare, and abort on any
//! mismatch. Under contention the operation fails closed and asks the user
//! to retry; it never deletes or updates the wrong row.
//!
//! Both paths invalidate the relevant snapshot cache as soon as the store
//! may have changed, failed writes included.

use chrono::NaiveDate;
use tracing::{info, warn};

use crate::cache::{CachedRows, CachedTable};
use crate::error::Result;
use crate::goals::{self, GOAL_COMPLETED_COL, GOAL_ID_COL, GOAL_STATUS_COL};
use crate::models::{GoalStatus, EXPENSES_TABLE, GOALS_TABLE};
use crate::store::RowStore;

/// Column index of the owner cell in an Expenses row
const EXPENSE_USER_COL: usize = 5;

/// Outcome of an undo-last-expense attempt
#[derive(Debug, Clone, PartialEq)]
pub enum UndoOutcome {
    /// The tail row was deleted
    Deleted { amount: String, merchant: String },
    /// Table has no data rows
    NothingToDelete,
    /// The last entry belongs to someone else (ownership, not concurrency)
    NotYours,
    /// The table changed between read and re-read; nothing was deleted
    Conflict,
}

/// Outcome of a goal-completion attempt
#[derive(Debug, Clone, PartialEq)]
pub enum CompleteOutcome {
    Completed { name: String },
    /// Second completion of a Done goal is a no-op, not an error
    AlreadyDone { name: String },
    /// No goal row carries this id
    NotFound,
    /// The row vanished between read and re-read
    GoalDeleted,
    /// Fingerprint mismatch; nothing was written
    Conflict,
}

/// Undo the requesting user's last expense.
///
/// "Undo" is strictly a pop of the tail: the last-appended row is deletable
/// only by its owner, and only if the table is untouched between the
/// fingerprint capture and the delete.
pub async fn undo_last_expense(expenses: &CachedTable, user: &str) -> Result<UndoOutcome> {
    let store = expenses.store();
    let rows = store.list_rows(EXPENSES_TABLE).await?;
    if rows.len() <= 1 {
        return Ok(UndoOutcome::NothingToDelete);
    }

    let last_index = rows.len() - 1;
    let last_row = &rows[last_index];
    let owner = last_row.get(EXPENSE_USER_COL).map(String::as_str).unwrap_or("");
    if owner != user {
        return Ok(UndoOutcome::NotYours);
    }

    let fingerprint = last_row.first().cloned().unwrap_or_default();
    let amount = last_row.get(1).cloned().unwrap_or_default();
    let merchant = last_row.get(3).cloned().unwrap_or_default();

    // Re-read and verify nothing moved underneath us
    let current = store.list_rows(EXPENSES_TABLE).await?;
    let unchanged = current.len() == rows.len()
        && current
            .last()
            .and_then(|r| r.first())
            .map(|ts| *ts == fingerprint)
            .unwrap_or(false);
    if !unchanged {
        warn!(user, "Undo refused: expenses changed between read and re-read");
        return Ok(UndoOutcome::Conflict);
    }

    store.delete_row(EXPENSES_TABLE, last_index).await?;
    expenses.invalidate().await;
    info!(user, amount = %amount, merchant = %merchant, "Deleted last expense");
    Ok(UndoOutcome::Deleted { amount, merchant })
}

/// Mark a goal done by its opaque id.
///
/// Completing an already-Done goal reports `AlreadyDone` without touching
/// the store, so repeated button clicks stay idempotent.
pub async fn complete_goal(
    goals: &CachedRows,
    goal_id: &str,
    today: NaiveDate,
) -> Result<CompleteOutcome> {
    let store = goals.store();
    let rows = store.list_rows(GOALS_TABLE).await?;

    let Some((row_index, row)) = rows
        .iter()
        .enumerate()
        .skip(1)
        .find(|(_, r)| r.get(GOAL_ID_COL).map(String::as_str) == Some(goal_id))
    else {
        return Ok(CompleteOutcome::NotFound);
    };

    let name = goals::goal_name(row);
    let status = row
        .get(GOAL_STATUS_COL)
        .and_then(|s| s.parse::<GoalStatus>().ok());
    if status == Some(GoalStatus::Done) {
        return Ok(CompleteOutcome::AlreadyDone { name });
    }

    let fingerprint = row.first().cloned().unwrap_or_default();

    let current = store.list_rows(GOALS_TABLE).await?;
    let Some(current_row) = current.get(row_index) else {
        // Row count shrank below the expected index
        return Ok(CompleteOutcome::GoalDeleted);
    };
    if current_row.first().map(String::as_str) != Some(fingerprint.as_str()) {
        warn!(goal_id, "Goal completion refused: row fingerprint changed");
        return Ok(CompleteOutcome::Conflict);
    }

    // Date before status: if the second write fails the goal stays
    // Pending and a retry repeats both writes. A Done row with no
    // completion date would read as already handled and never heal.
    let write = async {
        store
            .update_cell(
                GOALS_TABLE,
                row_index,
                GOAL_COMPLETED_COL,
                &today.to_string(),
            )
            .await?;
        store
            .update_cell(
                GOALS_TABLE,
                row_index,
                GOAL_STATUS_COL,
                GoalStatus::Done.as_str(),
            )
            .await
    }
    .await;
    // Invalidate even on failure; the first write may have landed
    goals.invalidate().await;
    write?;
    info!(goal_id, name = %name, "Goal completed");
    Ok(CompleteOutcome::Completed { name })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CachedRows, CachedTable, EXPENSES_TTL, GOALS_TTL};
    use crate::error::Error;
    use crate::models::{EXPENSE_COLUMNS, GOAL_COLUMNS};
    use crate::store::{MemoryStore, StoreClient};

    fn expense_row(ts: &str, amount: &str, user: &str) -> Vec<String> {
        vec![
            ts.into(),
            amount.into(),
            "Groceries".into(),
            "Rewe".into(),
            "".into(),
            user.into(),
        ]
    }

    fn goal_row(created: &str, id: &str, status: &str) -> Vec<String> {
        vec![
            created.into(),
            "Item".into(),
            "New bike".into(),
            "500.00".into(),
            "".into(),
            status.into(),
            "Alice".into(),
            id.into(),
            "".into(),
            "".into(),
        ]
    }

    fn setup() -> (MemoryStore, CachedTable, CachedRows) {
        let memory = MemoryStore::new();
        memory.create_table(EXPENSES_TABLE, &EXPENSE_COLUMNS);
        memory.create_table(GOALS_TABLE, &GOAL_COLUMNS);
        let store = StoreClient::Memory(memory.clone());
        let expenses = CachedTable::new(store.clone(), EXPENSES_TABLE, EXPENSES_TTL);
        let goals = CachedRows::new(store, GOALS_TABLE, GOALS_TTL);
        (memory, expenses, goals)
    }

    #[tokio::test]
    async fn test_undo_empty_table() {
        let (_, expenses, _) = setup();
        let outcome = undo_last_expense(&expenses, "Alice").await.unwrap();
        assert_eq!(outcome, UndoOutcome::NothingToDelete);
    }

    #[tokio::test]
    async fn test_undo_deletes_own_tail_row() {
        let (memory, expenses, _) = setup();
        memory
            .append_row(EXPENSES_TABLE, &expense_row("2025-01-05 10:00", "45.00", "Alice"))
            .await
            .unwrap();

        let outcome = undo_last_expense(&expenses, "Alice").await.unwrap();
        assert_eq!(
            outcome,
            UndoOutcome::Deleted {
                amount: "45.00".into(),
                merchant: "Rewe".into()
            }
        );
        assert_eq!(memory.row_count(EXPENSES_TABLE), 1);
    }

    #[tokio::test]
    async fn test_undo_refuses_other_users_row() {
        let (memory, expenses, _) = setup();
        memory
            .append_row(EXPENSES_TABLE, &expense_row("2025-01-05 10:00", "45.00", "Alice"))
            .await
            .unwrap();

        // Bob's undo arrives after Alice's entry
        let outcome = undo_last_expense(&expenses, "Bob").await.unwrap();
        assert_eq!(outcome, UndoOutcome::NotYours);
        assert_eq!(memory.row_count(EXPENSES_TABLE), 2);
    }

    #[tokio::test]
    async fn test_complete_goal_happy_path() {
        let (memory, _, goals) = setup();
        memory
            .append_row(GOALS_TABLE, &goal_row("2025-01-01 09:00", "a1b2c3d4", "Pending"))
            .await
            .unwrap();

        let today = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        let outcome = complete_goal(&goals, "a1b2c3d4", today).await.unwrap();
        assert_eq!(outcome, CompleteOutcome::Completed { name: "New bike".into() });

        let rows = memory.list_rows(GOALS_TABLE).await.unwrap();
        assert_eq!(rows[1][GOAL_STATUS_COL], "Done");
        assert_eq!(rows[1][GOAL_COMPLETED_COL], "2025-02-01");
    }

    #[tokio::test]
    async fn test_partial_completion_write_is_retryable() {
        let (memory, _, goals) = setup();
        memory
            .append_row(GOALS_TABLE, &goal_row("2025-01-01 09:00", "a1b2c3d4", "Pending"))
            .await
            .unwrap();

        // First cell write lands, the second one fails
        memory.fail_updates_after(1);
        let today = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        let err = complete_goal(&goals, "a1b2c3d4", today).await.unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(_)));

        // Status must still read Pending so a retry can finish the job
        let rows = memory.list_rows(GOALS_TABLE).await.unwrap();
        assert_eq!(rows[1][GOAL_STATUS_COL], "Pending");

        let outcome = complete_goal(&goals, "a1b2c3d4", today).await.unwrap();
        assert_eq!(outcome, CompleteOutcome::Completed { name: "New bike".into() });
        let rows = memory.list_rows(GOALS_TABLE).await.unwrap();
        assert_eq!(rows[1][GOAL_STATUS_COL], "Done");
        assert_eq!(rows[1][GOAL_COMPLETED_COL], "2025-02-01");
    }

    #[tokio::test]
    async fn test_complete_goal_is_idempotent() {
        let (memory, _, goals) = setup();
        memory
            .append_row(GOALS_TABLE, &goal_row("2025-01-01 09:00", "a1b2c3d4", "Pending"))
            .await
            .unwrap();

        let today = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        complete_goal(&goals, "a1b2c3d4", today).await.unwrap();
        let second = complete_goal(&goals, "a1b2c3d4", today).await.unwrap();
        assert_eq!(second, CompleteOutcome::AlreadyDone { name: "New bike".into() });

        // Completed date untouched by the second attempt
        let rows = memory.list_rows(GOALS_TABLE).await.unwrap();
        assert_eq!(rows[1][GOAL_COMPLETED_COL], "2025-02-01");
    }

    #[tokio::test]
    async fn test_complete_goal_unknown_id() {
        let (_, _, goals) = setup();
        let today = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
        let outcome = complete_goal(&goals, "deadbeef", today).await.unwrap();
        assert_eq!(outcome, CompleteOutcome::NotFound);
    }
}
