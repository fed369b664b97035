//! Integration tests for tally-core
//!
//! These exercise the full store -> cache -> normalize -> analytics/mutate
//! stack against the in-memory store.

use chrono::NaiveDate;

use tally_core::cache::{CachedRows, CachedTable, EXPENSES_TTL, GOALS_TTL};
use tally_core::goals;
use tally_core::models::{Category, Expense, EXPENSES_TABLE, EXPENSE_COLUMNS, GOALS_TABLE, GOAL_COLUMNS};
use tally_core::mutate::{complete_goal, undo_last_expense, CompleteOutcome, UndoOutcome};
use tally_core::store::{MemoryStore, RowStore, StagedOp, StoreClient};
use tally_core::{summarize, CallbackIntent, ExtractedGoal, Period, ViewKind};

fn seeded_store() -> MemoryStore {
    let memory = MemoryStore::new();
    memory.create_table(EXPENSES_TABLE, &EXPENSE_COLUMNS);
    memory.create_table(GOALS_TABLE, &GOAL_COLUMNS);
    memory
}

fn expense(ts: &str, amount: f64, category: Category, merchant: &str, owner: &str) -> Expense {
    Expense {
        timestamp: chrono::NaiveDateTime::parse_from_str(ts, "%Y-%m-%d %H:%M").unwrap(),
        amount,
        category,
        merchant: merchant.into(),
        note: String::new(),
        owner: owner.into(),
    }
}

fn expenses_cache(memory: &MemoryStore) -> CachedTable {
    CachedTable::new(StoreClient::Memory(memory.clone()), EXPENSES_TABLE, EXPENSES_TTL)
}

fn goals_cache(memory: &MemoryStore) -> CachedRows {
    CachedRows::new(StoreClient::Memory(memory.clone()), GOALS_TABLE, GOALS_TTL)
}

// =============================================================================
// Round trip and cache coherence
// =============================================================================

#[tokio::test]
async fn test_append_list_round_trip_preserves_column_order() {
    let memory = seeded_store();
    let e = expense("2025-01-05 10:00", 45.0, Category::Groceries, "Rewe", "Alice");
    memory.append_row(EXPENSES_TABLE, &e.to_row()).await.unwrap();

    let rows = memory.list_rows(EXPENSES_TABLE).await.unwrap();
    assert_eq!(
        rows[1],
        vec!["2025-01-05 10:00", "45.00", "Groceries", "Rewe", "", "Alice"]
    );
}

#[tokio::test]
async fn test_read_after_write_sees_write_through_cache() {
    let memory = seeded_store();
    let cache = expenses_cache(&memory);

    // Warm the cache while the table is empty
    assert!(cache.get(false).await.unwrap().table().unwrap().is_empty());

    // The write path appends then invalidates before returning
    let e = expense("2025-01-05 10:00", 45.0, Category::Groceries, "Rewe", "Alice");
    memory.append_row(EXPENSES_TABLE, &e.to_row()).await.unwrap();
    cache.invalidate().await;

    let snapshot = cache.get(false).await.unwrap();
    assert_eq!(snapshot.table().unwrap().records.len(), 1);
}

// =============================================================================
// Analytics scenarios
// =============================================================================

#[tokio::test]
async fn test_overview_scenario_january() {
    let memory = seeded_store();
    let e = expense("2025-01-05 10:00", 45.0, Category::Groceries, "Rewe", "Alice");
    memory.append_row(EXPENSES_TABLE, &e.to_row()).await.unwrap();

    let cache = expenses_cache(&memory);
    let snapshot = cache.get(false).await.unwrap();
    let now = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();
    let view = summarize(
        snapshot.table().unwrap(),
        ViewKind::Overview,
        Period::CurrentMonth,
        now,
    );

    assert!(view.text.contains("Total: €45.00"));
    assert!(view.text.contains("Entries: 1"));
    assert!(view.text.contains("Average: €45.00"));
    assert!(view.text.contains("Groceries — €45.00 (100.0%)"));
}

#[tokio::test]
async fn test_user_view_orders_by_sum_and_emits_drill_buttons() {
    let memory = seeded_store();
    for e in [
        expense("2025-01-03 09:00", 10.0, Category::Transport, "BVG", "Bob"),
        expense("2025-01-05 10:00", 30.0, Category::Groceries, "Rewe", "Alice"),
    ] {
        memory.append_row(EXPENSES_TABLE, &e.to_row()).await.unwrap();
    }

    let cache = expenses_cache(&memory);
    let snapshot = cache.get(false).await.unwrap();
    let now = NaiveDate::from_ymd_opt(2025, 1, 20).unwrap();
    let view = summarize(snapshot.table().unwrap(), ViewKind::User, Period::CurrentMonth, now);

    assert!(view.text.find("Alice").unwrap() < view.text.find("Bob").unwrap());
    assert_eq!(view.buttons.len(), 2);
    for button in &view.buttons {
        assert!(matches!(button.intent, CallbackIntent::DrillUser { .. }));
    }
}

// =============================================================================
// Optimistic concurrency
// =============================================================================

#[tokio::test]
async fn test_undo_refused_when_row_appended_between_reads() {
    let memory = seeded_store();
    let alice = expense("2025-01-05 10:00", 45.0, Category::Groceries, "Rewe", "Alice");
    memory.append_row(EXPENSES_TABLE, &alice.to_row()).await.unwrap();

    // Bob's expense lands between Alice's fingerprint capture and re-read
    let bob = expense("2025-01-05 10:01", 10.0, Category::Transport, "BVG", "Bob");
    memory.stage_after_read(EXPENSES_TABLE, StagedOp::Append(bob.to_row()));

    let cache = expenses_cache(&memory);
    let outcome = undo_last_expense(&cache, "Alice").await.unwrap();
    assert_eq!(outcome, UndoOutcome::Conflict);

    // Both rows survive
    let rows = memory.list_rows(EXPENSES_TABLE).await.unwrap();
    assert_eq!(rows.len(), 3);
}

#[tokio::test]
async fn test_complete_goal_refused_when_rows_shift() {
    let memory = seeded_store();
    let first = goals::new_goal(
        ExtractedGoal {
            goal_type: "Item".into(),
            goal: "First goal".into(),
            target_amount: 0.0,
            target_date: None,
        },
        "Alice",
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(9, 0, 0).unwrap(),
        1e6,
    )
    .unwrap();
    let second = goals::new_goal(
        ExtractedGoal {
            goal_type: "Item".into(),
            goal: "Second goal".into(),
            target_amount: 0.0,
            target_date: None,
        },
        "Alice",
        NaiveDate::from_ymd_opt(2025, 1, 2).unwrap().and_hms_opt(9, 0, 0).unwrap(),
        1e6,
    )
    .unwrap();
    memory.append_row(GOALS_TABLE, &first.to_row()).await.unwrap();
    memory.append_row(GOALS_TABLE, &second.to_row()).await.unwrap();

    // The first goal's row is deleted concurrently, shifting the second up
    memory.stage_after_read(GOALS_TABLE, StagedOp::Delete(1));

    let cache = goals_cache(&memory);
    let today = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
    let outcome = complete_goal(&cache, &second.id, today).await.unwrap();
    assert_eq!(outcome, CompleteOutcome::Conflict);

    // The surviving goal is untouched
    let rows = memory.list_rows(GOALS_TABLE).await.unwrap();
    assert_eq!(rows[1][goals::GOAL_STATUS_COL], "Pending");
}

#[tokio::test]
async fn test_complete_goal_row_vanished() {
    let memory = seeded_store();
    let only = goals::new_goal(
        ExtractedGoal {
            goal_type: "Task".into(),
            goal: "Only goal".into(),
            target_amount: 0.0,
            target_date: None,
        },
        "Alice",
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(9, 0, 0).unwrap(),
        1e6,
    )
    .unwrap();
    memory.append_row(GOALS_TABLE, &only.to_row()).await.unwrap();
    memory.stage_after_read(GOALS_TABLE, StagedOp::Delete(1));

    let cache = goals_cache(&memory);
    let today = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
    let outcome = complete_goal(&cache, &only.id, today).await.unwrap();
    assert_eq!(outcome, CompleteOutcome::GoalDeleted);
}

#[tokio::test]
async fn test_goal_completion_mutates_store_at_most_once() {
    let memory = seeded_store();
    let goal = goals::new_goal(
        ExtractedGoal {
            goal_type: "Item".into(),
            goal: "New bike".into(),
            target_amount: 500.0,
            target_date: None,
        },
        "Alice",
        NaiveDate::from_ymd_opt(2025, 1, 1).unwrap().and_hms_opt(9, 0, 0).unwrap(),
        1e6,
    )
    .unwrap();
    memory.append_row(GOALS_TABLE, &goal.to_row()).await.unwrap();

    let cache = goals_cache(&memory);
    let first_day = NaiveDate::from_ymd_opt(2025, 2, 1).unwrap();
    let later_day = NaiveDate::from_ymd_opt(2025, 3, 1).unwrap();

    assert_eq!(
        complete_goal(&cache, &goal.id, first_day).await.unwrap(),
        CompleteOutcome::Completed { name: "New bike".into() }
    );
    assert_eq!(
        complete_goal(&cache, &goal.id, later_day).await.unwrap(),
        CompleteOutcome::AlreadyDone { name: "New bike".into() }
    );

    // The completion date still reflects the first attempt
    let rows = memory.list_rows(GOALS_TABLE).await.unwrap();
    assert_eq!(rows[1][goals::GOAL_COMPLETED_COL], "2025-02-01");
}
