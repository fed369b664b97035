//! Tally Core Library
//!
//! Shared functionality for the tally family expense bot:
//! - Row store adapter over the spreadsheet backing store
//! - Time-boxed snapshot cache with explicit invalidation
//! - Tabular normalizer for loosely-typed sheet rows
//! - Analytics engine (period filters, drill-down views)
//! - Optimistic-concurrency mutator for undo and goal completion
//! - Goal creation and listing
//! - Pluggable model backends for structured extraction

pub mod ai;
pub mod analytics;
pub mod cache;
pub mod callback;
pub mod error;
pub mod goals;
pub mod models;
pub mod mutate;
pub mod normalize;
pub mod prompts;
pub mod store;

pub use ai::{MockBackend, ModelBackend, ModelClient, OpenAICompatibleBackend};
pub use analytics::{drill_user, summarize, Button, Period, SummaryView, ViewKind};
pub use cache::{CachedRows, CachedTable, Snapshot, EXPENSES_TTL, GOALS_TTL};
pub use callback::CallbackIntent;
pub use error::{Error, Result};
pub use models::{
    Category, Expense, ExtractedExpense, ExtractedGoal, Goal, GoalStatus, GoalType,
    EXPENSES_TABLE, EXPENSE_COLUMNS, GOALS_TABLE, GOAL_COLUMNS, TIMESTAMP_FORMAT,
};
pub use mutate::{complete_goal, undo_last_expense, CompleteOutcome, UndoOutcome};
pub use normalize::{normalize, NormalizedTable, Record};
pub use store::{MemoryStore, RowStore, SheetsStore, StoreClient};
