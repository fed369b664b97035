//! Row store abstraction over the spreadsheet backing store
//!
//! The durable database is a header-plus-rows table store. This module
//! defines the adapter interface and two implementations:
//!
//! - `RowStore` trait: list/append/update/delete on a named table
//! - `StoreClient` enum: concrete wrapper providing Clone + compile-time
//!   dispatch (same pattern as the model client)
//! - `SheetsStore`: Google Sheets values API over HTTP
//! - `MemoryStore`: in-memory tables for tests and offline use
//!
//! No operation is atomic across rows. Destructive single-row edits must go
//! through the optimistic-concurrency mutator (`crate::mutate`).

mod memory;
mod sheets;

pub use memory::{MemoryStore, StagedOp};
pub use sheets::SheetsStore;

use async_trait::async_trait;

use crate::error::Result;

/// Interface to the tabular backing store.
///
/// `list_rows` returns the raw table including the header row at index 0.
/// Row and column indexes in `update_cell`/`delete_row` are 0-based absolute
/// indexes into that same sequence.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Fetch all rows of a named table, header first
    async fn list_rows(&self, table: &str) -> Result<Vec<Vec<String>>>;

    /// Append a row of positional values to the end of the table
    async fn append_row(&self, table: &str, values: &[String]) -> Result<()>;

    /// Overwrite a single cell
    async fn update_cell(&self, table: &str, row: usize, col: usize, value: &str) -> Result<()>;

    /// Delete one row by absolute index
    async fn delete_row(&self, table: &str, row: usize) -> Result<()>;
}

/// Concrete store client enum
///
/// Provides Clone and compile-time dispatch without Box<dyn> overhead.
#[derive(Clone)]
pub enum StoreClient {
    /// Google Sheets backing store (HTTP API)
    Sheets(SheetsStore),
    /// In-memory store for testing
    Memory(MemoryStore),
}

impl StoreClient {
    /// Create a Sheets-backed store
    pub fn sheets(spreadsheet_id: &str, token: &str) -> Self {
        StoreClient::Sheets(SheetsStore::new(spreadsheet_id, token))
    }

    /// Create an in-memory store for testing
    pub fn memory() -> Self {
        StoreClient::Memory(MemoryStore::new())
    }
}

#[async_trait]
impl RowStore for StoreClient {
    async fn list_rows(&self, table: &str) -> Result<Vec<Vec<String>>> {
        match self {
            StoreClient::Sheets(s) => s.list_rows(table).await,
            StoreClient::Memory(s) => s.list_rows(table).await,
        }
    }

    async fn append_row(&self, table: &str, values: &[String]) -> Result<()> {
        match self {
            StoreClient::Sheets(s) => s.append_row(table, values).await,
            StoreClient::Memory(s) => s.append_row(table, values).await,
        }
    }

    async fn update_cell(&self, table: &str, row: usize, col: usize, value: &str) -> Result<()> {
        match self {
            StoreClient::Sheets(s) => s.update_cell(table, row, col, value).await,
            StoreClient::Memory(s) => s.update_cell(table, row, col, value).await,
        }
    }

    async fn delete_row(&self, table: &str, row: usize) -> Result<()> {
        match self {
            StoreClient::Sheets(s) => s.delete_row(table, row).await,
            StoreClient::Memory(s) => s.delete_row(table, row).await,
        }
    }
}
