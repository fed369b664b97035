//! In-memory row store for tests and offline runs

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{Error, Result};

use super::RowStore;

/// A mutation staged to land right after the next read of a table
#[derive(Debug, Clone)]
pub enum StagedOp {
    Append(Vec<String>),
    Delete(usize),
}

/// In-memory table store
///
/// Tables must be created explicitly with [`MemoryStore::create_table`];
/// operations on a missing table fail with `TableNotFound`, matching the
/// Sheets adapter so callers exercise the same error paths in tests.
#[derive(Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<HashMap<String, Vec<Vec<String>>>>>,
    staged: Arc<Mutex<Vec<(String, StagedOp)>>>,
    updates_until_failure: Arc<Mutex<Option<usize>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a mutation that is applied immediately after the next
    /// `list_rows` of the named table returns. Simulates a concurrent
    /// writer landing between a caller's read and its re-read.
    pub fn stage_after_read(&self, table: &str, op: StagedOp) {
        self.staged.lock().unwrap().push((table.to_string(), op));
    }

    /// Arm `update_cell` to fail with `StoreUnavailable` once the next
    /// `n` calls have succeeded. Simulates the backing API dropping out
    /// partway through a multi-cell mutation.
    pub fn fail_updates_after(&self, n: usize) {
        *self.updates_until_failure.lock().unwrap() = Some(n);
    }

    /// Create a table with the given header row
    pub fn create_table(&self, name: &str, header: &[&str]) {
        let mut tables = self.tables.lock().unwrap();
        tables.insert(
            name.to_string(),
            vec![header.iter().map(|s| s.to_string()).collect()],
        );
    }

    /// Number of rows in a table, header included (test helper)
    pub fn row_count(&self, name: &str) -> usize {
        let tables = self.tables.lock().unwrap();
        tables.get(name).map(|t| t.len()).unwrap_or(0)
    }
}

#[async_trait]
impl RowStore for MemoryStore {
    async fn list_rows(&self, table: &str) -> Result<Vec<Vec<String>>> {
        let mut tables = self.tables.lock().unwrap();
        let snapshot = tables
            .get(table)
            .cloned()
            .ok_or_else(|| Error::TableNotFound(table.to_string()))?;

        // Apply any staged concurrent writes now that the read is captured
        let mut staged = self.staged.lock().unwrap();
        let mut remaining = Vec::new();
        for (t, op) in staged.drain(..) {
            if t != table {
                remaining.push((t, op));
                continue;
            }
            if let Some(rows) = tables.get_mut(&t) {
                match op {
                    StagedOp::Append(values) => rows.push(values),
                    StagedOp::Delete(index) => {
                        if index < rows.len() {
                            rows.remove(index);
                        }
                    }
                }
            }
        }
        *staged = remaining;

        Ok(snapshot)
    }

    async fn append_row(&self, table: &str, values: &[String]) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| Error::TableNotFound(table.to_string()))?;
        rows.push(values.to_vec());
        Ok(())
    }

    async fn update_cell(&self, table: &str, row: usize, col: usize, value: &str) -> Result<()> {
        {
            let mut armed = self.updates_until_failure.lock().unwrap();
            if let Some(remaining) = armed.as_mut() {
                if *remaining == 0 {
                    *armed = None;
                    return Err(Error::StoreUnavailable("injected update failure".into()));
                }
                *remaining -= 1;
            }
        }
        let mut tables = self.tables.lock().unwrap();
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| Error::TableNotFound(table.to_string()))?;
        let cells = rows.get_mut(row).ok_or_else(|| {
            Error::InvalidData(format!("Row {} out of range for table {}", row, table))
        })?;
        if cells.len() <= col {
            cells.resize(col + 1, String::new());
        }
        cells[col] = value.to_string();
        Ok(())
    }

    async fn delete_row(&self, table: &str, row: usize) -> Result<()> {
        let mut tables = self.tables.lock().unwrap();
        let rows = tables
            .get_mut(table)
            .ok_or_else(|| Error::TableNotFound(table.to_string()))?;
        if row >= rows.len() {
            return Err(Error::InvalidData(format!(
                "Row {} out of range for table {}",
                row, table
            )));
        }
        rows.remove(row);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_table_is_table_not_found() {
        let store = MemoryStore::new();
        let err = store.list_rows("Expenses").await.unwrap_err();
        assert!(matches!(err, Error::TableNotFound(ref t) if t == "Expenses"));
    }

    #[tokio::test]
    async fn test_append_then_list_preserves_order() {
        let store = MemoryStore::new();
        store.create_table("Expenses", &["Timestamp", "Amount"]);
        store
            .append_row("Expenses", &["2025-01-05 10:00".into(), "45.00".into()])
            .await
            .unwrap();

        let rows = store.list_rows("Expenses").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1], vec!["2025-01-05 10:00", "45.00"]);
    }

    #[tokio::test]
    async fn test_update_cell_extends_short_row() {
        let store = MemoryStore::new();
        store.create_table("Goals", &["Created_Date", "Status"]);
        store
            .append_row("Goals", &["2025-02-01 09:00".into()])
            .await
            .unwrap();
        store.update_cell("Goals", 1, 5, "Done").await.unwrap();

        let rows = store.list_rows("Goals").await.unwrap();
        assert_eq!(rows[1][5], "Done");
    }

    #[tokio::test]
    async fn test_delete_row_out_of_range() {
        let store = MemoryStore::new();
        store.create_table("Expenses", &["Timestamp"]);
        assert!(store.delete_row("Expenses", 3).await.is_err());
    }
}
