//! Time-boxed snapshot cache
//!
//! Each logical table gets one `CachedTable`: a full normalized snapshot
//! memoized for a TTL window and invalidated explicitly on every write path.
//! Invalidation happens before control returns to the caller, so a read
//! issued after a successful write never observes pre-write data, whatever
//! the remaining TTL.
//!
//! Normalization failures are cached too (the sheet stays broken until an
//! operator fixes it; re-normalizing on every read would not change that).
//! Store-level failures are never cached and propagate to the caller.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::RwLock;
use tracing::debug;

use crate::error::Result;
use crate::normalize::{normalize, NormalizedTable};
use crate::store::{RowStore, StoreClient};

/// TTL for the Expenses snapshot
pub const EXPENSES_TTL: Duration = Duration::from_secs(120);

/// TTL for the Goals snapshot
pub const GOALS_TTL: Duration = Duration::from_secs(60);

/// Outcome of normalizing one table, as held by the cache
#[derive(Debug)]
pub enum Snapshot {
    Valid(NormalizedTable),
    /// Normalization failed; the message is shown to operators
    Invalid(String),
}

impl Snapshot {
    pub fn table(&self) -> Option<&NormalizedTable> {
        match self {
            Snapshot::Valid(t) => Some(t),
            Snapshot::Invalid(_) => None,
        }
    }
}

/// One cached table: store handle + table name + TTL-boxed snapshot slot
pub struct CachedTable {
    store: StoreClient,
    table: &'static str,
    ttl: Duration,
    slot: RwLock<Option<(Arc<Snapshot>, Instant)>>,
}

impl CachedTable {
    pub fn new(store: StoreClient, table: &'static str, ttl: Duration) -> Self {
        Self {
            store,
            table,
            ttl,
            slot: RwLock::new(None),
        }
    }

    pub fn table_name(&self) -> &'static str {
        self.table
    }

    pub fn store(&self) -> &StoreClient {
        &self.store
    }

    /// Get the snapshot, reusing a fresh cached one unless `force_refresh`
    pub async fn get(&self, force_refresh: bool) -> Result<Arc<Snapshot>> {
        if !force_refresh {
            let slot = self.slot.read().await;
            if let Some((snapshot, captured_at)) = slot.as_ref() {
                if captured_at.elapsed() < self.ttl {
                    debug!(table = self.table, "Snapshot cache hit");
                    return Ok(snapshot.clone());
                }
            }
        }

        let rows = self.store.list_rows(self.table).await?;
        let snapshot = Arc::new(match normalize(&rows) {
            Ok(table) => Snapshot::Valid(table),
            Err(e) => Snapshot::Invalid(e.to_string()),
        });

        let mut slot = self.slot.write().await;
        *slot = Some((snapshot.clone(), Instant::now()));
        debug!(table = self.table, "Snapshot cache refreshed");
        Ok(snapshot)
    }

    /// Drop the snapshot unconditionally. Called by every successful write.
    pub async fn invalidate(&self) {
        let mut slot = self.slot.write().await;
        *slot = None;
        debug!(table = self.table, "Snapshot cache invalidated");
    }
}

/// Raw-row sibling of [`CachedTable`] for tables that do not go through the
/// normalizer (the Goals schema has no semantic amount/date columns).
/// Same TTL-plus-explicit-invalidation contract.
pub struct CachedRows {
    store: StoreClient,
    table: &'static str,
    ttl: Duration,
    slot: RwLock<Option<(Arc<Vec<Vec<String>>>, Instant)>>,
}

impl CachedRows {
    pub fn new(store: StoreClient, table: &'static str, ttl: Duration) -> Self {
        Self {
            store,
            table,
            ttl,
            slot: RwLock::new(None),
        }
    }

    pub fn table_name(&self) -> &'static str {
        self.table
    }

    pub fn store(&self) -> &StoreClient {
        &self.store
    }

    pub async fn get(&self, force_refresh: bool) -> Result<Arc<Vec<Vec<String>>>> {
        if !force_refresh {
            let slot = self.slot.read().await;
            if let Some((rows, captured_at)) = slot.as_ref() {
                if captured_at.elapsed() < self.ttl {
                    debug!(table = self.table, "Row cache hit");
                    return Ok(rows.clone());
                }
            }
        }

        let rows = Arc::new(self.store.list_rows(self.table).await?);
        let mut slot = self.slot.write().await;
        *slot = Some((rows.clone(), Instant::now()));
        debug!(table = self.table, "Row cache refreshed");
        Ok(rows)
    }

    pub async fn invalidate(&self) {
        let mut slot = self.slot.write().await;
        *slot = None;
        debug!(table = self.table, "Row cache invalidated");
    }
}
