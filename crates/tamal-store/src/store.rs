//! # Snapshot Store Contract
//!
//! The persistence boundary of the engine: a named table goes in whole and
//! comes out whole.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      SnapshotStore contract                             │
//! │                                                                         │
//! │  load("menu")          ──► Table (header + rows), empty if never saved │
//! │  save("menu", &table)  ──► replaces the whole table, or fails          │
//! │                                                                         │
//! │  • no per-row update, no append                                        │
//! │  • no optimistic concurrency check: last writer wins                   │
//! │  • every failure is a StoreError, never an empty result                │
//! │                                                                         │
//! │  Implementations                                                       │
//! │  ├── MemoryStore       in-process tables (tests, demos)                │
//! │  ├── SqliteStore       one JSON row per table (sqlite.rs)              │
//! │  └── ResilientStore<S> timeout + retry around any of them (retry.rs)   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::table::Table;

/// Full-table persistence.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Loads a table. A table that was never saved loads as empty.
    async fn load(&self, table: &str) -> StoreResult<Table>;

    /// Replaces a table's entire content.
    async fn save(&self, table: &str, snapshot: &Table) -> StoreResult<()>;
}

#[async_trait]
impl<T: SnapshotStore + ?Sized> SnapshotStore for Arc<T> {
    async fn load(&self, table: &str) -> StoreResult<Table> {
        (**self).load(table).await
    }

    async fn save(&self, table: &str, snapshot: &Table) -> StoreResult<()> {
        (**self).save(table, snapshot).await
    }
}

// =============================================================================
// Memory Store
// =============================================================================

/// In-process snapshot store.
///
/// Besides holding tables it can simulate an unhealthy backend, which is how
/// the engine's failure paths are tested:
///
/// ```rust
/// use tamal_store::MemoryStore;
///
/// let store = MemoryStore::new();
/// store.set_unavailable(true);     // every call fails with Unavailable
/// store.set_unavailable(false);
/// store.fail_saves_to("menu");     // only saves of `menu` fail
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Table>>,
    unavailable: AtomicBool,
    failing_saves: std::sync::Mutex<HashSet<String>>,
    latency_ms: AtomicU64,
    loads: AtomicUsize,
    saves: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a table before the store is shared.
    pub fn with_table(mut self, name: &str, table: Table) -> Self {
        self.tables.get_mut().insert(name.to_string(), table);
        self
    }

    /// Makes every load and save fail with `Unavailable`.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Makes saves of one table fail with `WriteFailed`.
    pub fn fail_saves_to(&self, table: &str) {
        if let Ok(mut failing) = self.failing_saves.lock() {
            failing.insert(table.to_string());
        }
    }

    /// Lets saves of every table succeed again.
    pub fn clear_failures(&self) {
        if let Ok(mut failing) = self.failing_saves.lock() {
            failing.clear();
        }
        self.set_unavailable(false);
    }

    /// Delays every call, to exercise timeouts.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    /// Number of load calls that reached the store.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::SeqCst)
    }

    /// Number of save calls that reached the store.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Current content of a table, bypassing failure injection.
    pub async fn snapshot(&self, table: &str) -> Option<Table> {
        self.tables.read().await.get(table).cloned()
    }

    async fn simulate(&self) -> StoreResult<()> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("memory store offline".to_string()));
        }
        Ok(())
    }

    fn save_fails(&self, table: &str) -> bool {
        self.failing_saves
            .lock()
            .map(|failing| failing.contains(table))
            .unwrap_or(false)
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn load(&self, table: &str) -> StoreResult<Table> {
        self.loads.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;

        let snapshot = self.tables.read().await.get(table).cloned().unwrap_or_default();
        debug!(table = %table, rows = snapshot.len(), "Loaded table from memory");
        Ok(snapshot)
    }

    async fn save(&self, table: &str, snapshot: &Table) -> StoreResult<()> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        self.simulate().await?;

        if self.save_fails(table) {
            return Err(StoreError::write_failed(table, "injected write failure"));
        }

        self.tables
            .write()
            .await
            .insert(table.to_string(), snapshot.clone());
        debug!(table = %table, rows = snapshot.len(), "Saved table to memory");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::from_parts(
            vec!["Producto".into()],
            vec![vec!["Tamal Verde".into()]],
        )
    }

    #[tokio::test]
    async fn test_missing_table_loads_empty() {
        let store = MemoryStore::new();
        let loaded = store.load("menu").await.unwrap();
        assert!(loaded.is_empty());
        assert!(loaded.columns().is_empty());
    }

    #[tokio::test]
    async fn test_save_replaces_whole_table() {
        let store = MemoryStore::new().with_table("menu", table());
        let replacement = Table::new(["Producto"]);

        store.save("menu", &replacement).await.unwrap();
        assert_eq!(store.load("menu").await.unwrap(), replacement);
        assert_eq!(store.save_count(), 1);
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let store = MemoryStore::new().with_table("menu", table());

        store.set_unavailable(true);
        assert!(matches!(store.load("menu").await, Err(StoreError::Unavailable(_))));

        store.set_unavailable(false);
        store.fail_saves_to("menu");
        assert!(matches!(
            store.save("menu", &Table::default()).await,
            Err(StoreError::WriteFailed { .. })
        ));
        assert!(store.save("ventas", &Table::default()).await.is_ok());
        assert_eq!(store.snapshot("menu").await, Some(table()));

        store.clear_failures();
        assert!(store.save("menu", &Table::default()).await.is_ok());
    }

    #[tokio::test]
    async fn test_arc_store_delegates() {
        let store = Arc::new(MemoryStore::new());
        store.save("recetas", &table()).await.unwrap();
        assert_eq!(store.load("recetas").await.unwrap(), table());
    }
}
