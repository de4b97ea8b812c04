//! # Table Locks
//!
//! One async mutex per table name: the single-writer serialization point of
//! the engine.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Lock acquisition                                     │
//! │                                                                         │
//! │  checkout   wants {ventas, menu}  ──► sorted: menu, ventas             │
//! │  cancel     wants {menu, ventas}  ──► sorted: menu, ventas             │
//! │  recipe     wants {recetas, menu} ──► sorted: menu, recetas            │
//! │                                                                         │
//! │  Every operation locks in the same global order, so two operations    │
//! │  can never each hold a lock the other is waiting on.                   │
//! │                                                                         │
//! │  Locks are held from the first load to the last save.                  │
//! │  Writers in OTHER processes are not covered.                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tracing::trace;

/// Process-wide registry of per-table locks.
#[derive(Debug, Default)]
pub struct TableLocks {
    tables: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

/// Locks held for one operation. Dropping it releases every table.
#[derive(Debug)]
pub struct TableGuard {
    tables: Vec<String>,
    _guards: Vec<OwnedMutexGuard<()>>,
}

impl TableGuard {
    /// Names of the locked tables, in acquisition order.
    pub fn tables(&self) -> &[String] {
        &self.tables
    }
}

impl TableLocks {
    pub fn new() -> Self {
        Self::default()
    }

    fn handle(&self, table: &str) -> Arc<AsyncMutex<()>> {
        // A poisoned registry only means another thread panicked while
        // inserting; the map itself is still usable.
        let mut tables = match self.tables.lock() {
            Ok(tables) => tables,
            Err(poisoned) => poisoned.into_inner(),
        };
        tables
            .entry(table.to_string())
            .or_insert_with(|| Arc::new(AsyncMutex::new(())))
            .clone()
    }

    /// Locks every named table in sorted order. Duplicates are ignored.
    pub async fn acquire(&self, tables: &[&str]) -> TableGuard {
        let mut names: Vec<String> = tables.iter().map(|t| t.to_string()).collect();
        names.sort();
        names.dedup();

        let mut guards = Vec::with_capacity(names.len());
        for name in &names {
            let handle = self.handle(name);
            guards.push(handle.lock_owned().await);
            trace!(table = %name, "Table lock acquired");
        }

        TableGuard {
            tables: names,
            _guards: guards,
        }
    }
}
