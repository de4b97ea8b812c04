//! # Engine
//!
//! Every operation has the same shape: lock the tables it touches, load
//! them, apply a `tamal-core` rule, save them.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Engine operation                                     │
//! │                                                                         │
//! │  acquire locks (sorted) ──► load tables ──► tamal-core rule            │
//! │                                                  │                      │
//! │                              ┌───────────────────┴──────┐               │
//! │                              ▼                          ▼               │
//! │                         Err(Core)                   Ok(mutated)         │
//! │                         nothing saved                   │               │
//! │                                                         ▼               │
//! │                                              save tables in order       │
//! │                                                         │               │
//! │                                second save fails? ──► restore first     │
//! │                                                         │               │
//! │                                                         ▼               │
//! │                                                   release locks         │
//! │                                                                         │
//! │  Submodules: catalog.rs  sales.rs  recipes.rs  reports.rs               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod catalog;
mod recipes;
mod reports;
mod sales;

pub use reports::ReportFilter;

use std::sync::Arc;
use tamal_core::{default_catalog, Catalog, Ledger, RecipeBook, UnknownLocationPolicy};
use tamal_store::schema::{self, MENU, RECETAS, VENTAS};
use tamal_store::{ResilientStore, SnapshotStore, SqliteStore, Table};
use tracing::{error, info, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{BusinessSettings, EngineConfig};
use crate::error::{EngineError, EngineResult};
use crate::locks::TableLocks;

/// The transactional service over a snapshot store.
pub struct Engine<S> {
    store: S,
    locks: TableLocks,
    clock: Arc<dyn Clock>,
    location_policy: UnknownLocationPolicy,
    business: BusinessSettings,
}

impl<S: SnapshotStore> Engine<S> {
    /// An engine with the system clock and default settings.
    pub fn new(store: S) -> Self {
        Engine {
            store,
            locks: TableLocks::new(),
            clock: Arc::new(SystemClock),
            location_policy: UnknownLocationPolicy::default(),
            business: BusinessSettings::default(),
        }
    }

    /// An engine over `store` using the ledger and business settings of
    /// `config`. Store settings are ignored; see [`Engine::open`].
    pub fn with_config(store: S, config: &EngineConfig) -> Self {
        Engine::new(store)
            .with_location_policy(config.ledger.unknown_location)
            .with_business(config.business.clone())
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_location_policy(mut self, policy: UnknownLocationPolicy) -> Self {
        self.location_policy = policy;
        self
    }

    pub fn with_business(mut self, business: BusinessSettings) -> Self {
        self.business = business;
        self
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn business(&self) -> &BusinessSettings {
        &self.business
    }

    pub fn location_policy(&self) -> UnknownLocationPolicy {
        self.location_policy
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Current catalog.
    pub async fn load_catalog(&self) -> EngineResult<Catalog> {
        let (catalog, _) = self.read_catalog().await?;
        Ok(catalog)
    }

    /// Current ledger.
    pub async fn load_ledger(&self) -> EngineResult<Ledger> {
        let (ledger, _) = self.read_ledger().await?;
        Ok(ledger)
    }

    /// Current recipe rows.
    pub async fn load_recipes(&self) -> EngineResult<RecipeBook> {
        let (book, _) = self.read_recipes().await?;
        Ok(book)
    }

    /// Writes the starter catalog when `menu` holds no products.
    ///
    /// ## Returns
    /// `true` if the catalog was written.
    pub async fn initialize_catalog(&self) -> EngineResult<bool> {
        let _guard = self.locks.acquire(&[MENU]).await;

        let (existing, _) = self.read_catalog().await?;
        if !existing.is_empty() {
            info!(products = existing.len(), "Catalog already initialized");
            return Ok(false);
        }

        let catalog = default_catalog();
        self.save_catalog(&catalog).await?;
        info!(products = catalog.len(), "Default catalog written");
        Ok(true)
    }

    // =========================================================================
    // Table I/O
    // =========================================================================
    // Each read also returns the raw table so a failed multi-table save can
    // put it back exactly as it was.

    async fn read_catalog(&self) -> EngineResult<(Catalog, Table)> {
        let table = self.store.load(MENU).await?;
        let catalog = schema::decode_catalog(&table)?;
        Ok((catalog, table))
    }

    async fn read_ledger(&self) -> EngineResult<(Ledger, Table)> {
        let table = self.store.load(VENTAS).await?;
        Ok((schema::decode_ledger(&table), table))
    }

    async fn read_recipes(&self) -> EngineResult<(RecipeBook, Table)> {
        let table = self.store.load(RECETAS).await?;
        Ok((schema::decode_recipes(&table), table))
    }

    async fn save_catalog(&self, catalog: &Catalog) -> EngineResult<()> {
        self.store.save(MENU, &schema::encode_catalog(catalog)).await?;
        Ok(())
    }

    async fn save_ledger(&self, ledger: &Ledger) -> EngineResult<()> {
        self.store.save(VENTAS, &schema::encode_ledger(ledger)).await?;
        Ok(())
    }

    async fn save_recipes(&self, book: &RecipeBook) -> EngineResult<()> {
        self.store.save(RECETAS, &schema::encode_recipes(book)).await?;
        Ok(())
    }

    /// Puts `previous` back after a later save in the same operation failed.
    ///
    /// Returns the original failure either way; a failed restore is logged
    /// because the two tables now disagree.
    async fn restore(&self, table: &str, previous: &Table, failure: EngineError) -> EngineError {
        warn!(table = %table, error = %failure, "Save failed, restoring previous snapshot");
        if let Err(restore_err) = self.store.save(table, previous).await {
            error!(
                table = %table,
                error = %restore_err,
                "Could not restore snapshot; tables may be inconsistent"
            );
        }
        failure
    }
}

impl Engine<ResilientStore<SqliteStore>> {
    /// Opens the configured SQLite file behind the configured retry policy.
    pub async fn open(config: &EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        let sqlite = SqliteStore::new(config.sqlite_config()?).await?;
        let store = ResilientStore::new(sqlite, config.retry_policy());
        info!(store_name = %config.business.store_name, "Engine ready");
        Ok(Engine::with_config(store, config))
    }
}
