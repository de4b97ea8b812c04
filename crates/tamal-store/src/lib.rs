//! # tamal-store: Snapshot Store for Tamal POS
//!
//! Every table the engine reads or writes goes through this crate, in full:
//! a named table is loaded whole and saved whole.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tamal POS Data Flow                              │
//! │                                                                         │
//! │  Engine::checkout                                                      │
//! │       │  Catalog / Ledger / RecipeBook (tamal-core records)            │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                   tamal-store (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │    schema     │    │ SnapshotStore │    │  Migrations  │  │   │
//! │  │   │               │    │               │    │  (embedded)  │  │   │
//! │  │   │ records <->   │───►│ MemoryStore   │    │ 001_snap-    │  │   │
//! │  │   │ Table cells   │    │ SqliteStore   │◄───│ shots.sql    │  │   │
//! │  │   │ normalization │    │ ResilientStore│    │              │  │   │
//! │  │   └───────────────┘    └───────────────┘    └──────────────┘  │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │          SQLite file (menu / ventas / recetas snapshots)        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`store`] - The `SnapshotStore` trait and the in-memory store
//! - [`sqlite`] - SQLite-backed store and its configuration
//! - [`retry`] - Timeout and bounded retry around any store
//! - [`schema`] - Table layouts and record conversion
//! - [`table`] - Tabular snapshot and cell parsing
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Store error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tamal_store::{schema, ResilientStore, RetryPolicy, SnapshotStore, SqliteConfig, SqliteStore};
//!
//! let sqlite = SqliteStore::new(SqliteConfig::new("tamal.db")).await?;
//! let store = ResilientStore::new(sqlite, RetryPolicy::default());
//!
//! let catalog = schema::decode_catalog(&store.load(schema::MENU).await?)?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod retry;
pub mod schema;
pub mod sqlite;
pub mod store;
pub mod table;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{StoreError, StoreResult};
pub use retry::{ResilientStore, RetryPolicy};
pub use sqlite::{SqliteConfig, SqliteStore};
pub use store::{MemoryStore, SnapshotStore};
pub use table::Table;
