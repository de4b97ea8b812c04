//! # tamal-engine: Transactional Engine for Tamal POS
//!
//! The layer a UI calls. It owns the read-modify-write cycle of every
//! operation and the locks that keep two of them from interleaving.
//!
//! ## Module Organization
//! ```text
//! tamal_engine/
//! ├── lib.rs          ◄─── You are here (exports)
//! ├── engine/
//! │   ├── mod.rs      ◄─── Engine struct, table I/O, restore on failure
//! │   ├── catalog.rs  ◄─── create/remove/pricing, stock adjust, transfer
//! │   ├── sales.rs    ◄─── checkout, cancel
//! │   ├── recipes.rs  ◄─── recipe select/commit, recipe table edits
//! │   └── reports.rs  ◄─── KPIs, peak hours, profitability, history
//! ├── locks.rs        ◄─── Per-table async mutexes, sorted acquisition
//! ├── clock.rs        ◄─── Ticket timestamps (system or fixed)
//! ├── config.rs       ◄─── tamal.toml + TAMAL_* environment
//! ├── telemetry.rs    ◄─── tracing subscriber setup
//! └── error.rs        ◄─── EngineError + ErrorCode
//! ```
//!
//! ## Session State
//! The cart and the recipe working list belong to the caller's session
//! ([`CartSession`](tamal_core::CartSession),
//! [`RecipeSession`](tamal_core::RecipeSession)). The engine borrows them
//! per call and keeps no per-user state of its own.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use tamal_engine::{telemetry, Engine, EngineConfig};
//! use tamal_core::{CartSession, Location};
//!
//! telemetry::init_tracing();
//! let config = EngineConfig::load(None)?;
//! let engine = Engine::open(&config).await?;
//! engine.initialize_catalog().await?;
//!
//! let mut cart = CartSession::new();
//! cart.add("Tamal Verde", 3)?;
//! let ticket = engine.checkout(&mut cart, Location::Local1).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod clock;
pub mod config;
pub mod engine;
pub mod error;
pub mod locks;
pub mod telemetry;

// =============================================================================
// Re-exports
// =============================================================================

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::{ConfigError, EngineConfig};
pub use engine::{Engine, ReportFilter};
pub use error::{EngineError, EngineResult, ErrorCode};
