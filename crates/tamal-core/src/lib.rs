//! # tamal-core: Pure Business Logic for Tamal POS
//!
//! This crate is the **heart** of Tamal POS. It contains the transactional
//! rules of the ledger and inventory engine as pure functions with zero I/O
//! dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Tamal POS Architecture                           │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                UI collaborator (out of tree)                    │   │
//! │  │    Menu grid ──► Cart ──► Checkout ──► History / Dashboard      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tamal-engine                                 │   │
//! │  │    load ─► mutate ─► save, one table lock per snapshot          │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ tamal-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │ catalog │ │ ledger  │ │  cart   │ │ recipe  │ │ report  │  │   │
//! │  │   │ stock   │ │ tickets │ │ session │ │ costing │ │  KPIs   │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO STORE • NO CLOCK • PURE FUNCTIONS                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    tamal-store (Snapshot Store)                 │   │
//! │  │              menu / ventas / recetas tables                     │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Location, LineItem, Ticket, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`catalog`] - Product catalog and per-location stock
//! - [`ledger`] - Ticket log, checkout and cancellation
//! - [`cart`] - Per-session cart context
//! - [`recipe`] - Recipe costing working set
//! - [`report`] - Sales aggregations
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use tamal_core::{Catalog, Category, Location, Money, Product};
//!
//! let mut catalog = Catalog::default();
//! let mut tamal = Product::new(
//!     "Tamal Verde",
//!     Category::Tamales,
//!     Money::from_cents(2000),
//!     Money::from_cents(850),
//! );
//! tamal.stock.set(Location::Local1, 50);
//! catalog.create(tamal).unwrap();
//!
//! let remaining = catalog.adjust_stock("Tamal Verde", Location::Local1, -3).unwrap();
//! assert_eq!(remaining, 47);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod error;
pub mod ledger;
pub mod money;
pub mod recipe;
pub mod report;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use cart::{change_due, CartSession};
pub use catalog::{Catalog, PricingUpdate, StockDelta, TransferReceipt};
pub use error::{CoreError, CoreResult, ValidationError};
pub use ledger::{CancelledTicket, CartLine, Ledger};
pub use money::Money;
pub use recipe::{CostingMode, IngredientInput, IngredientLine, RecipeBook, RecipeCommit, RecipeSession};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum distinct products allowed in a single cart.
pub const MAX_CART_ITEMS: usize = 100;

/// Maximum quantity of a single product in one cart line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (e.g., typing 1000 instead of 10).
pub const MAX_ITEM_QUANTITY: i64 = 999;

/// Suggested price multipliers applied to unit cost (about 33% and 66% margin).
pub const SUGGESTED_PRICE_FACTORS: [(u32, u32); 2] = [(3, 2), (3, 1)];

/// The catalog written when a store is initialized for the first time.
pub fn default_catalog() -> Catalog {
    let mut product = Product::new(
        "Tamal Verde",
        Category::Tamales,
        Money::from_cents(2000),
        Money::from_cents(850),
    );
    product.stock.set(Location::Local1, 50);
    product.stock.set(Location::Local2, 30);
    product.stock.set(Location::Feria, 0);

    Catalog::from_products(vec![product]).unwrap_or_default()
}
