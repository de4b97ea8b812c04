//! # Error Types
//!
//! Domain-specific error types for tamal-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  tamal-core errors (this file)                                         │
//! │  ├── CoreError        - Business rule violations                       │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  tamal-store errors (separate crate)                                   │
//! │  └── StoreError       - Snapshot load/save failures                    │
//! │                                                                         │
//! │  tamal-engine errors                                                   │
//! │  └── EngineError      - What the UI collaborator sees                  │
//! │                                                                         │
//! │  Flow: ValidationError → CoreError → EngineError ← StoreError          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Design Principles
//! 1. Use `thiserror` for derive macros (not manual impl)
//! 2. Name the failed precondition (product, location, quantities)
//! 3. Every variant is detected before any mutation is applied

use thiserror::Error;

use crate::types::Location;

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoreError {
    /// Product name does not exist in the catalog.
    #[error("Unknown product: {0}")]
    UnknownProduct(String),

    /// Product name is already taken.
    #[error("Product already exists: {0}")]
    DuplicateProduct(String),

    /// A stock decrement would drive a location negative.
    ///
    /// ## User Workflow
    /// ```text
    /// Checkout 5 × Tamal Verde at Feria
    ///      │
    ///      ▼
    /// Check stock: available=3
    ///      │
    ///      ▼
    /// InsufficientStock { product: "Tamal Verde", location: Feria, available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// UI shows: "Only 3 Tamal Verde at Feria"
    /// ```
    #[error("Insufficient stock for {product} at {location}: available {available}, requested {requested}")]
    InsufficientStock {
        product: String,
        location: Location,
        available: i64,
        requested: i64,
    },

    /// Checkout was called with no lines.
    #[error("Cart is empty")]
    EmptyCart,

    /// No ledger line carries this ticket id.
    #[error("Ticket not found: {0}")]
    TicketNotFound(String),

    /// Recipe yield must be at least one piece.
    #[error("Invalid yield: {0} (must be at least 1)")]
    InvalidYield(u32),

    /// A stored location label does not map to a known stock column.
    #[error("Unknown location '{label}' on ticket {ticket_id}")]
    UnknownLocation { label: String, ticket_id: String },

    /// Amount tendered does not cover the ticket total.
    #[error("Payment of {tendered} cents does not cover total of {total} cents")]
    InsufficientPayment { total: i64, tendered: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when caller input doesn't meet requirements.
/// Used for early validation before business logic runs.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Value must be zero or greater.
    #[error("{field} must not be negative")]
    MustNotBeNegative { field: String },

    /// Measurement is NaN or infinite.
    #[error("{field} must be a finite number")]
    NotFinite { field: String },

    /// Invalid format or combination of arguments.
    #[error("{field} is invalid: {reason}")]
    Invalid { field: String, reason: String },
}

impl ValidationError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ValidationError::Invalid {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Result Type Alias
// =============================================================================

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
