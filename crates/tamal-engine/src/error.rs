//! # Engine Error Type
//!
//! The single error type the UI collaborator sees.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Tamal POS                              │
//! │                                                                         │
//! │  Engine::checkout                                                      │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  ┌──────────────────────────────────────────────────────────────────┐  │
//! │  │  load tables ─── StoreError::Unavailable ─────────┐             │  │
//! │  │         │                                          │             │  │
//! │  │         ▼                                          ▼             │  │
//! │  │  tamal-core ─── CoreError::InsufficientStock ── EngineError ───►│  │
//! │  │         │                                          ▲             │  │
//! │  │         ▼                                          │             │  │
//! │  │  save tables ─── StoreError::WriteFailed ──────────┘             │  │
//! │  │         │                                                        │  │
//! │  │         ▼                                                        │  │
//! │  │  Ok(Ticket) ───────────────────────────────────────────────────►│  │
//! │  └──────────────────────────────────────────────────────────────────┘  │
//! │                                                                         │
//! │  error.code()    → INSUFFICIENT_STOCK  (for branching)                 │
//! │  error.to_string → "Insufficient stock for Tamal Verde at Feria: ..."  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use serde::Serialize;
use tamal_core::{CoreError, ValidationError};
use tamal_store::StoreError;
use thiserror::Error;

use crate::config::ConfigError;

/// Errors returned by [`Engine`](crate::Engine) operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A business rule rejected the operation. Nothing was saved.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Loading or saving a table failed.
    ///
    /// ## When This Occurs
    /// - Store timed out or exhausted its retries (`Unavailable`)
    /// - Store rejected a save (`WriteFailed`)
    /// - A persisted table could not be decoded (`Corrupt`)
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Configuration could not be loaded or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl From<ValidationError> for EngineError {
    fn from(err: ValidationError) -> Self {
        EngineError::Core(CoreError::Validation(err))
    }
}

/// Machine-readable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    NotFound,
    ValidationError,
    InsufficientStock,
    CartError,
    PaymentError,
    BusinessLogic,
    StoreUnavailable,
    StoreError,
    ConfigError,
}

impl EngineError {
    /// Category for programmatic handling.
    pub fn code(&self) -> ErrorCode {
        match self {
            EngineError::Core(err) => match err {
                CoreError::UnknownProduct(_) | CoreError::TicketNotFound(_) => ErrorCode::NotFound,
                CoreError::InsufficientStock { .. } => ErrorCode::InsufficientStock,
                CoreError::EmptyCart => ErrorCode::CartError,
                CoreError::InsufficientPayment { .. } => ErrorCode::PaymentError,
                CoreError::Validation(_) | CoreError::InvalidYield(_) => ErrorCode::ValidationError,
                CoreError::DuplicateProduct(_) | CoreError::UnknownLocation { .. } => {
                    ErrorCode::BusinessLogic
                }
            },
            EngineError::Store(err) if err.is_transient() => ErrorCode::StoreUnavailable,
            EngineError::Store(_) => ErrorCode::StoreError,
            EngineError::Config(_) => ErrorCode::ConfigError,
        }
    }

    /// Whether the same call may succeed later without any input change.
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Store(err) if err.is_transient())
    }
}

/// Convenience type alias for engine results.
pub type EngineResult<T> = Result<T, EngineError>;
