//! # Store Error Types
//!
//! Error types for snapshot store operations.
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite error (sqlx::Error) / tokio timeout                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  StoreError (this module) ← Adds table context and categorization      │
//! │       │                                                                 │
//! │       ├── transient? ──► ResilientStore retries with backoff           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  EngineError (tamal-engine) ← What the UI collaborator sees            │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Nothing here is swallowed: a failed load is an error, never an empty
//! table.

use std::time::Duration;
use thiserror::Error;

/// Snapshot store errors.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The backend could not be reached.
    ///
    /// ## When This Occurs
    /// - Pool closed or exhausted
    /// - I/O error opening the database file
    /// - Every retry attempt failed or timed out
    #[error("Snapshot store unavailable: {0}")]
    Unavailable(String),

    /// The backend rejected a save.
    ///
    /// ## When This Occurs
    /// - Read-only database file
    /// - Constraint or disk-full error while writing
    #[error("Failed to save table '{table}': {reason}")]
    WriteFailed { table: String, reason: String },

    /// A single call took longer than the configured timeout.
    #[error("Store call timed out after {0:?}")]
    Timeout(Duration),

    /// A persisted snapshot could not be decoded.
    ///
    /// ## When This Occurs
    /// - Payload JSON is not a header plus rows
    /// - Two `menu` rows share a product name
    #[error("Table '{table}' is corrupt: {reason}")]
    Corrupt { table: String, reason: String },

    /// Migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),
}

impl StoreError {
    pub fn write_failed(table: impl Into<String>, reason: impl ToString) -> Self {
        StoreError::WriteFailed {
            table: table.into(),
            reason: reason.to_string(),
        }
    }

    pub fn corrupt(table: impl Into<String>, reason: impl ToString) -> Self {
        StoreError::Corrupt {
            table: table.into(),
            reason: reason.to_string(),
        }
    }

    /// Whether retrying the same call could succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Timeout(_))
    }
}

impl StoreError {
    /// Maps a failed read of `table`.
    ///
    /// A database error other than lock contention means the schema is not
    /// what the store expects (e.g. migrations never ran).
    pub fn on_load(table: &str, err: sqlx::Error) -> Self {
        match rejected_by_database(err) {
            Ok(unavailable) => unavailable,
            Err(reason) => StoreError::corrupt(table, reason),
        }
    }

    /// Maps a failed write of `table`.
    pub fn on_save(table: &str, err: sqlx::Error) -> Self {
        match rejected_by_database(err) {
            Ok(unavailable) => unavailable,
            Err(reason) => StoreError::write_failed(table, reason),
        }
    }
}

/// Splits sqlx errors into "backend unreachable" (`Ok`) and "statement
/// rejected" (`Err` with the database message).
fn rejected_by_database(err: sqlx::Error) -> Result<StoreError, String> {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = db_err.message();
            if msg.contains("locked") || msg.contains("busy") {
                Ok(StoreError::Unavailable(msg.to_string()))
            } else {
                Err(msg.to_string())
            }
        }

        sqlx::Error::PoolTimedOut => Ok(StoreError::Unavailable("Connection pool exhausted".to_string())),

        sqlx::Error::PoolClosed => Ok(StoreError::Unavailable("Pool is closed".to_string())),

        other => Ok(StoreError::Unavailable(other.to_string())),
    }
}

/// Convert sqlx errors to StoreError when no single table is involved.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::PoolTimedOut / PoolClosed / Io  → StoreError::Unavailable
/// sqlx::Error::Database (locked / busy)        → StoreError::Unavailable
/// sqlx::Error::Database (other)                → StoreError::Corrupt ("snapshots")
/// Other                                        → StoreError::Unavailable
/// ```
///
/// Loads and saves use [`StoreError::on_load`] / [`StoreError::on_save`]
/// so the error names the table and the direction.
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::on_load("snapshots", err)
    }
}

impl From<sqlx::migrate::MigrateError> for StoreError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        StoreError::Migration(err.to_string())
    }
}

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(StoreError::Unavailable("down".into()).is_transient());
        assert!(StoreError::Timeout(Duration::from_millis(10)).is_transient());
        assert!(!StoreError::write_failed("menu", "read-only").is_transient());
        assert!(!StoreError::corrupt("menu", "bad json").is_transient());
    }

    #[test]
    fn test_pool_errors_stay_transient_in_both_directions() {
        assert!(StoreError::on_load("menu", sqlx::Error::PoolClosed).is_transient());
        assert!(StoreError::on_save("menu", sqlx::Error::PoolTimedOut).is_transient());
    }

    #[test]
    fn test_pool_errors_are_unavailable() {
        let err: StoreError = sqlx::Error::PoolTimedOut.into();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
