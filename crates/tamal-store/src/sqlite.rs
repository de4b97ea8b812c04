//! # SQLite Snapshot Store
//!
//! A [`SnapshotStore`] backed by one SQLite file.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         snapshots table                                 │
//! │                                                                         │
//! │  name     │ header (JSON)          │ rows (JSON)          │ row_count  │
//! │  ─────────┼────────────────────────┼──────────────────────┼─────────── │
//! │  menu     │ ["Categoria", ...]     │ [["🌽 Tamales", ...]] │ 1          │
//! │  ventas   │ ["Ticket_ID", ...]     │ [[...], [...]]        │ 2          │
//! │  recetas  │ ["Producto", ...]      │ []                    │ 0          │
//! │                                                                         │
//! │  save = one INSERT ... ON CONFLICT DO UPDATE → atomic per table         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## WAL Mode
//! WAL journaling lets a reader load one table while another table is being
//! saved.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, info};

use crate::error::{StoreError, StoreResult};
use crate::migrations;
use crate::store::SnapshotStore;
use crate::table::Table;

// =============================================================================
// Configuration
// =============================================================================

/// SQLite store configuration.
///
/// ## Example
/// ```rust,ignore
/// let config = SqliteConfig::new("/path/to/tamal.db")
///     .max_connections(2)
///     .connect_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct SqliteConfig {
    /// Path to the SQLite database file, or `:memory:`.
    pub database_path: PathBuf,

    /// Default: 4
    pub max_connections: u32,

    /// Default: 1
    pub min_connections: u32,

    /// Default: 10 seconds
    pub connect_timeout: Duration,

    /// Default: 10 minutes. Ignored for in-memory databases.
    pub idle_timeout: Duration,

    /// Default: true
    pub run_migrations: bool,
}

impl SqliteConfig {
    /// Creates a configuration for a database file, created if missing.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        SqliteConfig {
            database_path: path.into(),
            max_connections: 4,
            min_connections: 1,
            connect_timeout: Duration::from_secs(10),
            idle_timeout: Duration::from_secs(600),
            run_migrations: true,
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn min_connections(mut self, min: u32) -> Self {
        self.min_connections = min;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn run_migrations(mut self, run: bool) -> Self {
        self.run_migrations = run;
        self
    }

    /// An isolated in-memory database (for tests).
    ///
    /// Uses a single connection that is never recycled, because each SQLite
    /// in-memory connection is its own database.
    pub fn in_memory() -> Self {
        SqliteConfig {
            database_path: PathBuf::from(":memory:"),
            max_connections: 1,
            min_connections: 1,
            connect_timeout: Duration::from_secs(5),
            idle_timeout: Duration::from_secs(60),
            run_migrations: true,
        }
    }

    fn is_memory(&self) -> bool {
        self.database_path.as_os_str() == ":memory:"
    }
}

// =============================================================================
// SqliteStore
// =============================================================================

/// Snapshot store over a SQLite connection pool.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Opens (or creates) the database and runs migrations if enabled.
    ///
    /// ## What This Does
    /// 1. Creates the database file if it doesn't exist
    /// 2. WAL journal, NORMAL synchronous
    /// 3. Creates the connection pool
    /// 4. Runs migrations (if enabled)
    pub async fn new(config: SqliteConfig) -> StoreResult<Self> {
        info!(
            path = %config.database_path.display(),
            "Opening snapshot database"
        );

        let connect_options = if config.is_memory() {
            SqliteConnectOptions::from_str("sqlite::memory:")
                .map_err(|e| StoreError::Unavailable(e.to_string()))?
        } else {
            SqliteConnectOptions::new()
                .filename(&config.database_path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal)
        }
        .synchronous(SqliteSynchronous::Normal)
        .foreign_keys(true);

        let mut pool_options = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections)
            .acquire_timeout(config.connect_timeout);
        pool_options = if config.is_memory() {
            pool_options.idle_timeout(None).max_lifetime(None)
        } else {
            pool_options.idle_timeout(Some(config.idle_timeout))
        };

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        info!(max_connections = config.max_connections, "Snapshot pool created");

        let store = SqliteStore { pool };
        if config.run_migrations {
            store.run_migrations().await?;
        }
        Ok(store)
    }

    /// Shorthand for an in-memory store with migrations applied.
    pub async fn in_memory() -> StoreResult<Self> {
        Self::new(SqliteConfig::in_memory()).await
    }

    pub async fn run_migrations(&self) -> StoreResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Names of every saved table.
    pub async fn table_names(&self) -> StoreResult<Vec<String>> {
        let names = sqlx::query_scalar::<_, String>("SELECT name FROM snapshots ORDER BY name")
            .fetch_all(&self.pool)
            .await?;
        Ok(names)
    }

    /// Closes the pool. Later calls fail with `Unavailable`.
    pub async fn close(&self) {
        info!("Closing snapshot database");
        self.pool.close().await;
    }

    /// Whether the database answers a trivial query.
    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}

#[async_trait]
impl SnapshotStore for SqliteStore {
    async fn load(&self, table: &str) -> StoreResult<Table> {
        let row: Option<(String, String)> =
            sqlx::query_as("SELECT header, rows FROM snapshots WHERE name = ?")
                .bind(table)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| StoreError::on_load(table, e))?;

        let Some((header, rows)) = row else {
            debug!(table = %table, "Table never saved, loading empty");
            return Ok(Table::default());
        };

        let columns: Vec<String> =
            serde_json::from_str(&header).map_err(|e| StoreError::corrupt(table, e))?;
        let rows: Vec<Vec<String>> =
            serde_json::from_str(&rows).map_err(|e| StoreError::corrupt(table, e))?;

        debug!(table = %table, rows = rows.len(), "Loaded table from SQLite");
        Ok(Table::from_parts(columns, rows))
    }

    async fn save(&self, table: &str, snapshot: &Table) -> StoreResult<()> {
        let header =
            serde_json::to_string(snapshot.columns()).map_err(|e| StoreError::write_failed(table, e))?;
        let rows =
            serde_json::to_string(snapshot.rows()).map_err(|e| StoreError::write_failed(table, e))?;

        sqlx::query(
            r#"
            INSERT INTO snapshots (name, header, rows, row_count, updated_at)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(name) DO UPDATE SET
                header = excluded.header,
                rows = excluded.rows,
                row_count = excluded.row_count,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(table)
        .bind(header)
        .bind(rows)
        .bind(snapshot.len() as i64)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| StoreError::on_save(table, e))?;

        debug!(table = %table, rows = snapshot.len(), "Saved table to SQLite");
        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn menu() -> Table {
        Table::from_parts(
            vec!["Producto".into(), "Precio".into()],
            vec![
                vec!["Tamal Verde".into(), "20.00".into()],
                vec!["Atole".into(), "15.00".into()],
            ],
        )
    }

    #[tokio::test]
    async fn test_in_memory_store() {
        let store = SqliteStore::in_memory().await.unwrap();
        assert!(store.health_check().await);
        assert!(store.load("menu").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_then_load() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.save("menu", &menu()).await.unwrap();
        assert_eq!(store.load("menu").await.unwrap(), menu());

        let smaller = Table::new(["Producto", "Precio"]);
        store.save("menu", &smaller).await.unwrap();
        assert_eq!(store.load("menu").await.unwrap(), smaller);
        assert_eq!(store.table_names().await.unwrap(), vec!["menu".to_string()]);
    }

    #[tokio::test]
    async fn test_file_store_persists_across_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tamal.db");

        let store = SqliteStore::new(SqliteConfig::new(&path)).await.unwrap();
        store.save("menu", &menu()).await.unwrap();
        store.close().await;

        let reopened = SqliteStore::new(SqliteConfig::new(&path)).await.unwrap();
        assert_eq!(reopened.load("menu").await.unwrap(), menu());

        let (total, applied) = migrations::migration_status(reopened.pool()).await.unwrap();
        assert_eq!(total, applied);
    }

    #[tokio::test]
    async fn test_closed_pool_is_unavailable() {
        let store = SqliteStore::in_memory().await.unwrap();
        store.close().await;
        assert!(matches!(store.load("menu").await, Err(StoreError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_corrupt_payload() {
        let store = SqliteStore::in_memory().await.unwrap();
        sqlx::query(
            "INSERT INTO snapshots (name, header, rows, row_count, updated_at) VALUES ('menu', 'not json', '[]', 0, '')",
        )
        .execute(store.pool())
        .await
        .unwrap();

        assert!(matches!(store.load("menu").await, Err(StoreError::Corrupt { .. })));
    }

    #[tokio::test]
    async fn test_missing_schema_names_table_and_direction() {
        let store = SqliteStore::new(SqliteConfig::in_memory().run_migrations(false))
            .await
            .unwrap();

        match store.load("menu").await {
            Err(StoreError::Corrupt { table, .. }) => assert_eq!(table, "menu"),
            other => panic!("expected Corrupt, got {other:?}"),
        }
        match store.save("ventas", &menu()).await {
            Err(StoreError::WriteFailed { table, .. }) => assert_eq!(table, "ventas"),
            other => panic!("expected WriteFailed, got {other:?}"),
        }
        assert!(migrations::migration_status(store.pool()).await.is_err());
    }

    #[test]
    fn test_config_builder() {
        let config = SqliteConfig::new("/tmp/tamal.db")
            .max_connections(8)
            .min_connections(2)
            .run_migrations(false);

        assert_eq!(config.max_connections, 8);
        assert_eq!(config.min_connections, 2);
        assert!(!config.run_migrations);
        assert!(SqliteConfig::in_memory().is_memory());
    }
}
