//! # Engine Configuration
//!
//! Settings loaded once at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`TAMAL_*`)
//! 2. Config file (`tamal.toml`)
//! 3. Defaults (this file)
//!
//! ```toml
//! [store]
//! path = "/var/lib/tamal/tamal.db"
//! call_timeout_ms = 10000
//! max_attempts = 3
//! initial_backoff_ms = 100
//! max_backoff_ms = 2000
//!
//! [ledger]
//! unknown_location = "reject"   # or "fallback_first"
//!
//! [business]
//! store_name = "Tamales Doña Mary"
//! currency_symbol = "$"
//! ```
//!
//! Configuration is read-only once the engine is built.

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tamal_core::{Money, UnknownLocationPolicy};
use tamal_store::{RetryPolicy, SqliteConfig};
use thiserror::Error;
use tracing::{debug, info};

/// File name looked up in the platform config directory.
pub const CONFIG_FILE_NAME: &str = "tamal.toml";

/// File name of the snapshot database in the platform data directory.
pub const DATABASE_FILE_NAME: &str = "tamal.db";

/// Configuration error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Could not write config file {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Could not serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Invalid value for {field}: {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Could not determine the platform data directory")]
    NoDataDir,
}

impl ConfigError {
    fn invalid(field: &str, reason: impl Into<String>) -> Self {
        ConfigError::InvalidValue {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

// =============================================================================
// Sections
// =============================================================================

/// `[store]`: where snapshots live and how hard to try.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    /// SQLite file. Default: `tamal.db` in the platform data directory.
    pub path: Option<PathBuf>,

    /// Limit for a single load or save, in milliseconds.
    pub call_timeout_ms: u64,

    /// Attempts per store call, including the first.
    pub max_attempts: u32,

    pub initial_backoff_ms: u64,

    pub max_backoff_ms: u64,
}

impl Default for StoreSettings {
    fn default() -> Self {
        StoreSettings {
            path: None,
            call_timeout_ms: 10_000,
            max_attempts: 3,
            initial_backoff_ms: 100,
            max_backoff_ms: 2_000,
        }
    }
}

/// `[ledger]`: how stored sales are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerSettings {
    pub unknown_location: UnknownLocationPolicy,
}

/// `[business]`: display settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusinessSettings {
    pub store_name: String,
    pub currency_symbol: String,
}

impl Default for BusinessSettings {
    fn default() -> Self {
        BusinessSettings {
            store_name: "Tamal POS".to_string(),
            currency_symbol: "$".to_string(),
        }
    }
}

impl BusinessSettings {
    /// Formats an amount with the configured symbol.
    ///
    /// ## Example
    /// ```rust
    /// # use tamal_engine::config::BusinessSettings;
    /// # use tamal_core::Money;
    /// let business = BusinessSettings::default();
    /// assert_eq!(business.format_money(Money::from_cents(1234)), "$12.34");
    /// ```
    pub fn format_money(&self, amount: Money) -> String {
        format!(
            "{}{}{}.{:02}",
            if amount.is_negative() { "-" } else { "" },
            self.currency_symbol,
            amount.dollars().abs(),
            amount.cents_part().abs()
        )
    }
}

// =============================================================================
// EngineConfig
// =============================================================================

/// Full engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub store: StoreSettings,
    pub ledger: LedgerSettings,
    pub business: BusinessSettings,
}

impl EngineConfig {
    /// Loads defaults, then the config file, then `TAMAL_*` variables.
    ///
    /// With `path = None` the platform config directory is searched; a
    /// missing file there is not an error. An explicit path must exist.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => match default_config_path() {
                Some(path) if path.exists() => Self::from_file(&path)?,
                _ => {
                    debug!("No config file found, using defaults");
                    EngineConfig::default()
                }
            },
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Reads a TOML file. Missing sections and keys take their defaults.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Loaded config file");
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Overrides settings from environment variables.
    ///
    /// ## Environment Variables
    /// - `TAMAL_DB_PATH`: SQLite file
    /// - `TAMAL_STORE_TIMEOUT_MS`: per-call timeout
    /// - `TAMAL_STORE_MAX_ATTEMPTS`: attempts per call
    /// - `TAMAL_UNKNOWN_LOCATION`: `reject` or `fallback_first`
    /// - `TAMAL_STORE_NAME`: display name
    ///
    /// `lookup` is `std::env::var` in production and a map in tests.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("TAMAL_DB_PATH") {
            self.store.path = Some(PathBuf::from(path));
        }

        if let Some(value) = lookup("TAMAL_STORE_TIMEOUT_MS") {
            self.store.call_timeout_ms = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid("TAMAL_STORE_TIMEOUT_MS", "expected milliseconds"))?;
        }

        if let Some(value) = lookup("TAMAL_STORE_MAX_ATTEMPTS") {
            self.store.max_attempts = value
                .trim()
                .parse()
                .map_err(|_| ConfigError::invalid("TAMAL_STORE_MAX_ATTEMPTS", "expected a count"))?;
        }

        if let Some(value) = lookup("TAMAL_UNKNOWN_LOCATION") {
            self.ledger.unknown_location = match value.trim() {
                "reject" => UnknownLocationPolicy::Reject,
                "fallback_first" => UnknownLocationPolicy::FallbackFirst,
                other => {
                    return Err(ConfigError::invalid(
                        "TAMAL_UNKNOWN_LOCATION",
                        format!("'{}' is not reject or fallback_first", other),
                    ))
                }
            };
        }

        if let Some(name) = lookup("TAMAL_STORE_NAME") {
            self.business.store_name = name;
        }

        Ok(())
    }

    /// Rejects settings the engine cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.store.call_timeout_ms == 0 {
            return Err(ConfigError::invalid("store.call_timeout_ms", "must be positive"));
        }
        if self.store.max_attempts == 0 {
            return Err(ConfigError::invalid("store.max_attempts", "must be at least 1"));
        }
        if self.store.initial_backoff_ms > self.store.max_backoff_ms {
            return Err(ConfigError::invalid(
                "store.initial_backoff_ms",
                "must not exceed store.max_backoff_ms",
            ));
        }
        if self.business.store_name.trim().is_empty() {
            return Err(ConfigError::invalid("business.store_name", "must not be empty"));
        }
        Ok(())
    }

    /// Writes the configuration as TOML, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let text = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: parent.to_path_buf(),
                source,
            })?;
        }
        std::fs::write(path, text).map_err(|source| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), "Saved config file");
        Ok(())
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            call_timeout: Duration::from_millis(self.store.call_timeout_ms),
            max_attempts: self.store.max_attempts,
            initial_backoff: Duration::from_millis(self.store.initial_backoff_ms),
            max_backoff: Duration::from_millis(self.store.max_backoff_ms),
        }
    }

    /// SQLite settings for the configured (or platform default) path.
    pub fn sqlite_config(&self) -> Result<SqliteConfig, ConfigError> {
        let path = match &self.store.path {
            Some(path) => path.clone(),
            None => default_database_path().ok_or(ConfigError::NoDataDir)?,
        };
        Ok(SqliteConfig::new(path)
            .connect_timeout(Duration::from_millis(self.store.call_timeout_ms)))
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("com", "tamal", "pos")
}

/// `tamal.toml` in the platform config directory.
///
/// - **Linux**: `~/.config/pos/tamal.toml`
/// - **macOS**: `~/Library/Application Support/com.tamal.pos/tamal.toml`
pub fn default_config_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

/// `tamal.db` in the platform data directory.
pub fn default_database_path() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.data_dir().join(DATABASE_FILE_NAME))
}
