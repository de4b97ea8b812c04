//! # Telemetry
//!
//! Tracing subscriber setup for binaries and hosts embedding the engine.
//!
//! ## Log Levels
//! - `RUST_LOG=debug` - Show debug messages, including every store call
//! - `RUST_LOG=tamal_engine=trace` - Also show table lock acquisition
//! - Default: `info,tamal=debug,sqlx=warn`

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "info,tamal=debug,sqlx=warn";

/// Builds the filter from `RUST_LOG`, falling back to [`DEFAULT_FILTER`].
pub fn env_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Installs the global fmt subscriber.
///
/// Safe to call more than once: later calls leave the first subscriber in
/// place.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter())
        .with_target(true)
        .try_init();
}
