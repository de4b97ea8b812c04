//! # Resilient Store
//!
//! Bounded timeout and retry around any [`SnapshotStore`].
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     ResilientStore call                                 │
//! │                                                                         │
//! │  attempt 1 ──► timeout(call_timeout, inner.load/save)                  │
//! │      │                                                                  │
//! │      ├── Ok ───────────────────────────────► return                    │
//! │      ├── WriteFailed / Corrupt ────────────► return (not retried)      │
//! │      └── Unavailable / Timeout                                          │
//! │              │                                                          │
//! │              ▼                                                          │
//! │      sleep(backoff) ──► attempt 2 ──► ... ──► attempt max_attempts     │
//! │                                                   │                     │
//! │                                                   ▼                     │
//! │                               StoreError::Unavailable(last failure)    │
//! │                                                                         │
//! │  BACKOFF (exponential, jittered): 100ms, 200ms, 400ms ... max 2s        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine itself never retries; this adapter is the only retry policy.

use async_trait::async_trait;
use backoff::backoff::Backoff;
use backoff::ExponentialBackoff;
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::store::SnapshotStore;
use crate::table::Table;

/// Timeout and retry settings for store calls.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Limit for one load or save call.
    pub call_timeout: Duration,

    /// Total attempts per call, including the first (minimum 1).
    pub max_attempts: u32,

    pub initial_backoff: Duration,

    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            call_timeout: Duration::from_secs(10),
            max_attempts: 3,
            initial_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    /// One attempt, no sleeping.
    pub fn no_retry(call_timeout: Duration) -> Self {
        RetryPolicy {
            call_timeout,
            max_attempts: 1,
            ..Default::default()
        }
    }

    fn create_backoff(&self) -> ExponentialBackoff {
        ExponentialBackoff {
            initial_interval: self.initial_backoff,
            max_interval: self.max_backoff,
            multiplier: 2.0,
            max_elapsed_time: None,
            ..Default::default()
        }
    }
}

/// Wraps a store with per-call timeouts and retries.
#[derive(Debug, Clone)]
pub struct ResilientStore<S> {
    inner: S,
    policy: RetryPolicy,
}

impl<S: SnapshotStore> ResilientStore<S> {
    pub fn new(inner: S, policy: RetryPolicy) -> Self {
        ResilientStore { inner, policy }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    async fn call<T, F, Fut>(&self, op: &str, table: &str, mut attempt_call: F) -> StoreResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = StoreResult<T>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut backoff = self.policy.create_backoff();
        let mut attempt = 0;

        loop {
            attempt += 1;
            let failure = match timeout(self.policy.call_timeout, attempt_call()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(err)) if !err.is_transient() => return Err(err),
                Ok(Err(err)) => err,
                Err(_) => StoreError::Timeout(self.policy.call_timeout),
            };

            if attempt >= max_attempts {
                warn!(op = %op, table = %table, attempts = attempt, error = %failure, "Store call gave up");
                return Err(StoreError::Unavailable(format!(
                    "{} '{}' failed after {} attempt(s): {}",
                    op, table, attempt, failure
                )));
            }

            let Some(delay) = backoff.next_backoff() else {
                return Err(StoreError::Unavailable(failure.to_string()));
            };
            debug!(op = %op, table = %table, attempt, ?delay, error = %failure, "Retrying store call");
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl<S: SnapshotStore> SnapshotStore for ResilientStore<S> {
    async fn load(&self, table: &str) -> StoreResult<Table> {
        self.call("load", table, || self.inner.load(table)).await
    }

    async fn save(&self, table: &str, snapshot: &Table) -> StoreResult<()> {
        self.call("save", table, || self.inner.save(table, snapshot)).await
    }
}
