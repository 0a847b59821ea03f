//! Lock manager
//!
//! Implements the acquisition/release protocol over an injected
//! `KeyValueStore`. The manager holds no in-process lock state and is safe
//! to share across any number of workers; all coordination is delegated to
//! the store's atomic primitives.
//!
//! Error policy: every store-communication failure is logged and mapped to
//! the same negative result as contention or ownership mismatch. Callers
//! cannot distinguish "held by someone else" from "store unreachable", and
//! a failed call never creates or destroys a lock record, so no false
//! positive is ever produced.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use keylock_common::is_valid_key;

use crate::retry::RetryPolicy;
use crate::store::KeyValueStore;

use super::model::{LockConfig, LockStats, LockStatsCollector};

/// Distributed mutual-exclusion lock manager
///
/// For a given key, only the party whose token matches the stored value is
/// the owner, and only that party can release the lock. At most one lock
/// record exists per key at any instant.
pub struct LockManager {
    store: Arc<dyn KeyValueStore>,
    config: LockConfig,
    stats: LockStatsCollector,
}

impl LockManager {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self::with_config(store, LockConfig::default())
    }

    pub fn with_config(store: Arc<dyn KeyValueStore>, config: LockConfig) -> Self {
        Self {
            store,
            config,
            stats: LockStatsCollector::default(),
        }
    }

    pub fn config(&self) -> &LockConfig {
        &self.config
    }

    /// Try to acquire the lock once
    ///
    /// Issues a single atomic set-if-absent with TTL against the store.
    /// Returns `true` iff the store accepted the write. Contention,
    /// invalid arguments, and store failures all return `false`.
    pub async fn try_acquire(&self, key: &str, token: &str, ttl_ms: u64) -> bool {
        if !is_valid_key(key) {
            warn!(key, "rejecting acquire: invalid lock key");
            return false;
        }
        if token.is_empty() {
            warn!(key, "rejecting acquire: empty token");
            return false;
        }
        if ttl_ms == 0 {
            warn!(key, "rejecting acquire: ttl must be positive");
            return false;
        }

        let ttl = Duration::from_millis(ttl_ms);
        match self
            .store
            .set_if_absent(key.as_bytes(), token.as_bytes(), ttl)
            .await
        {
            Ok(true) => {
                self.stats.record_acquisition();
                debug!(key, token, ttl_ms, "lock acquired");
                true
            }
            Ok(false) => {
                self.stats.record_contention();
                debug!(key, "lock contended");
                false
            }
            Err(e) => {
                self.stats.record_transport_failure();
                warn!(key, error = %e, "lock acquire failed");
                false
            }
        }
    }

    /// Try to acquire the lock once, with the configured default TTL
    pub async fn try_acquire_default(&self, key: &str, token: &str) -> bool {
        self.try_acquire(key, token, self.config.default_ttl_ms).await
    }

    /// Poll `try_acquire` under a retry policy
    ///
    /// Sleeps a jittered, exponentially growing backoff between attempts.
    /// Returns `false` once the policy's attempt or deadline budget is
    /// exhausted.
    pub async fn acquire_with_retry(
        &self,
        key: &str,
        token: &str,
        ttl_ms: u64,
        policy: &RetryPolicy,
    ) -> bool {
        let started = Instant::now();
        let mut attempt: u32 = 0;

        loop {
            if self.try_acquire(key, token, ttl_ms).await {
                return true;
            }

            attempt += 1;
            if policy.is_exhausted(attempt, started) {
                debug!(key, attempt, "giving up acquisition");
                return false;
            }
            tokio::time::sleep(policy.backoff_for(attempt)).await;
        }
    }

    /// Release the lock
    ///
    /// Executes one atomic compare-and-delete at the store: the key is
    /// deleted iff its current value equals `token`. The compare and the
    /// delete are a single atomic unit; a release never destroys a record
    /// acquired by someone else after this holder's expiry.
    pub async fn release(&self, key: &str, token: &str) -> bool {
        match self
            .store
            .compare_and_delete(key.as_bytes(), token.as_bytes())
            .await
        {
            Ok(true) => {
                self.stats.record_release();
                debug!(key, token, "lock released");
                true
            }
            Ok(false) => {
                self.stats.record_failed_release();
                debug!(key, "release rejected: not the current owner");
                false
            }
            Err(e) => {
                self.stats.record_transport_failure();
                warn!(key, error = %e, "lock release failed");
                false
            }
        }
    }

    /// Read the raw token currently stored under `key`
    ///
    /// Diagnostics only; not part of the mutual-exclusion protocol. Read
    /// failures and undecodable values are logged and surfaced as `None`.
    pub async fn get(&self, key: &str) -> Option<String> {
        match self.store.get(key.as_bytes()).await {
            Ok(Some(value)) => match String::from_utf8(value.to_vec()) {
                Ok(token) => Some(token),
                Err(_) => {
                    warn!(key, "stored lock value is not valid UTF-8");
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                warn!(key, error = %e, "lock read failed");
                None
            }
        }
    }

    /// Current statistics snapshot
    pub fn stats(&self) -> LockStats {
        self.stats.snapshot()
    }
}
