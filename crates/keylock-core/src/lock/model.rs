//! Lock configuration and statistics model

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

use keylock_common::DEFAULT_EXPIRE_MS;

/// Configuration for the lock manager
///
/// `default_ttl_ms` is the expiry applied when a caller does not supply a
/// TTL. It bounds how long a crashed holder can block others (a starvation
/// bound); the expected hold duration is a separate concern configured by
/// the caller, and must stay below the TTL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    /// TTL applied by `try_acquire_default`, in milliseconds
    #[serde(default = "default_ttl_ms")]
    pub default_ttl_ms: u64,
}

fn default_ttl_ms() -> u64 {
    DEFAULT_EXPIRE_MS
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            default_ttl_ms: DEFAULT_EXPIRE_MS,
        }
    }
}

impl LockConfig {
    /// Set the default TTL in milliseconds
    pub fn with_default_ttl_ms(mut self, ttl_ms: u64) -> Self {
        self.default_ttl_ms = ttl_ms;
        self
    }
}

/// Lock manager statistics snapshot
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LockStats {
    /// Successful acquisitions
    pub total_acquisitions: u64,
    /// Acquisitions rejected because the key was already held
    pub contended_acquisitions: u64,
    /// Store calls that failed and were mapped to a negative result
    pub transport_failures: u64,
    /// Successful releases
    pub total_releases: u64,
    /// Releases rejected because the stored token did not match
    pub failed_releases: u64,
}

#[derive(Default)]
pub(crate) struct LockStatsCollector {
    total_acquisitions: AtomicU64,
    contended_acquisitions: AtomicU64,
    transport_failures: AtomicU64,
    total_releases: AtomicU64,
    failed_releases: AtomicU64,
}

impl LockStatsCollector {
    pub(crate) fn record_acquisition(&self) {
        self.total_acquisitions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_contention(&self) {
        self.contended_acquisitions.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_transport_failure(&self) {
        self.transport_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_release(&self) {
        self.total_releases.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_failed_release(&self) {
        self.failed_releases.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> LockStats {
        LockStats {
            total_acquisitions: self.total_acquisitions.load(Ordering::Relaxed),
            contended_acquisitions: self.contended_acquisitions.load(Ordering::Relaxed),
            transport_failures: self.transport_failures.load(Ordering::Relaxed),
            total_releases: self.total_releases.load(Ordering::Relaxed),
            failed_releases: self.failed_releases.load(Ordering::Relaxed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = LockConfig::default();
        assert_eq!(config.default_ttl_ms, 60_000);
    }

    #[test]
    fn test_config_builder() {
        let config = LockConfig::default().with_default_ttl_ms(5_000);
        assert_eq!(config.default_ttl_ms, 5_000);
    }

    #[test]
    fn test_stats_collector_snapshot() {
        let collector = LockStatsCollector::default();
        collector.record_acquisition();
        collector.record_acquisition();
        collector.record_contention();
        collector.record_release();
        collector.record_failed_release();
        collector.record_transport_failure();

        let stats = collector.snapshot();
        assert_eq!(stats.total_acquisitions, 2);
        assert_eq!(stats.contended_acquisitions, 1);
        assert_eq!(stats.total_releases, 1);
        assert_eq!(stats.failed_releases, 1);
        assert_eq!(stats.transport_failures, 1);
    }
}
