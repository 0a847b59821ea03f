//! In-memory key-value store
//!
//! Implements the `KeyValueStore` contract with per-key atomicity and TTL
//! expiry. Used as the substitutable store in tests and by the contention
//! harness; production deployments inject a remote store behind the same
//! trait.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use tokio::time::interval;

use keylock_common::Result;

use super::KeyValueStore;

#[derive(Debug, Clone)]
struct Entry {
    value: Bytes,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }
}

/// In-memory TTL'd key-value store
///
/// Expired entries are treated as absent on every read and write path, so
/// correctness never depends on the background sweeper; the sweeper only
/// reclaims memory and publishes the alive-count gauge.
pub struct MemoryKeyValueStore {
    entries: Arc<DashMap<Vec<u8>, Entry>>,
    _cleanup_handle: Option<tokio::task::JoinHandle<()>>,
}

impl MemoryKeyValueStore {
    pub fn new() -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            _cleanup_handle: None,
        }
    }

    /// Start with a background sweep task that removes expired entries
    pub fn with_cleanup(self, sweep_interval: Duration) -> Self {
        let entries = self.entries.clone();

        let handle = tokio::spawn(async move {
            let mut interval = interval(sweep_interval);
            loop {
                interval.tick().await;
                Self::sweep_expired(&entries);
            }
        });

        Self {
            entries: self.entries,
            _cleanup_handle: Some(handle),
        }
    }

    fn sweep_expired(entries: &Arc<DashMap<Vec<u8>, Entry>>) {
        let before = entries.len();
        entries.retain(|_, entry| !entry.is_expired());
        let alive = entries.len();

        let swept = before.saturating_sub(alive);
        if swept > 0 {
            metrics::counter!("keylock_store_expired_total").increment(swept as u64);
            tracing::debug!(swept, alive, "swept expired entries");
        }
        metrics::gauge!("keylock_store_alive_keys").set(alive as f64);
    }

    /// Number of live (unexpired) entries
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_expired()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for MemoryKeyValueStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn set_if_absent(&self, key: &[u8], value: &[u8], ttl: Duration) -> Result<bool> {
        let entry = Entry {
            value: Bytes::copy_from_slice(value),
            expires_at: Instant::now() + ttl,
        };

        // The entry API holds the shard lock for the whole check-and-insert,
        // which is what makes this a single atomic unit.
        match self.entries.entry(key.to_vec()) {
            dashmap::mapref::entry::Entry::Occupied(mut occupied) => {
                if occupied.get().is_expired() {
                    occupied.insert(entry);
                    Ok(true)
                } else {
                    Ok(false)
                }
            }
            dashmap::mapref::entry::Entry::Vacant(vacant) => {
                vacant.insert(entry);
                Ok(true)
            }
        }
    }

    async fn get(&self, key: &[u8]) -> Result<Option<Bytes>> {
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired() => Ok(Some(entry.value.clone())),
            _ => Ok(None),
        }
    }

    async fn delete(&self, key: &[u8]) -> Result<bool> {
        match self.entries.remove(key) {
            Some((_, entry)) => Ok(!entry.is_expired()),
            None => Ok(false),
        }
    }

    async fn compare_and_delete(&self, key: &[u8], expected: &[u8]) -> Result<bool> {
        // remove_if holds the shard lock across the compare and the delete.
        let removed = self
            .entries
            .remove_if(key, |_, entry| {
                !entry.is_expired() && entry.value.as_ref() == expected
            })
            .is_some();
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_if_absent_basic() {
        let store = MemoryKeyValueStore::new();

        let set = store
            .set_if_absent(b"k1", b"v1", Duration::from_secs(30))
            .await
            .unwrap();
        assert!(set);

        // Second write against a live key is rejected
        let set = store
            .set_if_absent(b"k1", b"v2", Duration::from_secs(30))
            .await
            .unwrap();
        assert!(!set);

        let value = store.get(b"k1").await.unwrap();
        assert_eq!(value.as_deref(), Some(b"v1".as_ref()));
    }

    #[tokio::test]
    async fn test_set_if_absent_replaces_expired() {
        let store = MemoryKeyValueStore::new();

        store
            .set_if_absent(b"k1", b"v1", Duration::from_millis(10))
            .await
            .unwrap();
        tokio::time::sleep(Duration::from_millis(30)).await;

        // Expired entry counts as absent
        assert_eq!(store.get(b"k1").await.unwrap(), None);
        let set = store
            .set_if_absent(b"k1", b"v2", Duration::from_secs(30))
            .await
            .unwrap();
        assert!(set);
        assert_eq!(
            store.get(b"k1").await.unwrap().as_deref(),
            Some(b"v2".as_ref())
        );
    }

    #[tokio::test]
    async fn test_compare_and_delete() {
        let store = MemoryKeyValueStore::new();

        store
            .set_if_absent(b"k1", b"token-a", Duration::from_secs(30))
            .await
            .unwrap();

        // Wrong expected value: no-op
        assert!(!store.compare_and_delete(b"k1", b"token-b").await.unwrap());
        assert!(store.get(b"k1").await.unwrap().is_some());

        // Matching value: deleted
        assert!(store.compare_and_delete(b"k1", b"token-a").await.unwrap());
        assert_eq!(store.get(b"k1").await.unwrap(), None);

        // Already gone
        assert!(!store.compare_and_delete(b"k1", b"token-a").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete() {
        let store = MemoryKeyValueStore::new();

        store
            .set_if_absent(b"k1", b"v1", Duration::from_secs(30))
            .await
            .unwrap();
        assert!(store.delete(b"k1").await.unwrap());
        assert!(!store.delete(b"k1").await.unwrap());
    }

    #[tokio::test]
    async fn test_cleanup_sweeps_expired_entries() {
        let store = MemoryKeyValueStore::new().with_cleanup(Duration::from_millis(10));

        store
            .set_if_absent(b"short", b"v", Duration::from_millis(5))
            .await
            .unwrap();
        store
            .set_if_absent(b"long", b"v", Duration::from_secs(30))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(50)).await;

        assert_eq!(store.len(), 1);
        assert!(store.get(b"long").await.unwrap().is_some());
    }
}
