//! Key-value store collaborator
//!
//! The lock protocol delegates all coordination to a remote store that can
//! evaluate a small set of atomic primitives. The store itself is not part
//! of this subsystem; `KeyValueStore` is the seam through which it is
//! injected, and `MemoryKeyValueStore` is a faithful in-process
//! implementation of the same contract.

mod memory;

pub use memory::MemoryKeyValueStore;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;

use keylock_common::Result;

/// Minimal key-value contract consumed by the lock protocol
///
/// Implementations must be safe for concurrent use by many workers; one
/// caller's operation must never block another caller's unrelated operation.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Atomically set `value` under `key` with the given TTL, only if `key`
    /// currently has no live value. Returns `true` iff the write was
    /// accepted.
    async fn set_if_absent(&self, key: &[u8], value: &[u8], ttl: Duration) -> Result<bool>;

    /// Read the current value under `key`, or `None` if absent/expired.
    async fn get(&self, key: &[u8]) -> Result<Option<Bytes>>;

    /// Unconditionally delete `key`. Returns `true` iff a live value was
    /// removed.
    async fn delete(&self, key: &[u8]) -> Result<bool>;

    /// Atomically compare the current value under `key` with `expected` and
    /// delete the key on a match. Returns `true` iff the delete happened.
    ///
    /// The compare and the delete are a single atomic unit; no intermediate
    /// state is observable by any other caller. This is the primitive the
    /// release protocol's correctness rests on.
    async fn compare_and_delete(&self, key: &[u8], expected: &[u8]) -> Result<bool>;
}
