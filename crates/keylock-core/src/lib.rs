//! Keylock Core - distributed mutual-exclusion lock
//!
//! This crate provides:
//! - The `KeyValueStore` collaborator contract (atomic set-if-absent with
//!   TTL, get, delete, atomic compare-and-delete)
//! - An in-memory TTL'd store implementation for tests and local use
//! - `LockManager`: acquire/release/inspect protocol over the store
//! - `RetryPolicy`: bounded, jittered backoff for acquisition polling

pub mod lock;
pub mod retry;
pub mod store;

// Re-export commonly used types
pub use lock::{LockConfig, LockManager, LockStats};
pub use retry::RetryPolicy;
pub use store::{KeyValueStore, MemoryKeyValueStore};
