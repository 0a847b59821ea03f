//! Keylock Common - Shared types and utilities
//!
//! This crate provides the foundational pieces used across all Keylock
//! components:
//! - Error types
//! - Lock key validation
//! - Timestamp and token helpers

pub mod error;
pub mod utils;

// Re-exports for convenience
pub use error::{Error, Result};
pub use utils::{current_timestamp_ms, is_valid_key, new_token};

/// Default lock expiry applied when the caller does not supply a TTL,
/// in milliseconds.
pub const DEFAULT_EXPIRE_MS: u64 = 60_000;
