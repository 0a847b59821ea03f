//! Utility functions for Keylock
//!
//! Common helper functions used across the codebase.

use std::sync::LazyLock;
use std::time::{SystemTime, UNIX_EPOCH};

/// Regex pattern for validating lock keys
static VALID_KEY_PATTERN: LazyLock<regex::Regex> =
    LazyLock::new(|| regex::Regex::new("^[a-zA-Z0-9_.:/-]+$").expect("Invalid regex pattern"));

/// Validate a lock key
///
/// A valid key is non-empty and contains only alphanumeric characters,
/// underscore, dot, colon, slash, and hyphen.
///
/// # Examples
///
/// ```
/// use keylock_common::is_valid_key;
///
/// assert!(is_valid_key("jobs/daily-report"));
/// assert!(is_valid_key("job1"));
/// assert!(!is_valid_key(""));
/// assert!(!is_valid_key("with spaces"));
/// ```
pub fn is_valid_key(key: &str) -> bool {
    VALID_KEY_PATTERN.is_match(key)
}

/// Current Unix timestamp in milliseconds
pub fn current_timestamp_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Mint a fresh, globally-unique lock token
///
/// Tokens are unique per acquisition attempt and are never reused, even by
/// the same logical owner.
pub fn new_token() -> String {
    uuid::Uuid::new_v4().to_string()
}
