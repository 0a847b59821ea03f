//! Error types for Keylock
//!
//! This module defines:
//! - `Error`: application-specific error enum
//! - `Result`: convenience alias used across the workspace

/// Application-specific error types
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("caused: {0}")]
    IllegalArgument(String),

    #[error("store error: {0}")]
    Store(String),

    #[error("value for key '{0}' is not valid UTF-8")]
    InvalidValue(String),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Shorthand for a store-communication failure
    pub fn store(msg: impl Into<String>) -> Self {
        Error::Store(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::IllegalArgument("lock key is empty".to_string());
        assert_eq!(err.to_string(), "caused: lock key is empty");

        let err = Error::store("connection refused");
        assert_eq!(err.to_string(), "store error: connection refused");
    }
}
