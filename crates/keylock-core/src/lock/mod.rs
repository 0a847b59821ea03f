//! Distributed lock protocol
//!
//! This module provides:
//! - Lock configuration and statistics model
//! - `LockManager`: acquire/release/inspect over an injected store

mod manager;
mod model;

pub use manager::*;
pub use model::*;
