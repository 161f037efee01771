//! Common Infrastructure Module
//!
//! Shared error types for the poolforge backend. Configuration and
//! logging live at the crate root.

pub mod error;

// Re-exports for convenience
pub use error::{PoolForgeError, Result};
