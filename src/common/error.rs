//! Common Error Types for the PoolForge Backend
//!
//! Provides unified error handling across all modules.

use thiserror::Error;

/// Root error type for the poolforge backend
#[derive(Debug, Error)]
pub enum PoolForgeError {
    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(#[from] crate::config::ConfigError),

    /// Logging errors
    #[error("logging error: {0}")]
    Logging(#[from] crate::logging::LoggingError),

    /// Signer / transaction submission errors
    #[error("signer error: {0}")]
    Signer(String),

    /// Storage errors
    #[error("storage error: {0}")]
    Storage(String),

    /// API errors
    #[error("API error: {0}")]
    Api(String),

    /// Service errors
    #[error("service error: {0}")]
    Service(String),

    /// Validation errors
    #[error("validation error: {0}")]
    Validation(String),

    /// Internal errors
    #[error("internal error: {0}")]
    Internal(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PoolForgeError {
    /// Create a signer error
    pub fn signer(msg: impl Into<String>) -> Self {
        Self::Signer(msg.into())
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create an API error
    pub fn api(msg: impl Into<String>) -> Self {
        Self::Api(msg.into())
    }

    /// Create a service error
    pub fn service(msg: impl Into<String>) -> Self {
        Self::Service(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Check if this is a retryable error
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            PoolForgeError::Signer(_) | PoolForgeError::Storage(_) | PoolForgeError::Io(_)
        )
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            PoolForgeError::Config(_) => "CONFIG_ERROR",
            PoolForgeError::Logging(_) => "LOGGING_ERROR",
            PoolForgeError::Signer(_) => "SIGNER_ERROR",
            PoolForgeError::Storage(_) => "STORAGE_ERROR",
            PoolForgeError::Api(_) => "API_ERROR",
            PoolForgeError::Service(_) => "SERVICE_ERROR",
            PoolForgeError::Validation(_) => "VALIDATION_ERROR",
            PoolForgeError::Internal(_) => "INTERNAL_ERROR",
            PoolForgeError::Io(_) => "IO_ERROR",
        }
    }
}

/// Result type alias using PoolForgeError
pub type Result<T> = std::result::Result<T, PoolForgeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let err = PoolForgeError::signer("submission timed out");
        assert!(err.to_string().contains("submission timed out"));
        assert_eq!(err.error_code(), "SIGNER_ERROR");
    }

    #[test]
    fn test_retryable_errors() {
        assert!(PoolForgeError::signer("timeout").is_retryable());
        assert!(PoolForgeError::storage("lock poisoned").is_retryable());
        assert!(!PoolForgeError::validation("invalid input").is_retryable());
    }
}
