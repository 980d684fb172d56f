//! Error Handling Infrastructure
//!
//! This module defines all error types used throughout the contact book.
//! Every error maps to a stable error code.
//!
//! # Error Categories
//! - `Validation`: Malformed input (bad phone, email, category, empty name or term)
//! - `DuplicatePhone`: Insert rejected by the unique phone constraint
//! - `NotFound`: No contact with the requested id
//! - `ConnectionFailed`: Database unreachable or login rejected
//! - `QueryFailed`: Statement execution errors
//! - `EngineError`: Engine-specific database errors (schema setup, type conversion)
//! - `ConfigError`: Connection profile or configuration file errors
//! - `Console`: Terminal read/write failures
//!
//! Only a failure during schema setup is fatal to the process. Everything else is
//! reported by the menu and the loop carries on.

use thiserror::Error;

/// Main error type for contact book operations
#[derive(Error, Debug)]
pub enum ContactError {
    /// Input failed validation
    #[error("Invalid input: {0}")]
    Validation(String),

    /// A contact with this phone number already exists
    #[error("Contact with phone {0} already exists")]
    DuplicatePhone(String),

    /// No contact with the given id
    #[error("No contact with ID {0}")]
    NotFound(i64),

    /// Database connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Query execution failed
    #[error("Query execution failed: {0}")]
    QueryFailed(String),

    /// Engine-specific database error
    #[error("Engine error ({engine}): {detail}")]
    EngineError { engine: String, detail: String },

    /// Configuration error (file not found, invalid JSON, missing profile, etc.)
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Terminal I/O error
    #[error("Console error: {0}")]
    Console(String),
}

impl ContactError {
    /// Convert error to a stable error code string
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::DuplicatePhone(_) => "DUPLICATE_PHONE",
            Self::NotFound(_) => "NOT_FOUND",
            Self::ConnectionFailed(_) => "CONNECTION_FAILED",
            Self::QueryFailed(_) => "QUERY_FAILED",
            Self::EngineError { .. } => "ENGINE_ERROR",
            Self::ConfigError(_) => "CONFIG_ERROR",
            Self::Console(_) => "CONSOLE_ERROR",
        }
    }

    /// Get human-readable error message
    ///
    /// Messages never contain credentials.
    #[must_use]
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a duplicate phone error
    pub fn duplicate_phone(phone: impl Into<String>) -> Self {
        Self::DuplicatePhone(phone.into())
    }

    /// Create a not found error
    #[must_use]
    pub const fn not_found(id: i64) -> Self {
        Self::NotFound(id)
    }

    /// Create a connection failed error
    pub fn connection_failed(message: impl Into<String>) -> Self {
        Self::ConnectionFailed(message.into())
    }

    /// Create a query failed error
    pub fn query_failed(message: impl Into<String>) -> Self {
        Self::QueryFailed(message.into())
    }

    /// Create an engine-specific error
    pub fn engine_error(engine: impl Into<String>, detail: impl Into<String>) -> Self {
        Self::EngineError { engine: engine.into(), detail: detail.into() }
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::ConfigError(message.into())
    }

    /// Create a console error
    pub fn console(message: impl Into<String>) -> Self {
        Self::Console(message.into())
    }
}

/// Result type alias for contact book operations
pub type Result<T> = std::result::Result<T, ContactError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ContactError::validation("test").error_code(), "VALIDATION_ERROR");
        assert_eq!(ContactError::duplicate_phone("555").error_code(), "DUPLICATE_PHONE");
        assert_eq!(ContactError::not_found(7).error_code(), "NOT_FOUND");
        assert_eq!(ContactError::connection_failed("test").error_code(), "CONNECTION_FAILED");
        assert_eq!(ContactError::query_failed("test").error_code(), "QUERY_FAILED");
        assert_eq!(ContactError::engine_error("sqlite", "test").error_code(), "ENGINE_ERROR");
        assert_eq!(ContactError::config_error("test").error_code(), "CONFIG_ERROR");
        assert_eq!(ContactError::console("test").error_code(), "CONSOLE_ERROR");
    }

    #[test]
    fn test_error_messages() {
        let err = ContactError::duplicate_phone("5551234567");
        assert_eq!(err.message(), "Contact with phone 5551234567 already exists");

        let err = ContactError::not_found(99999);
        assert_eq!(err.message(), "No contact with ID 99999");

        let err = ContactError::engine_error("postgres", "permission denied");
        assert!(err.message().contains("postgres"));
        assert!(err.message().contains("permission denied"));
    }

    #[test]
    fn test_error_constructors() {
        assert!(matches!(ContactError::validation("x"), ContactError::Validation(_)));
        assert!(matches!(ContactError::duplicate_phone("x"), ContactError::DuplicatePhone(_)));
        assert!(matches!(ContactError::not_found(1), ContactError::NotFound(1)));
        assert!(matches!(ContactError::connection_failed("x"), ContactError::ConnectionFailed(_)));
        assert!(matches!(ContactError::query_failed("x"), ContactError::QueryFailed(_)));
        assert!(matches!(ContactError::engine_error("e", "d"), ContactError::EngineError { .. }));
        assert!(matches!(ContactError::config_error("x"), ContactError::ConfigError(_)));
        assert!(matches!(ContactError::console("x"), ContactError::Console(_)));
    }
}
