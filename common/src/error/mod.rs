//! Error types for the banking service
//!
//! This module provides the error taxonomy shared by the account service and
//! the API gateway. Each variant maps onto one class of HTTP failure at the
//! gateway boundary.

use std::fmt::Display;
use thiserror::Error;

/// Banking service error type
#[derive(Debug, Error)]
pub enum Error {
    /// Malformed request input (bad sort field, direction, page or id)
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Account payload failed field validation on create or update
    #[error("Invalid account: {0}")]
    InvalidAccount(String),

    /// Error when an account cannot be found
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// An external collaborator failed or could not be reached
    #[error("Dependency error: {0}")]
    DependencyError(String),

    /// Authorization error
    #[error("Authorization error: {0}")]
    AuthorizationError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Internal server error
    #[error("Internal error: {0}")]
    Internal(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Database migration error
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Extension trait to add context to error results
pub trait ErrorExt<T> {
    /// Add context information to an error
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display;
}

impl<T> ErrorExt<T> for Result<T> {
    fn with_context<C, F>(self, context_fn: F) -> Result<T>
    where
        F: FnOnce() -> C,
        C: Display,
    {
        self.map_err(|e| {
            let context = context_fn().to_string();
            match e {
                Error::ValidationError(msg) => Error::ValidationError(format!("{}: {}", context, msg)),
                Error::InvalidAccount(msg) => Error::InvalidAccount(format!("{}: {}", context, msg)),
                Error::AccountNotFound(msg) => Error::AccountNotFound(format!("{}: {}", context, msg)),
                Error::DependencyError(msg) => Error::DependencyError(format!("{}: {}", context, msg)),
                Error::AuthorizationError(msg) => Error::AuthorizationError(format!("{}: {}", context, msg)),
                Error::ConfigurationError(msg) => Error::ConfigurationError(format!("{}: {}", context, msg)),
                Error::Internal(msg) => Error::Internal(format!("{}: {}", context, msg)),
                Error::Database(e) => Error::Database(e),
                Error::Migration(e) => Error::Migration(e),
                Error::Serialization(e) => Error::Serialization(e),
            }
        })
    }
}

/// Trait for converting other error types to our Error type
pub trait IntoError {
    /// Convert to Error
    fn into_error(self, message: &str) -> Error;
}

impl<E: std::error::Error> IntoError for E {
    fn into_error(self, message: &str) -> Error {
        Error::Internal(format!("{}: {}", message, self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn with_context_keeps_variant() {
        let result: Result<()> = Err(Error::AccountNotFound("7".to_string()));
        let err = result.with_context(|| "Failed to load account").unwrap_err();
        match err {
            Error::AccountNotFound(msg) => assert_eq!(msg, "Failed to load account: 7"),
            other => panic!("unexpected variant: {:?}", other),
        }
    }
}
