//! Error types for authentication and account management.

use database::{DatabaseError, ValidationError};
use thiserror::Error;

/// Errors that can occur while authenticating or managing accounts.
#[derive(Debug, Error)]
pub enum AuthError {
    /// No user matches the given email or id.
    #[error("User not found")]
    UserNotFound,

    /// Password does not match, or the account has no password.
    #[error("Incorrect email or password")]
    IncorrectPassword,

    /// Another account already uses this email.
    #[error("Email is already registered: {0}")]
    EmailTaken(String),

    /// Input failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Storage failure.
    #[error(transparent)]
    Database(DatabaseError),

    /// Password hashing failed.
    #[error("Password hashing failed: {0}")]
    Hashing(String),

    /// The OAuth exchange with the identity provider failed, or its
    /// identity cannot be trusted for this account.
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// The external identity is tied to a different account.
    #[error("Account conflict: {0}")]
    Conflict(String),
}

impl From<DatabaseError> for AuthError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { .. } => AuthError::UserNotFound,
            DatabaseError::AlreadyExists { key, .. } => AuthError::EmailTaken(key),
            DatabaseError::Conflict(msg) => AuthError::Conflict(msg),
            other => AuthError::Database(other),
        }
    }
}

impl From<reqwest::Error> for AuthError {
    fn from(err: reqwest::Error) -> Self {
        AuthError::OAuth(err.to_string())
    }
}

/// Result type for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;
