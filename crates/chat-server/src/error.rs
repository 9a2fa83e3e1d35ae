//! Error types for the chat server.

use auth::AuthError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use completions::CompletionsError;
use database::DatabaseError;
use thiserror::Error;

use crate::compress::CompressError;
use crate::messages::MessagesError;
use crate::upload::UploadError;

/// Message returned for upstream and other unclassified failures.
const GENERIC_FAILURE: &str = "Something went wrong.";

/// Errors that can occur while handling a request.
#[derive(Debug, Error)]
pub enum AppError {
    /// Bad or missing input.
    #[error("{0}")]
    Validation(String),

    /// No session, bad credentials or a forged OAuth state.
    #[error("{0}")]
    Unauthorized(String),

    /// Unknown user.
    #[error("{0}")]
    NotFound(String),

    /// The request contradicts existing account state.
    #[error("{0}")]
    Conflict(String),

    /// Upload or compressed image over its limit.
    #[error("{0}")]
    PayloadTooLarge(String),

    /// A feature that is not configured on this server.
    #[error("{0}")]
    Unavailable(String),

    /// Image could not be decoded or re-encoded.
    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    /// The completions API call failed.
    #[error("Upstream error: {0}")]
    Upstream(#[from] CompletionsError),

    /// Google sign-in failed after the redirect.
    #[error("Google authentication failed: {0}")]
    OAuth(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(DatabaseError),

    /// Session store error.
    #[error("Session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::UserNotFound => AppError::NotFound("User not found".to_string()),
            AuthError::IncorrectPassword => {
                AppError::Unauthorized("Incorrect email or password.".to_string())
            }
            AuthError::EmailTaken(_) => {
                AppError::Validation("Email is already registered".to_string())
            }
            AuthError::Validation(err) => AppError::Validation(err.to_string()),
            AuthError::Database(err) => AppError::Database(err),
            AuthError::OAuth(msg) => AppError::OAuth(msg),
            AuthError::Hashing(msg) => AppError::Internal(msg),
            AuthError::Conflict(msg) => AppError::Conflict(msg),
        }
    }
}

impl From<DatabaseError> for AppError {
    fn from(err: DatabaseError) -> Self {
        AuthError::from(err).into()
    }
}

impl From<MessagesError> for AppError {
    fn from(err: MessagesError) -> Self {
        AppError::Validation(err.to_string())
    }
}

impl From<UploadError> for AppError {
    fn from(err: UploadError) -> Self {
        match err {
            UploadError::NotAnImage(_) => AppError::Validation(err.to_string()),
            UploadError::TooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
        }
    }
}

impl From<CompressError> for AppError {
    fn from(err: CompressError) -> Self {
        match err {
            CompressError::TooLarge { .. } => AppError::PayloadTooLarge(err.to_string()),
            other => AppError::ImageProcessing(other.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Validation(msg) => {
                tracing::warn!("Validation error: {}", msg);
                (StatusCode::BAD_REQUEST, msg.clone())
            }
            AppError::Unauthorized(msg) => {
                tracing::warn!("Unauthorized: {}", msg);
                (StatusCode::UNAUTHORIZED, msg.clone())
            }
            AppError::NotFound(msg) => {
                tracing::warn!("Not found: {}", msg);
                (StatusCode::NOT_FOUND, msg.clone())
            }
            AppError::Conflict(msg) => {
                tracing::warn!("Conflict: {}", msg);
                (
                    StatusCode::CONFLICT,
                    "Account is linked to a different login".to_string(),
                )
            }
            AppError::PayloadTooLarge(msg) => {
                tracing::warn!("Payload too large: {}", msg);
                (StatusCode::PAYLOAD_TOO_LARGE, msg.clone())
            }
            AppError::Unavailable(msg) => {
                tracing::warn!("Unavailable: {}", msg);
                (StatusCode::SERVICE_UNAVAILABLE, msg.clone())
            }
            AppError::ImageProcessing(msg) => {
                tracing::error!("Image processing error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to process image".to_string(),
                )
            }
            AppError::Upstream(err) => {
                tracing::error!("Upstream error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE.to_string())
            }
            AppError::OAuth(msg) => {
                tracing::error!("Google authentication error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Google authentication failed".to_string(),
                )
            }
            AppError::Database(err) => {
                tracing::error!("Database error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE.to_string())
            }
            AppError::Session(err) => {
                tracing::error!("Session error: {}", err);
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE.to_string())
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE.to_string())
            }
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}

/// Result type for request handlers.
pub type Result<T> = std::result::Result<T, AppError>;
