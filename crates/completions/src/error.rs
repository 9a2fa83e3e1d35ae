//! Error types for the completions client.

use thiserror::Error;

/// Errors that can occur when calling the completions API.
#[derive(Debug, Error)]
pub enum CompletionsError {
    /// Invalid or missing configuration.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Request could not be sent or the connection failed.
    #[error("Network error: {0}")]
    Network(String),

    /// Upstream answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    /// Response body did not match the expected shape.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Upstream returned no assistant text.
    #[error("Upstream returned an empty reply")]
    EmptyReply,
}
