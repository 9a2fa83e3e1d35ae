//! The seam between the chat endpoint and whatever produces replies.

use async_trait::async_trait;

use crate::api_types::ChatMessage;
use crate::error::CompletionsError;

/// Something that turns a conversation into an assistant reply.
///
/// [`crate::CompletionsClient`] is the production implementation; tests
/// substitute recording or failing backends.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Send the full conversation and return the assistant's reply text.
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, CompletionsError>;

    /// Short name used in logs.
    fn name(&self) -> &str;
}
