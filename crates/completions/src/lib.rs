//! Client for OpenAI-compatible chat completion APIs.
//!
//! The chat endpoint forwards a cleaned conversation, optionally carrying an
//! inline image, and needs only the assistant's reply text back.
//!
//! # Example
//!
//! ```rust,no_run
//! use completions::{ChatMessage, CompletionBackend, CompletionsClient};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = CompletionsClient::from_env()?;
//!     let reply = client.complete(vec![ChatMessage::user("Hello!")]).await?;
//!     println!("{}", reply);
//!     Ok(())
//! }
//! ```

mod api_types;
mod backend;
mod client;
mod config;
mod error;

pub use api_types::{
    ChatCompletionRequest, ChatCompletionResponse, ChatMessage, ContentPart, ImageUrl,
    MessageContent,
};
pub use backend::CompletionBackend;
pub use client::CompletionsClient;
pub use config::{CompletionsConfig, CompletionsConfigBuilder};
pub use error::CompletionsError;

// Re-export async_trait for implementors of CompletionBackend
pub use async_trait::async_trait;
