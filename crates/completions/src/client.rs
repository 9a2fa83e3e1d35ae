//! HTTP client for the chat completions endpoint.

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::api_types::{ApiError, ChatCompletionRequest, ChatCompletionResponse, ChatMessage};
use crate::backend::CompletionBackend;
use crate::config::CompletionsConfig;
use crate::error::CompletionsError;

/// Calls an OpenAI-compatible `/v1/chat/completions` endpoint.
///
/// One request per call; no retries and no timeout beyond reqwest's defaults.
#[derive(Debug, Clone)]
pub struct CompletionsClient {
    client: Client,
    config: CompletionsConfig,
}

impl CompletionsClient {
    /// Create a new client with the given configuration.
    pub fn new(config: CompletionsConfig) -> Result<Self, CompletionsError> {
        if config.api_key.is_empty() {
            return Err(CompletionsError::Configuration(
                "API key must not be empty".to_string(),
            ));
        }

        let client = Client::builder().build().map_err(|e| {
            CompletionsError::Configuration(format!("Failed to create HTTP client: {}", e))
        })?;

        info!(model = %config.model, endpoint = %config.endpoint(), "Completions client initialized");

        Ok(Self { client, config })
    }

    /// Create a client from environment variables.
    ///
    /// See [`CompletionsConfig::from_env`] for the variables read.
    pub fn from_env() -> Result<Self, CompletionsError> {
        Self::new(CompletionsConfig::from_env()?)
    }

    /// Get the configuration.
    pub fn config(&self) -> &CompletionsConfig {
        &self.config
    }

    /// Make a chat completion request and return the raw response.
    pub async fn chat_completion(
        &self,
        messages: Vec<ChatMessage>,
    ) -> Result<ChatCompletionResponse, CompletionsError> {
        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages,
            max_tokens: self.config.max_tokens,
        };

        debug!(
            model = %request.model,
            message_count = request.messages.len(),
            "Sending chat completion request"
        );

        let response = self
            .client
            .post(self.config.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| CompletionsError::Network(format!("Failed to send request: {}", e)))?;

        let status = response.status();

        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<ApiError>(&error_text) {
                Ok(api_error) => {
                    warn!(
                        status = status.as_u16(),
                        error_type = ?api_error.error.error_type,
                        "Completions API returned an error"
                    );
                    api_error.error.message
                }
                Err(_) => error_text,
            };

            return Err(CompletionsError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            CompletionsError::InvalidResponse(format!("Failed to parse response: {}", e))
        })?;

        if let Some(usage) = &completion.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                total_tokens = usage.total_tokens,
                "Chat completion usage"
            );
        }

        Ok(completion)
    }
}

#[async_trait]
impl CompletionBackend for CompletionsClient {
    async fn complete(&self, messages: Vec<ChatMessage>) -> Result<String, CompletionsError> {
        let completion = self.chat_completion(messages).await?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(CompletionsError::EmptyReply)
    }

    fn name(&self) -> &str {
        "CompletionsClient"
    }
}
