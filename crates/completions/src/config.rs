//! Configuration for the completions client.

use std::env;

use crate::error::CompletionsError;

/// Default API base URL (Groq's OpenAI-compatible endpoint).
pub const DEFAULT_API_URL: &str = "https://api.groq.com/openai";

/// Default vision-capable model.
pub const DEFAULT_MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";

/// Default completion token cap.
pub const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Configuration for [`crate::CompletionsClient`].
#[derive(Debug, Clone)]
pub struct CompletionsConfig {
    /// API base URL; `/v1/chat/completions` is appended.
    pub api_url: String,

    /// API key for bearer authentication.
    pub api_key: String,

    /// Model name to use.
    pub model: String,

    /// Maximum tokens for response.
    pub max_tokens: Option<u32>,
}

impl Default for CompletionsConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            max_tokens: Some(DEFAULT_MAX_TOKENS),
        }
    }
}

impl CompletionsConfig {
    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `GROQ_API_KEY` - API key for authentication
    ///
    /// Optional environment variables:
    /// - `GROQ_API_URL` - API URL (default: https://api.groq.com/openai)
    /// - `GROQ_MODEL` - Model name (default: meta-llama/llama-4-scout-17b-16e-instruct)
    /// - `GROQ_MAX_TOKENS` - Max tokens (default: 1000)
    pub fn from_env() -> Result<Self, CompletionsError> {
        let api_key = env::var("GROQ_API_KEY")
            .map_err(|_| CompletionsError::Configuration("GROQ_API_KEY not set".to_string()))?;

        let api_url = env::var("GROQ_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let model = env::var("GROQ_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());

        let max_tokens = env::var("GROQ_MAX_TOKENS")
            .ok()
            .and_then(|v| v.parse().ok())
            .or(Some(DEFAULT_MAX_TOKENS));

        Ok(Self {
            api_url,
            api_key,
            model,
            max_tokens,
        })
    }

    /// Create a new config builder.
    pub fn builder() -> CompletionsConfigBuilder {
        CompletionsConfigBuilder::default()
    }

    /// Full URL of the chat completions endpoint.
    pub fn endpoint(&self) -> String {
        format!("{}/v1/chat/completions", self.api_url.trim_end_matches('/'))
    }
}

/// Builder for CompletionsConfig.
#[derive(Debug, Default)]
pub struct CompletionsConfigBuilder {
    config: CompletionsConfig,
}

impl CompletionsConfigBuilder {
    /// Set the API key.
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = key.into();
        self
    }

    /// Set the API URL.
    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    /// Set the model name.
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    /// Set the max tokens.
    pub fn max_tokens(mut self, tokens: u32) -> Self {
        self.config.max_tokens = Some(tokens);
        self
    }

    /// Build the configuration.
    pub fn build(self) -> CompletionsConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = CompletionsConfig::default();

        assert_eq!(config.api_url, "https://api.groq.com/openai");
        assert!(config.api_key.is_empty());
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_tokens, Some(1000));
        assert_eq!(
            config.endpoint(),
            "https://api.groq.com/openai/v1/chat/completions"
        );
    }

    #[test]
    fn test_builder_all_options() {
        let config = CompletionsConfig::builder()
            .api_key("my-key")
            .api_url("http://localhost:9000/")
            .model("llama-3")
            .max_tokens(256)
            .build();

        assert_eq!(config.api_key, "my-key");
        assert_eq!(config.model, "llama-3");
        assert_eq!(config.max_tokens, Some(256));
        assert_eq!(config.endpoint(), "http://localhost:9000/v1/chat/completions");
    }

    // Environment-based scenarios share one test; env vars are process-global.
    #[test]
    fn test_from_env_scenarios() {
        use std::sync::Mutex;
        static ENV_LOCK: Mutex<()> = Mutex::new(());
        let _guard = ENV_LOCK.lock().unwrap();

        fn clear_all_groq_vars() {
            std::env::remove_var("GROQ_API_KEY");
            std::env::remove_var("GROQ_API_URL");
            std::env::remove_var("GROQ_MODEL");
            std::env::remove_var("GROQ_MAX_TOKENS");
        }

        // Missing API key
        clear_all_groq_vars();
        match CompletionsConfig::from_env() {
            Err(CompletionsError::Configuration(msg)) => assert!(msg.contains("GROQ_API_KEY")),
            other => panic!("Expected Configuration error, got {:?}", other),
        }

        // Only API key set
        clear_all_groq_vars();
        std::env::set_var("GROQ_API_KEY", "test-env-key");
        let config = CompletionsConfig::from_env().unwrap();
        assert_eq!(config.api_key, "test-env-key");
        assert_eq!(config.api_url, DEFAULT_API_URL);
        assert_eq!(config.model, DEFAULT_MODEL);
        assert_eq!(config.max_tokens, Some(1000));

        // Overrides, with an unparsable token cap falling back to the default
        clear_all_groq_vars();
        std::env::set_var("GROQ_API_KEY", "k");
        std::env::set_var("GROQ_API_URL", "https://test.api.com");
        std::env::set_var("GROQ_MODEL", "other-model");
        std::env::set_var("GROQ_MAX_TOKENS", "lots");
        let config = CompletionsConfig::from_env().unwrap();
        assert_eq!(config.api_url, "https://test.api.com");
        assert_eq!(config.model, "other-model");
        assert_eq!(config.max_tokens, Some(1000));

        clear_all_groq_vars();
    }
}
