//! Completion providers.
//!
//! The refinement stage only needs the capability
//! `complete(prompt) -> text`; the OpenAI chat provider is the
//! production implementation. Completions may be non-deterministic and
//! no retries are attempted here.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ClassifierError, Result};

/// Default timeout applied to each provider call.
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Trait for completion providers.
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Get the name of this provider.
    fn name(&self) -> &str;

    /// Complete the given prompt and return the raw response text.
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Check if the provider is available (API key set, etc.).
    fn is_available(&self) -> bool;
}

/// OpenAI chat-completion provider.
pub struct OpenAiCompletionProvider {
    /// API key.
    api_key: Option<String>,

    /// API base URL.
    base_url: String,

    /// HTTP client.
    client: reqwest::Client,

    /// Model to use.
    model: String,
}

impl OpenAiCompletionProvider {
    /// Create a new OpenAI completion provider.
    pub fn new() -> Self {
        Self::with_timeout(DEFAULT_TIMEOUT)
    }

    /// Create a provider with a per-request timeout.
    pub fn with_timeout(timeout: Duration) -> Self {
        Self {
            api_key: std::env::var("OPENAI_API_KEY").ok(),
            base_url: "https://api.openai.com/v1".to_string(),
            client: reqwest::Client::builder()
                .timeout(timeout)
                .build()
                .unwrap_or_default(),
            model: "gpt-4o".to_string(),
        }
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }
}

impl Default for OpenAiCompletionProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CompletionProvider for OpenAiCompletionProvider {
    fn name(&self) -> &str {
        "openai"
    }

    async fn complete(&self, prompt: &str) -> Result<String> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or(ClassifierError::ProviderNotConfigured)?;

        debug!("Requesting completion with model: {}", self.model);

        let body = serde_json::json!({
            "model": self.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": 0.0
        });

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .header("Authorization", format!("Bearer {api_key}"))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await?;

        if response.status() == reqwest::StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(60);

            return Err(ClassifierError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if !response.status().is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(ClassifierError::ApiRequest(format!(
                "API error: {error_text}"
            )));
        }

        let result: OpenAiChatResponse = response.json().await?;

        let text = result
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| {
                ClassifierError::InvalidResponse("No choices in response".to_string())
            })?;

        debug!("Received completion of {} chars", text.len());
        Ok(text)
    }

    fn is_available(&self) -> bool {
        self.api_key.is_some()
    }
}

/// OpenAI chat API response format.
#[derive(Debug, Deserialize)]
struct OpenAiChatResponse {
    choices: Vec<OpenAiChatChoice>,
}

#[derive(Debug, Deserialize)]
struct OpenAiChatChoice {
    message: OpenAiChatMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAiChatMessage {
    content: String,
}
