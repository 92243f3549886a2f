//! Assistant backed by an OpenAI-compatible chat completions API.

use async_trait::async_trait;
use database::{ChatMessage, ChatRole};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::api_types::{ApiError, ApiMessage, ChatCompletionRequest, ChatCompletionResponse};
use crate::config::AssistantConfig;
use crate::error::AssistantError;
use crate::trait_def::Assistant;

/// Calls `/v1/chat/completions` with the system prompt, recent history and
/// the user's message.
pub struct OpenAiAssistant {
    client: Client,
    config: AssistantConfig,
}

impl OpenAiAssistant {
    pub fn new(config: AssistantConfig) -> Result<Self, AssistantError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| AssistantError::Configuration(format!("Failed to create HTTP client: {}", e)))?;

        info!(model = %config.model, api_url = %config.api_url, "Assistant initialized");

        Ok(Self { client, config })
    }

    /// Create an assistant from environment variables.
    ///
    /// See [`AssistantConfig::from_env`] for required environment variables.
    pub fn from_env() -> Result<Self, AssistantError> {
        Self::new(AssistantConfig::from_env()?)
    }

    pub fn config(&self) -> &AssistantConfig {
        &self.config
    }

    /// Build the messages array for a request.
    pub fn build_messages(&self, message: &str, history: &[ChatMessage]) -> Vec<ApiMessage> {
        let keep = self.config.max_history_turns * 2;
        let skip = history.len().saturating_sub(keep);

        let mut messages = Vec::with_capacity(history.len() - skip + 2);
        messages.push(ApiMessage::new("system", self.config.system_prompt.clone()));
        for turn in &history[skip..] {
            let role = match turn.role {
                ChatRole::User => "user",
                ChatRole::Assistant => "assistant",
            };
            messages.push(ApiMessage::new(role, turn.content.clone()));
        }
        messages.push(ApiMessage::new("user", message));
        messages
    }
}

#[async_trait]
impl Assistant for OpenAiAssistant {
    async fn complete(&self, message: &str, history: &[ChatMessage]) -> Result<String, AssistantError> {
        let request = ChatCompletionRequest {
            model: self.config.model.clone(),
            messages: self.build_messages(message, history),
            max_tokens: self.config.max_tokens,
            temperature: self.config.temperature,
        };

        debug!(model = %request.model, messages = request.messages.len(), "Sending chat completion");

        let response = self
            .client
            .post(self.config.completions_url())
            .bearer_auth(self.config.api_key())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    AssistantError::Timeout
                } else {
                    AssistantError::Unavailable(format!("Failed to send request: {}", e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ApiError>(&error_text)
                .map(|e| e.error.message)
                .unwrap_or(error_text);
            warn!(status = status.as_u16(), "Assistant API error");
            return Err(AssistantError::Unavailable(format!(
                "API error ({}): {}",
                status.as_u16(),
                detail
            )));
        }

        let completion: ChatCompletionResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                AssistantError::Timeout
            } else {
                AssistantError::ProcessingFailed(format!("Failed to parse response: {}", e))
            }
        })?;

        completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| AssistantError::ProcessingFailed("Empty response from assistant".to_string()))
    }

    fn name(&self) -> &str {
        "OpenAiAssistant"
    }

    async fn is_ready(&self) -> bool {
        !self.config.api_key().is_empty()
    }
}
