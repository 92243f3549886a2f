//! Configuration for the assistant backend.

use std::env;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};

use crate::error::AssistantError;

/// System prompt used when none is configured.
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a friendly health companion inside a personal health tracking \
app. Help the user understand their readings and habits in plain language. You are not a doctor: do not \
diagnose, and suggest contacting a professional or emergency services when something sounds serious.";

/// Configuration for an OpenAI-compatible chat completions backend.
#[derive(Debug, Clone)]
pub struct AssistantConfig {
    /// API base URL.
    pub api_url: String,

    /// API key for authentication.
    api_key: SecretString,

    /// Model name to use.
    pub model: String,

    /// System prompt sent with every request.
    pub system_prompt: String,

    /// Maximum tokens for a reply.
    pub max_tokens: Option<u32>,

    /// Temperature for generation (0.0 - 2.0).
    pub temperature: Option<f32>,

    /// Per-request timeout.
    pub timeout: Duration,

    /// Earlier user/assistant turns sent as context.
    pub max_history_turns: usize,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_url: "https://api.openai.com".to_string(),
            api_key: SecretString::from(String::new()),
            model: "gpt-4o-mini".to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            max_tokens: Some(800),
            temperature: Some(0.4),
            timeout: Duration::from_secs(30),
            max_history_turns: 10,
        }
    }
}

impl AssistantConfig {
    /// Create configuration from environment variables.
    ///
    /// Required environment variables:
    /// - `ASSISTANT_API_KEY` - API key for authentication
    ///
    /// Optional environment variables:
    /// - `ASSISTANT_API_URL` - API URL (default: https://api.openai.com)
    /// - `ASSISTANT_MODEL` - Model name (default: gpt-4o-mini)
    /// - `ASSISTANT_SYSTEM_PROMPT` - System prompt (default: built-in health companion prompt)
    /// - `ASSISTANT_TIMEOUT_SECS` - Request timeout (default: 30)
    /// - `ASSISTANT_MAX_HISTORY_TURNS` - Turns of context (default: 10)
    pub fn from_env() -> Result<Self, AssistantError> {
        let api_key = env::var("ASSISTANT_API_KEY")
            .ok()
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| AssistantError::Configuration("ASSISTANT_API_KEY not set".to_string()))?;

        let defaults = Self::default();

        let api_url = env::var("ASSISTANT_API_URL").unwrap_or(defaults.api_url);
        let model = env::var("ASSISTANT_MODEL").unwrap_or(defaults.model);
        let system_prompt = env::var("ASSISTANT_SYSTEM_PROMPT").unwrap_or(defaults.system_prompt);

        let timeout = env::var("ASSISTANT_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(defaults.timeout);

        let max_history_turns = env::var("ASSISTANT_MAX_HISTORY_TURNS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(defaults.max_history_turns);

        Ok(Self {
            api_url,
            api_key: SecretString::from(api_key),
            model,
            system_prompt,
            max_tokens: defaults.max_tokens,
            temperature: defaults.temperature,
            timeout,
            max_history_turns,
        })
    }

    /// Create a new config builder.
    pub fn builder() -> AssistantConfigBuilder {
        AssistantConfigBuilder::default()
    }

    /// Get the API key (exposes the secret).
    pub(crate) fn api_key(&self) -> &str {
        self.api_key.expose_secret()
    }

    /// Chat completions endpoint.
    pub fn completions_url(&self) -> String {
        format!("{}/v1/chat/completions", self.api_url.trim_end_matches('/'))
    }
}

/// Builder for AssistantConfig.
#[derive(Debug, Default)]
pub struct AssistantConfigBuilder {
    config: AssistantConfig,
}

impl AssistantConfigBuilder {
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.config.api_key = SecretString::from(key.into());
        self
    }

    pub fn api_url(mut self, url: impl Into<String>) -> Self {
        self.config.api_url = url.into();
        self
    }

    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.config.model = model.into();
        self
    }

    pub fn system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.config.system_prompt = prompt.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    pub fn max_history_turns(mut self, turns: usize) -> Self {
        self.config.max_history_turns = turns;
        self
    }

    pub fn build(self) -> AssistantConfig {
        self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = AssistantConfig::default();
        assert_eq!(config.api_url, "https://api.openai.com");
        assert!(config.api_key().is_empty());
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.max_history_turns, 10);
        assert_eq!(config.completions_url(), "https://api.openai.com/v1/chat/completions");
    }

    #[test]
    fn test_builder() {
        let config = AssistantConfig::builder()
            .api_key("sk-test")
            .api_url("http://localhost:11434/")
            .model("llama3")
            .timeout(Duration::from_secs(5))
            .max_history_turns(2)
            .build();

        assert_eq!(config.api_key(), "sk-test");
        assert_eq!(config.completions_url(), "http://localhost:11434/v1/chat/completions");
        assert_eq!(config.model, "llama3");
        assert_eq!(config.max_history_turns, 2);
        assert!(!format!("{:?}", config).contains("sk-test"));
    }

    // Environment-based tests share one test; env vars are process-global.
    #[test]
    fn test_from_env_scenarios() {
        use std::sync::Mutex;
        static ENV_LOCK: Mutex<()> = Mutex::new(());
        let _guard = ENV_LOCK.lock().unwrap();

        fn clear() {
            for var in [
                "ASSISTANT_API_KEY",
                "ASSISTANT_API_URL",
                "ASSISTANT_MODEL",
                "ASSISTANT_SYSTEM_PROMPT",
                "ASSISTANT_TIMEOUT_SECS",
                "ASSISTANT_MAX_HISTORY_TURNS",
            ] {
                env::remove_var(var);
            }
        }

        clear();
        match AssistantConfig::from_env() {
            Err(AssistantError::Configuration(msg)) => assert!(msg.contains("ASSISTANT_API_KEY")),
            other => panic!("Expected Configuration error, got {:?}", other),
        }

        env::set_var("ASSISTANT_API_KEY", "sk-env");
        env::set_var("ASSISTANT_TIMEOUT_SECS", "12");
        env::set_var("ASSISTANT_SYSTEM_PROMPT", "Be brief.");
        let config = AssistantConfig::from_env().unwrap();
        assert_eq!(config.api_key(), "sk-env");
        assert_eq!(config.timeout, Duration::from_secs(12));
        assert_eq!(config.system_prompt, "Be brief.");
        assert_eq!(config.model, "gpt-4o-mini");

        clear();
    }
}
