//! Offline assistants for development and tests.

use async_trait::async_trait;
use database::ChatMessage;

use crate::error::AssistantError;
use crate::trait_def::Assistant;

/// Replies with the user's own message.
#[derive(Debug, Clone, Default)]
pub struct EchoAssistant {
    /// Optional prefix to add before the echo.
    prefix: Option<String>,
}

impl EchoAssistant {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an echo assistant with a custom prefix.
    ///
    /// ```rust
    /// use assistant::EchoAssistant;
    ///
    /// let assistant = EchoAssistant::with_prefix("Echo: ");
    /// // Replies with "Echo: <message>"
    /// ```
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: Some(prefix.into()),
        }
    }
}

#[async_trait]
impl Assistant for EchoAssistant {
    async fn complete(&self, message: &str, _history: &[ChatMessage]) -> Result<String, AssistantError> {
        Ok(match &self.prefix {
            Some(prefix) => format!("{}{}", prefix, message),
            None => message.to_string(),
        })
    }

    fn name(&self) -> &str {
        "EchoAssistant"
    }
}

/// Stands in when no backend is configured; every call is unavailable.
#[derive(Debug, Clone, Default)]
pub struct DisabledAssistant;

#[async_trait]
impl Assistant for DisabledAssistant {
    async fn complete(&self, _message: &str, _history: &[ChatMessage]) -> Result<String, AssistantError> {
        Err(AssistantError::Unavailable("assistant is not configured".to_string()))
    }

    fn name(&self) -> &str {
        "DisabledAssistant"
    }

    async fn is_ready(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_echo_no_prefix() {
        let assistant = EchoAssistant::new();
        assert_eq!(assistant.complete("Hello!", &[]).await.unwrap(), "Hello!");
        assert!(assistant.is_ready().await);
    }

    #[tokio::test]
    async fn test_echo_with_prefix() {
        let assistant = EchoAssistant::with_prefix("Echo: ");
        assert_eq!(assistant.complete("Hello!", &[]).await.unwrap(), "Echo: Hello!");
    }

    #[tokio::test]
    async fn test_disabled_is_unavailable() {
        let assistant = DisabledAssistant;
        assert!(!assistant.is_ready().await);
        assert!(matches!(
            assistant.complete("Hello!", &[]).await,
            Err(AssistantError::Unavailable(_))
        ));
    }
}
