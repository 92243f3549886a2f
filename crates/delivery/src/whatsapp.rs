//! WhatsApp text messages through a Cloud-style messages API.

use std::env;

use async_trait::async_trait;
use database::{Channel, DeliveryContent, DeliveryDestination};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::debug;

use crate::error::{DeliveryError, Result};
use crate::sender::{ChannelSender, SendOutcome};

/// Default messages API base URL.
pub const DEFAULT_API_URL: &str = "https://graph.facebook.com/v19.0";

/// WhatsApp messages API settings.
#[derive(Debug, Clone)]
pub struct WhatsAppConfig {
    /// API base URL.
    pub api_url: String,
    /// Sending phone number ID.
    pub phone_number_id: String,
    /// Access token.
    token: SecretString,
}

impl WhatsAppConfig {
    pub fn new(api_url: impl Into<String>, phone_number_id: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            phone_number_id: phone_number_id.into(),
            token: SecretString::from(token.into()),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Required:
    /// - `WHATSAPP_PHONE_NUMBER_ID` - Sending phone number ID
    /// - `WHATSAPP_TOKEN` - Access token
    ///
    /// Optional (with defaults):
    /// - `WHATSAPP_API_URL` - Default: https://graph.facebook.com/v19.0
    pub fn from_env() -> Result<Self> {
        let api_url = env::var("WHATSAPP_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.to_string());

        let phone_number_id = env::var("WHATSAPP_PHONE_NUMBER_ID")
            .map_err(|_| DeliveryError::MissingEnvVar("WHATSAPP_PHONE_NUMBER_ID".to_string()))?;

        let token =
            env::var("WHATSAPP_TOKEN").map_err(|_| DeliveryError::MissingEnvVar("WHATSAPP_TOKEN".to_string()))?;

        Ok(Self::new(api_url, phone_number_id, token))
    }

    /// URL that accepts outbound messages.
    pub fn messages_url(&self) -> String {
        format!("{}/{}/messages", self.api_url.trim_end_matches('/'), self.phone_number_id)
    }
}

/// Sends WhatsApp text messages.
pub struct WhatsAppSender {
    client: Client,
    config: WhatsAppConfig,
}

impl WhatsAppSender {
    pub fn new(config: WhatsAppConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| DeliveryError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }
}

/// Message text: title on the first line, body below.
pub fn render_text(content: &DeliveryContent) -> String {
    format!("{}\n\n{}", content.title, content.body)
}

/// API error codes that reject the recipient number itself.
///
/// 131026 message undeliverable (not a WhatsApp user), 131021 recipient is the
/// sender, 131030 recipient not on the allowed list.
pub const RECIPIENT_ERROR_CODES: [i64; 3] = [131026, 131021, 131030];

/// Classify a messages API reply from its status and body.
///
/// Only recipient errors are permanent. A 400 for anything else (bad
/// template, bad parameter) and every auth failure is retried, since the
/// number itself may be fine.
pub fn classify_response(status: StatusCode, body: &str) -> SendOutcome {
    if status.is_success() {
        return SendOutcome::Delivered;
    }

    match error_code(body) {
        Some(code) if RECIPIENT_ERROR_CODES.contains(&code) => {
            SendOutcome::PermanentlyInvalid(format!("recipient rejected ({}): {}", code, body))
        }
        Some(code) => SendOutcome::TransientError(format!(
            "messages API error ({}, code {}): {}",
            status.as_u16(),
            code,
            body
        )),
        None => SendOutcome::TransientError(format!("messages API error ({})", status.as_u16())),
    }
}

/// `error.code` from a Graph-style error body.
fn error_code(body: &str) -> Option<i64> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value.get("error")?.get("code")?.as_i64()
}

#[async_trait]
impl ChannelSender for WhatsAppSender {
    fn channel(&self) -> Channel {
        Channel::Whatsapp
    }

    async fn send(&self, destination: &DeliveryDestination, content: &DeliveryContent) -> SendOutcome {
        let body = json!({
            "messaging_product": "whatsapp",
            "to": destination.address.trim_start_matches('+'),
            "type": "text",
            "text": { "body": render_text(content) },
        });

        let result = self
            .client
            .post(self.config.messages_url())
            .bearer_auth(self.config.token.expose_secret())
            .json(&body)
            .send()
            .await;

        match result {
            Ok(response) => {
                let status = response.status();
                debug!(destination_id = %destination.id, status = status.as_u16(), "Messages API replied");
                let body = if status.is_success() {
                    String::new()
                } else {
                    response.text().await.unwrap_or_default()
                };
                classify_response(status, &body)
            }
            Err(e) => SendOutcome::TransientError(format!("messages API unreachable: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::NotificationType;

    #[test]
    fn test_messages_url() {
        let config = WhatsAppConfig::new("https://graph.example.com/v19.0/", "12345", "token");
        assert_eq!(config.messages_url(), "https://graph.example.com/v19.0/12345/messages");
    }

    #[test]
    fn test_render_text() {
        let content = DeliveryContent {
            title: "Reading request accepted".to_string(),
            body: "Ana accepted your request".to_string(),
            notification_type: NotificationType::ReadingAccepted,
            data: serde_json::Value::Null,
        };
        assert_eq!(render_text(&content), "Reading request accepted\n\nAna accepted your request");
    }

    #[test]
    fn test_classify_response() {
        assert_eq!(classify_response(StatusCode::OK, ""), SendOutcome::Delivered);

        let not_on_whatsapp = r#"{"error":{"message":"Message undeliverable","code":131026}}"#;
        assert!(matches!(
            classify_response(StatusCode::BAD_REQUEST, not_on_whatsapp),
            SendOutcome::PermanentlyInvalid(_)
        ));

        let bad_parameter = r#"{"error":{"message":"Invalid parameter","code":100}}"#;
        assert!(matches!(
            classify_response(StatusCode::BAD_REQUEST, bad_parameter),
            SendOutcome::TransientError(_)
        ));

        let expired_token = r#"{"error":{"message":"Error validating access token","code":190}}"#;
        assert!(matches!(
            classify_response(StatusCode::UNAUTHORIZED, expired_token),
            SendOutcome::TransientError(_)
        ));

        assert!(matches!(
            classify_response(StatusCode::BAD_REQUEST, "<html>bad gateway</html>"),
            SendOutcome::TransientError(_)
        ));
        assert!(matches!(
            classify_response(StatusCode::SERVICE_UNAVAILABLE, ""),
            SendOutcome::TransientError(_)
        ));
    }
}
