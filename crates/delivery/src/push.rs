//! Push notifications through an HTTP push gateway.
//!
//! The gateway receives `{ "endpoint": ..., "payload": ... }` and forwards the
//! payload to the device endpoint. It answers 404 or 410 when the endpoint no
//! longer exists.

use std::env;

use async_trait::async_trait;
use database::{Channel, DeliveryContent, DeliveryDestination};
use reqwest::{Client, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::debug;

use crate::error::{DeliveryError, Result};
use crate::sender::{ChannelSender, SendOutcome};

/// Push gateway settings.
#[derive(Debug, Clone)]
pub struct PushConfig {
    /// Gateway URL that accepts send requests.
    pub gateway_url: String,
    /// Optional bearer token for the gateway.
    token: Option<SecretString>,
}

impl PushConfig {
    pub fn new(gateway_url: impl Into<String>) -> Self {
        Self {
            gateway_url: gateway_url.into(),
            token: None,
        }
    }

    /// Builder method to set the gateway token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(SecretString::from(token.into()));
        self
    }

    /// Create configuration from environment variables.
    ///
    /// Required:
    /// - `PUSH_GATEWAY_URL` - Gateway send URL
    ///
    /// Optional:
    /// - `PUSH_GATEWAY_TOKEN` - Bearer token
    pub fn from_env() -> Result<Self> {
        let gateway_url =
            env::var("PUSH_GATEWAY_URL").map_err(|_| DeliveryError::MissingEnvVar("PUSH_GATEWAY_URL".to_string()))?;

        let mut config = Self::new(gateway_url);
        if let Ok(token) = env::var("PUSH_GATEWAY_TOKEN") {
            config = config.with_token(token);
        }
        Ok(config)
    }
}

#[derive(Debug, Serialize)]
struct PushRequest<'a> {
    endpoint: &'a str,
    payload: &'a DeliveryContent,
}

/// Sends push notifications through the gateway.
pub struct PushSender {
    client: Client,
    config: PushConfig,
}

impl PushSender {
    pub fn new(config: PushConfig) -> Result<Self> {
        let client = Client::builder()
            .build()
            .map_err(|e| DeliveryError::Transport(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }
}

/// Classify a gateway response status.
pub fn classify_status(status: StatusCode) -> SendOutcome {
    if status.is_success() {
        SendOutcome::Delivered
    } else if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
        SendOutcome::PermanentlyInvalid(format!("push endpoint rejected ({})", status.as_u16()))
    } else {
        SendOutcome::TransientError(format!("push gateway error ({})", status.as_u16()))
    }
}

#[async_trait]
impl ChannelSender for PushSender {
    fn channel(&self) -> Channel {
        Channel::Push
    }

    async fn send(&self, destination: &DeliveryDestination, content: &DeliveryContent) -> SendOutcome {
        let mut request = self.client.post(&self.config.gateway_url).json(&PushRequest {
            endpoint: &destination.address,
            payload: content,
        });
        if let Some(token) = &self.config.token {
            request = request.bearer_auth(token.expose_secret());
        }

        match request.send().await {
            Ok(response) => {
                let outcome = classify_status(response.status());
                debug!(destination_id = %destination.id, status = response.status().as_u16(), "Push gateway replied");
                outcome
            }
            Err(e) => SendOutcome::TransientError(format!("push gateway unreachable: {}", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_status() {
        assert_eq!(classify_status(StatusCode::CREATED), SendOutcome::Delivered);
        assert!(matches!(
            classify_status(StatusCode::GONE),
            SendOutcome::PermanentlyInvalid(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::NOT_FOUND),
            SendOutcome::PermanentlyInvalid(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS),
            SendOutcome::TransientError(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY),
            SendOutcome::TransientError(_)
        ));
    }
}
