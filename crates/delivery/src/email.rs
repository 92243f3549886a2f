//! Email delivery over SMTP.

use std::env;

use async_trait::async_trait;
use database::{Channel, DeliveryContent, DeliveryDestination};
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, info};

use crate::error::{DeliveryError, Result};
use crate::sender::{ChannelSender, SendOutcome};

/// SMTP settings.
#[derive(Debug, Clone)]
pub struct EmailConfig {
    /// SMTP host.
    pub smtp_host: String,
    /// SMTP port (default: 587)
    pub smtp_port: u16,
    /// SMTP username.
    pub username: String,
    /// Sender address, e.g. `Vitals <alerts@example.com>`.
    pub from: String,
    password: SecretString,
}

impl EmailConfig {
    pub fn new(
        smtp_host: impl Into<String>,
        smtp_port: u16,
        username: impl Into<String>,
        password: impl Into<String>,
        from: impl Into<String>,
    ) -> Self {
        Self {
            smtp_host: smtp_host.into(),
            smtp_port,
            username: username.into(),
            from: from.into(),
            password: SecretString::from(password.into()),
        }
    }

    /// Create configuration from environment variables.
    ///
    /// Required:
    /// - `SMTP_HOST` - SMTP relay host
    /// - `SMTP_USERNAME` - SMTP username
    /// - `SMTP_PASSWORD` - SMTP password
    ///
    /// Optional (with defaults):
    /// - `SMTP_PORT` - Default: 587
    /// - `SMTP_FROM` - Default: the username
    pub fn from_env() -> Result<Self> {
        let smtp_host = env::var("SMTP_HOST").map_err(|_| DeliveryError::MissingEnvVar("SMTP_HOST".to_string()))?;

        let smtp_port = env::var("SMTP_PORT")
            .unwrap_or_else(|_| "587".to_string())
            .parse::<u16>()
            .map_err(|e| DeliveryError::Config(format!("Invalid SMTP_PORT: {}", e)))?;

        let username =
            env::var("SMTP_USERNAME").map_err(|_| DeliveryError::MissingEnvVar("SMTP_USERNAME".to_string()))?;

        let password =
            env::var("SMTP_PASSWORD").map_err(|_| DeliveryError::MissingEnvVar("SMTP_PASSWORD".to_string()))?;

        let from = env::var("SMTP_FROM").unwrap_or_else(|_| username.clone());

        Ok(Self::new(smtp_host, smtp_port, username, password, from))
    }

    pub(crate) fn password(&self) -> &str {
        self.password.expose_secret()
    }
}

/// Sends notification emails.
///
/// Uses a pooled STARTTLS connection to the relay.
pub struct EmailSender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
}

impl EmailSender {
    pub fn new(config: EmailConfig) -> Result<Self> {
        let from = config
            .from
            .parse::<Mailbox>()
            .map_err(|e| DeliveryError::Config(format!("Invalid SMTP_FROM '{}': {}", config.from, e)))?;

        let creds = Credentials::new(config.username.clone(), config.password().to_string());

        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| DeliveryError::Transport(e.to_string()))?
            .port(config.smtp_port)
            .credentials(creds)
            .build();

        info!(
            host = %config.smtp_host,
            port = config.smtp_port,
            username = %config.username,
            "Created SMTP client"
        );

        Ok(Self { transport, from })
    }

    fn build_message(&self, to: Mailbox, content: &DeliveryContent) -> std::result::Result<Message, String> {
        Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(&content.title)
            .body(content.body.clone())
            .map_err(|e| e.to_string())
    }
}

/// Reply codes that reject the recipient mailbox itself.
///
/// 550 mailbox unavailable, 551 user not local, 553 mailbox name not allowed.
/// Other 5xx replies (535 authentication, 554 policy, ...) come from our own
/// relay setup and are retried.
pub const RECIPIENT_REJECTION_CODES: [u16; 3] = [550, 551, 553];

/// Classify an SMTP failure by its reply code, if the relay sent one.
pub fn classify_smtp_reply(code: Option<u16>, detail: String) -> SendOutcome {
    match code {
        Some(code) if RECIPIENT_REJECTION_CODES.contains(&code) => {
            SendOutcome::PermanentlyInvalid(format!("mailbox rejected ({}): {}", code, detail))
        }
        Some(code) => SendOutcome::TransientError(format!("SMTP error ({}): {}", code, detail)),
        None => SendOutcome::TransientError(format!("SMTP error: {}", detail)),
    }
}

#[async_trait]
impl ChannelSender for EmailSender {
    fn channel(&self) -> Channel {
        Channel::Email
    }

    async fn send(&self, destination: &DeliveryDestination, content: &DeliveryContent) -> SendOutcome {
        let to = match destination.address.parse::<Mailbox>() {
            Ok(to) => to,
            Err(e) => return SendOutcome::PermanentlyInvalid(format!("invalid address: {}", e)),
        };

        let message = match self.build_message(to, content) {
            Ok(message) => message,
            Err(e) => return SendOutcome::TransientError(format!("failed to build email: {}", e)),
        };

        match self.transport.send(message).await {
            Ok(_) => {
                debug!(destination_id = %destination.id, "Email accepted by relay");
                SendOutcome::Delivered
            }
            Err(e) => classify_smtp_reply(e.status().map(u16::from), e.to_string()),
        }
    }
}
