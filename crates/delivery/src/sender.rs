//! Channel sender trait and the logging implementation.

use async_trait::async_trait;
use database::{Channel, DeliveryContent, DeliveryDestination, DeliveryOutcome};

/// Result of one send to one destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// The provider accepted the message.
    Delivered,
    /// The destination will never work (unknown token, bad address, ...).
    /// The dispatcher deactivates it.
    PermanentlyInvalid(String),
    /// Anything worth retrying later: timeouts, 5xx, rate limits.
    TransientError(String),
}

impl SendOutcome {
    /// The stored outcome for a delivery attempt.
    pub fn outcome(&self) -> DeliveryOutcome {
        match self {
            SendOutcome::Delivered => DeliveryOutcome::Delivered,
            SendOutcome::PermanentlyInvalid(_) => DeliveryOutcome::PermanentlyInvalid,
            SendOutcome::TransientError(_) => DeliveryOutcome::TransientError,
        }
    }

    /// The failure detail, if any.
    pub fn error(&self) -> Option<&str> {
        match self {
            SendOutcome::Delivered => None,
            SendOutcome::PermanentlyInvalid(e) | SendOutcome::TransientError(e) => Some(e),
        }
    }
}

/// Sends rendered notification content over one channel.
///
/// Implementations never return errors: every failure is classified into a
/// [`SendOutcome`] so the dispatcher can decide what to do with the
/// destination and the queue entry.
#[async_trait]
pub trait ChannelSender: Send + Sync {
    /// The channel this sender serves.
    fn channel(&self) -> Channel;

    /// Send `content` to a single destination.
    async fn send(&self, destination: &DeliveryDestination, content: &DeliveryContent) -> SendOutcome;
}

/// A sender that logs every message and reports it as delivered.
#[derive(Debug, Clone)]
pub struct LoggingSender {
    channel: Channel,
}

impl LoggingSender {
    pub fn new(channel: Channel) -> Self {
        Self { channel }
    }
}

#[async_trait]
impl ChannelSender for LoggingSender {
    fn channel(&self) -> Channel {
        self.channel
    }

    async fn send(&self, destination: &DeliveryDestination, content: &DeliveryContent) -> SendOutcome {
        tracing::info!(
            "[{}] Sending to {}: {} - {}",
            self.channel,
            destination.address,
            content.title,
            content.body
        );
        SendOutcome::Delivered
    }
}
