//! The Assistant trait definition.

use async_trait::async_trait;
use database::ChatMessage;

use crate::error::AssistantError;

/// Produces a reply to a user's message given their recent conversation.
///
/// This trait is object-safe and can be used with `Arc<dyn Assistant>`.
#[async_trait]
pub trait Assistant: Send + Sync {
    /// Answer `message`.
    ///
    /// `history` holds earlier turns, oldest first, not including `message`.
    async fn complete(&self, message: &str, history: &[ChatMessage]) -> Result<String, AssistantError>;

    /// Get a human-readable name for this implementation.
    fn name(&self) -> &str;

    /// Check if the assistant is ready to answer.
    ///
    /// Default implementation always returns true.
    async fn is_ready(&self) -> bool {
        true
    }
}
