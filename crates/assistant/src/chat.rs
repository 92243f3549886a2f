//! Persisted assistant conversations.

use std::sync::Arc;

use database::{chat_message, validation, ChatMessage, ChatRole, Database};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::Result;
use crate::trait_def::Assistant;

/// Default number of earlier turns loaded as context.
pub const DEFAULT_HISTORY_TURNS: usize = 10;

/// The stored user message and the assistant's reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatExchange {
    pub message: ChatMessage,
    pub reply: ChatMessage,
}

/// Runs one chat turn at a time against an [`Assistant`], keeping history in
/// the database.
#[derive(Clone)]
pub struct ChatService {
    db: Database,
    assistant: Arc<dyn Assistant>,
    history_turns: usize,
}

impl ChatService {
    pub fn new(db: Database, assistant: Arc<dyn Assistant>) -> Self {
        Self {
            db,
            assistant,
            history_turns: DEFAULT_HISTORY_TURNS,
        }
    }

    /// Builder method to set how many earlier turns are sent as context.
    pub fn with_history_turns(mut self, turns: usize) -> Self {
        self.history_turns = turns;
        self
    }

    /// Name of the backing assistant.
    pub fn assistant_name(&self) -> &str {
        self.assistant.name()
    }

    /// Send `message` for `user_id` and store both sides of the exchange.
    ///
    /// Nothing is stored when the assistant fails.
    pub async fn send(&self, user_id: &str, message: &str) -> Result<ChatExchange> {
        let message = message.trim();
        validation::validate_chat_message(message)?;

        let history = chat_message::recent_messages(self.db.pool(), user_id, (self.history_turns * 2) as i64).await?;

        let reply = match self.assistant.complete(message, &history).await {
            Ok(reply) => reply,
            Err(e) => {
                warn!(user_id, assistant = self.assistant.name(), error = %e, "Assistant call failed");
                return Err(e);
            }
        };

        let mut tx = self.db.begin().await?;
        let stored_message = chat_message::append_message(&mut *tx, user_id, ChatRole::User, message).await?;
        let stored_reply = chat_message::append_message(&mut *tx, user_id, ChatRole::Assistant, &reply).await?;
        tx.commit().await.map_err(database::DatabaseError::from)?;

        info!(user_id, history = history.len(), "Assistant replied");

        Ok(ChatExchange {
            message: stored_message,
            reply: stored_reply,
        })
    }

    /// The most recent messages, oldest first.
    pub async fn history(&self, user_id: &str, limit: i64) -> Result<Vec<ChatMessage>> {
        Ok(chat_message::recent_messages(self.db.pool(), user_id, limit).await?)
    }

    /// Forget a user's conversation. Returns the number of messages removed.
    pub async fn clear_history(&self, user_id: &str) -> Result<u64> {
        let removed = chat_message::clear_history(self.db.pool(), user_id).await?;
        info!(user_id, removed, "Chat history cleared");
        Ok(removed)
    }
}
