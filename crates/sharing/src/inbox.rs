//! A recipient's in-app notifications.

use database::{notification, Database, Notification};
use tracing::debug;

use crate::error::{Result, SharingError};
use crate::metrics::{DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};

/// Reads and tidies notifications. Every call is scoped to one recipient.
#[derive(Debug, Clone)]
pub struct Inbox {
    db: Database,
}

impl Inbox {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Newest first.
    pub async fn list(&self, recipient_id: &str, unread_only: bool, limit: Option<i64>) -> Result<Vec<Notification>> {
        let limit = limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT);
        Ok(notification::list_for_recipient(self.db.pool(), recipient_id, unread_only, limit).await?)
    }

    pub async fn count_unread(&self, recipient_id: &str) -> Result<i64> {
        Ok(notification::count_unread(self.db.pool(), recipient_id).await?)
    }

    pub async fn mark_read(&self, recipient_id: &str, notification_id: &str) -> Result<()> {
        if !notification::mark_read(self.db.pool(), recipient_id, notification_id).await? {
            return Err(SharingError::not_found("Notification", notification_id));
        }
        Ok(())
    }

    /// Returns how many notifications changed.
    pub async fn mark_all_read(&self, recipient_id: &str) -> Result<u64> {
        let updated = notification::mark_all_read(self.db.pool(), recipient_id).await?;
        debug!(recipient_id, updated, "Marked notifications read");
        Ok(updated)
    }

    pub async fn delete(&self, recipient_id: &str, notification_id: &str) -> Result<()> {
        if !notification::delete_notification(self.db.pool(), recipient_id, notification_id).await? {
            return Err(SharingError::not_found("Notification", notification_id));
        }
        Ok(())
    }
}
