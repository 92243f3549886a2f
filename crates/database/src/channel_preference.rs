//! Per-user opt-in for out-of-app delivery channels.

use sqlx::SqliteExecutor;

use crate::error::Result;
use crate::models::{Channel, ChannelPreference};

/// Enable or disable a channel for a user.
pub async fn set_channel_enabled(
    executor: impl SqliteExecutor<'_>,
    user_id: &str,
    channel: Channel,
    enabled: bool,
) -> Result<ChannelPreference> {
    let row = sqlx::query_as::<_, ChannelPreference>(
        r#"
        INSERT INTO channel_preferences (user_id, channel, enabled)
        VALUES (?, ?, ?)
        ON CONFLICT(user_id, channel) DO UPDATE SET
            enabled = excluded.enabled,
            updated_at = datetime('now')
        RETURNING user_id, channel, enabled, updated_at
        "#,
    )
    .bind(user_id)
    .bind(channel)
    .bind(enabled)
    .fetch_one(executor)
    .await?;

    Ok(row)
}

/// All stored preferences for a user.
pub async fn list_preferences(executor: impl SqliteExecutor<'_>, user_id: &str) -> Result<Vec<ChannelPreference>> {
    let rows = sqlx::query_as::<_, ChannelPreference>(
        r#"
        SELECT user_id, channel, enabled, updated_at
        FROM channel_preferences
        WHERE user_id = ?
        ORDER BY channel
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// Channels a user has opted into. Channels without a row are disabled.
pub async fn enabled_channels(executor: impl SqliteExecutor<'_>, user_id: &str) -> Result<Vec<Channel>> {
    let channels = sqlx::query_scalar::<_, Channel>(
        r#"
        SELECT channel
        FROM channel_preferences
        WHERE user_id = ? AND enabled = 1
        ORDER BY channel
        "#,
    )
    .bind(user_id)
    .fetch_all(executor)
    .await?;

    Ok(channels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_channels_default_disabled() {
        let db = test_db().await;
        assert!(enabled_channels(db.pool(), "user").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_toggle_channel() {
        let db = test_db().await;

        set_channel_enabled(db.pool(), "user", Channel::Push, true).await.unwrap();
        set_channel_enabled(db.pool(), "user", Channel::Email, true).await.unwrap();
        let channels = enabled_channels(db.pool(), "user").await.unwrap();
        assert_eq!(channels.len(), 2);
        assert!(channels.contains(&Channel::Push));

        let pref = set_channel_enabled(db.pool(), "user", Channel::Push, false).await.unwrap();
        assert!(!pref.enabled);
        assert_eq!(enabled_channels(db.pool(), "user").await.unwrap(), vec![Channel::Email]);
        assert_eq!(list_preferences(db.pool(), "user").await.unwrap().len(), 2);
    }
}
