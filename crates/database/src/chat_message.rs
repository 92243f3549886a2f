//! Persisted assistant conversations.

use sqlx::SqliteExecutor;

use crate::error::Result;
use crate::models::{ChatMessage, ChatRole};

/// Append a message to a user's conversation.
pub async fn append_message(
    executor: impl SqliteExecutor<'_>,
    user_id: &str,
    role: ChatRole,
    content: &str,
) -> Result<ChatMessage> {
    let row = sqlx::query_as::<_, ChatMessage>(
        r#"
        INSERT INTO chat_messages (user_id, role, content)
        VALUES (?, ?, ?)
        RETURNING id, user_id, role, content, created_at
        "#,
    )
    .bind(user_id)
    .bind(role)
    .bind(content)
    .fetch_one(executor)
    .await?;

    Ok(row)
}

/// The most recent `limit` messages, oldest first.
pub async fn recent_messages(executor: impl SqliteExecutor<'_>, user_id: &str, limit: i64) -> Result<Vec<ChatMessage>> {
    let mut rows = sqlx::query_as::<_, ChatMessage>(
        r#"
        SELECT id, user_id, role, content, created_at
        FROM chat_messages
        WHERE user_id = ?
        ORDER BY id DESC
        LIMIT ?
        "#,
    )
    .bind(user_id)
    .bind(limit)
    .fetch_all(executor)
    .await?;

    rows.reverse();
    Ok(rows)
}

/// Delete a user's conversation. Returns the number of messages removed.
pub async fn clear_history(executor: impl SqliteExecutor<'_>, user_id: &str) -> Result<u64> {
    let result = sqlx::query(
        r#"
        DELETE FROM chat_messages
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
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
    async fn test_recent_messages_window() {
        let db = test_db().await;
        for i in 0..5 {
            append_message(db.pool(), "user", ChatRole::User, &format!("q{}", i))
                .await
                .unwrap();
            append_message(db.pool(), "user", ChatRole::Assistant, &format!("a{}", i))
                .await
                .unwrap();
        }
        append_message(db.pool(), "other", ChatRole::User, "hello").await.unwrap();

        let recent = recent_messages(db.pool(), "user", 4).await.unwrap();
        let contents: Vec<&str> = recent.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["q3", "a3", "q4", "a4"]);
        assert_eq!(recent[0].role, ChatRole::User);
    }

    #[tokio::test]
    async fn test_clear_history() {
        let db = test_db().await;
        append_message(db.pool(), "user", ChatRole::User, "hi").await.unwrap();
        append_message(db.pool(), "other", ChatRole::User, "hi").await.unwrap();

        assert_eq!(clear_history(db.pool(), "user").await.unwrap(), 1);
        assert!(recent_messages(db.pool(), "user", 10).await.unwrap().is_empty());
        assert_eq!(recent_messages(db.pool(), "other", 10).await.unwrap().len(), 1);
    }
}
