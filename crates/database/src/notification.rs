//! In-app notification storage.

use sqlx::types::Json;
use sqlx::SqliteExecutor;

use crate::error::Result;
use crate::models::{new_id, NewNotification, Notification};

const NOTIFICATION_COLUMNS: &str =
    "id, recipient_id, actor_id, notification_type, title, message, payload, is_read, created_at";

/// Insert a notification.
pub async fn insert_notification(
    executor: impl SqliteExecutor<'_>,
    notification: &NewNotification,
) -> Result<Notification> {
    let query = format!(
        r#"
        INSERT INTO notifications (id, recipient_id, actor_id, notification_type, title, message, payload)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        RETURNING {NOTIFICATION_COLUMNS}
        "#
    );

    let row = sqlx::query_as::<_, Notification>(&query)
        .bind(new_id())
        .bind(&notification.recipient_id)
        .bind(&notification.actor_id)
        .bind(notification.notification_type)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(Json(&notification.payload))
        .fetch_one(executor)
        .await?;

    Ok(row)
}

/// List a recipient's notifications, newest first.
pub async fn list_for_recipient(
    executor: impl SqliteExecutor<'_>,
    recipient_id: &str,
    unread_only: bool,
    limit: i64,
) -> Result<Vec<Notification>> {
    let query = format!(
        r#"
        SELECT {NOTIFICATION_COLUMNS}
        FROM notifications
        WHERE recipient_id = ?1 AND (?2 = 0 OR is_read = 0)
        ORDER BY created_at DESC, rowid DESC
        LIMIT ?3
        "#
    );

    let rows = sqlx::query_as::<_, Notification>(&query)
        .bind(recipient_id)
        .bind(unread_only)
        .bind(limit)
        .fetch_all(executor)
        .await?;

    Ok(rows)
}

/// Count a recipient's unread notifications.
pub async fn count_unread(executor: impl SqliteExecutor<'_>, recipient_id: &str) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*)
        FROM notifications
        WHERE recipient_id = ? AND is_read = 0
        "#,
    )
    .bind(recipient_id)
    .fetch_one(executor)
    .await?;

    Ok(count)
}

/// Mark one of a recipient's notifications as read.
///
/// Returns false if the recipient has no such notification.
pub async fn mark_read(executor: impl SqliteExecutor<'_>, recipient_id: &str, id: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE notifications
        SET is_read = 1
        WHERE id = ? AND recipient_id = ?
        "#,
    )
    .bind(id)
    .bind(recipient_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Mark every unread notification of a recipient as read.
pub async fn mark_all_read(executor: impl SqliteExecutor<'_>, recipient_id: &str) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE notifications
        SET is_read = 1
        WHERE recipient_id = ? AND is_read = 0
        "#,
    )
    .bind(recipient_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Delete one of a recipient's notifications.
pub async fn delete_notification(executor: impl SqliteExecutor<'_>, recipient_id: &str, id: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM notifications
        WHERE id = ? AND recipient_id = ?
        "#,
    )
    .bind(id)
    .bind(recipient_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}
