//! Delivery destinations: push endpoints, email addresses, phone numbers.

use sqlx::SqliteExecutor;

use crate::error::Result;
use crate::models::{new_id, Channel, DeliveryDestination};

const DESTINATION_COLUMNS: &str =
    "id, user_id, channel, address, is_active, last_error, created_at, deactivated_at";

/// Register a destination. Re-registering a known address reactivates it.
pub async fn add_destination(
    executor: impl SqliteExecutor<'_>,
    user_id: &str,
    channel: Channel,
    address: &str,
) -> Result<DeliveryDestination> {
    let query = format!(
        r#"
        INSERT INTO delivery_destinations (id, user_id, channel, address)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(user_id, channel, address) DO UPDATE SET
            is_active = 1,
            last_error = NULL,
            deactivated_at = NULL
        RETURNING {DESTINATION_COLUMNS}
        "#
    );

    let row = sqlx::query_as::<_, DeliveryDestination>(&query)
        .bind(new_id())
        .bind(user_id)
        .bind(channel)
        .bind(address)
        .fetch_one(executor)
        .await?;

    Ok(row)
}

/// All destinations for a user, including inactive ones.
pub async fn list_for_user(executor: impl SqliteExecutor<'_>, user_id: &str) -> Result<Vec<DeliveryDestination>> {
    let query = format!(
        r#"
        SELECT {DESTINATION_COLUMNS}
        FROM delivery_destinations
        WHERE user_id = ?
        ORDER BY channel, created_at, rowid
        "#
    );

    let rows = sqlx::query_as::<_, DeliveryDestination>(&query)
        .bind(user_id)
        .fetch_all(executor)
        .await?;

    Ok(rows)
}

/// Active destinations for a user on one channel.
pub async fn list_active(
    executor: impl SqliteExecutor<'_>,
    user_id: &str,
    channel: Channel,
) -> Result<Vec<DeliveryDestination>> {
    let query = format!(
        r#"
        SELECT {DESTINATION_COLUMNS}
        FROM delivery_destinations
        WHERE user_id = ? AND channel = ? AND is_active = 1
        ORDER BY created_at, rowid
        "#
    );

    let rows = sqlx::query_as::<_, DeliveryDestination>(&query)
        .bind(user_id)
        .bind(channel)
        .fetch_all(executor)
        .await?;

    Ok(rows)
}

/// Mark a destination as permanently unusable.
pub async fn deactivate(executor: impl SqliteExecutor<'_>, id: &str, error: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE delivery_destinations
        SET is_active = 0, last_error = ?, deactivated_at = datetime('now')
        WHERE id = ? AND is_active = 1
        "#,
    )
    .bind(error)
    .bind(id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Remove one of a user's destinations.
pub async fn remove_destination(executor: impl SqliteExecutor<'_>, user_id: &str, id: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM delivery_destinations
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(id)
    .bind(user_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
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
    async fn test_deactivate_and_reactivate() {
        let db = test_db().await;
        let dest = add_destination(db.pool(), "user", Channel::Push, "https://push.example/abc")
            .await
            .unwrap();
        assert!(dest.is_active);

        assert!(deactivate(db.pool(), &dest.id, "410 Gone").await.unwrap());
        assert!(!deactivate(db.pool(), &dest.id, "410 Gone").await.unwrap());
        assert!(list_active(db.pool(), "user", Channel::Push).await.unwrap().is_empty());

        let all = list_for_user(db.pool(), "user").await.unwrap();
        assert_eq!(all[0].last_error.as_deref(), Some("410 Gone"));
        assert!(all[0].deactivated_at.is_some());

        let again = add_destination(db.pool(), "user", Channel::Push, "https://push.example/abc")
            .await
            .unwrap();
        assert_eq!(again.id, dest.id);
        assert!(again.is_active);
        assert!(again.last_error.is_none());
    }

    #[tokio::test]
    async fn test_active_is_per_channel() {
        let db = test_db().await;
        add_destination(db.pool(), "user", Channel::Push, "https://push.example/1").await.unwrap();
        add_destination(db.pool(), "user", Channel::Push, "https://push.example/2").await.unwrap();
        add_destination(db.pool(), "user", Channel::Email, "user@example.com").await.unwrap();

        assert_eq!(list_active(db.pool(), "user", Channel::Push).await.unwrap().len(), 2);
        assert_eq!(list_active(db.pool(), "user", Channel::Email).await.unwrap().len(), 1);
        assert!(list_active(db.pool(), "user", Channel::Whatsapp).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_destination_is_user_scoped() {
        let db = test_db().await;
        let dest = add_destination(db.pool(), "user", Channel::Email, "user@example.com")
            .await
            .unwrap();

        assert!(!remove_destination(db.pool(), "other", &dest.id).await.unwrap());
        assert!(remove_destination(db.pool(), "user", &dest.id).await.unwrap());
        assert!(list_for_user(db.pool(), "user").await.unwrap().is_empty());
    }
}
