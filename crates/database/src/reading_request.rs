//! Reading request storage.

use sqlx::SqliteExecutor;

use crate::error::{DatabaseError, Result};
use crate::models::{new_id, ReadingRequest, RequestStatus};

const REQUEST_COLUMNS: &str = "id, requester_id, owner_id, status, message, created_at, updated_at";

/// Insert a pending request.
///
/// Returns [`DatabaseError::AlreadyExists`] if a row for the pair exists.
pub async fn insert_request(
    executor: impl SqliteExecutor<'_>,
    requester_id: &str,
    owner_id: &str,
    message: Option<&str>,
) -> Result<ReadingRequest> {
    let query = format!(
        r#"
        INSERT INTO reading_requests (id, requester_id, owner_id, status, message)
        VALUES (?, ?, ?, 'pending', ?)
        RETURNING {REQUEST_COLUMNS}
        "#
    );

    let row = sqlx::query_as::<_, ReadingRequest>(&query)
        .bind(new_id())
        .bind(requester_id)
        .bind(owner_id)
        .bind(message)
        .fetch_one(executor)
        .await
        .map_err(DatabaseError::unique_violation(
            "ReadingRequest",
            format!("{}/{}", requester_id, owner_id),
        ))?;

    Ok(row)
}

/// Get a request by ID.
pub async fn find_request(executor: impl SqliteExecutor<'_>, id: &str) -> Result<Option<ReadingRequest>> {
    let query = format!("SELECT {REQUEST_COLUMNS} FROM reading_requests WHERE id = ?");

    let row = sqlx::query_as::<_, ReadingRequest>(&query)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(row)
}

/// Get the request for a (requester, owner) pair.
pub async fn find_request_for_pair(
    executor: impl SqliteExecutor<'_>,
    requester_id: &str,
    owner_id: &str,
) -> Result<Option<ReadingRequest>> {
    let query = format!(
        "SELECT {REQUEST_COLUMNS} FROM reading_requests WHERE requester_id = ? AND owner_id = ?"
    );

    let row = sqlx::query_as::<_, ReadingRequest>(&query)
        .bind(requester_id)
        .bind(owner_id)
        .fetch_optional(executor)
        .await?;

    Ok(row)
}

/// Move a non-pending request back to pending with a new message.
pub async fn reopen_request(
    executor: impl SqliteExecutor<'_>,
    id: &str,
    message: Option<&str>,
) -> Result<Option<ReadingRequest>> {
    let query = format!(
        r#"
        UPDATE reading_requests
        SET status = 'pending', message = ?, updated_at = datetime('now')
        WHERE id = ? AND status <> 'pending'
        RETURNING {REQUEST_COLUMNS}
        "#
    );

    let row = sqlx::query_as::<_, ReadingRequest>(&query)
        .bind(message)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(row)
}

/// Resolve a pending request.
///
/// The update only matches while the row is still pending, so it returns
/// `None` if the request was already resolved.
pub async fn resolve_request(
    executor: impl SqliteExecutor<'_>,
    id: &str,
    status: RequestStatus,
) -> Result<Option<ReadingRequest>> {
    let query = format!(
        r#"
        UPDATE reading_requests
        SET status = ?, updated_at = datetime('now')
        WHERE id = ? AND status = 'pending'
        RETURNING {REQUEST_COLUMNS}
        "#
    );

    let row = sqlx::query_as::<_, ReadingRequest>(&query)
        .bind(status)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(row)
}

/// Delete a request while it is still pending.
///
/// Returns true if a row was deleted.
pub async fn delete_pending_request(executor: impl SqliteExecutor<'_>, id: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM reading_requests
        WHERE id = ? AND status = 'pending'
        "#,
    )
    .bind(id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Requests addressed to an owner, newest first.
pub async fn list_incoming(
    executor: impl SqliteExecutor<'_>,
    owner_id: &str,
    status: Option<RequestStatus>,
) -> Result<Vec<ReadingRequest>> {
    let query = format!(
        r#"
        SELECT {REQUEST_COLUMNS}
        FROM reading_requests
        WHERE owner_id = ?1 AND (?2 IS NULL OR status = ?2)
        ORDER BY updated_at DESC
        "#
    );

    let rows = sqlx::query_as::<_, ReadingRequest>(&query)
        .bind(owner_id)
        .bind(status)
        .fetch_all(executor)
        .await?;

    Ok(rows)
}

/// Requests made by a requester, newest first.
pub async fn list_outgoing(executor: impl SqliteExecutor<'_>, requester_id: &str) -> Result<Vec<ReadingRequest>> {
    let query = format!(
        r#"
        SELECT {REQUEST_COLUMNS}
        FROM reading_requests
        WHERE requester_id = ?
        ORDER BY updated_at DESC
        "#
    );

    let rows = sqlx::query_as::<_, ReadingRequest>(&query)
        .bind(requester_id)
        .fetch_all(executor)
        .await?;

    Ok(rows)
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
    async fn test_pair_is_unique() {
        let db = test_db().await;

        insert_request(db.pool(), "viewer", "owner", Some("hi")).await.unwrap();
        let result = insert_request(db.pool(), "viewer", "owner", None).await;
        assert!(matches!(result, Err(DatabaseError::AlreadyExists { .. })));

        // The reverse direction is a different pair
        insert_request(db.pool(), "owner", "viewer", None).await.unwrap();
    }

    #[tokio::test]
    async fn test_self_request_rejected_by_schema() {
        let db = test_db().await;
        let result = insert_request(db.pool(), "same", "same", None).await;
        assert!(matches!(result, Err(DatabaseError::Sqlx(_))));
    }

    #[tokio::test]
    async fn test_resolve_only_once() {
        let db = test_db().await;
        let request = insert_request(db.pool(), "viewer", "owner", None).await.unwrap();
        assert_eq!(request.status, RequestStatus::Pending);

        let resolved = resolve_request(db.pool(), &request.id, RequestStatus::Declined)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(resolved.status, RequestStatus::Declined);

        let again = resolve_request(db.pool(), &request.id, RequestStatus::Accepted)
            .await
            .unwrap();
        assert!(again.is_none());

        let reopened = reopen_request(db.pool(), &request.id, Some("please"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reopened.status, RequestStatus::Pending);
        assert_eq!(reopened.message.as_deref(), Some("please"));
    }

    #[tokio::test]
    async fn test_list_incoming_and_outgoing() {
        let db = test_db().await;
        let first = insert_request(db.pool(), "a", "owner", None).await.unwrap();
        insert_request(db.pool(), "b", "owner", None).await.unwrap();
        resolve_request(db.pool(), &first.id, RequestStatus::Accepted)
            .await
            .unwrap();

        let all = list_incoming(db.pool(), "owner", None).await.unwrap();
        assert_eq!(all.len(), 2);

        let pending = list_incoming(db.pool(), "owner", Some(RequestStatus::Pending))
            .await
            .unwrap();
        assert_eq!(pending.len(), 1);
        assert_eq!(pending[0].requester_id, "b");

        let outgoing = list_outgoing(db.pool(), "a").await.unwrap();
        assert_eq!(outgoing.len(), 1);
        assert!(!delete_pending_request(db.pool(), &first.id).await.unwrap());
    }
}
