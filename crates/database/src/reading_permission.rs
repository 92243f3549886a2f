//! Reading permission storage.
//!
//! A permission row is the only source of truth for whether a viewer may
//! read an owner's metrics. Nothing here caches.

use sqlx::SqliteExecutor;

use crate::error::Result;
use crate::models::{new_id, PermissionStatus, ReadingPermission};

const PERMISSION_COLUMNS: &str = "id, viewer_id, owner_id, status, created_at, updated_at";

/// Grant `viewer_id` active access to `owner_id`.
///
/// An existing row is left untouched. Returns true if a row was inserted.
pub async fn grant_permission(executor: impl SqliteExecutor<'_>, viewer_id: &str, owner_id: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        INSERT INTO reading_permissions (id, viewer_id, owner_id, status)
        VALUES (?, ?, ?, 'active')
        ON CONFLICT(viewer_id, owner_id) DO NOTHING
        "#,
    )
    .bind(new_id())
    .bind(viewer_id)
    .bind(owner_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Get the permission row for a pair.
pub async fn find_permission(
    executor: impl SqliteExecutor<'_>,
    viewer_id: &str,
    owner_id: &str,
) -> Result<Option<ReadingPermission>> {
    let query = format!(
        "SELECT {PERMISSION_COLUMNS} FROM reading_permissions WHERE viewer_id = ? AND owner_id = ?"
    );

    let row = sqlx::query_as::<_, ReadingPermission>(&query)
        .bind(viewer_id)
        .bind(owner_id)
        .fetch_optional(executor)
        .await?;

    Ok(row)
}

/// Check whether an active permission exists for a pair.
pub async fn is_active(executor: impl SqliteExecutor<'_>, viewer_id: &str, owner_id: &str) -> Result<bool> {
    let result = sqlx::query_scalar::<_, i32>(
        r#"
        SELECT 1
        FROM reading_permissions
        WHERE viewer_id = ? AND owner_id = ? AND status = 'active'
        "#,
    )
    .bind(viewer_id)
    .bind(owner_id)
    .fetch_optional(executor)
    .await?;

    Ok(result.is_some())
}

/// Set the status of an owner's grant to a viewer.
pub async fn set_status(
    executor: impl SqliteExecutor<'_>,
    owner_id: &str,
    viewer_id: &str,
    status: PermissionStatus,
) -> Result<Option<ReadingPermission>> {
    let query = format!(
        r#"
        UPDATE reading_permissions
        SET status = ?, updated_at = datetime('now')
        WHERE owner_id = ? AND viewer_id = ?
        RETURNING {PERMISSION_COLUMNS}
        "#
    );

    let row = sqlx::query_as::<_, ReadingPermission>(&query)
        .bind(status)
        .bind(owner_id)
        .bind(viewer_id)
        .fetch_optional(executor)
        .await?;

    Ok(row)
}

/// Remove an owner's grant to a viewer. Returns true if a row was deleted.
pub async fn delete_permission(executor: impl SqliteExecutor<'_>, owner_id: &str, viewer_id: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        DELETE FROM reading_permissions
        WHERE owner_id = ? AND viewer_id = ?
        "#,
    )
    .bind(owner_id)
    .bind(viewer_id)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// All grants issued by an owner, active and blocked.
pub async fn list_for_owner(executor: impl SqliteExecutor<'_>, owner_id: &str) -> Result<Vec<ReadingPermission>> {
    let query = format!(
        r#"
        SELECT {PERMISSION_COLUMNS}
        FROM reading_permissions
        WHERE owner_id = ?
        ORDER BY created_at, rowid
        "#
    );

    let rows = sqlx::query_as::<_, ReadingPermission>(&query)
        .bind(owner_id)
        .fetch_all(executor)
        .await?;

    Ok(rows)
}

/// Active grants held by a viewer.
pub async fn list_active_for_viewer(
    executor: impl SqliteExecutor<'_>,
    viewer_id: &str,
) -> Result<Vec<ReadingPermission>> {
    let query = format!(
        r#"
        SELECT {PERMISSION_COLUMNS}
        FROM reading_permissions
        WHERE viewer_id = ? AND status = 'active'
        ORDER BY created_at, rowid
        "#
    );

    let rows = sqlx::query_as::<_, ReadingPermission>(&query)
        .bind(viewer_id)
        .fetch_all(executor)
        .await?;

    Ok(rows)
}

/// IDs of every viewer with an active grant to `owner_id`.
pub async fn active_viewer_ids(executor: impl SqliteExecutor<'_>, owner_id: &str) -> Result<Vec<String>> {
    let ids = sqlx::query_scalar::<_, String>(
        r#"
        SELECT viewer_id
        FROM reading_permissions
        WHERE owner_id = ? AND status = 'active'
        ORDER BY created_at, rowid
        "#,
    )
    .bind(owner_id)
    .fetch_all(executor)
    .await?;

    Ok(ids)
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
    async fn test_grant_is_idempotent() {
        let db = test_db().await;

        assert!(grant_permission(db.pool(), "viewer", "owner").await.unwrap());
        assert!(!grant_permission(db.pool(), "viewer", "owner").await.unwrap());

        let rows = list_for_owner(db.pool(), "owner").await.unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].status, PermissionStatus::Active);
    }

    #[tokio::test]
    async fn test_grant_does_not_reactivate_blocked() {
        let db = test_db().await;
        grant_permission(db.pool(), "viewer", "owner").await.unwrap();
        set_status(db.pool(), "owner", "viewer", PermissionStatus::Blocked)
            .await
            .unwrap()
            .unwrap();

        grant_permission(db.pool(), "viewer", "owner").await.unwrap();
        assert!(!is_active(db.pool(), "viewer", "owner").await.unwrap());
    }

    #[tokio::test]
    async fn test_is_active_follows_status() {
        let db = test_db().await;
        assert!(!is_active(db.pool(), "viewer", "owner").await.unwrap());

        grant_permission(db.pool(), "viewer", "owner").await.unwrap();
        assert!(is_active(db.pool(), "viewer", "owner").await.unwrap());
        // One-way
        assert!(!is_active(db.pool(), "owner", "viewer").await.unwrap());

        set_status(db.pool(), "owner", "viewer", PermissionStatus::Blocked)
            .await
            .unwrap();
        assert!(!is_active(db.pool(), "viewer", "owner").await.unwrap());
        assert!(active_viewer_ids(db.pool(), "owner").await.unwrap().is_empty());
        assert!(list_active_for_viewer(db.pool(), "viewer").await.unwrap().is_empty());

        set_status(db.pool(), "owner", "viewer", PermissionStatus::Active)
            .await
            .unwrap();
        assert_eq!(active_viewer_ids(db.pool(), "owner").await.unwrap(), vec!["viewer"]);
    }

    #[tokio::test]
    async fn test_delete_permission() {
        let db = test_db().await;
        grant_permission(db.pool(), "viewer", "owner").await.unwrap();

        assert!(delete_permission(db.pool(), "owner", "viewer").await.unwrap());
        assert!(!delete_permission(db.pool(), "owner", "viewer").await.unwrap());
        assert!(find_permission(db.pool(), "viewer", "owner").await.unwrap().is_none());
    }
}
