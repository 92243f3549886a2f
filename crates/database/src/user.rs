//! User profile operations.

use sqlx::SqliteExecutor;

use crate::error::{DatabaseError, Result};
use crate::models::User;

/// Profile fields supplied by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Create or replace a user's profile.
pub async fn upsert_user(
    executor: impl SqliteExecutor<'_>,
    id: &str,
    profile: &ProfileUpdate,
) -> Result<User> {
    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (id, full_name, email, phone)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            full_name = excluded.full_name,
            email = excluded.email,
            phone = excluded.phone,
            updated_at = datetime('now')
        RETURNING id, full_name, email, phone, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(&profile.full_name)
    .bind(&profile.email)
    .bind(&profile.phone)
    .fetch_one(executor)
    .await?;

    Ok(user)
}

/// Get a user by ID, if a profile exists.
pub async fn find_user(executor: impl SqliteExecutor<'_>, id: &str) -> Result<Option<User>> {
    let user = sqlx::query_as::<_, User>(
        r#"
        SELECT id, full_name, email, phone, created_at, updated_at
        FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(user)
}

/// Get a user by ID.
pub async fn get_user(executor: impl SqliteExecutor<'_>, id: &str) -> Result<User> {
    find_user(executor, id)
        .await?
        .ok_or_else(|| DatabaseError::not_found("User", id))
}

/// Delete a user's profile.
pub async fn delete_user(executor: impl SqliteExecutor<'_>, id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM users
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("User", id));
    }

    Ok(())
}

/// Count stored profiles.
pub async fn count_users(executor: impl SqliteExecutor<'_>) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM users
        "#,
    )
    .fetch_one(executor)
    .await?;

    Ok(count)
}
