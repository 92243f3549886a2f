//! Out-of-app delivery queue.
//!
//! Entries are written by the notifier inside the triggering transaction and
//! consumed by per-channel dispatchers. A dispatcher first claims a batch by
//! stamping a claim token on it in a single statement; later updates must
//! present that token, so two concurrent runs never process the same entry.

use sqlx::types::Json;
use sqlx::SqliteExecutor;

use crate::error::Result;
use crate::models::{
    new_id, Channel, DeliveryAttempt, DeliveryContent, DeliveryOutcome, DeliveryQueueEntry, DeliveryStatus,
};

const ENTRY_COLUMNS: &str = "id, notification_id, recipient_id, channel, content, status, attempts, \
     retryable, claim_token, claimed_at, attempted_at, error, created_at";

/// Queue a delivery for one recipient on one channel.
pub async fn enqueue(
    executor: impl SqliteExecutor<'_>,
    notification_id: Option<&str>,
    recipient_id: &str,
    channel: Channel,
    content: &DeliveryContent,
) -> Result<DeliveryQueueEntry> {
    let query = format!(
        r#"
        INSERT INTO delivery_queue (id, notification_id, recipient_id, channel, content)
        VALUES (?, ?, ?, ?, ?)
        RETURNING {ENTRY_COLUMNS}
        "#
    );

    let row = sqlx::query_as::<_, DeliveryQueueEntry>(&query)
        .bind(new_id())
        .bind(notification_id)
        .bind(recipient_id)
        .bind(channel)
        .bind(Json(content))
        .fetch_one(executor)
        .await?;

    Ok(row)
}

/// Claim up to `limit` pending entries for a channel.
///
/// Entries claimed by a run that never finished become claimable again once
/// the claim is older than `claim_ttl_secs`.
pub async fn claim_batch(
    executor: impl SqliteExecutor<'_>,
    channel: Channel,
    limit: i64,
    claim_ttl_secs: i64,
) -> Result<Vec<DeliveryQueueEntry>> {
    let query = format!(
        r#"
        UPDATE delivery_queue
        SET claim_token = ?1, claimed_at = datetime('now')
        WHERE id IN (
            SELECT id
            FROM delivery_queue
            WHERE channel = ?2
              AND status = 'pending'
              AND (claim_token IS NULL OR claimed_at <= datetime('now', ?3))
            ORDER BY created_at, rowid
            LIMIT ?4
        )
        RETURNING {ENTRY_COLUMNS}
        "#
    );

    let mut rows = sqlx::query_as::<_, DeliveryQueueEntry>(&query)
        .bind(new_id())
        .bind(channel)
        .bind(format!("-{} seconds", claim_ttl_secs.max(0)))
        .bind(limit)
        .fetch_all(executor)
        .await?;

    rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    Ok(rows)
}

/// Restamp a claim so it does not expire while the holder is still working.
///
/// Returns false when the entry is no longer pending under `claim_token`,
/// meaning another run has taken it over.
pub async fn renew_claim(executor: impl SqliteExecutor<'_>, id: &str, claim_token: &str) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE delivery_queue
        SET claimed_at = datetime('now')
        WHERE id = ? AND claim_token = ? AND status = 'pending'
        "#,
    )
    .bind(id)
    .bind(claim_token)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Mark a claimed entry as delivered. `note` keeps partial-failure details.
pub async fn mark_sent(
    executor: impl SqliteExecutor<'_>,
    id: &str,
    claim_token: &str,
    note: Option<&str>,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE delivery_queue
        SET status = 'sent',
            attempts = attempts + 1,
            retryable = 0,
            attempted_at = datetime('now'),
            error = ?,
            claim_token = NULL
        WHERE id = ? AND claim_token = ?
        "#,
    )
    .bind(note)
    .bind(id)
    .bind(claim_token)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Mark a claimed entry as failed.
pub async fn mark_failed(
    executor: impl SqliteExecutor<'_>,
    id: &str,
    claim_token: &str,
    error: &str,
    retryable: bool,
) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE delivery_queue
        SET status = 'failed',
            attempts = attempts + 1,
            retryable = ?,
            attempted_at = datetime('now'),
            error = ?,
            claim_token = NULL
        WHERE id = ? AND claim_token = ?
        "#,
    )
    .bind(retryable)
    .bind(error)
    .bind(id)
    .bind(claim_token)
    .execute(executor)
    .await?;

    Ok(result.rows_affected() > 0)
}

/// Record the outcome for one destination of an entry.
pub async fn record_attempt(
    executor: impl SqliteExecutor<'_>,
    entry_id: &str,
    destination_id: &str,
    outcome: DeliveryOutcome,
    error: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO delivery_attempts (entry_id, destination_id, outcome, error)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(entry_id)
    .bind(destination_id)
    .bind(outcome)
    .bind(error)
    .execute(executor)
    .await?;

    Ok(())
}

/// Per-destination outcomes recorded for an entry.
pub async fn list_attempts(executor: impl SqliteExecutor<'_>, entry_id: &str) -> Result<Vec<DeliveryAttempt>> {
    let rows = sqlx::query_as::<_, DeliveryAttempt>(
        r#"
        SELECT id, entry_id, destination_id, outcome, error, attempted_at
        FROM delivery_attempts
        WHERE entry_id = ?
        ORDER BY id
        "#,
    )
    .bind(entry_id)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// Put retryable failed entries back to pending.
///
/// Only entries with fewer than `max_attempts` attempts are touched. This is
/// never called by the dispatcher itself.
pub async fn requeue_failed(executor: impl SqliteExecutor<'_>, channel: Channel, max_attempts: i64) -> Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE delivery_queue
        SET status = 'pending', claim_token = NULL, claimed_at = NULL
        WHERE channel = ? AND status = 'failed' AND retryable = 1 AND attempts < ?
        "#,
    )
    .bind(channel)
    .bind(max_attempts)
    .execute(executor)
    .await?;

    Ok(result.rows_affected())
}

/// Get an entry by ID.
pub async fn find_entry(executor: impl SqliteExecutor<'_>, id: &str) -> Result<Option<DeliveryQueueEntry>> {
    let query = format!("SELECT {ENTRY_COLUMNS} FROM delivery_queue WHERE id = ?");

    let row = sqlx::query_as::<_, DeliveryQueueEntry>(&query)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(row)
}

/// All entries queued for a recipient, oldest first.
pub async fn list_for_recipient(
    executor: impl SqliteExecutor<'_>,
    recipient_id: &str,
) -> Result<Vec<DeliveryQueueEntry>> {
    let query = format!(
        r#"
        SELECT {ENTRY_COLUMNS}
        FROM delivery_queue
        WHERE recipient_id = ?
        ORDER BY created_at, rowid
        "#
    );

    let rows = sqlx::query_as::<_, DeliveryQueueEntry>(&query)
        .bind(recipient_id)
        .fetch_all(executor)
        .await?;

    Ok(rows)
}

/// Entry counts per status for a channel.
pub async fn count_by_status(executor: impl SqliteExecutor<'_>, channel: Channel) -> Result<Vec<(DeliveryStatus, i64)>> {
    let rows = sqlx::query_as::<_, (DeliveryStatus, i64)>(
        r#"
        SELECT status, COUNT(*) as count
        FROM delivery_queue
        WHERE channel = ?
        GROUP BY status
        ORDER BY status
        "#,
    )
    .bind(channel)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}
