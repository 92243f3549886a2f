//! Health metric storage.

use sqlx::SqliteExecutor;

use crate::error::{DatabaseError, Result};
use crate::models::{new_id, HealthMetric, MetricType, NewHealthMetric};

const METRIC_COLUMNS: &str =
    "id, owner_id, metric_type, value, unit, notes, recorded_at, created_at, updated_at";

/// Editable fields of an existing reading.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricUpdate {
    pub value: String,
    pub unit: String,
    pub notes: Option<String>,
    /// Keeps the stored value when absent.
    pub recorded_at: Option<String>,
}

/// Insert a reading for `owner_id`.
pub async fn insert_metric(
    executor: impl SqliteExecutor<'_>,
    owner_id: &str,
    metric: &NewHealthMetric,
) -> Result<HealthMetric> {
    let query = format!(
        r#"
        INSERT INTO health_metrics (id, owner_id, metric_type, value, unit, notes, recorded_at)
        VALUES (?, ?, ?, ?, ?, ?, COALESCE(?, strftime('%Y-%m-%dT%H:%M:%SZ', 'now')))
        RETURNING {METRIC_COLUMNS}
        "#
    );

    let row = sqlx::query_as::<_, HealthMetric>(&query)
        .bind(new_id())
        .bind(owner_id)
        .bind(metric.metric_type)
        .bind(&metric.value)
        .bind(&metric.unit)
        .bind(&metric.notes)
        .bind(&metric.recorded_at)
        .fetch_one(executor)
        .await?;

    Ok(row)
}

/// Get a reading by ID without any access check.
pub async fn find_metric(executor: impl SqliteExecutor<'_>, id: &str) -> Result<Option<HealthMetric>> {
    let query = format!("SELECT {METRIC_COLUMNS} FROM health_metrics WHERE id = ?");

    let row = sqlx::query_as::<_, HealthMetric>(&query)
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(row)
}

/// List an owner's readings, newest first.
pub async fn list_metrics(
    executor: impl SqliteExecutor<'_>,
    owner_id: &str,
    metric_type: Option<MetricType>,
    limit: i64,
) -> Result<Vec<HealthMetric>> {
    let query = format!(
        r#"
        SELECT {METRIC_COLUMNS}
        FROM health_metrics
        WHERE owner_id = ?1 AND (?2 IS NULL OR metric_type = ?2)
        ORDER BY recorded_at DESC, created_at DESC
        LIMIT ?3
        "#
    );

    let rows = sqlx::query_as::<_, HealthMetric>(&query)
        .bind(owner_id)
        .bind(metric_type)
        .bind(limit)
        .fetch_all(executor)
        .await?;

    Ok(rows)
}

/// Update a reading. Only the owner's own rows match.
pub async fn update_metric(
    executor: impl SqliteExecutor<'_>,
    owner_id: &str,
    id: &str,
    update: &MetricUpdate,
) -> Result<HealthMetric> {
    let query = format!(
        r#"
        UPDATE health_metrics
        SET value = ?, unit = ?, notes = ?,
            recorded_at = COALESCE(?, recorded_at),
            updated_at = datetime('now')
        WHERE id = ? AND owner_id = ?
        RETURNING {METRIC_COLUMNS}
        "#
    );

    sqlx::query_as::<_, HealthMetric>(&query)
        .bind(&update.value)
        .bind(&update.unit)
        .bind(&update.notes)
        .bind(&update.recorded_at)
        .bind(id)
        .bind(owner_id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| DatabaseError::not_found("HealthMetric", id))
}

/// Delete a reading. Only the owner's own rows match.
pub async fn delete_metric(executor: impl SqliteExecutor<'_>, owner_id: &str, id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM health_metrics
        WHERE id = ? AND owner_id = ?
        "#,
    )
    .bind(id)
    .bind(owner_id)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::not_found("HealthMetric", id));
    }

    Ok(())
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

    fn reading(metric_type: MetricType, value: &str, unit: &str, at: &str) -> NewHealthMetric {
        NewHealthMetric {
            metric_type,
            value: value.to_string(),
            unit: unit.to_string(),
            notes: None,
            recorded_at: Some(at.to_string()),
        }
    }

    #[tokio::test]
    async fn test_insert_and_list_newest_first() {
        let db = test_db().await;

        insert_metric(
            db.pool(),
            "owner",
            &reading(MetricType::HeartRate, "72", "bpm", "2025-03-01T08:00:00Z"),
        )
        .await
        .unwrap();
        insert_metric(
            db.pool(),
            "owner",
            &reading(MetricType::BloodPressure, "120/80", "mmHg", "2025-03-02T08:00:00Z"),
        )
        .await
        .unwrap();
        insert_metric(
            db.pool(),
            "someone-else",
            &reading(MetricType::Weight, "80", "kg", "2025-03-03T08:00:00Z"),
        )
        .await
        .unwrap();

        let all = list_metrics(db.pool(), "owner", None, 100).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].value, "120/80");
        assert_eq!(all[1].metric_type, MetricType::HeartRate);

        let filtered = list_metrics(db.pool(), "owner", Some(MetricType::HeartRate), 100)
            .await
            .unwrap();
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].unit, "bpm");
    }

    #[tokio::test]
    async fn test_recorded_at_defaults_to_now() {
        let db = test_db().await;
        let metric = NewHealthMetric {
            recorded_at: None,
            ..reading(MetricType::Sleep, "7.5", "h", "")
        };

        let row = insert_metric(db.pool(), "owner", &metric).await.unwrap();
        assert!(row.recorded_at.ends_with('Z'));
        assert_eq!(row.recorded_at.len(), "2025-03-01T08:00:00Z".len());
    }

    #[tokio::test]
    async fn test_update_and_delete_are_owner_scoped() {
        let db = test_db().await;
        let row = insert_metric(
            db.pool(),
            "owner",
            &reading(MetricType::Temperature, "37.0", "C", "2025-03-01T08:00:00Z"),
        )
        .await
        .unwrap();

        let update = MetricUpdate {
            value: "37.4".to_string(),
            unit: "C".to_string(),
            notes: Some("after run".to_string()),
            recorded_at: None,
        };

        let result = update_metric(db.pool(), "intruder", &row.id, &update).await;
        assert!(matches!(result, Err(DatabaseError::NotFound { .. })));

        let updated = update_metric(db.pool(), "owner", &row.id, &update).await.unwrap();
        assert_eq!(updated.value, "37.4");
        assert_eq!(updated.recorded_at, "2025-03-01T08:00:00Z");

        assert!(delete_metric(db.pool(), "intruder", &row.id).await.is_err());
        delete_metric(db.pool(), "owner", &row.id).await.unwrap();
        assert!(find_metric(db.pool(), &row.id).await.unwrap().is_none());
    }
}
