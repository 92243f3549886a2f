//! Recording and reading health metrics.

use database::health_metric::{self, MetricUpdate};
use database::{validation, Database, HealthMetric, MetricType, NewHealthMetric};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, SharingError};
use crate::guard::{self, AccessGuard};
use crate::notifier::{self, FanoutReport};

/// Default number of readings returned by a list call.
pub const DEFAULT_LIST_LIMIT: i64 = 100;

/// Largest accepted list limit.
pub const MAX_LIST_LIMIT: i64 = 500;

/// Filters for listing readings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct MetricQuery {
    pub metric_type: Option<MetricType>,
    pub limit: Option<i64>,
}

impl MetricQuery {
    fn effective_limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_LIST_LIMIT).clamp(1, MAX_LIST_LIMIT)
    }
}

/// A stored reading and what its fanout produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordedMetric {
    pub metric: HealthMetric,
    pub fanout: FanoutReport,
}

/// Writes readings (with fanout) and serves guarded reads.
#[derive(Debug, Clone)]
pub struct MetricService {
    db: Database,
    guard: AccessGuard,
}

impl MetricService {
    pub fn new(db: Database) -> Self {
        let guard = AccessGuard::new(db.clone());
        Self { db, guard }
    }

    /// Store a reading for `owner_id` and notify every active viewer.
    ///
    /// The reading, its notifications and its queue entries commit together.
    pub async fn record_metric(&self, owner_id: &str, new: NewHealthMetric) -> Result<RecordedMetric> {
        let new = validate_new(new)?;

        let mut tx = self.db.begin().await?;
        let metric = health_metric::insert_metric(&mut *tx, owner_id, &new).await?;
        let fanout = notifier::on_metric_created(&mut *tx, &metric).await?;
        tx.commit().await?;

        info!(
            metric_id = %metric.id,
            owner_id,
            metric_type = %metric.metric_type,
            viewers_notified = fanout.notifications,
            "Reading recorded"
        );

        Ok(RecordedMetric { metric, fanout })
    }

    /// List `owner_id`'s readings as seen by `viewer_id`.
    ///
    /// Fails with [`SharingError::Forbidden`] if the viewer has no active grant.
    pub async fn list_metrics(&self, viewer_id: &str, owner_id: &str, query: &MetricQuery) -> Result<Vec<HealthMetric>> {
        self.guard.ensure_can_read(viewer_id, owner_id).await?;

        Ok(health_metric::list_metrics(self.db.pool(), owner_id, query.metric_type, query.effective_limit()).await?)
    }

    /// Get a single reading as seen by `viewer_id`.
    ///
    /// A reading the viewer may not see is reported as not found.
    pub async fn get_metric(&self, viewer_id: &str, metric_id: &str) -> Result<HealthMetric> {
        let not_found = || SharingError::not_found("HealthMetric", metric_id);

        let metric = health_metric::find_metric(self.db.pool(), metric_id)
            .await?
            .ok_or_else(not_found)?;

        if !guard::can_read(self.db.pool(), viewer_id, &metric.owner_id).await? {
            debug!(viewer_id, metric_id, "Read denied");
            return Err(not_found());
        }

        Ok(metric)
    }

    /// Edit one of `owner_id`'s readings. Viewers are not notified of edits.
    pub async fn update_metric(&self, owner_id: &str, metric_id: &str, update: MetricUpdate) -> Result<HealthMetric> {
        let value = update.value.trim().to_string();
        let unit = update.unit.trim().to_string();
        validation::validate_metric_value(&value)?;
        validation::validate_unit(&unit)?;
        let update = MetricUpdate {
            value,
            unit,
            notes: clean_notes(update.notes)?,
            recorded_at: update
                .recorded_at
                .as_deref()
                .map(validation::normalize_timestamp)
                .transpose()?,
        };

        let metric = health_metric::update_metric(self.db.pool(), owner_id, metric_id, &update).await?;
        info!(metric_id, owner_id, "Reading updated");
        Ok(metric)
    }

    /// Delete one of `owner_id`'s readings.
    pub async fn delete_metric(&self, owner_id: &str, metric_id: &str) -> Result<()> {
        health_metric::delete_metric(self.db.pool(), owner_id, metric_id).await?;
        info!(metric_id, owner_id, "Reading deleted");
        Ok(())
    }
}

fn validate_new(new: NewHealthMetric) -> Result<NewHealthMetric> {
    let value = new.value.trim().to_string();
    let unit = new.unit.trim().to_string();
    validation::validate_metric_value(&value)?;
    validation::validate_unit(&unit)?;

    let recorded_at = new
        .recorded_at
        .as_deref()
        .map(validation::normalize_timestamp)
        .transpose()?;

    Ok(NewHealthMetric {
        metric_type: new.metric_type,
        value,
        unit,
        notes: clean_notes(new.notes)?,
        recorded_at,
    })
}

fn clean_notes(notes: Option<String>) -> Result<Option<String>> {
    match notes.map(|n| n.trim().to_string()).filter(|n| !n.is_empty()) {
        Some(notes) => {
            validation::validate_notes(&notes)?;
            Ok(Some(notes))
        }
        None => Ok(None),
    }
}
