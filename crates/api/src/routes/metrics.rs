//! Health reading routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use database::health_metric::MetricUpdate;
use database::{HealthMetric, NewHealthMetric};
use serde::Deserialize;
use sharing::{MetricQuery, RecordedMetric};

use crate::auth::CurrentUser;
use crate::error::Result;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct UpdateBody {
    pub value: String,
    pub unit: String,
    pub notes: Option<String>,
    pub recorded_at: Option<String>,
}

/// `POST /api/metrics`: record a reading for the caller and fan it out.
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<NewHealthMetric>,
) -> Result<(StatusCode, Json<RecordedMetric>)> {
    let recorded = state.metrics.record_metric(user.id(), body).await?;
    Ok((StatusCode::CREATED, Json(recorded)))
}

/// `GET /api/users/:owner_id/metrics`
pub async fn list_for_owner(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(owner_id): Path<String>,
    Query(query): Query<MetricQuery>,
) -> Result<Json<Vec<HealthMetric>>> {
    let metrics = state.metrics.list_metrics(user.id(), &owner_id, &query).await?;
    Ok(Json(metrics))
}

/// `GET /api/metrics/:id`
pub async fn get(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<HealthMetric>> {
    Ok(Json(state.metrics.get_metric(user.id(), &id).await?))
}

/// `PUT /api/metrics/:id`
pub async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(body): Json<UpdateBody>,
) -> Result<Json<HealthMetric>> {
    let update = MetricUpdate {
        value: body.value,
        unit: body.unit,
        notes: body.notes,
        recorded_at: body.recorded_at,
    };
    Ok(Json(state.metrics.update_metric(user.id(), &id, update).await?))
}

/// `DELETE /api/metrics/:id`
pub async fn delete(State(state): State<AppState>, user: CurrentUser, Path(id): Path<String>) -> Result<StatusCode> {
    state.metrics.delete_metric(user.id(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
