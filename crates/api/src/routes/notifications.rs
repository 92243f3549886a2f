//! In-app notification inbox routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use database::Notification;
use serde::{Deserialize, Serialize};

use crate::auth::CurrentUser;
use crate::error::Result;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub unread_only: bool,
    pub limit: Option<i64>,
}

#[derive(Serialize)]
pub struct UnreadCount {
    pub unread: i64,
}

#[derive(Serialize)]
pub struct MarkedRead {
    pub updated: u64,
}

/// `GET /api/notifications?unread_only=true&limit=20`
pub async fn list(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<ListQuery>,
) -> Result<Json<Vec<Notification>>> {
    let notifications = state.inbox.list(user.id(), query.unread_only, query.limit).await?;
    Ok(Json(notifications))
}

/// `GET /api/notifications/unread-count`
pub async fn unread_count(State(state): State<AppState>, user: CurrentUser) -> Result<Json<UnreadCount>> {
    let unread = state.inbox.count_unread(user.id()).await?;
    Ok(Json(UnreadCount { unread }))
}

/// `POST /api/notifications/:id/read`
pub async fn mark_read(State(state): State<AppState>, user: CurrentUser, Path(id): Path<String>) -> Result<StatusCode> {
    state.inbox.mark_read(user.id(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/notifications/read-all`
pub async fn mark_all_read(State(state): State<AppState>, user: CurrentUser) -> Result<Json<MarkedRead>> {
    let updated = state.inbox.mark_all_read(user.id()).await?;
    Ok(Json(MarkedRead { updated }))
}

/// `DELETE /api/notifications/:id`
pub async fn delete(State(state): State<AppState>, user: CurrentUser, Path(id): Path<String>) -> Result<StatusCode> {
    state.inbox.delete(user.id(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
