//! Grant management routes.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use database::ReadingPermission;
use sharing::GrantSummary;

use crate::auth::CurrentUser;
use crate::error::Result;
use crate::state::AppState;

/// `GET /api/permissions/viewers`: who can read the caller's readings.
pub async fn viewers(State(state): State<AppState>, user: CurrentUser) -> Result<Json<Vec<GrantSummary>>> {
    Ok(Json(state.permissions.list_viewers(user.id()).await?))
}

/// `GET /api/permissions/owners`: whose readings the caller can read.
pub async fn owners(State(state): State<AppState>, user: CurrentUser) -> Result<Json<Vec<GrantSummary>>> {
    Ok(Json(state.permissions.list_owners(user.id()).await?))
}

pub async fn block(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(viewer_id): Path<String>,
) -> Result<Json<ReadingPermission>> {
    Ok(Json(state.permissions.block_viewer(user.id(), &viewer_id).await?))
}

pub async fn unblock(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(viewer_id): Path<String>,
) -> Result<Json<ReadingPermission>> {
    Ok(Json(state.permissions.unblock_viewer(user.id(), &viewer_id).await?))
}

pub async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(viewer_id): Path<String>,
) -> Result<StatusCode> {
    state.permissions.remove_viewer(user.id(), &viewer_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
