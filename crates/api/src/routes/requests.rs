//! Reading request routes.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use database::{ReadingRequest, RequestStatus};
use serde::Deserialize;
use sharing::Decision;

use crate::auth::CurrentUser;
use crate::error::Result;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CreateBody {
    pub owner_id: String,
    pub message: Option<String>,
}

#[derive(Deserialize)]
pub struct IncomingQuery {
    pub status: Option<RequestStatus>,
}

/// `POST /api/requests`: ask another user for access to their readings.
pub async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<CreateBody>,
) -> Result<(StatusCode, Json<ReadingRequest>)> {
    let request = state
        .workflow
        .create_request(user.id(), &body.owner_id, body.message.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(request)))
}

/// `GET /api/requests/incoming?status=pending`
pub async fn incoming(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<IncomingQuery>,
) -> Result<Json<Vec<ReadingRequest>>> {
    Ok(Json(state.workflow.list_incoming(user.id(), query.status).await?))
}

/// `GET /api/requests/outgoing`
pub async fn outgoing(State(state): State<AppState>, user: CurrentUser) -> Result<Json<Vec<ReadingRequest>>> {
    Ok(Json(state.workflow.list_outgoing(user.id()).await?))
}

/// `POST /api/requests/:id/accept`
pub async fn accept(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ReadingRequest>> {
    Ok(Json(state.workflow.respond(&id, user.id(), Decision::Accept).await?))
}

/// `POST /api/requests/:id/decline`
pub async fn decline(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<Json<ReadingRequest>> {
    Ok(Json(state.workflow.respond(&id, user.id(), Decision::Decline).await?))
}

/// `DELETE /api/requests/:id`: the requester withdraws a pending request.
pub async fn cancel(State(state): State<AppState>, user: CurrentUser, Path(id): Path<String>) -> Result<StatusCode> {
    state.workflow.cancel_request(&id, user.id()).await?;
    Ok(StatusCode::NO_CONTENT)
}
