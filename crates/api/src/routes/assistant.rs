//! Assistant chat routes.

use assistant::ChatExchange;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use database::ChatMessage;
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::error::Result;
use crate::state::AppState;

const DEFAULT_HISTORY_LIMIT: i64 = 50;

#[derive(Deserialize)]
pub struct ChatBody {
    pub message: String,
}

#[derive(Deserialize)]
pub struct HistoryQuery {
    pub limit: Option<i64>,
}

/// `POST /api/assistant/chat`
pub async fn chat(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<ChatBody>,
) -> Result<Json<ChatExchange>> {
    Ok(Json(state.chat.send(user.id(), &body.message).await?))
}

/// `GET /api/assistant/history`
pub async fn history(
    State(state): State<AppState>,
    user: CurrentUser,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<ChatMessage>>> {
    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT).clamp(1, 500);
    Ok(Json(state.chat.history(user.id(), limit).await?))
}

/// `DELETE /api/assistant/history`
pub async fn clear_history(State(state): State<AppState>, user: CurrentUser) -> Result<StatusCode> {
    state.chat.clear_history(user.id()).await?;
    Ok(StatusCode::NO_CONTENT)
}
