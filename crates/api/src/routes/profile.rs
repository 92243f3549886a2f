//! The caller's profile, channel opt-ins and delivery destinations.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use database::user::ProfileUpdate;
use database::{Channel, DeliveryDestination, User};
use serde::Deserialize;
use sharing::ChannelSetting;

use crate::auth::CurrentUser;
use crate::error::Result;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct ProfileBody {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
}

#[derive(Deserialize)]
pub struct ChannelBody {
    pub channel: Channel,
    pub enabled: bool,
}

#[derive(Deserialize)]
pub struct DestinationBody {
    pub channel: Channel,
    pub address: String,
}

/// `GET /api/me`. A user who never saved a profile gets an empty one.
pub async fn get_profile(State(state): State<AppState>, user: CurrentUser) -> Result<Json<serde_json::Value>> {
    let profile = state.settings.get_profile(user.id()).await?;
    let body = match profile {
        Some(profile) => serde_json::json!(profile),
        None => serde_json::json!({
            "id": user.id(),
            "full_name": null,
            "email": null,
            "phone": null,
        }),
    };
    Ok(Json(body))
}

/// `PUT /api/me`
pub async fn put_profile(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<ProfileBody>,
) -> Result<Json<User>> {
    let update = ProfileUpdate {
        full_name: body.full_name,
        email: body.email,
        phone: body.phone,
    };
    Ok(Json(state.settings.upsert_profile(user.id(), update).await?))
}

/// `GET /api/me/channels`
pub async fn list_channels(State(state): State<AppState>, user: CurrentUser) -> Result<Json<Vec<ChannelSetting>>> {
    Ok(Json(state.settings.list_channel_preferences(user.id()).await?))
}

/// `PUT /api/me/channels`
pub async fn put_channel(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<ChannelBody>,
) -> Result<Json<ChannelSetting>> {
    let setting = state
        .settings
        .set_channel_enabled(user.id(), body.channel, body.enabled)
        .await?;
    Ok(Json(setting))
}

/// `GET /api/me/destinations`
pub async fn list_destinations(
    State(state): State<AppState>,
    user: CurrentUser,
) -> Result<Json<Vec<DeliveryDestination>>> {
    Ok(Json(state.settings.list_destinations(user.id()).await?))
}

/// `POST /api/me/destinations`
pub async fn add_destination(
    State(state): State<AppState>,
    user: CurrentUser,
    Json(body): Json<DestinationBody>,
) -> Result<(StatusCode, Json<DeliveryDestination>)> {
    let destination = state
        .settings
        .add_destination(user.id(), body.channel, &body.address)
        .await?;
    Ok((StatusCode::CREATED, Json(destination)))
}

/// `DELETE /api/me/destinations/:id`
pub async fn remove_destination(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> Result<StatusCode> {
    state.settings.remove_destination(user.id(), &id).await?;
    Ok(StatusCode::NO_CONTENT)
}
