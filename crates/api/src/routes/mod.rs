//! Route handlers for the Vitals API.

pub mod assistant;
pub mod health;
pub mod metrics;
pub mod notifications;
pub mod permissions;
pub mod profile;
pub mod requests;

use axum::routing::{delete, get, post};
use axum::Router;

use crate::state::AppState;

/// Build the router with all routes.
pub fn router() -> Router<AppState> {
    Router::new()
        // Health check
        .route("/health", get(health::health))
        // Profile and delivery settings
        .route("/api/me", get(profile::get_profile).put(profile::put_profile))
        .route("/api/me/channels", get(profile::list_channels).put(profile::put_channel))
        .route(
            "/api/me/destinations",
            get(profile::list_destinations).post(profile::add_destination),
        )
        .route("/api/me/destinations/:id", delete(profile::remove_destination))
        // Readings
        .route("/api/metrics", post(metrics::create))
        .route(
            "/api/metrics/:id",
            get(metrics::get).put(metrics::update).delete(metrics::delete),
        )
        .route("/api/users/:owner_id/metrics", get(metrics::list_for_owner))
        // Reading requests
        .route("/api/requests", post(requests::create))
        .route("/api/requests/incoming", get(requests::incoming))
        .route("/api/requests/outgoing", get(requests::outgoing))
        .route("/api/requests/:id/accept", post(requests::accept))
        .route("/api/requests/:id/decline", post(requests::decline))
        .route("/api/requests/:id", delete(requests::cancel))
        // Grants
        .route("/api/permissions/viewers", get(permissions::viewers))
        .route("/api/permissions/owners", get(permissions::owners))
        .route("/api/permissions/:viewer_id/block", post(permissions::block))
        .route("/api/permissions/:viewer_id/unblock", post(permissions::unblock))
        .route("/api/permissions/:viewer_id", delete(permissions::remove))
        // Inbox
        .route("/api/notifications", get(notifications::list))
        .route("/api/notifications/unread-count", get(notifications::unread_count))
        .route("/api/notifications/read-all", post(notifications::mark_all_read))
        .route("/api/notifications/:id/read", post(notifications::mark_read))
        .route("/api/notifications/:id", delete(notifications::delete))
        // Assistant
        .route("/api/assistant/chat", post(assistant::chat))
        .route(
            "/api/assistant/history",
            get(assistant::history).delete(assistant::clear_history),
        )
}
