//! Event notifier.
//!
//! Turns domain events into in-app notifications plus one delivery-queue
//! entry per channel the recipient has enabled. Every function takes the
//! connection of the triggering transaction, so nothing written here becomes
//! visible unless the triggering row commits too.

use database::{
    channel_preference, delivery_queue, notification, reading_permission, user, DeliveryContent, HealthMetric,
    NewNotification, Notification, NotificationType, ReadingRequest, User,
};
use serde::Serialize;
use serde_json::json;
use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::error::Result;

/// Name used when a user has no profile details.
pub const FALLBACK_DISPLAY_NAME: &str = "Someone";

/// Counts of what one event produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FanoutReport {
    /// In-app notifications written.
    pub notifications: usize,
    /// Delivery-queue entries created.
    pub deliveries: usize,
}

impl FanoutReport {
    fn add(&mut self, deliveries: usize) {
        self.notifications += 1;
        self.deliveries += deliveries;
    }
}

/// Name shown to other users: full name, then the email local part, then
/// [`FALLBACK_DISPLAY_NAME`].
pub fn display_name(user: Option<&User>) -> String {
    let Some(user) = user else {
        return FALLBACK_DISPLAY_NAME.to_string();
    };

    if let Some(name) = user.full_name.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        return name.to_string();
    }

    user.email
        .as_deref()
        .and_then(|email| email.split('@').next())
        .map(str::trim)
        .filter(|local| !local.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| FALLBACK_DISPLAY_NAME.to_string())
}

/// Body text for a new-reading notification.
pub fn metric_message(owner_name: &str, metric: &HealthMetric) -> String {
    format!(
        "{} logged a new {}: {} {}",
        owner_name,
        metric.metric_type.label(),
        metric.value,
        metric.unit
    )
}

/// Notify every active viewer of `metric.owner_id` about a new reading.
///
/// The viewer set is read on this connection, so it reflects the grants in
/// force when the reading was inserted.
pub async fn on_metric_created(conn: &mut SqliteConnection, metric: &HealthMetric) -> Result<FanoutReport> {
    let viewers = reading_permission::active_viewer_ids(&mut *conn, &metric.owner_id).await?;
    let mut report = FanoutReport::default();

    if viewers.is_empty() {
        debug!(metric_id = %metric.id, "No viewers to notify");
        return Ok(report);
    }

    let owner = user::find_user(&mut *conn, &metric.owner_id).await?;
    let message = metric_message(&display_name(owner.as_ref()), metric);
    let payload = json!({
        "metric_id": metric.id,
        "owner_id": metric.owner_id,
        "metric_type": metric.metric_type,
        "value": metric.value,
        "unit": metric.unit,
        "recorded_at": metric.recorded_at,
    });

    for viewer_id in viewers {
        let (_, deliveries) = emit(
            &mut *conn,
            NewNotification {
                recipient_id: viewer_id,
                actor_id: Some(metric.owner_id.clone()),
                notification_type: NotificationType::HealthMetric,
                title: "New health reading".to_string(),
                message: message.clone(),
                payload: payload.clone(),
            },
        )
        .await?;
        report.add(deliveries);
    }

    info!(
        metric_id = %metric.id,
        owner_id = %metric.owner_id,
        notifications = report.notifications,
        deliveries = report.deliveries,
        "Fanned out new reading"
    );

    Ok(report)
}

/// Tell the owner someone asked to read their metrics.
pub async fn on_request_created(conn: &mut SqliteConnection, request: &ReadingRequest) -> Result<Notification> {
    let requester = user::find_user(&mut *conn, &request.requester_id).await?;
    let name = display_name(requester.as_ref());

    let mut payload = json!({
        "request_id": request.id,
        "requester_id": request.requester_id,
    });
    if let Some(message) = &request.message {
        payload["message"] = json!(message);
    }

    let (notification, _) = emit(
        conn,
        NewNotification {
            recipient_id: request.owner_id.clone(),
            actor_id: Some(request.requester_id.clone()),
            notification_type: NotificationType::ReadingRequest,
            title: "New reading request".to_string(),
            message: format!("{} wants to see your health readings", name),
            payload,
        },
    )
    .await?;

    Ok(notification)
}

/// Tell the requester their request was accepted.
pub async fn on_request_accepted(conn: &mut SqliteConnection, request: &ReadingRequest) -> Result<Notification> {
    let owner = user::find_user(&mut *conn, &request.owner_id).await?;
    let name = display_name(owner.as_ref());

    let (notification, _) = emit(
        conn,
        NewNotification {
            recipient_id: request.requester_id.clone(),
            actor_id: Some(request.owner_id.clone()),
            notification_type: NotificationType::ReadingAccepted,
            title: "Reading request accepted".to_string(),
            message: format!("{} accepted your request to see their health readings", name),
            payload: json!({
                "request_id": request.id,
                "owner_id": request.owner_id,
            }),
        },
    )
    .await?;

    Ok(notification)
}

/// Write a notification and queue it on each enabled channel.
///
/// Returns the notification and the number of queue entries created.
async fn emit(conn: &mut SqliteConnection, new: NewNotification) -> Result<(Notification, usize)> {
    let notification = notification::insert_notification(&mut *conn, &new).await?;
    let channels = channel_preference::enabled_channels(&mut *conn, &new.recipient_id).await?;

    let content = DeliveryContent {
        title: new.title,
        body: new.message,
        notification_type: new.notification_type,
        data: new.payload,
    };

    for channel in &channels {
        delivery_queue::enqueue(
            &mut *conn,
            Some(&notification.id),
            &notification.recipient_id,
            *channel,
            &content,
        )
        .await?;
    }

    debug!(
        notification_id = %notification.id,
        recipient_id = %notification.recipient_id,
        channels = channels.len(),
        "Emitted notification"
    );

    Ok((notification, channels.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::{Channel, Database, MetricType, NewHealthMetric};

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn profile(full_name: Option<&str>, email: Option<&str>) -> User {
        User {
            id: "u1".to_string(),
            full_name: full_name.map(str::to_string),
            email: email.map(str::to_string),
            phone: None,
            created_at: String::new(),
            updated_at: String::new(),
        }
    }

    #[test]
    fn test_display_name_fallbacks() {
        assert_eq!(display_name(Some(&profile(Some("Ana Ruiz"), None))), "Ana Ruiz");
        assert_eq!(display_name(Some(&profile(Some("  "), Some("ana@example.com")))), "ana");
        assert_eq!(display_name(Some(&profile(None, None))), "Someone");
        assert_eq!(display_name(None), "Someone");
    }

    #[tokio::test]
    async fn test_emit_queues_enabled_channels_only() {
        let db = test_db().await;
        channel_preference::set_channel_enabled(db.pool(), "viewer", Channel::Email, true)
            .await
            .unwrap();
        channel_preference::set_channel_enabled(db.pool(), "viewer", Channel::Push, false)
            .await
            .unwrap();
        reading_permission::grant_permission(db.pool(), "viewer", "owner")
            .await
            .unwrap();

        let mut tx = db.begin().await.unwrap();
        let metric = database::health_metric::insert_metric(
            &mut *tx,
            "owner",
            &NewHealthMetric {
                metric_type: MetricType::HeartRate,
                value: "72".to_string(),
                unit: "bpm".to_string(),
                notes: None,
                recorded_at: None,
            },
        )
        .await
        .unwrap();
        let report = on_metric_created(&mut *tx, &metric).await.unwrap();
        tx.commit().await.unwrap();

        assert_eq!(report, FanoutReport { notifications: 1, deliveries: 1 });

        let entries = delivery_queue::list_for_recipient(db.pool(), "viewer").await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].channel, Channel::Email);
        assert_eq!(entries[0].content.0.body, "Someone logged a new heart rate reading: 72 bpm");
    }
}
