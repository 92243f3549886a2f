//! Database models.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;

/// Cached profile for an identity issued by the auth provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    /// Subject id from the auth provider.
    pub id: String,
    /// Full display name.
    pub full_name: Option<String>,
    /// Email address.
    pub email: Option<String>,
    /// Phone number in E.164 format.
    pub phone: Option<String>,
    /// Creation timestamp.
    pub created_at: String,
    /// Last update timestamp.
    pub updated_at: String,
}

/// Kind of health reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum MetricType {
    BloodPressure,
    HeartRate,
    Temperature,
    Weight,
    Sleep,
}

impl MetricType {
    /// All metric types, in display order.
    pub const ALL: [MetricType; 5] = [
        MetricType::BloodPressure,
        MetricType::HeartRate,
        MetricType::Temperature,
        MetricType::Weight,
        MetricType::Sleep,
    ];

    /// Stored column value.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricType::BloodPressure => "blood_pressure",
            MetricType::HeartRate => "heart_rate",
            MetricType::Temperature => "temperature",
            MetricType::Weight => "weight",
            MetricType::Sleep => "sleep",
        }
    }

    /// Human-readable label used in notification text.
    pub fn label(&self) -> &'static str {
        match self {
            MetricType::BloodPressure => "blood pressure reading",
            MetricType::HeartRate => "heart rate reading",
            MetricType::Temperature => "temperature reading",
            MetricType::Weight => "weight reading",
            MetricType::Sleep => "sleep record",
        }
    }
}

impl fmt::Display for MetricType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MetricType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        MetricType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown metric type: {}", s))
    }
}

/// A single health reading owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct HealthMetric {
    pub id: String,
    pub owner_id: String,
    pub metric_type: MetricType,
    /// Reading value as entered (e.g. "120/80").
    pub value: String,
    pub unit: String,
    pub notes: Option<String>,
    /// When the reading was taken (RFC 3339, UTC).
    pub recorded_at: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Fields for a new health reading.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewHealthMetric {
    pub metric_type: MetricType,
    pub value: String,
    pub unit: String,
    pub notes: Option<String>,
    /// Defaults to now when absent.
    pub recorded_at: Option<String>,
}

/// Lifecycle of a reading request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum RequestStatus {
    Pending,
    Accepted,
    Declined,
}

impl RequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RequestStatus::Pending => "pending",
            RequestStatus::Accepted => "accepted",
            RequestStatus::Declined => "declined",
        }
    }
}

/// A request from `requester_id` to read `owner_id`'s metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ReadingRequest {
    pub id: String,
    pub requester_id: String,
    pub owner_id: String,
    pub status: RequestStatus,
    pub message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// State of a viewer's grant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum PermissionStatus {
    Active,
    Blocked,
}

impl PermissionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PermissionStatus::Active => "active",
            PermissionStatus::Blocked => "blocked",
        }
    }
}

/// One-way grant letting `viewer_id` read `owner_id`'s metrics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ReadingPermission {
    pub id: String,
    pub viewer_id: String,
    pub owner_id: String,
    pub status: PermissionStatus,
    pub created_at: String,
    pub updated_at: String,
}

/// What triggered a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum NotificationType {
    HealthMetric,
    ReadingRequest,
    ReadingAccepted,
}

impl NotificationType {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationType::HealthMetric => "health_metric",
            NotificationType::ReadingRequest => "reading_request",
            NotificationType::ReadingAccepted => "reading_accepted",
        }
    }
}

/// An in-app notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Notification {
    pub id: String,
    pub recipient_id: String,
    pub actor_id: Option<String>,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub payload: Json<serde_json::Value>,
    pub is_read: bool,
    pub created_at: String,
}

/// Fields for a new notification.
#[derive(Debug, Clone, PartialEq)]
pub struct NewNotification {
    pub recipient_id: String,
    pub actor_id: Option<String>,
    pub notification_type: NotificationType,
    pub title: String,
    pub message: String,
    pub payload: serde_json::Value,
}

/// Out-of-app delivery channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Channel {
    Push,
    Email,
    Whatsapp,
}

impl Channel {
    pub const ALL: [Channel; 3] = [Channel::Push, Channel::Email, Channel::Whatsapp];

    pub fn as_str(&self) -> &'static str {
        match self {
            Channel::Push => "push",
            Channel::Email => "email",
            Channel::Whatsapp => "whatsapp",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Channel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "push" => Ok(Channel::Push),
            "email" | "e-mail" => Ok(Channel::Email),
            "whatsapp" => Ok(Channel::Whatsapp),
            other => Err(format!("unknown channel: {}", other)),
        }
    }
}

/// Whether a user wants notifications on a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ChannelPreference {
    pub user_id: String,
    pub channel: Channel,
    pub enabled: bool,
    pub updated_at: String,
}

/// A channel-specific address: push endpoint, email address, or phone number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DeliveryDestination {
    pub id: String,
    pub user_id: String,
    pub channel: Channel,
    pub address: String,
    pub is_active: bool,
    pub last_error: Option<String>,
    pub created_at: String,
    pub deactivated_at: Option<String>,
}

/// Rendered content carried by a queue entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryContent {
    pub title: String,
    pub body: String,
    pub notification_type: NotificationType,
    #[serde(default)]
    pub data: serde_json::Value,
}

/// Queue entry state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum DeliveryStatus {
    Pending,
    Sent,
    Failed,
}

/// A pending or processed out-of-app delivery.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DeliveryQueueEntry {
    pub id: String,
    pub notification_id: Option<String>,
    pub recipient_id: String,
    pub channel: Channel,
    pub content: Json<DeliveryContent>,
    pub status: DeliveryStatus,
    pub attempts: i64,
    pub retryable: bool,
    pub claim_token: Option<String>,
    pub claimed_at: Option<String>,
    pub attempted_at: Option<String>,
    pub error: Option<String>,
    pub created_at: String,
}

/// Result of sending to a single destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum DeliveryOutcome {
    Delivered,
    PermanentlyInvalid,
    TransientError,
}

/// Per-destination delivery record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct DeliveryAttempt {
    pub id: i64,
    pub entry_id: String,
    pub destination_id: String,
    pub outcome: DeliveryOutcome,
    pub error: Option<String>,
    pub attempted_at: String,
}

/// Author of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ChatRole {
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChatRole::User => "user",
            ChatRole::Assistant => "assistant",
        }
    }
}

/// A persisted assistant conversation message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct ChatMessage {
    pub id: i64,
    pub user_id: String,
    pub role: ChatRole,
    pub content: String,
    pub created_at: String,
}

/// Generate a new row id.
pub fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_type_round_trip_str() {
        for t in MetricType::ALL {
            assert_eq!(t.as_str().parse::<MetricType>().unwrap(), t);
        }
        assert!("steps".parse::<MetricType>().is_err());
    }

    #[test]
    fn test_channel_from_str() {
        assert_eq!("push".parse::<Channel>().unwrap(), Channel::Push);
        assert_eq!("E-Mail".parse::<Channel>().unwrap(), Channel::Email);
        assert_eq!("WhatsApp".parse::<Channel>().unwrap(), Channel::Whatsapp);
        assert!("sms".parse::<Channel>().is_err());
    }

    #[test]
    fn test_enum_serde_snake_case() {
        let json = serde_json::to_string(&NotificationType::ReadingAccepted).unwrap();
        assert_eq!(json, "\"reading_accepted\"");
        let t: MetricType = serde_json::from_str("\"blood_pressure\"").unwrap();
        assert_eq!(t, MetricType::BloodPressure);
    }
}
