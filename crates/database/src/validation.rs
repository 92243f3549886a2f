//! Input validation for profile, metric, request and destination fields.

use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};

use crate::models::Channel;

/// Validation error types.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Invalid email format.
    InvalidEmail(String),
    /// Invalid phone number format.
    InvalidPhone(String),
    /// Invalid push endpoint.
    InvalidEndpoint(String),
    /// Timestamp is not RFC 3339.
    InvalidTimestamp(String),
    /// Value too long.
    TooLong { field: String, max: usize, actual: usize },
    /// Empty value where one is required.
    Empty(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidEmail(msg) => write!(f, "Invalid email: {}", msg),
            ValidationError::InvalidPhone(msg) => write!(f, "Invalid phone number: {}", msg),
            ValidationError::InvalidEndpoint(msg) => write!(f, "Invalid push endpoint: {}", msg),
            ValidationError::InvalidTimestamp(msg) => write!(f, "Invalid timestamp: {}", msg),
            ValidationError::TooLong { field, max, actual } => {
                write!(f, "{} is too long ({} chars, max {})", field, actual, max)
            }
            ValidationError::Empty(field) => write!(f, "{} cannot be empty", field),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Maximum allowed length for email addresses.
pub const MAX_EMAIL_LENGTH: usize = 254;

/// Maximum allowed length for display names.
pub const MAX_NAME_LENGTH: usize = 100;

/// Maximum allowed length for metric values.
pub const MAX_VALUE_LENGTH: usize = 64;

/// Maximum allowed length for metric units.
pub const MAX_UNIT_LENGTH: usize = 32;

/// Maximum allowed length for metric notes.
pub const MAX_NOTES_LENGTH: usize = 1000;

/// Maximum allowed length for a reading request message.
pub const MAX_REQUEST_MESSAGE_LENGTH: usize = 500;

/// Maximum allowed length for push endpoints.
pub const MAX_ENDPOINT_LENGTH: usize = 2048;

/// Maximum allowed length for an assistant chat message.
pub const MAX_CHAT_MESSAGE_LENGTH: usize = 4000;

fn check_length(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    let actual = value.chars().count();
    if actual > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
            actual,
        });
    }
    Ok(())
}

fn require(field: &str, value: &str, max: usize) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::Empty(field.to_string()));
    }
    check_length(field, value, max)
}

/// Validate an email address (basic RFC 5322 format check).
///
/// This is a basic validation that checks:
/// - Contains exactly one @
/// - Has at least one character before @
/// - Has a domain with at least one inner dot after @
/// - Is not too long
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    require("email", email, MAX_EMAIL_LENGTH)?;

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ValidationError::InvalidEmail(
            "must contain exactly one @ symbol".to_string(),
        ));
    };

    if domain.contains('@') {
        return Err(ValidationError::InvalidEmail(
            "must contain exactly one @ symbol".to_string(),
        ));
    }

    if local.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "missing local part (before @)".to_string(),
        ));
    }

    if domain.is_empty() {
        return Err(ValidationError::InvalidEmail(
            "missing domain (after @)".to_string(),
        ));
    }

    if !domain.contains('.') {
        return Err(ValidationError::InvalidEmail(
            "domain must contain at least one dot".to_string(),
        ));
    }

    if domain.starts_with('.') || domain.ends_with('.') || domain.contains("..") {
        return Err(ValidationError::InvalidEmail(
            "domain has a misplaced dot".to_string(),
        ));
    }

    Ok(())
}

/// Validate an E.164 phone number (`+` followed by 8 to 15 digits).
pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let phone = phone.trim();
    if phone.is_empty() {
        return Err(ValidationError::Empty("phone".to_string()));
    }

    let Some(digits) = phone.strip_prefix('+') else {
        return Err(ValidationError::InvalidPhone(
            "must start with + and a country code".to_string(),
        ));
    };

    if !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationError::InvalidPhone(
            "must contain only digits after +".to_string(),
        ));
    }

    if !(8..=15).contains(&digits.len()) {
        return Err(ValidationError::InvalidPhone(
            "must have between 8 and 15 digits".to_string(),
        ));
    }

    if digits.starts_with('0') {
        return Err(ValidationError::InvalidPhone(
            "country code cannot start with 0".to_string(),
        ));
    }

    Ok(())
}

/// Validate a push subscription endpoint (HTTPS URL).
pub fn validate_push_endpoint(endpoint: &str) -> Result<(), ValidationError> {
    let endpoint = endpoint.trim();
    require("push endpoint", endpoint, MAX_ENDPOINT_LENGTH)?;

    let Some(rest) = endpoint.strip_prefix("https://") else {
        return Err(ValidationError::InvalidEndpoint("must use https".to_string()));
    };

    if rest.is_empty() || rest.starts_with('/') || rest.contains(char::is_whitespace) {
        return Err(ValidationError::InvalidEndpoint("missing host".to_string()));
    }

    Ok(())
}

/// Validate an address for the given delivery channel.
pub fn validate_destination(channel: Channel, address: &str) -> Result<(), ValidationError> {
    match channel {
        Channel::Push => validate_push_endpoint(address),
        Channel::Email => validate_email(address),
        Channel::Whatsapp => validate_phone(address),
    }
}

/// Validate a display name.
pub fn validate_full_name(name: &str) -> Result<(), ValidationError> {
    require("full name", name, MAX_NAME_LENGTH)
}

/// Validate a metric value such as `120/80` or `72`.
pub fn validate_metric_value(value: &str) -> Result<(), ValidationError> {
    require("value", value, MAX_VALUE_LENGTH)
}

/// Validate a metric unit such as `mmHg`.
pub fn validate_unit(unit: &str) -> Result<(), ValidationError> {
    require("unit", unit, MAX_UNIT_LENGTH)
}

/// Validate optional metric notes.
pub fn validate_notes(notes: &str) -> Result<(), ValidationError> {
    check_length("notes", notes, MAX_NOTES_LENGTH)
}

/// Validate an optional reading request message.
pub fn validate_request_message(message: &str) -> Result<(), ValidationError> {
    check_length("message", message, MAX_REQUEST_MESSAGE_LENGTH)
}

/// Validate a message sent to the assistant.
pub fn validate_chat_message(message: &str) -> Result<(), ValidationError> {
    require("message", message, MAX_CHAT_MESSAGE_LENGTH)
}

/// Parse an RFC 3339 timestamp and render it in UTC with second precision.
///
/// Stored timestamps share this format so they sort lexically.
pub fn normalize_timestamp(value: &str) -> Result<String, ValidationError> {
    let parsed = DateTime::parse_from_rfc3339(value.trim())
        .map_err(|e| ValidationError::InvalidTimestamp(format!("{}: {}", value, e)))?;

    Ok(parsed
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Secs, true))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_email_valid() {
        assert!(validate_email("test@example.com").is_ok());
        assert!(validate_email("user.name@domain.co.uk").is_ok());
        assert!(validate_email(" test@example.com ").is_ok()); // trimmed
    }

    #[test]
    fn test_validate_email_invalid() {
        assert!(matches!(validate_email(""), Err(ValidationError::Empty(_))));
        assert!(matches!(
            validate_email("test.example.com"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("test@example@com"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("@example.com"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("test@localhost"),
            Err(ValidationError::InvalidEmail(_))
        ));
        assert!(matches!(
            validate_email("test@example..com"),
            Err(ValidationError::InvalidEmail(_))
        ));
    }

    #[test]
    fn test_validate_email_too_long() {
        let email = format!("{}@example.com", "a".repeat(250));
        assert!(matches!(
            validate_email(&email),
            Err(ValidationError::TooLong { .. })
        ));
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+15551234567").is_ok());
        assert!(validate_phone("+447911123456").is_ok());

        assert!(matches!(validate_phone(""), Err(ValidationError::Empty(_))));
        assert!(matches!(
            validate_phone("15551234567"),
            Err(ValidationError::InvalidPhone(_))
        ));
        assert!(matches!(
            validate_phone("+1 555 123"),
            Err(ValidationError::InvalidPhone(_))
        ));
        assert!(matches!(
            validate_phone("+1234"),
            Err(ValidationError::InvalidPhone(_))
        ));
        assert!(matches!(
            validate_phone("+0123456789"),
            Err(ValidationError::InvalidPhone(_))
        ));
    }

    #[test]
    fn test_validate_destination_by_channel() {
        assert!(validate_destination(Channel::Push, "https://fcm.googleapis.com/fcm/send/abc").is_ok());
        assert!(validate_destination(Channel::Push, "http://insecure.example/abc").is_err());
        assert!(validate_destination(Channel::Push, "https:///nohost").is_err());
        assert!(validate_destination(Channel::Email, "a@b.co").is_ok());
        assert!(validate_destination(Channel::Whatsapp, "+15551234567").is_ok());
        assert!(validate_destination(Channel::Whatsapp, "a@b.co").is_err());
    }

    #[test]
    fn test_metric_fields() {
        assert!(validate_metric_value("120/80").is_ok());
        assert!(matches!(validate_metric_value("  "), Err(ValidationError::Empty(_))));
        assert!(matches!(
            validate_metric_value(&"9".repeat(65)),
            Err(ValidationError::TooLong { .. })
        ));
        assert!(validate_unit("mmHg").is_ok());
        assert!(validate_unit("").is_err());
        assert!(validate_notes("").is_ok());
        assert!(validate_notes(&"n".repeat(1001)).is_err());
        assert!(validate_request_message(&"m".repeat(500)).is_ok());
        assert!(validate_request_message(&"m".repeat(501)).is_err());
    }

    #[test]
    fn test_normalize_timestamp() {
        assert_eq!(
            normalize_timestamp("2025-03-01T10:00:00+02:00").unwrap(),
            "2025-03-01T08:00:00Z"
        );
        assert_eq!(
            normalize_timestamp("2025-03-01T08:00:00.123Z").unwrap(),
            "2025-03-01T08:00:00Z"
        );
        assert!(matches!(
            normalize_timestamp("yesterday"),
            Err(ValidationError::InvalidTimestamp(_))
        ));
    }

    #[test]
    fn test_validation_error_display() {
        let err = ValidationError::InvalidPhone("test message".to_string());
        assert_eq!(err.to_string(), "Invalid phone number: test message");

        let err = ValidationError::TooLong {
            field: "notes".to_string(),
            max: 1000,
            actual: 1200,
        };
        assert_eq!(err.to_string(), "notes is too long (1200 chars, max 1000)");
    }
}
