//! Profile details, channel opt-ins and delivery destinations.

use database::user::{self, ProfileUpdate};
use database::{channel_preference, destination, validation, Channel, Database, DeliveryDestination, User};
use serde::Serialize;
use tracing::info;

use crate::error::{Result, SharingError};

/// Whether a channel is enabled for a user. Channels never set are off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChannelSetting {
    pub channel: Channel,
    pub enabled: bool,
}

/// Per-user settings that shape how notifications are rendered and delivered.
#[derive(Debug, Clone)]
pub struct SettingsService {
    db: Database,
}

impl SettingsService {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// The cached profile, if the user has saved one.
    pub async fn get_profile(&self, user_id: &str) -> Result<Option<User>> {
        Ok(user::find_user(self.db.pool(), user_id).await?)
    }

    /// Validate and store profile details. Blank fields are cleared.
    pub async fn upsert_profile(&self, user_id: &str, profile: ProfileUpdate) -> Result<User> {
        let profile = ProfileUpdate {
            full_name: non_blank(profile.full_name),
            email: non_blank(profile.email),
            phone: non_blank(profile.phone),
        };

        if let Some(name) = &profile.full_name {
            validation::validate_full_name(name)?;
        }
        if let Some(email) = &profile.email {
            validation::validate_email(email)?;
        }
        if let Some(phone) = &profile.phone {
            validation::validate_phone(phone)?;
        }

        let user = user::upsert_user(self.db.pool(), user_id, &profile).await?;
        info!(user_id, "Profile saved");
        Ok(user)
    }

    /// One entry per channel, in a fixed order.
    pub async fn list_channel_preferences(&self, user_id: &str) -> Result<Vec<ChannelSetting>> {
        let enabled = channel_preference::enabled_channels(self.db.pool(), user_id).await?;

        Ok(Channel::ALL
            .into_iter()
            .map(|channel| ChannelSetting {
                channel,
                enabled: enabled.contains(&channel),
            })
            .collect())
    }

    pub async fn set_channel_enabled(&self, user_id: &str, channel: Channel, enabled: bool) -> Result<ChannelSetting> {
        let preference = channel_preference::set_channel_enabled(self.db.pool(), user_id, channel, enabled).await?;
        info!(user_id, channel = %channel, enabled, "Channel preference changed");

        Ok(ChannelSetting {
            channel: preference.channel,
            enabled: preference.enabled,
        })
    }

    /// Register an address for a channel, validated for that channel.
    pub async fn add_destination(&self, user_id: &str, channel: Channel, address: &str) -> Result<DeliveryDestination> {
        let address = address.trim();
        validation::validate_destination(channel, address)?;

        let destination = destination::add_destination(self.db.pool(), user_id, channel, address).await?;
        info!(user_id, channel = %channel, destination_id = %destination.id, "Destination added");
        Ok(destination)
    }

    pub async fn list_destinations(&self, user_id: &str) -> Result<Vec<DeliveryDestination>> {
        Ok(destination::list_for_user(self.db.pool(), user_id).await?)
    }

    pub async fn remove_destination(&self, user_id: &str, destination_id: &str) -> Result<()> {
        if !destination::remove_destination(self.db.pool(), user_id, destination_id).await? {
            return Err(SharingError::not_found("DeliveryDestination", destination_id));
        }
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_service() -> SettingsService {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        SettingsService::new(db)
    }

    #[tokio::test]
    async fn test_profile_validation() {
        let service = test_service().await;
        let bad_email = ProfileUpdate {
            email: Some("not-an-email".to_string()),
            ..Default::default()
        };
        assert!(matches!(
            service.upsert_profile("alice", bad_email).await,
            Err(SharingError::Validation(_))
        ));

        let user = service
            .upsert_profile(
                "alice",
                ProfileUpdate {
                    full_name: Some(" Alice Moreau ".to_string()),
                    email: Some("alice@example.com".to_string()),
                    phone: Some("".to_string()),
                },
            )
            .await
            .unwrap();
        assert_eq!(user.full_name.as_deref(), Some("Alice Moreau"));
        assert_eq!(user.phone, None);
    }

    #[tokio::test]
    async fn test_channels_default_off() {
        let service = test_service().await;
        service.set_channel_enabled("alice", Channel::Whatsapp, true).await.unwrap();

        let settings = service.list_channel_preferences("alice").await.unwrap();
        assert_eq!(
            settings,
            vec![
                ChannelSetting {
                    channel: Channel::Push,
                    enabled: false
                },
                ChannelSetting {
                    channel: Channel::Email,
                    enabled: false
                },
                ChannelSetting {
                    channel: Channel::Whatsapp,
                    enabled: true
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_destinations_are_validated_per_channel() {
        let service = test_service().await;
        assert!(service
            .add_destination("alice", Channel::Whatsapp, "alice@example.com")
            .await
            .is_err());

        let dest = service
            .add_destination("alice", Channel::Whatsapp, "+15551234567")
            .await
            .unwrap();
        assert!(dest.is_active);

        assert!(matches!(
            service.remove_destination("bob", &dest.id).await,
            Err(SharingError::NotFound { .. })
        ));
        service.remove_destination("alice", &dest.id).await.unwrap();
        assert!(service.list_destinations("alice").await.unwrap().is_empty());
    }
}
