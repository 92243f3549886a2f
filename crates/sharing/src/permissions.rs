//! Owner and viewer views of the permission graph.

use database::{reading_permission, user, Database, PermissionStatus, ReadingPermission};
use serde::Serialize;
use tracing::info;

use crate::error::{Result, SharingError};
use crate::notifier::display_name;

/// A grant together with the display name of the other party.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GrantSummary {
    #[serde(flatten)]
    pub permission: ReadingPermission,
    pub display_name: String,
}

/// Manages grants from the owner's side and lists them from the viewer's.
#[derive(Debug, Clone)]
pub struct PermissionManager {
    db: Database,
}

impl PermissionManager {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Everyone `owner_id` has granted access to, active and blocked.
    pub async fn list_viewers(&self, owner_id: &str) -> Result<Vec<GrantSummary>> {
        let grants = reading_permission::list_for_owner(self.db.pool(), owner_id).await?;
        self.summarize(grants, |p| &p.viewer_id).await
    }

    /// Everyone whose readings `viewer_id` can currently see.
    pub async fn list_owners(&self, viewer_id: &str) -> Result<Vec<GrantSummary>> {
        let grants = reading_permission::list_active_for_viewer(self.db.pool(), viewer_id).await?;
        self.summarize(grants, |p| &p.owner_id).await
    }

    /// Suspend a viewer's access without removing the grant.
    pub async fn block_viewer(&self, owner_id: &str, viewer_id: &str) -> Result<ReadingPermission> {
        self.set_status(owner_id, viewer_id, PermissionStatus::Blocked).await
    }

    /// Restore a blocked viewer's access.
    pub async fn unblock_viewer(&self, owner_id: &str, viewer_id: &str) -> Result<ReadingPermission> {
        self.set_status(owner_id, viewer_id, PermissionStatus::Active).await
    }

    /// Remove a viewer's grant entirely.
    pub async fn remove_viewer(&self, owner_id: &str, viewer_id: &str) -> Result<()> {
        if !reading_permission::delete_permission(self.db.pool(), owner_id, viewer_id).await? {
            return Err(SharingError::not_found("ReadingPermission", viewer_id));
        }

        info!(owner_id, viewer_id, "Viewer removed");
        Ok(())
    }

    async fn set_status(&self, owner_id: &str, viewer_id: &str, status: PermissionStatus) -> Result<ReadingPermission> {
        let permission = reading_permission::set_status(self.db.pool(), owner_id, viewer_id, status)
            .await?
            .ok_or_else(|| SharingError::not_found("ReadingPermission", viewer_id))?;

        info!(owner_id, viewer_id, status = status.as_str(), "Viewer status changed");
        Ok(permission)
    }

    async fn summarize(
        &self,
        grants: Vec<ReadingPermission>,
        other_party: impl Fn(&ReadingPermission) -> &String,
    ) -> Result<Vec<GrantSummary>> {
        let mut summaries = Vec::with_capacity(grants.len());
        for permission in grants {
            let profile = user::find_user(self.db.pool(), other_party(&permission)).await?;
            summaries.push(GrantSummary {
                display_name: display_name(profile.as_ref()),
                permission,
            });
        }
        Ok(summaries)
    }
}
