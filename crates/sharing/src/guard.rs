//! Read access checks.

use database::{reading_permission, Database};
use sqlx::SqliteExecutor;
use tracing::debug;

use crate::error::{Result, SharingError};

/// Check whether `viewer_id` may read `owner_id`'s metrics.
///
/// Owners can always read their own readings; anyone else needs an active
/// grant. The check runs against the store on every call.
pub async fn can_read(executor: impl SqliteExecutor<'_>, viewer_id: &str, owner_id: &str) -> Result<bool> {
    if viewer_id == owner_id {
        return Ok(true);
    }

    Ok(reading_permission::is_active(executor, viewer_id, owner_id).await?)
}

/// Authorizes metric reads.
#[derive(Debug, Clone)]
pub struct AccessGuard {
    db: Database,
}

impl AccessGuard {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Whether `viewer_id` may read `owner_id`'s metrics.
    pub async fn can_read(&self, viewer_id: &str, owner_id: &str) -> Result<bool> {
        can_read(self.db.pool(), viewer_id, owner_id).await
    }

    /// Like [`AccessGuard::can_read`], but fails with [`SharingError::Forbidden`].
    pub async fn ensure_can_read(&self, viewer_id: &str, owner_id: &str) -> Result<()> {
        if self.can_read(viewer_id, owner_id).await? {
            Ok(())
        } else {
            debug!(viewer_id, owner_id, "Read denied");
            Err(SharingError::Forbidden)
        }
    }
}
