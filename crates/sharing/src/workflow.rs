//! Reading request workflow.
//!
//! A requester asks an owner for read access; the owner accepts or declines.
//! Acceptance grants a one-way permission and notifies the requester in the
//! same transaction that resolves the request.

use database::{
    reading_permission, reading_request, validation, Database, DatabaseError, ReadingRequest, RequestStatus,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{Result, SharingError};
use crate::notifier;

/// The owner's answer to a pending request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Decision {
    Accept,
    Decline,
}

impl Decision {
    fn status(self) -> RequestStatus {
        match self {
            Decision::Accept => RequestStatus::Accepted,
            Decision::Decline => RequestStatus::Declined,
        }
    }
}

/// Creates, resolves and withdraws reading requests.
#[derive(Debug, Clone)]
pub struct RequestWorkflow {
    db: Database,
}

impl RequestWorkflow {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Ask `owner_id` for permission to read their metrics.
    ///
    /// A declined request for the same pair, or an accepted one whose grant
    /// has since been removed, is reopened instead of duplicated.
    pub async fn create_request(
        &self,
        requester_id: &str,
        owner_id: &str,
        message: Option<&str>,
    ) -> Result<ReadingRequest> {
        if requester_id == owner_id {
            return Err(SharingError::InvalidSelfRequest);
        }

        let message = message.map(str::trim).filter(|m| !m.is_empty());
        if let Some(message) = message {
            validation::validate_request_message(message)?;
        }

        let mut tx = self.db.begin_immediate().await?;

        let existing = reading_request::find_request_for_pair(&mut *tx, requester_id, owner_id).await?;
        let request = match existing {
            Some(existing) if existing.status == RequestStatus::Pending => {
                return Err(SharingError::DuplicateRequest);
            }
            Some(existing) => {
                if reading_permission::find_permission(&mut *tx, requester_id, owner_id)
                    .await?
                    .is_some()
                {
                    return Err(SharingError::AlreadyGranted);
                }
                reading_request::reopen_request(&mut *tx, &existing.id, message)
                    .await?
                    .ok_or(SharingError::DuplicateRequest)?
            }
            None => reading_request::insert_request(&mut *tx, requester_id, owner_id, message)
                .await
                .map_err(|e| match e {
                    DatabaseError::AlreadyExists { .. } => SharingError::DuplicateRequest,
                    other => other.into(),
                })?,
        };

        notifier::on_request_created(&mut *tx, &request).await?;
        tx.commit().await?;

        info!(
            request_id = %request.id,
            requester_id,
            owner_id,
            "Reading request created"
        );

        Ok(request)
    }

    /// Accept or decline a pending request addressed to `owner_id`.
    pub async fn respond(&self, request_id: &str, owner_id: &str, decision: Decision) -> Result<ReadingRequest> {
        let mut tx = self.db.begin_immediate().await?;

        let request = reading_request::find_request(&mut *tx, request_id)
            .await?
            .filter(|r| r.owner_id == owner_id)
            .ok_or_else(|| SharingError::not_found("ReadingRequest", request_id))?;

        if request.status != RequestStatus::Pending {
            return Err(SharingError::AlreadyResolved);
        }

        // Guarded by `status = 'pending'`.
        let resolved = reading_request::resolve_request(&mut *tx, request_id, decision.status())
            .await?
            .ok_or(SharingError::AlreadyResolved)?;

        if decision == Decision::Accept {
            reading_permission::grant_permission(&mut *tx, &resolved.requester_id, &resolved.owner_id).await?;
            notifier::on_request_accepted(&mut *tx, &resolved).await?;
        }

        tx.commit().await?;

        info!(
            request_id,
            owner_id,
            status = resolved.status.as_str(),
            "Reading request resolved"
        );

        Ok(resolved)
    }

    /// Withdraw a pending request made by `requester_id`.
    pub async fn cancel_request(&self, request_id: &str, requester_id: &str) -> Result<()> {
        let mut tx = self.db.begin_immediate().await?;

        let request = reading_request::find_request(&mut *tx, request_id)
            .await?
            .filter(|r| r.requester_id == requester_id)
            .ok_or_else(|| SharingError::not_found("ReadingRequest", request_id))?;

        if request.status != RequestStatus::Pending
            || !reading_request::delete_pending_request(&mut *tx, request_id).await?
        {
            return Err(SharingError::AlreadyResolved);
        }

        tx.commit().await?;
        info!(request_id, requester_id, "Reading request withdrawn");
        Ok(())
    }

    /// Requests addressed to `owner_id`, optionally filtered by status.
    pub async fn list_incoming(&self, owner_id: &str, status: Option<RequestStatus>) -> Result<Vec<ReadingRequest>> {
        Ok(reading_request::list_incoming(self.db.pool(), owner_id, status).await?)
    }

    /// Requests made by `requester_id`.
    pub async fn list_outgoing(&self, requester_id: &str) -> Result<Vec<ReadingRequest>> {
        Ok(reading_request::list_outgoing(self.db.pool(), requester_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use database::notification;

    async fn test_workflow() -> (Database, RequestWorkflow) {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        let workflow = RequestWorkflow::new(db.clone());
        (db, workflow)
    }

    #[tokio::test]
    async fn test_self_request_rejected() {
        let (_db, workflow) = test_workflow().await;
        let result = workflow.create_request("alice", "alice", None).await;
        assert!(matches!(result, Err(SharingError::InvalidSelfRequest)));
    }

    #[tokio::test]
    async fn test_long_message_rejected() {
        let (_db, workflow) = test_workflow().await;
        let message = "x".repeat(validation::MAX_REQUEST_MESSAGE_LENGTH + 1);
        let result = workflow.create_request("bob", "alice", Some(&message)).await;
        assert!(matches!(result, Err(SharingError::Validation(_))));
    }

    #[tokio::test]
    async fn test_blank_message_is_dropped() {
        let (_db, workflow) = test_workflow().await;
        let request = workflow.create_request("bob", "alice", Some("   ")).await.unwrap();
        assert_eq!(request.message, None);
    }

    #[tokio::test]
    async fn test_decline_writes_no_grant_or_notification() {
        let (db, workflow) = test_workflow().await;
        let request = workflow.create_request("bob", "alice", None).await.unwrap();

        let declined = workflow.respond(&request.id, "alice", Decision::Decline).await.unwrap();
        assert_eq!(declined.status, RequestStatus::Declined);

        assert!(reading_permission::find_permission(db.pool(), "bob", "alice")
            .await
            .unwrap()
            .is_none());
        assert_eq!(notification::count_unread(db.pool(), "bob").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_respond_by_non_owner_is_not_found() {
        let (_db, workflow) = test_workflow().await;
        let request = workflow.create_request("bob", "alice", None).await.unwrap();

        let result = workflow.respond(&request.id, "mallory", Decision::Accept).await;
        assert!(matches!(result, Err(SharingError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_cancel_then_cancel_again() {
        let (db, workflow) = test_workflow().await;
        let request = workflow.create_request("bob", "alice", None).await.unwrap();

        workflow.cancel_request(&request.id, "bob").await.unwrap();
        assert!(reading_request::find_request(db.pool(), &request.id)
            .await
            .unwrap()
            .is_none());

        let result = workflow.cancel_request(&request.id, "bob").await;
        assert!(matches!(result, Err(SharingError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_cancel_resolved_request_fails() {
        let (_db, workflow) = test_workflow().await;
        let request = workflow.create_request("bob", "alice", None).await.unwrap();
        workflow.respond(&request.id, "alice", Decision::Accept).await.unwrap();

        let result = workflow.cancel_request(&request.id, "bob").await;
        assert!(matches!(result, Err(SharingError::AlreadyResolved)));
    }
}
