//! Application state shared across handlers.

use std::sync::Arc;

use assistant::{Assistant, ChatService};
use database::Database;
use sharing::{Inbox, MetricService, PermissionManager, RequestWorkflow, SettingsService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub workflow: RequestWorkflow,
    pub metrics: MetricService,
    pub permissions: PermissionManager,
    pub settings: SettingsService,
    pub inbox: Inbox,
    pub chat: ChatService,
}

impl AppState {
    /// Build every service on top of one database handle.
    pub fn new(db: Database, assistant: Arc<dyn Assistant>, history_turns: usize) -> Self {
        Self {
            workflow: RequestWorkflow::new(db.clone()),
            metrics: MetricService::new(db.clone()),
            permissions: PermissionManager::new(db.clone()),
            settings: SettingsService::new(db.clone()),
            inbox: Inbox::new(db.clone()),
            chat: ChatService::new(db, assistant).with_history_turns(history_turns),
        }
    }
}
