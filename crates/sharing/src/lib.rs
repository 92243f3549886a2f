//! Sharing core for Vitals.
//!
//! Owners record health readings; viewers read them once an owner accepts
//! their reading request. This crate holds that permission graph and the
//! notification fanout that follows from it:
//!
//! - [`RequestWorkflow`]: create, accept, decline and withdraw requests
//! - [`AccessGuard`]: the single read-authorization check
//! - [`PermissionManager`]: block, unblock and remove viewers
//! - [`MetricService`]: record readings (with fanout) and serve guarded reads
//! - [`notifier`]: in-app notifications plus per-channel queue entries
//! - [`SettingsService`] and [`Inbox`]: per-user profile, channels and inbox
//!
//! # Example
//!
//! ```no_run
//! use database::{Database, MetricType, NewHealthMetric};
//! use sharing::{Decision, MetricService, RequestWorkflow};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("sqlite:vitals.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let workflow = RequestWorkflow::new(db.clone());
//!     let request = workflow.create_request("bob", "alice", Some("Hi mum")).await?;
//!     workflow.respond(&request.id, "alice", Decision::Accept).await?;
//!
//!     let metrics = MetricService::new(db);
//!     let recorded = metrics
//!         .record_metric(
//!             "alice",
//!             NewHealthMetric {
//!                 metric_type: MetricType::BloodPressure,
//!                 value: "120/80".into(),
//!                 unit: "mmHg".into(),
//!                 notes: None,
//!                 recorded_at: None,
//!             },
//!         )
//!         .await?;
//!     assert_eq!(recorded.fanout.notifications, 1);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod guard;
pub mod inbox;
pub mod metrics;
pub mod notifier;
pub mod permissions;
pub mod settings;
pub mod workflow;

pub use error::{ErrorKind, Result, SharingError};
pub use guard::AccessGuard;
pub use inbox::Inbox;
pub use metrics::{MetricQuery, MetricService, RecordedMetric};
pub use notifier::FanoutReport;
pub use permissions::{GrantSummary, PermissionManager};
pub use settings::{ChannelSetting, SettingsService};
pub use workflow::{Decision, RequestWorkflow};
