//! Out-of-app delivery for Vitals notifications.
//!
//! The notifier queues one entry per recipient and enabled channel. This
//! crate drains that queue: a [`Dispatcher`] claims a batch for its channel,
//! sends each entry to the recipient's active destinations through a
//! [`ChannelSender`], and records per-destination outcomes.
//!
//! - Push: [`PushSender`] posts to an HTTP push gateway
//! - Email: [`EmailSender`] relays over SMTP
//! - WhatsApp: [`WhatsAppSender`] calls a messages API
//! - [`LoggingSender`] logs instead of sending
//!
//! Runs are one-shot; the `dispatch` binary is meant to be scheduled
//! externally (cron, systemd timer).
//!
//! ```no_run
//! use database::{Channel, Database};
//! use delivery::{Dispatcher, DispatcherConfig, LoggingSender};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("sqlite:vitals.db?mode=rwc").await?;
//!     let dispatcher = Dispatcher::new(db, LoggingSender::new(Channel::Push), DispatcherConfig::default())?;
//!     let report = dispatcher.run_batch().await?;
//!     println!("sent {} of {}", report.sent, report.claimed);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod dispatcher;
pub mod email;
pub mod error;
pub mod push;
pub mod sender;
pub mod whatsapp;

pub use config::DispatcherConfig;
pub use dispatcher::{BatchReport, Dispatcher};
pub use email::{EmailConfig, EmailSender};
pub use error::{DeliveryError, Result};
pub use push::{PushConfig, PushSender};
pub use sender::{ChannelSender, LoggingSender, SendOutcome};
pub use whatsapp::{WhatsAppConfig, WhatsAppSender};
