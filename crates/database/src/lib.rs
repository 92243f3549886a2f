//! SQLite persistence layer for Vitals.
//!
//! This crate provides async database operations for health metrics, the
//! reading-permission graph, notifications and the delivery queue using SQLx
//! with SQLite.
//!
//! Every query function takes any SQLite executor, so the same call works on
//! the pool or inside a transaction:
//!
//! ```no_run
//! use database::{reading_permission, Database};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("sqlite:vitals.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let mut tx = db.begin().await?;
//!     reading_permission::grant_permission(&mut *tx, "viewer-id", "owner-id").await?;
//!     tx.commit().await?;
//!
//!     let allowed = reading_permission::is_active(db.pool(), "viewer-id", "owner-id").await?;
//!     assert!(allowed);
//!     Ok(())
//! }
//! ```

pub mod channel_preference;
pub mod chat_message;
pub mod delivery_queue;
pub mod destination;
pub mod error;
pub mod health_metric;
pub mod models;
pub mod notification;
pub mod reading_permission;
pub mod reading_request;
pub mod user;
pub mod validation;

pub use error::{DatabaseError, Result};
pub use models::{
    Channel, ChannelPreference, ChatMessage, ChatRole, DeliveryAttempt, DeliveryContent, DeliveryDestination,
    DeliveryOutcome, DeliveryQueueEntry, DeliveryStatus, HealthMetric, MetricType, NewHealthMetric,
    NewNotification, Notification, NotificationType, PermissionStatus, ReadingPermission, ReadingRequest,
    RequestStatus, User,
};
pub use validation::ValidationError;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    const DEFAULT_POOL_SIZE: u32 = 10;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `sqlite::memory:` for tests.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(url = %url, pool_size, "Connected to database");

        Ok(Self { pool })
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Start a transaction.
    ///
    /// The write lock is taken at the first write, so use
    /// [`Database::begin_immediate`] for read-then-write work.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin().await?)
    }

    /// Start a transaction that holds the write lock from the start.
    ///
    /// Concurrent callers queue on the busy timeout and then see the
    /// committed state, instead of failing with "database is locked" when
    /// they upgrade from a read.
    pub async fn begin_immediate(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    #[tokio::test]
    async fn test_rolled_back_transaction_leaves_no_rows() {
        let db = test_db().await;

        let mut tx = db.begin().await.unwrap();
        reading_permission::grant_permission(&mut *tx, "viewer", "owner")
            .await
            .unwrap();
        tx.rollback().await.unwrap();

        assert!(!reading_permission::is_active(db.pool(), "viewer", "owner")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_immediate_transaction_commits() {
        let db = test_db().await;

        let mut tx = db.begin_immediate().await.unwrap();
        reading_permission::grant_permission(&mut *tx, "viewer", "owner")
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert!(reading_permission::is_active(db.pool(), "viewer", "owner")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_committed_transaction_is_visible() {
        let db = test_db().await;

        let mut tx = db.begin().await.unwrap();
        let request = reading_request::insert_request(&mut *tx, "viewer", "owner", None)
            .await
            .unwrap();
        reading_permission::grant_permission(&mut *tx, "viewer", "owner")
            .await
            .unwrap();
        tx.commit().await.unwrap();

        assert!(reading_request::find_request(db.pool(), &request.id)
            .await
            .unwrap()
            .is_some());
        assert!(reading_permission::is_active(db.pool(), "viewer", "owner")
            .await
            .unwrap());
    }
}
