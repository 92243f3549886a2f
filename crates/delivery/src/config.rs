//! Dispatcher settings.

use std::env;
use std::time::Duration;

use crate::error::{DeliveryError, Result};

/// Default number of entries claimed per run.
pub const DEFAULT_BATCH_SIZE: i64 = 50;

/// Default per-send timeout.
pub const DEFAULT_SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Default age after which an unfinished claim can be taken over.
pub const DEFAULT_CLAIM_TTL: Duration = Duration::from_secs(300);

/// Required gap between the claim TTL and the send timeout.
///
/// A claim is renewed before every send, so it must outlive one send plus
/// the attempt bookkeeping. Claim times are stored with second precision.
pub const CLAIM_TTL_HEADROOM: Duration = Duration::from_secs(2);

/// Settings shared by every channel dispatcher.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatcherConfig {
    /// Maximum entries claimed per run.
    pub batch_size: i64,
    /// Hard limit for a single send; elapsed means transient failure.
    pub send_timeout: Duration,
    /// Claims older than this are considered abandoned.
    pub claim_ttl: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            send_timeout: DEFAULT_SEND_TIMEOUT,
            claim_ttl: DEFAULT_CLAIM_TTL,
        }
    }
}

impl DispatcherConfig {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `DISPATCH_BATCH_SIZE` | Entries claimed per run | `50` |
    /// | `DISPATCH_SEND_TIMEOUT_SECS` | Per-send timeout | `10` |
    /// | `DISPATCH_CLAIM_TTL_SECS` | Abandoned-claim age | `300` |
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let batch_size = parse_var("DISPATCH_BATCH_SIZE")?.unwrap_or(defaults.batch_size);

        let send_timeout = parse_var("DISPATCH_SEND_TIMEOUT_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.send_timeout);

        let claim_ttl = parse_var("DISPATCH_CLAIM_TTL_SECS")?
            .map(Duration::from_secs)
            .unwrap_or(defaults.claim_ttl);

        let config = Self {
            batch_size,
            send_timeout,
            claim_ttl,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check that a run can hold its claims for as long as a send may take.
    pub fn validate(&self) -> Result<()> {
        if self.batch_size < 1 {
            return Err(DeliveryError::Config("DISPATCH_BATCH_SIZE must be at least 1".to_string()));
        }

        if self.claim_ttl < self.send_timeout + CLAIM_TTL_HEADROOM {
            return Err(DeliveryError::Config(format!(
                "DISPATCH_CLAIM_TTL_SECS ({}s) must be at least DISPATCH_SEND_TIMEOUT_SECS ({}s) plus {}s",
                self.claim_ttl.as_secs(),
                self.send_timeout.as_secs(),
                CLAIM_TTL_HEADROOM.as_secs()
            )));
        }

        Ok(())
    }

    /// Builder method to set the batch size.
    pub fn with_batch_size(mut self, batch_size: i64) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Builder method to set the send timeout.
    pub fn with_send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Builder method to set the claim TTL.
    pub fn with_claim_ttl(mut self, ttl: Duration) -> Self {
        self.claim_ttl = ttl;
        self
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Result<Option<T>>
where
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| DeliveryError::Config(format!("Invalid {}: {}", name, e))),
        Err(_) => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = DispatcherConfig::default();
        assert_eq!(config.batch_size, 50);
        assert_eq!(config.send_timeout, Duration::from_secs(10));
        assert_eq!(config.claim_ttl, Duration::from_secs(300));
    }

    #[test]
    fn test_builder() {
        let config = DispatcherConfig::default()
            .with_batch_size(0)
            .with_send_timeout(Duration::from_millis(50));
        assert_eq!(config.batch_size, 1);
        assert_eq!(config.send_timeout, Duration::from_millis(50));
    }

    #[test]
    fn test_claim_ttl_must_outlast_a_send() {
        assert!(DispatcherConfig::default().validate().is_ok());

        let tight = DispatcherConfig::default()
            .with_send_timeout(Duration::from_secs(10))
            .with_claim_ttl(Duration::from_secs(11));
        assert!(matches!(tight.validate(), Err(DeliveryError::Config(_))));

        let enough = tight.with_claim_ttl(Duration::from_secs(12));
        assert!(enough.validate().is_ok());
    }

    // Env vars are process-global, so every scenario lives in one test.
    #[test]
    fn test_from_env_scenarios() {
        use std::sync::Mutex;
        static ENV_LOCK: Mutex<()> = Mutex::new(());
        let _guard = ENV_LOCK.lock().unwrap();

        fn clear() {
            env::remove_var("DISPATCH_BATCH_SIZE");
            env::remove_var("DISPATCH_SEND_TIMEOUT_SECS");
            env::remove_var("DISPATCH_CLAIM_TTL_SECS");
        }

        clear();
        assert_eq!(DispatcherConfig::from_env().unwrap(), DispatcherConfig::default());

        env::set_var("DISPATCH_BATCH_SIZE", "20");
        env::set_var("DISPATCH_SEND_TIMEOUT_SECS", "3");
        let config = DispatcherConfig::from_env().unwrap();
        assert_eq!(config.batch_size, 20);
        assert_eq!(config.send_timeout, Duration::from_secs(3));

        env::set_var("DISPATCH_BATCH_SIZE", "lots");
        assert!(matches!(DispatcherConfig::from_env(), Err(DeliveryError::Config(_))));

        env::set_var("DISPATCH_BATCH_SIZE", "0");
        assert!(DispatcherConfig::from_env().is_err());

        env::remove_var("DISPATCH_BATCH_SIZE");
        env::set_var("DISPATCH_SEND_TIMEOUT_SECS", "30");
        env::set_var("DISPATCH_CLAIM_TTL_SECS", "30");
        assert!(matches!(DispatcherConfig::from_env(), Err(DeliveryError::Config(_))));

        clear();
    }
}
