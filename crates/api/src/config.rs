//! Configuration loaded from environment variables.

use std::env;
use std::net::SocketAddr;

/// API server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Server bind address.
    pub addr: SocketAddr,
    /// SQLite database URL.
    pub database_url: String,
    /// Earlier chat turns sent to the assistant.
    pub assistant_history_turns: usize,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `API_ADDR` | Server bind address | `127.0.0.1:8787` |
    /// | `SQLITE_PATH` | SQLite database URL | `sqlite:vitals.db?mode=rwc` |
    /// | `ASSISTANT_MAX_HISTORY_TURNS` | Chat turns sent as context | `10` |
    ///
    /// The assistant backend reads its own `ASSISTANT_*` variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        let addr = env::var("API_ADDR")
            .unwrap_or_else(|_| "127.0.0.1:8787".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidAddr)?;

        let database_url = env::var("SQLITE_PATH").unwrap_or_else(|_| "sqlite:vitals.db?mode=rwc".to_string());

        let assistant_history_turns = match env::var("ASSISTANT_MAX_HISTORY_TURNS") {
            Ok(value) => value.parse().map_err(|_| ConfigError::InvalidHistoryTurns)?,
            Err(_) => 10,
        };

        Ok(Self {
            addr,
            database_url,
            assistant_history_turns,
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid API_ADDR format")]
    InvalidAddr,

    #[error("ASSISTANT_MAX_HISTORY_TURNS must be a non-negative integer")]
    InvalidHistoryTurns,
}
