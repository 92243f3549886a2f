//! Vitals API server.

use std::sync::Arc;

use api::{AppState, Config};
use assistant::{Assistant, AssistantConfig, AssistantError, DisabledAssistant, OpenAiAssistant};
use database::Database;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting Vitals API");

    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    let assistant = build_assistant()?;
    info!(assistant = assistant.name(), "Assistant ready");

    let state = AppState::new(db, assistant, config.assistant_history_turns);
    let app = api::app(state);

    info!(addr = %config.addr, "Vitals API listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Use the configured completions backend, or a disabled one when no key is set.
fn build_assistant() -> Result<Arc<dyn Assistant>, AssistantError> {
    match AssistantConfig::from_env() {
        Ok(config) => Ok(Arc::new(OpenAiAssistant::new(config)?)),
        Err(AssistantError::Configuration(reason)) => {
            warn!(%reason, "Assistant not configured; chat will answer 503");
            Ok(Arc::new(DisabledAssistant))
        }
        Err(e) => Err(e),
    }
}
