//! Health assistant chat for Vitals.
//!
//! [`Assistant`] is the seam between the chat endpoint and a model backend:
//!
//! - [`OpenAiAssistant`]: any OpenAI-compatible `/v1/chat/completions` API
//! - [`EchoAssistant`]: deterministic replies for development and tests
//! - [`DisabledAssistant`]: used when no backend is configured
//!
//! [`ChatService`] loads recent turns from the database, asks the assistant,
//! and stores the exchange only when the assistant answered.

pub mod api_types;
pub mod chat;
pub mod config;
pub mod echo;
pub mod error;
pub mod openai;
pub mod trait_def;

pub use async_trait::async_trait;
pub use chat::{ChatExchange, ChatService};
pub use config::AssistantConfig;
pub use echo::{DisabledAssistant, EchoAssistant};
pub use error::{AssistantError, Result};
pub use openai::OpenAiAssistant;
pub use trait_def::Assistant;
