//! Chat-completions provider layer.
//!
//! `ChatProvider` is the seam between the bridge and the hosted LLM API:
//! one production implementation (OpenRouter) plus test doubles at the
//! trait boundary.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{BridgeError, Result};

pub mod openrouter;

pub use openrouter::OpenRouterProvider;

/// Message author role, serialized to the wire names the API expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single role-tagged message in a conversation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// Per-call generation parameters.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChatOptions {
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// A chat-completions backend. One HTTP round-trip per call; no retries.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send the conversation and return the assistant's text.
    async fn chat(&self, messages: &[Message], model: &str, options: &ChatOptions)
        -> Result<String>;

    /// Provider identifier for logs.
    fn name(&self) -> &str;
}

/// Map a reqwest transport error to the closed error set.
pub(crate) fn map_transport_error(e: reqwest::Error) -> BridgeError {
    if e.is_timeout() {
        BridgeError::Timeout
    } else {
        BridgeError::ConnectionFailed(e.to_string())
    }
}
