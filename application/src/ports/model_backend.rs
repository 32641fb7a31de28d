//! Model backend port
//!
//! Defines the interface for the language model that drives a conversation.

use async_trait::async_trait;
use serde_json::{Map, Value};
use tsagent_domain::Message;
use thiserror::Error;

/// Errors that can occur while invoking a model backend
#[derive(Error, Debug)]
pub enum BackendError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Timeout")]
    Timeout,
}

/// Sampling parameters passed with every request
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationParams {
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            max_output_tokens: 1024,
            temperature: 0.7,
        }
    }
}

/// Text completion returned by a backend
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ModelResponse {
    pub text: String,
    /// Why generation stopped, when the backend reports it
    pub finish_reason: Option<String>,
    /// Backend-specific extras (token usage, model name, ...)
    pub metadata: Map<String, Value>,
}

impl ModelResponse {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            ..Default::default()
        }
    }

    pub fn with_finish_reason(mut self, reason: impl Into<String>) -> Self {
        self.finish_reason = Some(reason.into());
        self
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Language model used by a conversation session
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    /// Short backend name for logs ("simulated", "local", "api")
    fn name(&self) -> &str;

    /// Produce the next assistant reply for the full history
    async fn chat(
        &self,
        history: &[Message],
        params: &GenerationParams,
    ) -> Result<ModelResponse, BackendError>;
}
