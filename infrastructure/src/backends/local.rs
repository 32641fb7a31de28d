//! Local completion server backend
//!
//! Talks to a llama.cpp-style server: the history is flattened into a single
//! `System:/User:/Assistant:` prompt and posted to `{base_url}/completion`.

use super::{build_client, map_reqwest_error};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use tsagent_application::{BackendError, GenerationParams, ModelBackend, ModelResponse};
use tsagent_domain::{Message, Role};

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    prompt: &'a str,
    n_predict: u32,
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    content: String,
    #[serde(default)]
    stop_type: Option<String>,
    #[serde(default)]
    tokens_predicted: Option<u64>,
}

/// Flatten a history into one prompt, blocks separated by a blank line
pub fn format_chat_prompt(history: &[Message]) -> String {
    history
        .iter()
        .map(|m| {
            let label = match m.role {
                Role::System => "System",
                Role::User => "User",
                Role::Assistant => "Assistant",
            };
            format!("{}: {}", label, m.content)
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Backend for a model served on the local machine
pub struct LocalBackend {
    client: reqwest::Client,
    endpoint: String,
    model: String,
}

impl LocalBackend {
    pub fn new(base_url: &str, model: &str, timeout: Duration) -> Result<Self, BackendError> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: format!("{}/completion", base_url.trim_end_matches('/')),
            model: model.to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ModelBackend for LocalBackend {
    fn name(&self) -> &str {
        "local"
    }

    async fn chat(
        &self,
        history: &[Message],
        params: &GenerationParams,
    ) -> Result<ModelResponse, BackendError> {
        let prompt = format_chat_prompt(history);
        let body = CompletionRequest {
            prompt: &prompt,
            n_predict: params.max_output_tokens,
            temperature: params.temperature,
        };

        debug!(endpoint = %self.endpoint, prompt_chars = prompt.len(), "Local completion request");

        let res = self
            .client
            .post(&self.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let status = res.status();
        let text = res.text().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            return Err(BackendError::RequestFailed(format!(
                "Local server error {}: {}",
                status, text
            )));
        }

        let parsed: CompletionResponse = serde_json::from_str(&text).map_err(|e| {
            BackendError::InvalidResponse(format!("{}; body: {}", e, text))
        })?;

        let mut response = ModelResponse::new(parsed.content.trim())
            .with_finish_reason(parsed.stop_type.unwrap_or_else(|| "stop".to_string()))
            .with_metadata("model", self.model.clone());
        if let Some(tokens) = parsed.tokens_predicted {
            response = response.with_metadata("tokens_predicted", tokens);
        }
        Ok(response)
    }
}
