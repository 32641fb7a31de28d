//! OpenAI-compatible chat completions backend

use super::{build_client, map_reqwest_error};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use tsagent_application::{BackendError, GenerationParams, ModelBackend, ModelResponse};
use tsagent_domain::Message;

/// Request body for chat completions (OpenAI format)
#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: &'a [Message],
    max_tokens: u32,
    temperature: f32,
}

/// Response: choices[0].message
#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

/// HTTP backend for any OpenAI-compatible endpoint
pub struct ApiBackend {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl ApiBackend {
    pub fn new(
        base_url: &str,
        model: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, BackendError> {
        Ok(Self {
            client: build_client(timeout)?,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            model: model.to_string(),
            api_key,
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn into_model_response(parsed: ChatCompletionResponse) -> Result<ModelResponse, BackendError> {
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| BackendError::InvalidResponse("response has no choices".to_string()))?;

    let mut response = ModelResponse::new(choice.message.content.unwrap_or_default())
        .with_finish_reason(choice.finish_reason.unwrap_or_else(|| "stop".to_string()));
    if let Some(usage) = parsed.usage {
        response = response.with_metadata("usage", usage);
    }
    Ok(response)
}

#[async_trait]
impl ModelBackend for ApiBackend {
    fn name(&self) -> &str {
        "api"
    }

    async fn chat(
        &self,
        history: &[Message],
        params: &GenerationParams,
    ) -> Result<ModelResponse, BackendError> {
        let body = ChatCompletionRequest {
            model: &self.model,
            messages: history,
            max_tokens: params.max_output_tokens,
            temperature: params.temperature,
        };

        debug!(endpoint = %self.endpoint, model = %self.model, messages = history.len(), "Chat completion request");

        let mut req = self.client.post(&self.endpoint).json(&body);
        if let Some(ref key) = self.api_key {
            req = req.bearer_auth(key);
        }

        let res = req.send().await.map_err(map_reqwest_error)?;
        let status = res.status();
        let text = res.text().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            return Err(BackendError::RequestFailed(format!(
                "API error {}: {}",
                status, text
            )));
        }

        let parsed: ChatCompletionResponse = serde_json::from_str(&text).map_err(|e| {
            BackendError::InvalidResponse(format!("{}; body: {}", e, text))
        })?;
        into_model_response(parsed)
    }
}
