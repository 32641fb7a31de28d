//! Model backend configuration from TOML (`[llm]` section)
//!
//! Example configuration:
//!
//! ```toml
//! [llm]
//! backend = "api"
//! api_base_url = "https://api.openai.com/v1"
//! api_key_env = "OPENAI_API_KEY"
//! api_model = "gpt-3.5-turbo"
//! ```

use serde::{Deserialize, Serialize};
use tsagent_application::GenerationParams;

/// Raw model backend configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLlmConfig {
    /// Backend kind: "simulated", "local" or "api"
    pub backend: String,
    /// Maximum tokens generated per reply
    pub max_tokens: u32,
    /// Sampling temperature
    pub temperature: f32,
    /// Base URL of a local completion server
    pub local_url: String,
    /// Model name reported by the local backend
    pub local_model: String,
    /// Base URL of an OpenAI-compatible API
    pub api_base_url: String,
    /// Environment variable holding the API key
    pub api_key_env: String,
    /// API key (takes precedence over `api_key_env`)
    pub api_key: Option<String>,
    /// Model requested from the API
    pub api_model: String,
    /// Request timeout in seconds
    pub timeout_seconds: u64,
    /// File the simulated backend loads, relative to the data root
    pub simulated_file: String,
}

impl Default for FileLlmConfig {
    fn default() -> Self {
        Self {
            backend: "simulated".to_string(),
            max_tokens: 1024,
            temperature: 0.7,
            local_url: "http://127.0.0.1:8080".to_string(),
            local_model: "phi-3-mini-4k-instruct".to_string(),
            api_base_url: "https://api.openai.com/v1".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            api_key: None,
            api_model: "gpt-3.5-turbo".to_string(),
            timeout_seconds: 60,
            simulated_file: "data.mat".to_string(),
        }
    }
}

impl FileLlmConfig {
    /// Sampling parameters for the conversation session
    pub fn generation_params(&self) -> GenerationParams {
        GenerationParams {
            max_output_tokens: self.max_tokens,
            temperature: self.temperature,
        }
    }

    /// Explicit key first, then the configured environment variable
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok())
            .filter(|k| !k.is_empty())
    }
}
