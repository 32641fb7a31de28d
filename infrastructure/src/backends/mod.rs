//! Model backend adapters
//!
//! Three implementations of [`ModelBackend`]:
//!
//! - [`SimulatedBackend`]: keyword rules, no model required
//! - [`LocalBackend`]: a llama.cpp-style completion server over HTTP
//! - [`ApiBackend`]: an OpenAI-compatible chat completions API

mod api;
mod local;
mod simulated;

pub use api::ApiBackend;
pub use local::{LocalBackend, format_chat_prompt};
pub use simulated::SimulatedBackend;

use crate::config::FileLlmConfig;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tsagent_application::{BackendError, ModelBackend};

/// Which backend drives the conversation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackendKind {
    #[default]
    Simulated,
    Local,
    Api,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Simulated => "simulated",
            BackendKind::Local => "local",
            BackendKind::Api => "api",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "simulated" | "sim" => Ok(BackendKind::Simulated),
            "local" => Ok(BackendKind::Local),
            "api" | "openai" => Ok(BackendKind::Api),
            _ => Err(format!("Invalid BackendKind: {}", s)),
        }
    }
}

/// Build the configured backend.
///
/// `data_root` anchors the simulated backend's load target.
pub fn create_backend(
    kind: BackendKind,
    config: &FileLlmConfig,
    data_root: &Path,
) -> Result<Arc<dyn ModelBackend>, BackendError> {
    let timeout = Duration::from_secs(config.timeout_seconds);
    let backend: Arc<dyn ModelBackend> = match kind {
        BackendKind::Simulated => Arc::new(SimulatedBackend::new(
            data_root.join(&config.simulated_file),
        )),
        BackendKind::Local => Arc::new(LocalBackend::new(
            &config.local_url,
            &config.local_model,
            timeout,
        )?),
        BackendKind::Api => Arc::new(ApiBackend::new(
            &config.api_base_url,
            &config.api_model,
            config.resolve_api_key(),
            timeout,
        )?),
    };
    Ok(backend)
}

/// Map a transport failure onto the port's error type
pub(crate) fn map_reqwest_error(e: reqwest::Error) -> BackendError {
    if e.is_timeout() {
        BackendError::Timeout
    } else if e.is_connect() {
        BackendError::ConnectionError(e.to_string())
    } else if e.is_decode() {
        BackendError::InvalidResponse(e.to_string())
    } else {
        BackendError::RequestFailed(e.to_string())
    }
}

pub(crate) fn build_client(timeout: Duration) -> Result<reqwest::Client, BackendError> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| BackendError::Configuration(format!("Failed to build HTTP client: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_kind_from_str() {
        assert_eq!("simulated".parse::<BackendKind>(), Ok(BackendKind::Simulated));
        assert_eq!("LOCAL".parse::<BackendKind>(), Ok(BackendKind::Local));
        assert_eq!(" api ".parse::<BackendKind>(), Ok(BackendKind::Api));
        assert_eq!("openai".parse::<BackendKind>(), Ok(BackendKind::Api));
        assert!("transformers".parse::<BackendKind>().is_err());
    }

    #[test]
    fn test_backend_kind_display_round_trips() {
        for kind in [BackendKind::Simulated, BackendKind::Local, BackendKind::Api] {
            assert_eq!(kind.to_string().parse::<BackendKind>(), Ok(kind));
        }
    }

    #[test]
    fn test_create_backend_names() {
        let config = FileLlmConfig::default();
        let root = Path::new("data");

        let simulated = create_backend(BackendKind::Simulated, &config, root).unwrap();
        assert_eq!(simulated.name(), "simulated");

        let local = create_backend(BackendKind::Local, &config, root).unwrap();
        assert_eq!(local.name(), "local");

        let api = create_backend(BackendKind::Api, &config, root).unwrap();
        assert_eq!(api.name(), "api");
    }
}
