//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! Every section is optional; missing keys fall back to their defaults.

mod data;
mod llm;
mod logging;
mod repl;
mod tools;

pub use data::FileDataConfig;
pub use llm::FileLlmConfig;
pub use logging::FileLoggingConfig;
pub use repl::FileReplConfig;
pub use tools::FileToolsConfig;

use crate::backends::BackendKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Error, PartialEq)]
pub enum ConfigValidationError {
    #[error("llm.timeout_seconds cannot be 0")]
    InvalidTimeout,

    #[error("tools.max_artifacts cannot be 0")]
    InvalidMaxArtifacts,

    #[error("llm.temperature must be between 0 and 2, got {0}")]
    InvalidTemperature(f32),

    #[error("llm.backend: unknown backend '{0}' (expected simulated, local or api)")]
    UnknownBackend(String),

    #[error("{0} cannot be empty")]
    EmptyModelName(&'static str),
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Data directory settings
    pub data: FileDataConfig,
    /// Model backend settings
    pub llm: FileLlmConfig,
    /// Data tool settings
    pub tools: FileToolsConfig,
    /// REPL settings
    pub repl: FileReplConfig,
    /// Logging settings
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    /// Validate the configuration, returning the first problem found.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        let backend = self.backend_kind()?;

        if self.llm.timeout_seconds == 0 {
            return Err(ConfigValidationError::InvalidTimeout);
        }
        if !(0.0..=2.0).contains(&self.llm.temperature) {
            return Err(ConfigValidationError::InvalidTemperature(
                self.llm.temperature,
            ));
        }
        if self.tools.max_artifacts == 0 {
            return Err(ConfigValidationError::InvalidMaxArtifacts);
        }

        match backend {
            BackendKind::Api if self.llm.api_model.trim().is_empty() => {
                Err(ConfigValidationError::EmptyModelName("llm.api_model"))
            }
            BackendKind::Local if self.llm.local_model.trim().is_empty() => {
                Err(ConfigValidationError::EmptyModelName("llm.local_model"))
            }
            _ => Ok(()),
        }
    }

    /// Parse `llm.backend`
    pub fn backend_kind(&self) -> Result<BackendKind, ConfigValidationError> {
        self.llm
            .backend
            .parse()
            .map_err(|_| ConfigValidationError::UnknownBackend(self.llm.backend.clone()))
    }
}
