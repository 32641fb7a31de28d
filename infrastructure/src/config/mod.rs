//! Configuration file loading for tsagent
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `--config <path>` specified file
//! 2. Project root: `./tsagent.toml` or `./.tsagent.toml`
//! 3. Global: `$XDG_CONFIG_HOME/tsagent/config.toml`
//! 4. Environment variables prefixed `TSAGENT_`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileConfig, FileDataConfig, FileLlmConfig, FileLoggingConfig,
    FileReplConfig, FileToolsConfig,
};
pub use loader::ConfigLoader;
