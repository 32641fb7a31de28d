//! Infrastructure layer for tsagent
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: model backends, the data tool executor,
//! the JSONL transcript logger, and configuration file loading.

pub mod backends;
pub mod config;
pub mod logging;
pub mod summary;
pub mod tools;

// Re-export commonly used types
pub use backends::{ApiBackend, BackendKind, LocalBackend, SimulatedBackend, create_backend};
pub use config::{
    ConfigLoader, ConfigValidationError, FileConfig, FileDataConfig, FileLlmConfig,
    FileLoggingConfig, FileReplConfig, FileToolsConfig,
};
pub use logging::JsonlConversationLogger;
pub use summary::summarize_directory;
pub use tools::{DataFrame, DataFrameStore, DataToolExecutor, default_tool_spec};
