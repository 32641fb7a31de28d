//! Data tool configuration from TOML (`[tools]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw tools configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileToolsConfig {
    /// Directory plots are written to
    pub output_dir: PathBuf,
    /// DataFrames kept in memory before the oldest is evicted
    pub max_artifacts: usize,
}

impl Default for FileToolsConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("outputs"),
            max_artifacts: 32,
        }
    }
}
