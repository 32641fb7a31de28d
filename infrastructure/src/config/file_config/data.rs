//! Data directory configuration from TOML (`[data]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw data configuration from TOML
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileDataConfig {
    /// Root directory scanned for data files
    pub root: PathBuf,
    /// Files summarised per directory
    pub max_files_per_folder: usize,
    /// Rows shown in each file preview
    pub max_preview_rows: usize,
}

impl Default for FileDataConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            max_files_per_folder: 2,
            max_preview_rows: 5,
        }
    }
}
