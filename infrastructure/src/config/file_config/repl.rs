//! Chat REPL settings (`[repl]` section)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// How the interactive chat loop looks and where it keeps line history
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileReplConfig {
    /// Show a spinner while the model and tools run
    pub show_progress: bool,
    /// Prompt label shown before each input line
    pub prompt: String,
    /// Line-editor history file; a leading `~/` is the home directory
    pub history_file: Option<String>,
    /// Entries kept in the history file
    pub history_capacity: usize,
}

impl Default for FileReplConfig {
    fn default() -> Self {
        Self {
            show_progress: true,
            prompt: "tsagent".to_string(),
            history_file: None,
            history_capacity: 1000,
        }
    }
}

impl FileReplConfig {
    /// History file path with `~/` expanded
    pub fn resolve_history_file(&self) -> Option<PathBuf> {
        let raw = self.history_file.as_deref()?;
        match raw.strip_prefix("~/") {
            Some(rest) => dirs::home_dir().map(|home| home.join(rest)),
            None => Some(PathBuf::from(raw)),
        }
    }
}
