//! Rule-based backend for demos and tests
//!
//! Looks at the last message only and answers with a canned
//! `Thought:`/`Action:` pair chosen by keyword.

use crate::tools::io::FileType;
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;
use tsagent_application::{BackendError, GenerationParams, ModelBackend, ModelResponse};
use tsagent_domain::Message;

/// Backend that answers with keyword-matched actions, no model involved
#[derive(Debug, Clone)]
pub struct SimulatedBackend {
    load_path: PathBuf,
}

impl SimulatedBackend {
    /// `load_path` is the file every load action points at
    pub fn new(load_path: impl Into<PathBuf>) -> Self {
        Self {
            load_path: load_path.into(),
        }
    }

    /// Canned reply for one message
    pub fn respond(&self, content: &str) -> String {
        let lower = content.to_lowercase();
        let has = |keys: &[&str]| keys.iter().any(|k| lower.contains(k));

        if has(&["load", "加载"]) {
            self.load_reply("Need to load the data file first.")
        } else if has(&["describe", "描述", "统计"]) {
            "Thought: Inspect the basic shape and statistics of the data.\n\
             Action: describe_dataframe(dataframe_id='<last_df_id>')"
                .to_string()
        } else if has(&["plot", "图表", "可视化"]) {
            "Thought: Draw the time series.\n\
             Action: plot_time_series(dataframe_id='<last_df_id>', time_column='index', value_column='value')"
                .to_string()
        } else if has(&["anomal", "异常"]) {
            "Thought: Look for outliers with the IQR rule.\n\
             Action: detect_anomalies_iqr(dataframe_id='<last_df_id>', value_column='value')"
                .to_string()
        } else {
            self.load_reply("I understand the request; start by loading the data.")
        }
    }

    fn load_reply(&self, thought: &str) -> String {
        let file_type = FileType::from_path(&self.load_path).unwrap_or(FileType::Csv);
        format!(
            "Thought: {}\nAction: load_dataframe(file_path={}, file_type='{}')",
            thought,
            quote_literal(&self.load_path.to_string_lossy()),
            file_type.as_str()
        )
    }
}

/// Single-quoted string literal with backslashes and quotes escaped
fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\\', "\\\\").replace('\'', "\\'"))
}

#[async_trait]
impl ModelBackend for SimulatedBackend {
    fn name(&self) -> &str {
        "simulated"
    }

    async fn chat(
        &self,
        history: &[Message],
        _params: &GenerationParams,
    ) -> Result<ModelResponse, BackendError> {
        let last = history.last().map(|m| m.content.as_str()).unwrap_or("");
        let text = self.respond(last);
        debug!(chars = text.len(), "Simulated reply");
        Ok(ModelResponse::new(text).with_finish_reason("stop"))
    }
}
