//! Data tool executor: the concrete implementation of [`ToolExecutorPort`].
//!
//! [`DataToolExecutor`] owns the session's [`DataFrameStore`] and routes each
//! action by tool name:
//!
//! ```text
//! ToolExecutorPort::execute()
//!   ├─ load_dataframe        → read_frame()      → store.insert()
//!   ├─ save_dataframe        → store.get()       → write_csv()
//!   ├─ describe_dataframe    → store.get()       → describe()
//!   ├─ plot_time_series      → store.get()       → write_plot()
//!   └─ detect_anomalies_iqr  → flag_anomalies()  → store.insert()
//! ```
//!
//! Relative file paths are resolved against the data root.

use super::anomaly::{self, DEFAULT_IQR_MULTIPLIER};
use super::dataframe::DataFrame;
use super::io;
use super::stats;
use super::store::DataFrameStore;
use super::viz::{self, PlotLabels};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Instant;
use tokio::sync::RwLock;
use tracing::{debug, info};
use tsagent_application::ports::tool_executor::ToolExecutorPort;
use tsagent_domain::{Action, ToolError, ToolResult, ToolSpec};

/// Executor for the five data tools.
///
/// One executor per conversation: its store is the session's artifact space.
pub struct DataToolExecutor {
    tool_spec: ToolSpec,
    store: RwLock<DataFrameStore>,
    data_root: PathBuf,
    output_dir: PathBuf,
}

impl DataToolExecutor {
    pub fn new(data_root: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            tool_spec: super::default_tool_spec(),
            store: RwLock::new(DataFrameStore::new(32)),
            data_root: data_root.into(),
            output_dir: output_dir.into(),
        }
    }

    /// Bound the number of frames kept in memory
    pub fn with_capacity(mut self, max_artifacts: usize) -> Self {
        self.store = RwLock::new(DataFrameStore::new(max_artifacts));
        self
    }

    /// Number of frames currently held
    pub async fn artifact_count(&self) -> usize {
        self.store.read().await.len()
    }

    fn resolve_path(&self, raw: &str) -> PathBuf {
        let path = Path::new(raw);
        if path.is_absolute() || path.exists() {
            path.to_path_buf()
        } else {
            self.data_root.join(path)
        }
    }

    async fn frame(&self, action: &Action) -> Result<DataFrame, ToolError> {
        let id = action
            .require_string("dataframe_id")
            .map_err(ToolError::invalid_argument)?;
        self.store
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| ToolError::not_found(format!("DataFrame ID {}", id)))
    }

    async fn load(&self, action: &Action) -> Result<String, ToolError> {
        let file_path = action
            .require_string("file_path")
            .map_err(ToolError::invalid_argument)?;
        let file_type = action
            .optional_string("file_type")
            .map_err(ToolError::invalid_argument)?
            .unwrap_or("csv");
        let file_type = io::FileType::parse(file_type)?;

        let path = self.resolve_path(file_path);
        let frame = io::read_frame(&path, file_type).await?;
        let (rows, cols) = frame.shape();
        let id = self.store.write().await.insert(frame);
        info!("Loaded {} ({} rows x {} cols) as {}", path.display(), rows, cols, id);
        Ok(id)
    }

    async fn save(&self, action: &Action) -> Result<String, ToolError> {
        let frame = self.frame(action).await?;
        let file_path = action
            .require_string("file_path")
            .map_err(ToolError::invalid_argument)?;
        let file_type = action
            .optional_string("file_type")
            .map_err(ToolError::invalid_argument)?
            .unwrap_or("csv");
        if io::FileType::parse(file_type)? != io::FileType::Csv {
            return Err(ToolError::invalid_argument(format!(
                "Unsupported file_type for saving: {}",
                file_type
            )));
        }

        io::write_csv(&frame, Path::new(file_path)).await?;
        Ok(format!("saved: {}", file_path))
    }

    async fn describe(&self, action: &Action) -> Result<String, ToolError> {
        let frame = self.frame(action).await?;
        Ok(stats::describe(&frame))
    }

    async fn plot(&self, action: &Action) -> Result<String, ToolError> {
        let frame = self.frame(action).await?;
        let arg = |key: &str| {
            action
                .optional_string(key)
                .map_err(ToolError::invalid_argument)
        };
        let time_column = action
            .require_string("time_column")
            .map_err(ToolError::invalid_argument)?;
        let value_column = action
            .require_string("value_column")
            .map_err(ToolError::invalid_argument)?;
        let labels = PlotLabels::with_defaults(
            arg("title")?,
            arg("xlabel")?,
            arg("ylabel")?,
            time_column,
            value_column,
        );

        let points = viz::series_points(&frame, time_column, value_column)?;
        let path = viz::write_plot(&self.output_dir, &points, &labels).await?;
        Ok(path.display().to_string())
    }

    async fn detect_anomalies(&self, action: &Action) -> Result<String, ToolError> {
        let frame = self.frame(action).await?;
        let value_column = action
            .require_string("value_column")
            .map_err(ToolError::invalid_argument)?;
        let multiplier = action
            .optional_f64("iqr_multiplier")
            .map_err(ToolError::invalid_argument)?
            .unwrap_or(DEFAULT_IQR_MULTIPLIER);

        let (flagged, count) = anomaly::flag_anomalies(&frame, value_column, multiplier)?;
        let id = self.store.write().await.insert(flagged);
        Ok(format!("({}, {})", id, count))
    }
}

#[async_trait]
impl ToolExecutorPort for DataToolExecutor {
    fn tool_spec(&self) -> &ToolSpec {
        &self.tool_spec
    }

    async fn execute(&self, action: &Action) -> ToolResult {
        let start = Instant::now();
        let result = match action.name.as_str() {
            io::LOAD_DATAFRAME => self.load(action).await,
            io::SAVE_DATAFRAME => self.save(action).await,
            stats::DESCRIBE_DATAFRAME => self.describe(action).await,
            viz::PLOT_TIME_SERIES => self.plot(action).await,
            anomaly::DETECT_ANOMALIES_IQR => self.detect_anomalies(action).await,
            other => Err(ToolError::execution_failed(format!(
                "Tool '{}' is not implemented",
                other
            ))),
        };
        let duration_ms = start.elapsed().as_millis() as u64;
        debug!(tool = %action.name, duration_ms, ok = result.is_ok(), "Tool executed");

        let result = match result {
            Ok(output) => ToolResult::success(&action.name, output),
            Err(error) => ToolResult::failure(&action.name, error),
        };
        result.with_duration(duration_ms)
    }
}
