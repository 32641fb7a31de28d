//! I/O tools: load_dataframe, save_dataframe

use super::dataframe::{Cell, DataFrame};
use super::matlab::read_mat;
use futures::StreamExt;
use std::path::Path;
use tsagent_domain::{ToolDefinition, ToolError, ToolParameter};

/// Tool name constants
pub const LOAD_DATAFRAME: &str = "load_dataframe";
pub const SAVE_DATAFRAME: &str = "save_dataframe";

/// File types the model may name that this build cannot read
const UNSUPPORTED_FILE_TYPES: [&str; 2] = ["parquet", "hdf5"];

/// Readable data file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileType {
    Csv,
    Mat,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Csv => "csv",
            FileType::Mat => "mat",
        }
    }

    /// Parse a `file_type` argument, naming the offending type on failure
    pub fn parse(file_type: &str) -> Result<Self, ToolError> {
        let lower = file_type.to_ascii_lowercase();
        match lower.as_str() {
            "csv" => Ok(FileType::Csv),
            "mat" => Ok(FileType::Mat),
            _ => {
                let error =
                    ToolError::invalid_argument(format!("Unsupported file_type: {}", file_type));
                if UNSUPPORTED_FILE_TYPES.contains(&lower.as_str()) {
                    Err(error.with_details("only csv and mat are supported in this build"))
                } else {
                    Err(error)
                }
            }
        }
    }

    /// Format implied by a path's extension
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?;
        Self::parse(ext).ok()
    }
}

/// Get the tool definition for load_dataframe
pub fn load_dataframe_definition() -> ToolDefinition {
    ToolDefinition::new(
        LOAD_DATAFRAME,
        "Load a CSV or MATLAB .mat file into memory and return its DataFrame ID. \
         A .mat file yields the columns `index` and `value` from its first array",
    )
    .with_parameter(ToolParameter::new("file_path", "Path to the data file", true))
    .with_parameter(ToolParameter::new(
        "file_type",
        "One of: csv, parquet, hdf5, mat (default csv)",
        false,
    ))
    .with_returns("dataframe_id (str)")
}

/// Get the tool definition for save_dataframe
pub fn save_dataframe_definition() -> ToolDefinition {
    ToolDefinition::new(SAVE_DATAFRAME, "Save a DataFrame to the given path")
        .with_parameter(ToolParameter::new("dataframe_id", "DataFrame ID", true))
        .with_parameter(ToolParameter::new("file_path", "Destination path", true))
        .with_parameter(ToolParameter::new(
            "file_type",
            "Output format (default csv)",
            false,
        ))
        .with_returns("success_message (str)")
}

/// Read a data file of the given format
pub async fn read_frame(path: &Path, file_type: FileType) -> Result<DataFrame, ToolError> {
    match file_type {
        FileType::Csv => read_csv(path).await,
        FileType::Mat => read_mat(path).await,
    }
}

/// Read a CSV file with a header row
pub async fn read_csv(path: &Path) -> Result<DataFrame, ToolError> {
    read_csv_rows(path, None).await
}

/// Read the header and at most `max_rows` records; the rest of the file is not read
pub async fn read_csv_head(path: &Path, max_rows: usize) -> Result<DataFrame, ToolError> {
    read_csv_rows(path, Some(max_rows)).await
}

async fn read_csv_rows(path: &Path, limit: Option<usize>) -> Result<DataFrame, ToolError> {
    let file = match tokio::fs::File::open(path).await {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ToolError::not_found(path.display().to_string()));
        }
        Err(e) => {
            return Err(ToolError::execution_failed(format!(
                "Failed to open {}: {}",
                path.display(),
                e
            )));
        }
    };

    let mut reader = csv_async::AsyncReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .create_reader(file);

    let columns: Vec<String> = reader
        .headers()
        .await
        .map_err(|e| csv_error(path, e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    let mut records = reader.records();
    while limit.is_none_or(|max| rows.len() < max)
        && let Some(record) = records.next().await
    {
        let record = record.map_err(|e| csv_error(path, e))?;
        rows.push(record.iter().map(Cell::parse).collect());
    }

    Ok(DataFrame::new(columns, rows))
}

/// Write a frame as CSV, creating parent directories
pub async fn write_csv(frame: &DataFrame, path: &Path) -> Result<(), ToolError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(|e| {
            ToolError::execution_failed(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    let file = tokio::fs::File::create(path).await.map_err(|e| {
        ToolError::execution_failed(format!("Failed to create {}: {}", path.display(), e))
    })?;
    let mut writer = csv_async::AsyncWriter::from_writer(file);

    writer
        .write_record(frame.columns())
        .await
        .map_err(|e| csv_error(path, e))?;
    for row in frame.rows() {
        let fields: Vec<String> = row.iter().map(Cell::to_string).collect();
        writer
            .write_record(&fields)
            .await
            .map_err(|e| csv_error(path, e))?;
    }
    writer.flush().await.map_err(|e| {
        ToolError::execution_failed(format!("Failed to write {}: {}", path.display(), e))
    })?;
    Ok(())
}

fn csv_error(path: &Path, e: csv_async::Error) -> ToolError {
    ToolError::execution_failed(format!("Failed to read CSV {}", path.display()))
        .with_details(e.to_string())
}
