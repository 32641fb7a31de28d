//! Anomaly tool: detect_anomalies_iqr

use super::dataframe::{Cell, DataFrame};
use super::stats::quantile;
use tsagent_domain::{ToolDefinition, ToolError, ToolParameter};

/// Tool name constant
pub const DETECT_ANOMALIES_IQR: &str = "detect_anomalies_iqr";

/// Name of the flag column added to the result frame
pub const ANOMALY_COLUMN: &str = "is_anomaly";

pub const DEFAULT_IQR_MULTIPLIER: f64 = 1.5;

/// Get the tool definition for detect_anomalies_iqr
pub fn detect_anomalies_iqr_definition() -> ToolDefinition {
    ToolDefinition::new(
        DETECT_ANOMALIES_IQR,
        "Flag outliers with the IQR rule; returns a new DataFrame ID and the anomaly count",
    )
    .with_parameter(ToolParameter::new("dataframe_id", "DataFrame ID", true))
    .with_parameter(ToolParameter::new("value_column", "Column to check", true))
    .with_parameter(
        ToolParameter::new("iqr_multiplier", "Fence width in IQRs (default 1.5)", false)
            .with_type("float"),
    )
    .with_returns("(modified_dataframe_id (str), anomaly_count (int))")
}

/// Outlier fences `(lower, upper)`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Fences {
    pub lower: f64,
    pub upper: f64,
}

impl Fences {
    pub fn contains(&self, value: f64) -> bool {
        value >= self.lower && value <= self.upper
    }
}

/// `q1 - k*iqr`, `q3 + k*iqr` over the non-missing values
pub fn iqr_fences(values: &[f64], multiplier: f64) -> Option<Fences> {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let q1 = quantile(&sorted, 0.25)?;
    let q3 = quantile(&sorted, 0.75)?;
    let iqr = q3 - q1;
    Some(Fences {
        lower: q1 - multiplier * iqr,
        upper: q3 + multiplier * iqr,
    })
}

/// Copy of `frame` with an `is_anomaly` column, plus the anomaly count.
///
/// Missing values are never anomalies.
pub fn flag_anomalies(
    frame: &DataFrame,
    value_column: &str,
    multiplier: f64,
) -> Result<(DataFrame, usize), ToolError> {
    if !multiplier.is_finite() || multiplier < 0.0 {
        return Err(ToolError::invalid_argument(format!(
            "iqr_multiplier must be a non-negative number, got {}",
            multiplier
        )));
    }
    let index = frame
        .column_index(value_column)
        .ok_or_else(|| ToolError::not_found(format!("column '{}'", value_column)))?;
    let values = frame.numeric_values(index).ok_or_else(|| {
        ToolError::invalid_argument(format!("Column '{}' is not numeric", value_column))
    })?;

    let flags: Vec<Cell> = match iqr_fences(&values, multiplier) {
        Some(fences) => frame
            .column(index)
            .map(|cell| Cell::Bool(cell.as_f64().is_some_and(|v| !fences.contains(v))))
            .collect(),
        None => vec![Cell::Bool(false); frame.shape().0],
    };
    let count = flags
        .iter()
        .filter(|c| matches!(c, Cell::Bool(true)))
        .count();

    Ok((frame.clone().with_column(ANOMALY_COLUMN, flags), count))
}
