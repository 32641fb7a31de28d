//! Summary tool: describe_dataframe

use super::dataframe::{DataFrame, csv_line, format_number};
use tsagent_domain::{ToolDefinition, ToolParameter};

/// Tool name constant
pub const DESCRIBE_DATAFRAME: &str = "describe_dataframe";

/// Rows shown in the `head:` section
const HEAD_ROWS: usize = 5;

const STAT_NAMES: [&str; 8] = ["count", "mean", "std", "min", "25%", "50%", "75%", "max"];

/// Get the tool definition for describe_dataframe
pub fn describe_dataframe_definition() -> ToolDefinition {
    ToolDefinition::new(
        DESCRIBE_DATAFRAME,
        "Report a DataFrame's shape, dtypes, first rows and summary statistics",
    )
    .with_parameter(ToolParameter::new("dataframe_id", "DataFrame ID", true))
    .with_returns("description_text (str)")
}

/// Linear-interpolated quantile of sorted values (`q` in `[0, 1]`)
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let pos = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    let weight = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * weight)
}

/// Sample standard deviation (n - 1), `None` for fewer than two values
fn std_dev(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

/// count, mean, std, min, 25%, 50%, 75%, max
fn column_stats(values: &[f64]) -> [Option<f64>; 8] {
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let count = sorted.len() as f64;
    let mean = (!sorted.is_empty()).then(|| sorted.iter().sum::<f64>() / count);
    [
        Some(count),
        mean,
        mean.and_then(|m| std_dev(&sorted, m)),
        sorted.first().copied(),
        quantile(&sorted, 0.25),
        quantile(&sorted, 0.5),
        quantile(&sorted, 0.75),
        sorted.last().copied(),
    ]
}

fn format_stat(value: Option<f64>) -> String {
    match value {
        Some(v) if v.fract() == 0.0 => format_number(v),
        Some(v) => format!("{:.6}", v)
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string(),
        None => "NaN".to_string(),
    }
}

/// Render the textual summary returned by describe_dataframe
pub fn describe(frame: &DataFrame) -> String {
    let (rows, cols) = frame.shape();
    let mut out = format!("shape: ({}, {})\n", rows, cols);

    out.push_str("dtypes:\n");
    let width = frame.columns().iter().map(String::len).max().unwrap_or(0);
    for (i, name) in frame.columns().iter().enumerate() {
        out.push_str(&format!(
            "{:<width$}    {}\n",
            name,
            frame.column_kind(i).as_str(),
            width = width
        ));
    }

    out.push_str("head:\n");
    out.push_str(&frame.head_csv(HEAD_ROWS));

    out.push_str("describe:\n");
    let numeric: Vec<(usize, &String)> = frame
        .columns()
        .iter()
        .enumerate()
        .filter(|(i, _)| frame.column_kind(*i).is_numeric())
        .collect();
    if numeric.is_empty() {
        out.push_str("(no numeric columns)\n");
        return out;
    }

    let stats: Vec<[Option<f64>; 8]> = numeric
        .iter()
        .map(|(i, _)| column_stats(&frame.numeric_values(*i).unwrap_or_default()))
        .collect();

    out.push_str(&csv_line(
        std::iter::once("").chain(numeric.iter().map(|(_, name)| name.as_str())),
    ));
    for (row, stat_name) in STAT_NAMES.iter().enumerate() {
        let cells: Vec<String> = stats.iter().map(|s| format_stat(s[row])).collect();
        out.push_str(&csv_line(
            std::iter::once(*stat_name).chain(cells.iter().map(String::as_str)),
        ));
    }
    out
}
