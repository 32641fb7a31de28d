//! Visualization tool: plot_time_series
//!
//! Plots are plain SVG line charts. The x axis is the time column when it is
//! numeric, otherwise the row position (text timestamps keep their order).

use super::dataframe::{DataFrame, format_number};
use std::path::{Path, PathBuf};
use tsagent_domain::{ToolDefinition, ToolError, ToolParameter};

/// Tool name constant
pub const PLOT_TIME_SERIES: &str = "plot_time_series";

const WIDTH: f64 = 1000.0;
const HEIGHT: f64 = 400.0;
const MARGIN: f64 = 60.0;

/// Get the tool definition for plot_time_series
pub fn plot_time_series_definition() -> ToolDefinition {
    ToolDefinition::new(
        PLOT_TIME_SERIES,
        "Draw a time-series line chart and return the image path",
    )
    .with_parameter(ToolParameter::new("dataframe_id", "DataFrame ID", true))
    .with_parameter(ToolParameter::new(
        "time_column",
        "Column for the x axis (row index if absent)",
        true,
    ))
    .with_parameter(ToolParameter::new("value_column", "Column to plot", true))
    .with_parameter(ToolParameter::new("title", "Chart title", false))
    .with_parameter(ToolParameter::new("xlabel", "X axis label", false))
    .with_parameter(ToolParameter::new("ylabel", "Y axis label", false))
    .with_returns("plot_image_path (str)")
}

/// Labels of a chart
#[derive(Debug, Clone, Default)]
pub struct PlotLabels {
    pub title: String,
    pub xlabel: String,
    pub ylabel: String,
}

impl PlotLabels {
    /// Fill empty labels the way a quick plot would
    pub fn with_defaults(
        title: Option<&str>,
        xlabel: Option<&str>,
        ylabel: Option<&str>,
        time_column: &str,
        value_column: &str,
    ) -> Self {
        let pick = |label: Option<&str>, fallback: String| {
            label.filter(|l| !l.is_empty()).map(String::from).unwrap_or(fallback)
        };
        Self {
            title: pick(title, format!("{} over {}", value_column, time_column)),
            xlabel: pick(xlabel, time_column.to_string()),
            ylabel: pick(ylabel, value_column.to_string()),
        }
    }
}

/// Extract `(x, y)` points, skipping rows with a missing value
pub fn series_points(
    frame: &DataFrame,
    time_column: &str,
    value_column: &str,
) -> Result<Vec<(f64, f64)>, ToolError> {
    let value_index = frame
        .column_index(value_column)
        .ok_or_else(|| ToolError::not_found(format!("column '{}'", value_column)))?;
    if !frame.column_kind(value_index).is_numeric() {
        return Err(ToolError::invalid_argument(format!(
            "Column '{}' is not numeric",
            value_column
        )));
    }

    // Missing or non-numeric time column: plot against the row index
    let time_index = frame
        .column_index(time_column)
        .filter(|&i| frame.column_kind(i).is_numeric());

    Ok(frame
        .rows()
        .iter()
        .enumerate()
        .filter_map(|(row_no, row)| {
            let y = row[value_index].as_f64()?;
            let x = match time_index {
                Some(i) => row[i].as_f64()?,
                None => row_no as f64,
            };
            Some((x, y))
        })
        .collect())
}

fn escape_xml(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Render points as an SVG document
pub fn render_svg(points: &[(f64, f64)], labels: &PlotLabels) -> String {
    let (min_x, max_x) = bounds(points.iter().map(|p| p.0));
    let (min_y, max_y) = bounds(points.iter().map(|p| p.1));
    let plot_w = WIDTH - 2.0 * MARGIN;
    let plot_h = HEIGHT - 2.0 * MARGIN;
    let scale = |v: f64, lo: f64, hi: f64| if hi > lo { (v - lo) / (hi - lo) } else { 0.5 };

    let polyline = points
        .iter()
        .map(|&(x, y)| {
            format!(
                "{:.2},{:.2}",
                MARGIN + scale(x, min_x, max_x) * plot_w,
                HEIGHT - MARGIN - scale(y, min_y, max_y) * plot_h
            )
        })
        .collect::<Vec<_>>()
        .join(" ");

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w}" height="{h}" viewBox="0 0 {w} {h}">
<rect width="100%" height="100%" fill="white"/>
<text x="{cx}" y="30" text-anchor="middle" font-size="18">{title}</text>
<line x1="{m}" y1="{bottom}" x2="{right}" y2="{bottom}" stroke="black"/>
<line x1="{m}" y1="{m}" x2="{m}" y2="{bottom}" stroke="black"/>
"#,
        w = WIDTH,
        h = HEIGHT,
        cx = WIDTH / 2.0,
        m = MARGIN,
        bottom = HEIGHT - MARGIN,
        right = WIDTH - MARGIN,
        title = escape_xml(&labels.title),
    );
    svg.push_str(&format!(
        r#"<text x="{cx}" y="{y}" text-anchor="middle" font-size="14">{label}</text>
<text x="20" y="{cy}" text-anchor="middle" font-size="14" transform="rotate(-90 20 {cy})">{ylabel}</text>
<text x="{m}" y="{ty}" font-size="11">{min_x}</text>
<text x="{right}" y="{ty}" text-anchor="end" font-size="11">{max_x}</text>
<text x="{lx}" y="{bottom}" text-anchor="end" font-size="11">{min_y}</text>
<text x="{lx}" y="{top}" text-anchor="end" font-size="11">{max_y}</text>
<polyline fill="none" stroke="steelblue" stroke-width="1.5" points="{points}"/>
</svg>
"#,
        cx = WIDTH / 2.0,
        y = HEIGHT - 15.0,
        cy = HEIGHT / 2.0,
        m = MARGIN,
        ty = HEIGHT - MARGIN + 15.0,
        right = WIDTH - MARGIN,
        lx = MARGIN - 5.0,
        bottom = HEIGHT - MARGIN,
        top = MARGIN + 4.0,
        label = escape_xml(&labels.xlabel),
        ylabel = escape_xml(&labels.ylabel),
        min_x = format_number(min_x),
        max_x = format_number(max_x),
        min_y = format_number(min_y),
        max_y = format_number(max_y),
        points = polyline,
    ));
    svg
}

fn bounds(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

/// `{output_dir}/ts_{8 hex}.svg`
pub fn plot_path(output_dir: &Path) -> PathBuf {
    let id = uuid::Uuid::new_v4().simple().to_string();
    output_dir.join(format!("ts_{}.svg", &id[..8]))
}

/// Write the chart and return its path
pub async fn write_plot(
    output_dir: &Path,
    points: &[(f64, f64)],
    labels: &PlotLabels,
) -> Result<PathBuf, ToolError> {
    if points.is_empty() {
        return Err(ToolError::invalid_argument("No data points to plot"));
    }
    tokio::fs::create_dir_all(output_dir).await.map_err(|e| {
        ToolError::execution_failed(format!(
            "Failed to create {}: {}",
            output_dir.display(),
            e
        ))
    })?;
    let path = plot_path(output_dir);
    tokio::fs::write(&path, render_svg(points, labels))
        .await
        .map_err(|e| {
            ToolError::execution_failed(format!("Failed to write {}: {}", path.display(), e))
        })?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::dataframe::Cell;

    fn frame() -> DataFrame {
        DataFrame::new(
            vec!["time".into(), "value".into(), "stamp".into()],
            vec![
                vec![Cell::Number(10.0), Cell::Number(1.0), Cell::Text("a".into())],
                vec![Cell::Number(20.0), Cell::Missing, Cell::Text("b".into())],
                vec![Cell::Number(30.0), Cell::Number(3.0), Cell::Text("c".into())],
            ],
        )
    }

    #[test]
    fn test_points_use_time_column() {
        let points = series_points(&frame(), "time", "value").unwrap();
        assert_eq!(points, vec![(10.0, 1.0), (30.0, 3.0)]);
    }

    #[test]
    fn test_missing_or_text_time_column_falls_back_to_index() {
        let points = series_points(&frame(), "absent", "value").unwrap();
        assert_eq!(points, vec![(0.0, 1.0), (2.0, 3.0)]);
        let points = series_points(&frame(), "stamp", "value").unwrap();
        assert_eq!(points, vec![(0.0, 1.0), (2.0, 3.0)]);
    }

    #[test]
    fn test_bad_value_column() {
        assert_eq!(series_points(&frame(), "time", "nope").unwrap_err().code, "NOT_FOUND");
        assert_eq!(
            series_points(&frame(), "time", "stamp").unwrap_err().code,
            "INVALID_ARGUMENT"
        );
    }

    #[test]
    fn test_labels_default_from_columns() {
        let labels = PlotLabels::with_defaults(None, Some(""), Some("Volts"), "t", "v");
        assert_eq!(labels.title, "v over t");
        assert_eq!(labels.xlabel, "t");
        assert_eq!(labels.ylabel, "Volts");
    }

    #[test]
    fn test_render_svg_escapes_title() {
        let labels = PlotLabels::with_defaults(Some("a < b"), None, None, "t", "v");
        let svg = render_svg(&[(0.0, 0.0), (1.0, 1.0)], &labels);
        assert!(svg.starts_with("<svg"));
        assert!(svg.contains("a &lt; b"));
        assert!(svg.contains(r#"points="60.00,340.00 940.00,60.00""#));
    }

    #[tokio::test]
    async fn test_write_plot_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let labels = PlotLabels::default();
        let path = write_plot(dir.path(), &[(0.0, 1.0)], &labels).await.unwrap();

        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("ts_") && name.ends_with(".svg"));
        assert_eq!(name.len(), "ts_".len() + 8 + ".svg".len());
        assert!(path.exists());

        let err = write_plot(dir.path(), &[], &labels).await.unwrap_err();
        assert_eq!(err.code, "INVALID_ARGUMENT");
    }
}
