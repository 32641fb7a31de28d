//! Directory summarizer
//!
//! Produces the data context placed in the session preamble: for every
//! directory under the root that holds CSV or `.mat` files, a
//! `Directory: {dir}` line followed by one JSON object per file.
//!
//! ```text
//! Directory: data/sensors
//! {"file":"data/sensors/a.csv","type":"csv","columns":["t","value"],"preview":[["0","1.5"]]}
//! {"file":"data/sensors/b.mat","type":"mat","keys":["X"],"previews":{"X":{"shape":[4,1],"dtype":"float64","preview":[0.1]}}}
//! ```

use crate::tools::Cell;
use crate::tools::io::{FileType, read_csv_head};
use crate::tools::matlab::{read_mat_file, summarize_mat};
use glob::{MatchOptions, Pattern};
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Summarize the data files under `root`.
///
/// At most `max_files_per_folder` files are listed per directory (sorted by
/// name), each with up to `max_preview_rows` rows. Unreadable files are
/// listed with an `error` field instead of a preview. Returns an empty
/// string when nothing is found.
pub async fn summarize_directory(
    root: &Path,
    max_files_per_folder: usize,
    max_preview_rows: usize,
) -> String {
    let mut lines = Vec::new();
    for (dir, files) in find_data_files(root) {
        lines.push(format!("Directory: {}", dir.display()));
        for path in files.iter().take(max_files_per_folder) {
            lines.push(summarize_file(path, max_preview_rows).await.to_string());
        }
    }
    lines.join("\n")
}

/// Data files grouped by parent directory, each group sorted
fn find_data_files(root: &Path) -> BTreeMap<PathBuf, Vec<PathBuf>> {
    let mut groups: BTreeMap<PathBuf, Vec<PathBuf>> = BTreeMap::new();

    let pattern = format!("{}/**/*", Pattern::escape(&root.to_string_lossy()));
    let options = MatchOptions {
        case_sensitive: false,
        ..Default::default()
    };

    let entries = match glob::glob_with(&pattern, options) {
        Ok(paths) => paths,
        Err(e) => {
            warn!(root = %root.display(), "Invalid data directory pattern: {}", e);
            return groups;
        }
    };

    for entry in entries {
        match entry {
            Ok(path) if path.is_file() && FileType::from_path(&path).is_some() => {
                let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
                groups.entry(dir).or_default().push(path);
            }
            Ok(_) => {}
            Err(e) => debug!("Skipping unreadable path: {}", e),
        }
    }

    for files in groups.values_mut() {
        files.sort();
    }
    groups
}

async fn summarize_file(path: &Path, max_preview_rows: usize) -> Value {
    let file_type = FileType::from_path(path).unwrap_or(FileType::Csv);
    let mut meta = json!({
        "file": path.display().to_string(),
        "type": file_type.as_str(),
    });

    let details = match file_type {
        FileType::Csv => read_csv_head(path, max_preview_rows).await.map(|frame| {
            let preview: Vec<Vec<String>> = frame
                .rows()
                .iter()
                .map(|row| row.iter().map(Cell::to_string).collect())
                .collect();
            json!({ "columns": frame.columns(), "preview": preview })
        }),
        FileType::Mat => read_mat_file(path)
            .await
            .map(|file| summarize_mat(&file, max_preview_rows)),
    };

    match details {
        Ok(Value::Object(fields)) => {
            for (key, value) in fields {
                meta[key.as_str()] = value;
            }
        }
        Ok(_) => {}
        Err(e) => {
            meta["error"] = json!(e.to_string());
        }
    }
    meta
}
