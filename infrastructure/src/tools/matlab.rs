//! MATLAB `.mat` (level 5) reading for load_dataframe and the summarizer.
//!
//! A `.mat` file is a bag of named numeric arrays. Loading picks the first
//! array and flattens it in row-major order into an `index`/`value` frame,
//! which is the shape the plot and anomaly tools are usually pointed at.
//! HDF5-based v7.3 files are not readable here.

use super::dataframe::{Cell, DataFrame};
use matfile::{Array, MatFile, NumericData};
use serde_json::{Map, Value, json};
use std::path::Path;
use tsagent_domain::ToolError;

/// Column holding the element position
pub const INDEX_COLUMN: &str = "index";
/// Column holding the element value
pub const VALUE_COLUMN: &str = "value";

/// Parse the arrays of a `.mat` file
pub async fn read_mat_file(path: &Path) -> Result<MatFile, ToolError> {
    let bytes = match tokio::fs::read(path).await {
        Ok(bytes) => bytes,
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

    MatFile::parse(bytes.as_slice()).map_err(|e| {
        ToolError::execution_failed(format!("Failed to read MAT file {}", path.display()))
            .with_details(e.to_string())
    })
}

/// Load the first array of a `.mat` file as an `index`/`value` frame
pub async fn read_mat(path: &Path) -> Result<DataFrame, ToolError> {
    let file = read_mat_file(path).await?;
    let array = file.arrays().first().ok_or_else(|| {
        ToolError::execution_failed(format!("No arrays in .mat file {}", path.display()))
    })?;
    Ok(series_frame(&flatten(array)))
}

/// Build an `index`/`value` frame from a flat series
pub fn series_frame(values: &[f64]) -> DataFrame {
    let rows = values
        .iter()
        .enumerate()
        .map(|(i, v)| {
            let value = if v.is_finite() {
                Cell::Number(*v)
            } else {
                Cell::Missing
            };
            vec![Cell::Number(i as f64), value]
        })
        .collect();
    DataFrame::new(vec![INDEX_COLUMN.into(), VALUE_COLUMN.into()], rows)
}

/// Summary record of one `.mat` file: array names, plus shape, dtype and
/// the first `max_preview` elements of each
pub fn summarize_mat(file: &MatFile, max_preview: usize) -> Value {
    let mut previews = Map::new();
    for array in file.arrays() {
        let values = flatten(array);
        let preview: Vec<f64> = values.into_iter().take(max_preview).collect();
        previews.insert(
            array.name().to_string(),
            json!({
                "shape": array.size(),
                "dtype": dtype(array.data()),
                "preview": preview,
            }),
        );
    }
    let keys: Vec<&str> = file.arrays().iter().map(Array::name).collect();
    json!({ "keys": keys, "previews": previews })
}

/// Real part of the array in row-major order
pub fn flatten(array: &Array) -> Vec<f64> {
    to_row_major(real_values(array.data()), array.size())
}

fn dtype(data: &NumericData) -> &'static str {
    match data {
        NumericData::Int8 { .. } => "int8",
        NumericData::UInt8 { .. } => "uint8",
        NumericData::Int16 { .. } => "int16",
        NumericData::UInt16 { .. } => "uint16",
        NumericData::Int32 { .. } => "int32",
        NumericData::UInt32 { .. } => "uint32",
        NumericData::Int64 { .. } => "int64",
        NumericData::UInt64 { .. } => "uint64",
        NumericData::Single { .. } => "float32",
        NumericData::Double { .. } => "float64",
    }
}

fn real_values(data: &NumericData) -> Vec<f64> {
    fn widen<T: Copy + Into<f64>>(values: &[T]) -> Vec<f64> {
        values.iter().map(|v| (*v).into()).collect()
    }
    match data {
        NumericData::Int8 { real, .. } => widen(real),
        NumericData::UInt8 { real, .. } => widen(real),
        NumericData::Int16 { real, .. } => widen(real),
        NumericData::UInt16 { real, .. } => widen(real),
        NumericData::Int32 { real, .. } => widen(real),
        NumericData::UInt32 { real, .. } => widen(real),
        NumericData::Int64 { real, .. } => real.iter().map(|v| *v as f64).collect(),
        NumericData::UInt64 { real, .. } => real.iter().map(|v| *v as f64).collect(),
        NumericData::Single { real, .. } => widen(real),
        NumericData::Double { real, .. } => real.clone(),
    }
}

/// MATLAB stores arrays column-major; reorder so the last axis varies fastest
fn to_row_major(values: Vec<f64>, dims: &[usize]) -> Vec<f64> {
    let non_trivial = dims.iter().filter(|&&d| d > 1).count();
    if non_trivial <= 1 || dims.iter().product::<usize>() != values.len() {
        return values;
    }

    let mut strides = vec![1usize; dims.len()];
    for k in 1..dims.len() {
        strides[k] = strides[k - 1] * dims[k - 1];
    }

    let mut out = Vec::with_capacity(values.len());
    let mut index = vec![0usize; dims.len()];
    for _ in 0..values.len() {
        let offset: usize = index.iter().zip(&strides).map(|(i, s)| i * s).sum();
        out.push(values[offset]);
        for k in (0..dims.len()).rev() {
            index[k] += 1;
            if index[k] < dims[k] {
                break;
            }
            index[k] = 0;
        }
    }
    out
}

/// Encode double arrays as an uncompressed level 5 MAT file
#[cfg(test)]
pub(crate) fn encode_mat_v5(arrays: &[(&str, &[usize], &[f64])]) -> Vec<u8> {
    const MI_INT8: u32 = 1;
    const MI_INT32: u32 = 5;
    const MI_UINT32: u32 = 6;
    const MI_DOUBLE: u32 = 9;
    const MI_MATRIX: u32 = 14;
    const MX_DOUBLE_CLASS: u32 = 6;

    fn element(data_type: u32, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::with_capacity(payload.len() + 16);
        out.extend(data_type.to_le_bytes());
        out.extend((payload.len() as u32).to_le_bytes());
        out.extend(payload);
        while out.len() % 8 != 0 {
            out.push(0);
        }
        out
    }

    let mut out = b"MATLAB 5.0 MAT-file, Platform: GLNXA64, Created by: tsagent".to_vec();
    out.resize(116, b' ');
    out.extend([0u8; 8]);
    out.extend(0x0100u16.to_le_bytes());
    out.extend(b"IM");

    for (name, dims, values) in arrays {
        let mut flags = MX_DOUBLE_CLASS.to_le_bytes().to_vec();
        flags.extend(0u32.to_le_bytes());
        let dims: Vec<u8> = dims.iter().flat_map(|d| (*d as i32).to_le_bytes()).collect();
        let data: Vec<u8> = values.iter().flat_map(|v| v.to_le_bytes()).collect();

        let mut body = element(MI_UINT32, &flags);
        body.extend(element(MI_INT32, &dims));
        body.extend(element(MI_INT8, name.as_bytes()));
        body.extend(element(MI_DOUBLE, &data));
        out.extend(element(MI_MATRIX, &body));
    }
    out
}
