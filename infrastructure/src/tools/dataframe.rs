//! In-memory table used by the data tools.
//!
//! Row-major storage of dynamically typed cells. Column kinds are inferred
//! from the cells, the way a CSV reader would: all-integer numbers are
//! `int64`, any fractional number makes a column `float64`, booleans are
//! `bool`, anything else is `object`.

use std::fmt;

/// A single table cell
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Bool(bool),
    Text(String),
    Missing,
}

impl Cell {
    /// Parse a raw CSV field
    pub fn parse(raw: &str) -> Self {
        let field = raw.trim();
        match field {
            "" | "NA" | "N/A" | "NaN" | "nan" | "null" | "None" => Cell::Missing,
            "True" | "true" => Cell::Bool(true),
            "False" | "false" => Cell::Bool(false),
            _ => match field.parse::<f64>() {
                Ok(n) if n.is_finite() => Cell::Number(n),
                _ => Cell::Text(raw.to_string()),
            },
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => Some(*n),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Cell::Missing)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(n) => f.write_str(&format_number(*n)),
            Cell::Bool(true) => f.write_str("True"),
            Cell::Bool(false) => f.write_str("False"),
            Cell::Text(s) => f.write_str(s),
            Cell::Missing => Ok(()),
        }
    }
}

/// Render a number without a trailing `.0` for integral values
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

/// Inferred type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnKind {
    Integer,
    Float,
    Bool,
    Text,
}

impl ColumnKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnKind::Integer => "int64",
            ColumnKind::Float => "float64",
            ColumnKind::Bool => "bool",
            ColumnKind::Text => "object",
        }
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, ColumnKind::Integer | ColumnKind::Float)
    }
}

/// Named columns over rows of [`Cell`]s
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataFrame {
    columns: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl DataFrame {
    /// Build a frame; short rows are padded with [`Cell::Missing`], long rows truncated
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Cell>>) -> Self {
        let width = columns.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, Cell::Missing);
                row
            })
            .collect();
        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Cell>] {
        &self.rows
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.rows.len(), self.columns.len())
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cells of one column, top to bottom
    pub fn column(&self, index: usize) -> impl Iterator<Item = &Cell> {
        self.rows.iter().filter_map(move |row| row.get(index))
    }

    /// Non-missing numeric values of a column, or `None` if it is not numeric
    pub fn numeric_values(&self, index: usize) -> Option<Vec<f64>> {
        if !self.column_kind(index).is_numeric() {
            return None;
        }
        Some(self.column(index).filter_map(Cell::as_f64).collect())
    }

    pub fn column_kind(&self, index: usize) -> ColumnKind {
        let mut kind: Option<ColumnKind> = None;
        for cell in self.column(index) {
            let cell_kind = match cell {
                Cell::Missing => continue,
                Cell::Number(n) if n.fract() == 0.0 => ColumnKind::Integer,
                Cell::Number(_) => ColumnKind::Float,
                Cell::Bool(_) => ColumnKind::Bool,
                Cell::Text(_) => return ColumnKind::Text,
            };
            kind = Some(match (kind, cell_kind) {
                (None, k) => k,
                (Some(a), b) if a == b => a,
                (Some(ColumnKind::Integer), ColumnKind::Float)
                | (Some(ColumnKind::Float), ColumnKind::Integer) => ColumnKind::Float,
                _ => return ColumnKind::Text,
            });
        }
        // An all-missing column reads as float (NaN) in most tools
        kind.unwrap_or(ColumnKind::Float)
    }

    /// Append a column, replacing any existing column with the same name
    pub fn with_column(mut self, name: impl Into<String>, cells: Vec<Cell>) -> Self {
        let name = name.into();
        let index = match self.column_index(&name) {
            Some(i) => i,
            None => {
                self.columns.push(name);
                for row in &mut self.rows {
                    row.push(Cell::Missing);
                }
                self.columns.len() - 1
            }
        };
        for (row, cell) in self.rows.iter_mut().zip(cells) {
            row[index] = cell;
        }
        self
    }

    /// First `n` rows as CSV text, header included
    pub fn head_csv(&self, n: usize) -> String {
        let mut out = csv_line(self.columns.iter().map(String::as_str));
        for row in self.rows.iter().take(n) {
            let fields: Vec<String> = row.iter().map(Cell::to_string).collect();
            out.push_str(&csv_line(fields.iter().map(String::as_str)));
        }
        out
    }
}

/// One CSV line with minimal quoting
pub fn csv_line<'a>(fields: impl Iterator<Item = &'a str>) -> String {
    let mut line = fields
        .map(|field| {
            if field.contains([',', '"', '\n', '\r']) {
                format!("\"{}\"", field.replace('"', "\"\""))
            } else {
                field.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(",");
    line.push('\n');
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame() -> DataFrame {
        DataFrame::new(
            vec!["time".into(), "value".into(), "label".into()],
            vec![
                vec![Cell::parse("1"), Cell::parse("1.5"), Cell::parse("a")],
                vec![Cell::parse("2"), Cell::parse(""), Cell::parse("b,c")],
                vec![Cell::parse("3"), Cell::parse("4")],
            ],
        )
    }

    #[test]
    fn test_cell_parse() {
        assert_eq!(Cell::parse("42"), Cell::Number(42.0));
        assert_eq!(Cell::parse(" -1.5e2 "), Cell::Number(-150.0));
        assert_eq!(Cell::parse("NaN"), Cell::Missing);
        assert_eq!(Cell::parse("True"), Cell::Bool(true));
        assert_eq!(Cell::parse("2024-01-01"), Cell::Text("2024-01-01".into()));
        assert_eq!(Cell::parse("inf"), Cell::Text("inf".into()));
    }

    #[test]
    fn test_shape_and_padding() {
        let df = frame();
        assert_eq!(df.shape(), (3, 3));
        assert_eq!(df.rows()[2][2], Cell::Missing);
    }

    #[test]
    fn test_column_kinds() {
        let df = frame();
        assert_eq!(df.column_kind(0), ColumnKind::Integer);
        assert_eq!(df.column_kind(1), ColumnKind::Float);
        assert_eq!(df.column_kind(2), ColumnKind::Text);
        assert_eq!(df.numeric_values(1), Some(vec![1.5, 4.0]));
        assert_eq!(df.numeric_values(2), None);
    }

    #[test]
    fn test_with_column_appends_and_replaces() {
        let df = frame().with_column("flag", vec![Cell::Bool(true), Cell::Bool(false), Cell::Bool(false)]);
        assert_eq!(df.columns().last().map(String::as_str), Some("flag"));
        assert_eq!(df.column_kind(3), ColumnKind::Bool);

        let df = df.with_column("flag", vec![Cell::Bool(false)]);
        assert_eq!(df.shape(), (3, 4));
        assert_eq!(df.rows()[0][3], Cell::Bool(false));
    }

    #[test]
    fn test_head_csv_quotes_fields() {
        let csv = frame().head_csv(2);
        assert_eq!(csv, "time,value,label\n1,1.5,a\n2,,\"b,c\"\n");
    }
}
