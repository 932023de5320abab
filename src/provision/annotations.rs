//! Annotation table parsing
//!
//! CelebA ships its annotations as whitespace-separated text tables whose
//! first column is the image file name and whose other columns are integers.
//! Some tables open with a row count and a header line.

use std::path::Path;

use crate::models::errors::{AppError, AppResult};

/// Parsed annotation table
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Table {
    /// Column names, empty for headerless tables
    pub header: Vec<String>,
    /// First column of every data row
    pub index: Vec<String>,
    /// Remaining columns of every data row
    pub data: Vec<Vec<i32>>,
}

impl Table {
    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Columns per data row
    pub fn width(&self) -> usize {
        self.data.first().map_or(0, |row| row.len())
    }
}

/// Read and parse the table at `path`
pub fn load_table(path: &Path, header_row: Option<usize>) -> AppResult<Table> {
    let text = std::fs::read_to_string(path)?;
    let source_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    parse_table(&text, header_row, &source_name)
}

/// Parse table text.
///
/// With `header_row = Some(h)`, non-blank line `h` holds the column names and
/// data starts on the line after it; lines before it are skipped.
pub fn parse_table(text: &str, header_row: Option<usize>, source_name: &str) -> AppResult<Table> {
    let mut table = Table::default();
    let data_start = header_row.map_or(0, |h| h + 1);

    let rows = text
        .lines()
        .enumerate()
        .map(|(n, line)| (n + 1, line.split_whitespace().collect::<Vec<_>>()))
        .filter(|(_, cells)| !cells.is_empty());

    for (row, (line_no, cells)) in rows.enumerate() {
        if Some(row) == header_row {
            table.header = cells.iter().map(|c| c.to_string()).collect();
            continue;
        }
        if row < data_start {
            continue;
        }

        let (name, values) = cells
            .split_first()
            .ok_or_else(|| AppError::index_parse(source_name, line_no, "empty row"))?;

        let values = values
            .iter()
            .map(|v| {
                v.parse::<i32>().map_err(|_| {
                    AppError::index_parse(source_name, line_no, format!("{:?} is not an integer", v))
                })
            })
            .collect::<AppResult<Vec<i32>>>()?;

        if let Some(first) = table.data.first() {
            if first.len() != values.len() {
                return Err(AppError::index_parse(
                    source_name,
                    line_no,
                    format!("expected {} values, found {}", first.len(), values.len()),
                ));
            }
        }

        table.index.push(name.to_string());
        table.data.push(values);
    }

    if let Some(h) = header_row {
        if table.header.is_empty() {
            return Err(AppError::index_parse(
                source_name,
                h + 1,
                "missing header line",
            ));
        }
    }

    Ok(table)
}
