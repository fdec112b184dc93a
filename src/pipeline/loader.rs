//! Dataset loader for spreadsheet, CSV and Parquet files

use std::path::Path;

use anyhow::Result;
use calamine::{open_workbook_auto, Data, Reader};
use polars::prelude::*;

use super::error::InputError;

/// Rows used for CSV schema inference
const CSV_INFER_SCHEMA_LENGTH: usize = 10_000;

/// Spreadsheet containers read through calamine
const SPREADSHEET_EXTENSIONS: [&str; 5] = ["xls", "xlsx", "xlsm", "xlsb", "ods"];

/// Load a dataset from a file, dispatching on the extension.
///
/// Spreadsheets are read wholesale from their first worksheet with every
/// cell rendered as text. CSV and Parquet keep the types polars infers.
pub fn load_dataset(path: &Path) -> Result<DataFrame> {
    if !path.exists() {
        return Err(InputError::NotFound(path.to_path_buf()).into());
    }

    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    let df = match extension.as_str() {
        ext if SPREADSHEET_EXTENSIONS.contains(&ext) => load_spreadsheet(path)?,
        "csv" => LazyCsvReader::new(path)
            .with_infer_schema_length(Some(CSV_INFER_SCHEMA_LENGTH))
            .finish()
            .and_then(|lf| lf.collect())
            .map_err(|e| unreadable(path, e))?,
        "parquet" => LazyFrame::scan_parquet(path, Default::default())
            .and_then(|lf| lf.collect())
            .map_err(|e| unreadable(path, e))?,
        _ => return Err(InputError::UnsupportedFormat { extension }.into()),
    };

    Ok(df)
}

/// Shape and estimated in-memory size of a loaded dataset
pub fn dataset_stats(df: &DataFrame) -> (usize, usize, f64) {
    let (rows, cols) = df.shape();
    let memory_mb = df.estimated_size() as f64 / (1024.0 * 1024.0);
    (rows, cols, memory_mb)
}

/// Check that every required column is present, reporting all that are not
pub fn require_columns(df: &DataFrame, required: &[&str]) -> Result<(), InputError> {
    let available: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let missing: Vec<String> = required
        .iter()
        .filter(|name| !available.iter().any(|a| a == *name))
        .map(|name| name.to_string())
        .collect();

    if missing.is_empty() {
        Ok(())
    } else {
        Err(InputError::MissingColumns { missing, available })
    }
}

fn unreadable(path: &Path, err: impl std::fmt::Display) -> InputError {
    InputError::Unreadable {
        path: path.to_path_buf(),
        message: err.to_string(),
    }
}

/// Read the first worksheet of a workbook into a DataFrame of text columns.
///
/// The first row is the header. Empty cells become nulls.
fn load_spreadsheet(path: &Path) -> Result<DataFrame, InputError> {
    let mut workbook = open_workbook_auto(path).map_err(|e| unreadable(path, e))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| InputError::NoWorksheet(path.to_path_buf()))?
        .map_err(|e| unreadable(path, e))?;

    let mut rows = range.rows();
    let header = rows
        .next()
        .ok_or_else(|| InputError::NoWorksheet(path.to_path_buf()))?;

    let names: Vec<String> = header
        .iter()
        .enumerate()
        .map(|(i, cell)| cell_to_text(cell).unwrap_or_else(|| format!("column_{}", i + 1)))
        .collect();

    let mut values: Vec<Vec<Option<String>>> = vec![Vec::with_capacity(range.height()); names.len()];
    for row in rows {
        for (col_idx, column) in values.iter_mut().enumerate() {
            column.push(row.get(col_idx).and_then(cell_to_text));
        }
    }

    let columns: Vec<Column> = names
        .into_iter()
        .zip(values)
        .map(|(name, vals)| Column::new(name.into(), vals))
        .collect();

    DataFrame::new(columns).map_err(|e| unreadable(path, e))
}

/// Render a spreadsheet cell as text. Empty and error cells become None.
fn cell_to_text(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => {
            if s.trim().is_empty() {
                None
            } else {
                Some(s.clone())
            }
        }
        Data::Int(v) => Some(v.to_string()),
        Data::Float(v) => Some(format_float(*v)),
        Data::Bool(b) => Some(b.to_string()),
        Data::DateTime(dt) => dt
            .as_datetime()
            .map(|d| d.format("%Y-%m-%d %H:%M:%S").to_string())
            .or_else(|| Some(format_float(dt.as_f64()))),
        Data::DateTimeIso(s) | Data::DurationIso(s) => Some(s.clone()),
    }
}

/// Integral floats print without a fractional part so numeric category
/// codes read the same as in the sheet
pub(crate) fn format_float(v: f64) -> String {
    if v.fract() == 0.0 && v.abs() < 1e15 {
        format!("{}", v as i64)
    } else {
        format!("{}", v)
    }
}
