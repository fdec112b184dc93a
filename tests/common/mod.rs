//! Shared test utilities and fixture generators

#![allow(dead_code)]

use polars::prelude::*;
use std::path::PathBuf;
use tempfile::TempDir;

/// Call statuses of the funnel scenario, in row order
pub const FUNNEL_STATUSES: [(&str, usize); 4] = [
    ("Closed", 5),
    ("EP Sent", 3),
    ("Unable to contact - Bad Contact Information", 4),
    ("Other", 8),
];

/// One raw lead, every field as it would arrive from a spreadsheet
#[derive(Debug, Clone)]
pub struct LeadRow {
    pub created: Option<String>,
    pub status: Option<String>,
    pub widget: Option<String>,
    pub partner: Option<String>,
    pub debt: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub state: Option<String>,
}

impl LeadRow {
    pub fn new(status: &str) -> Self {
        Self {
            created: Some("2023-01-15 09:30:00".to_string()),
            status: Some(status.to_string()),
            widget: Some("w1".to_string()),
            partner: Some("p1".to_string()),
            debt: Some("low".to_string()),
            phone: Some("1".to_string()),
            address: Some("3".to_string()),
            state: Some("TX".to_string()),
        }
    }
}

/// Build a raw lead frame with the eight source columns
pub fn lead_frame(rows: &[LeadRow]) -> DataFrame {
    let pick = |f: fn(&LeadRow) -> Option<String>| rows.iter().map(f).collect::<Vec<_>>();
    df! {
        "LeadCreated" => pick(|r| r.created.clone()),
        "CallStatus" => pick(|r| r.status.clone()),
        "WidgetName" => pick(|r| r.widget.clone()),
        "Partner" => pick(|r| r.partner.clone()),
        "DebtLevel" => pick(|r| r.debt.clone()),
        "PhoneScore" => pick(|r| r.phone.clone()),
        "AddressScore" => pick(|r| r.address.clone()),
        "State" => pick(|r| r.state.clone()),
    }
    .unwrap()
}

/// Twenty leads: 5 Closed, 3 EP Sent, 4 bad-contact, 8 Other.
///
/// - Partner `p1` holds rows 0..11 (11 leads), `p2` rows 11..20 (9 leads)
/// - Widgets alternate `w1`/`w2`
/// - Phone scores cycle `1`, `2.5`, `4`, `N/A`
/// - States cycle `TX`, `CA`, `NY`; months cycle Jan..Mar 2023
pub fn funnel_rows() -> Vec<LeadRow> {
    let statuses: Vec<&str> = FUNNEL_STATUSES
        .iter()
        .flat_map(|(s, n)| std::iter::repeat(*s).take(*n))
        .collect();

    statuses
        .iter()
        .enumerate()
        .map(|(i, status)| LeadRow {
            created: Some(format!("2023-0{}-15 10:00:00", 1 + i % 3)),
            status: Some(status.to_string()),
            widget: Some(if i % 2 == 0 { "w1" } else { "w2" }.to_string()),
            partner: Some(if i < 11 { "p1" } else { "p2" }.to_string()),
            debt: Some(if i % 3 == 0 { "high" } else { "low" }.to_string()),
            phone: Some(["1", "2.5", "4", "N/A"][i % 4].to_string()),
            address: Some("3".to_string()),
            state: Some(["TX", "CA", "NY"][i % 3].to_string()),
        })
        .collect()
}

pub fn funnel_frame() -> DataFrame {
    lead_frame(&funnel_rows())
}

/// Create a temporary directory with a test CSV file
pub fn create_temp_csv(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let csv_path = temp_dir.path().join("leads.csv");

    let mut file = std::fs::File::create(&csv_path).unwrap();
    CsvWriter::new(&mut file).finish(df).unwrap();

    (temp_dir, csv_path)
}

/// Create a temporary directory with a test Parquet file
pub fn create_temp_parquet(df: &mut DataFrame) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let parquet_path = temp_dir.path().join("leads.parquet");

    let file = std::fs::File::create(&parquet_path).unwrap();
    ParquetWriter::new(file).finish(df).unwrap();

    (temp_dir, parquet_path)
}

/// Read a column as optional strings
pub fn str_column(df: &DataFrame, name: &str) -> Vec<Option<String>> {
    df.column(name)
        .unwrap()
        .str()
        .unwrap()
        .into_iter()
        .map(|v| v.map(|s| s.to_string()))
        .collect()
}

/// Read a column as f64 values, nulls as NaN
pub fn f64_column(df: &DataFrame, name: &str) -> Vec<f64> {
    df.column(name)
        .unwrap()
        .cast(&DataType::Float64)
        .unwrap()
        .f64()
        .unwrap()
        .into_iter()
        .map(|v| v.unwrap_or(f64::NAN))
        .collect()
}

/// Assert that a DataFrame contains specific columns
pub fn assert_has_columns(df: &DataFrame, expected_cols: &[&str]) {
    let actual_cols: Vec<String> = df.get_column_names().iter().map(|s| s.to_string()).collect();
    for col in expected_cols {
        assert!(
            actual_cols.contains(&col.to_string()),
            "Missing expected column: '{}'. Actual columns: {:?}",
            col,
            actual_cols
        );
    }
}
