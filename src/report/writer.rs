//! Output directory layout and CSV export

use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use polars::prelude::*;

use crate::pipeline::{FeatureRanking, Segments};

pub const TABLES_DIR: &str = "tables";
pub const CHARTS_DIR: &str = "charts";
pub const DERIVED_DIR: &str = "derived_data";

pub const FEATURE_IMPORTANCE_FILE: &str = "feature_importance.csv";
pub const RUN_REPORT_FILE: &str = "run_report.json";

/// Paths of every artifact under one output root
#[derive(Debug, Clone)]
pub struct OutputLayout {
    root: PathBuf,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tables_dir(&self) -> PathBuf {
        self.root.join(TABLES_DIR)
    }

    pub fn charts_dir(&self) -> PathBuf {
        self.root.join(CHARTS_DIR)
    }

    pub fn derived_dir(&self) -> PathBuf {
        self.root.join(DERIVED_DIR)
    }

    pub fn table_csv(&self, name: &str) -> PathBuf {
        self.tables_dir().join(format!("{}.csv", name))
    }

    pub fn table_image(&self, name: &str) -> PathBuf {
        self.tables_dir().join(format!("{}.png", name))
    }

    pub fn chart_image(&self, id: &str) -> PathBuf {
        self.charts_dir().join(format!("{}.png", id))
    }

    pub fn feature_importance_csv(&self) -> PathBuf {
        self.derived_dir().join(FEATURE_IMPORTANCE_FILE)
    }

    pub fn run_report_json(&self) -> PathBuf {
        self.derived_dir().join(RUN_REPORT_FILE)
    }

    /// Create the directory tree; existing directories are left alone
    pub fn create(&self) -> Result<()> {
        for dir in [self.tables_dir(), self.charts_dir(), self.derived_dir()] {
            fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
        }
        Ok(())
    }
}

/// Write a DataFrame as CSV with a header row, replacing any existing file
pub fn write_csv(df: &DataFrame, path: &Path) -> Result<()> {
    let mut df = df.clone();
    let mut file = File::create(path)
        .with_context(|| format!("Failed to create output file: {}", path.display()))?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(&mut df)
        .with_context(|| format!("Failed to write CSV file: {}", path.display()))?;
    Ok(())
}

/// Write every segment table to `tables/<name>.csv`
pub fn write_segment_tables(segments: &Segments, layout: &OutputLayout) -> Result<Vec<PathBuf>> {
    segments
        .iter()
        .map(|t| {
            let path = layout.table_csv(t.segment.name());
            write_csv(&t.table, &path)?;
            Ok(path)
        })
        .collect()
}

/// Write the full ranking to `derived_data/feature_importance.csv`
pub fn write_feature_importance(ranking: &FeatureRanking, layout: &OutputLayout) -> Result<PathBuf> {
    let path = layout.feature_importance_csv();
    write_csv(&ranking.to_dataframe()?, &path)?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_layout_paths() {
        let layout = OutputLayout::new("out");
        assert_eq!(layout.table_csv("funnel"), Path::new("out/tables/funnel.csv"));
        assert_eq!(layout.table_image("funnel"), Path::new("out/tables/funnel.png"));
        assert_eq!(
            layout.chart_image("feature_importance"),
            Path::new("out/charts/feature_importance.png")
        );
        assert_eq!(
            layout.feature_importance_csv(),
            Path::new("out/derived_data/feature_importance.csv")
        );
    }

    #[test]
    fn test_create_is_idempotent() {
        let dir = TempDir::new().unwrap();
        let layout = OutputLayout::new(dir.path().join("nested/outputs"));
        layout.create().unwrap();
        layout.create().unwrap();
        assert!(layout.tables_dir().is_dir());
        assert!(layout.charts_dir().is_dir());
        assert!(layout.derived_dir().is_dir());
    }

    #[test]
    fn test_write_csv_header_and_rows() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("t.csv");
        let df = df! {
            "feature" => ["PhoneScore", "State_TX"],
            "importance" => [0.75f64, 0.25],
        }
        .unwrap();
        write_csv(&df, &path).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("feature,importance"));
        assert_eq!(lines.next(), Some("PhoneScore,0.75"));
        assert_eq!(lines.count(), 1);
    }
}
