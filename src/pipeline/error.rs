//! Error types for the lead analysis pipeline.
//!
//! Input and ranking failures are fatal and carry enough detail to tell the
//! user what to fix. Value-coercion problems never reach this module: they are
//! recovered in place by the cleaner.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while locating, reading or validating the input dataset.
#[derive(Debug, Error)]
pub enum InputError {
    /// Input file does not exist.
    #[error("Input file not found: {}", .0.display())]
    NotFound(PathBuf),

    /// File extension is not one of the supported containers.
    #[error("Unsupported file format: '{extension}'. Supported formats: xls, xlsx, xlsm, xlsb, ods, csv, parquet")]
    UnsupportedFormat { extension: String },

    /// The container could not be opened or decoded.
    #[error("Failed to read {}: {message}", .path.display())]
    Unreadable { path: PathBuf, message: String },

    /// The workbook has no worksheet, or the first worksheet has no header row.
    #[error("Workbook {} has no readable worksheet", .0.display())]
    NoWorksheet(PathBuf),

    /// One or more required columns are absent.
    #[error("Missing required column(s): {}. Available columns: {available:?}", .missing.join(", "))]
    MissingColumns {
        missing: Vec<String>,
        available: Vec<String>,
    },

    /// The dataset holds no rows after loading.
    #[error("Dataset is empty after cleaning: no lead rows to analyze")]
    EmptyDataset,
}

/// Errors raised when configuration values are inconsistent.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Closed status '{0}' must also be a member of the good status set")]
    ClosedNotGood(String),

    #[error("Good and bad status sets must not be empty")]
    EmptyStatusSet,

    #[error("Bucket thresholds must be strictly increasing, got {0:?}")]
    UnorderedBuckets([f64; 4]),

    #[error("Number of trees must be at least 1")]
    NoTrees,

    #[error("Failed to read configuration file {}: {message}", .path.display())]
    Unreadable { path: PathBuf, message: String },
}

/// Errors raised when the importance ranking cannot be computed.
#[derive(Debug, Error)]
pub enum RankingError {
    /// Every row had a missing predictor or target value.
    #[error("No complete rows left for feature importance after excluding {excluded} row(s) with missing values")]
    NoRows { excluded: usize },

    /// The design matrix ended up with no columns.
    #[error("No predictor columns available for feature importance")]
    NoFeatures,

    /// No predictor varies across the usable rows, so no tree could split.
    #[error("No predictor varies across the {rows} usable row(s); feature importance cannot be computed")]
    NoInformativeFeatures { rows: usize },

    /// The target holds a single class, so no split can be learned.
    #[error("Feature importance needs both good and non-good leads; all {rows} usable row(s) have {target} = {class}")]
    SingleClass {
        target: String,
        class: u8,
        rows: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_columns_lists_every_column() {
        let err = InputError::MissingColumns {
            missing: vec!["Partner".to_string(), "State".to_string()],
            available: vec!["CallStatus".to_string()],
        };
        let msg = err.to_string();
        assert!(msg.contains("Partner, State"));
        assert!(msg.contains("CallStatus"));
    }

    #[test]
    fn test_single_class_display() {
        let err = RankingError::SingleClass {
            target: "GoodLeadFlag".to_string(),
            class: 0,
            rows: 12,
        };
        assert_eq!(
            err.to_string(),
            "Feature importance needs both good and non-good leads; all 12 usable row(s) have GoodLeadFlag = 0"
        );
    }

    #[test]
    fn test_no_informative_features_display() {
        let err = RankingError::NoInformativeFeatures { rows: 10 };
        assert!(err.to_string().contains("10 usable row(s)"));
    }

    #[test]
    fn test_not_found_display() {
        let err = InputError::NotFound(PathBuf::from("data/leads_raw.xls"));
        assert_eq!(err.to_string(), "Input file not found: data/leads_raw.xls");
    }
}
