//! One-hot expansion of categorical predictors
//!
//! Levels are ordered lexicographically and the first one is dropped as the
//! reference level. The chosen reference is recorded so a ranking can always
//! be traced back to the encoding that produced it.

use std::collections::BTreeSet;

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::Serialize;

use super::clean::text_values;

/// How one categorical predictor was expanded
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryEncoding {
    /// Source column
    pub feature: String,
    /// Level dropped to avoid a redundant indicator
    pub reference_level: String,
    /// Levels that received an indicator column, in column order
    pub levels: Vec<String>,
}

impl CategoryEncoding {
    /// Name of the indicator column for a kept level
    pub fn indicator_name(&self, level: &str) -> String {
        format!("{}_{}", self.feature, level)
    }
}

/// Feature-major numeric design matrix
#[derive(Debug, Clone)]
pub struct DesignMatrix {
    /// Column names, one per feature
    pub feature_names: Vec<String>,
    /// Values per feature; every inner vector has `n_rows` entries
    pub columns: Vec<Vec<f64>>,
    /// Encodings of the categorical predictors, in input order
    pub encodings: Vec<CategoryEncoding>,
    pub n_rows: usize,
}

impl DesignMatrix {
    pub fn n_features(&self) -> usize {
        self.columns.len()
    }
}

/// Build a design matrix from complete rows.
///
/// Numeric predictors come first as-is, followed by the indicator columns of
/// each categorical predictor. The frame must hold no nulls in these columns.
pub fn encode_features(
    df: &DataFrame,
    numeric: &[&str],
    categorical: &[&str],
) -> Result<DesignMatrix> {
    let n_rows = df.height();
    let mut feature_names = Vec::new();
    let mut columns = Vec::new();
    let mut encodings = Vec::with_capacity(categorical.len());

    for name in numeric {
        let values: Vec<f64> = df
            .column(name)
            .with_context(|| format!("Column '{}' not found", name))?
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|v| v.unwrap_or(0.0))
            .collect();
        feature_names.push(name.to_string());
        columns.push(values);
    }

    for name in categorical {
        let values: Vec<String> = text_values(df, name)?
            .into_iter()
            .map(|v| v.unwrap_or_default())
            .collect();

        let (encoding, indicators) = one_hot(name, &values);
        for (level, indicator) in encoding.levels.iter().zip(indicators) {
            feature_names.push(encoding.indicator_name(level));
            columns.push(indicator);
        }
        encodings.push(encoding);
    }

    Ok(DesignMatrix {
        feature_names,
        columns,
        encodings,
        n_rows,
    })
}

/// Expand one categorical column, dropping the first sorted level
fn one_hot(feature: &str, values: &[String]) -> (CategoryEncoding, Vec<Vec<f64>>) {
    let sorted: BTreeSet<&str> = values.iter().map(|s| s.as_str()).collect();
    let mut levels = sorted.into_iter().map(|s| s.to_string());
    let reference_level = levels.next().unwrap_or_default();
    let levels: Vec<String> = levels.collect();

    let indicators: Vec<Vec<f64>> = levels
        .iter()
        .map(|level| {
            values
                .iter()
                .map(|v| if v == level { 1.0 } else { 0.0 })
                .collect()
        })
        .collect();

    (
        CategoryEncoding {
            feature: feature.to_string(),
            reference_level,
            levels,
        },
        indicators,
    )
}
