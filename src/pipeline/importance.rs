//! Feature importance ranking for good-lead prediction
//!
//! Fits the random forest on complete rows and ranks the expanded features by
//! mean decrease in impurity.

use anyhow::{Context, Result};
use polars::prelude::*;
use serde::Serialize;

use super::clean::{
    ADDRESS_SCORE, DEBT_LEVEL, GOOD_LEAD_FLAG, PARTNER, PHONE_SCORE, STATE, WIDGET_NAME,
};
use super::encoding::{encode_features, CategoryEncoding};
use super::error::RankingError;
use super::forest::{ForestConfig, RandomForest};

/// Numeric predictors, in design-matrix order
pub const NUMERIC_PREDICTORS: [&str; 2] = [PHONE_SCORE, ADDRESS_SCORE];

/// Categorical predictors, in design-matrix order
pub const CATEGORICAL_PREDICTORS: [&str; 4] = [STATE, DEBT_LEVEL, PARTNER, WIDGET_NAME];

/// Weight of one expanded feature
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
}

/// Ranked importances plus the provenance needed to reproduce them
#[derive(Debug, Clone, Serialize)]
pub struct FeatureRanking {
    /// Sorted by importance, descending
    pub features: Vec<FeatureImportance>,
    pub encodings: Vec<CategoryEncoding>,
    pub rows_used: usize,
    pub rows_excluded: usize,
    pub n_trees: usize,
    pub seed: u64,
}

impl FeatureRanking {
    /// The `n` most important features
    pub fn top(&self, n: usize) -> &[FeatureImportance] {
        &self.features[..n.min(self.features.len())]
    }

    /// Render the ranking as a two-column table
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let names: Vec<&str> = self.features.iter().map(|f| f.feature.as_str()).collect();
        let weights: Vec<f64> = self.features.iter().map(|f| f.importance).collect();
        let df = DataFrame::new(vec![
            Column::new("feature".into(), names),
            Column::new("importance".into(), weights),
        ])?;
        Ok(df)
    }
}

/// Rank predictors of the good-lead flag.
///
/// Rows with a missing value in the target or any predictor are excluded
/// before fitting. Fails when nothing is left to fit, when only one class
/// remains, or when no tree finds a split.
pub fn rank_features(df: &DataFrame, config: &ForestConfig) -> Result<FeatureRanking> {
    let mut selected: Vec<&str> = vec![GOOD_LEAD_FLAG];
    selected.extend(CATEGORICAL_PREDICTORS);
    selected.extend(NUMERIC_PREDICTORS);

    let complete = df
        .select(selected.iter().copied())
        .context("Feature importance input is missing a predictor column")?
        .drop_nulls::<String>(None)?;

    let rows_excluded = df.height() - complete.height();
    if complete.height() == 0 {
        return Err(RankingError::NoRows {
            excluded: rows_excluded,
        }
        .into());
    }

    let labels: Vec<u8> = complete
        .column(GOOD_LEAD_FLAG)?
        .cast(&DataType::Int32)?
        .i32()?
        .into_iter()
        .map(|v| (v.unwrap_or(0) != 0) as u8)
        .collect();

    let positives = labels.iter().filter(|&&y| y == 1).count();
    if positives == 0 || positives == labels.len() {
        return Err(RankingError::SingleClass {
            target: GOOD_LEAD_FLAG.to_string(),
            class: (positives > 0) as u8,
            rows: labels.len(),
        }
        .into());
    }

    let matrix = encode_features(&complete, &NUMERIC_PREDICTORS, &CATEGORICAL_PREDICTORS)?;
    if matrix.n_features() == 0 {
        return Err(RankingError::NoFeatures.into());
    }

    let forest = RandomForest::fit(&matrix.columns, &labels, config);
    let weights = forest.feature_importances();
    if weights.iter().sum::<f64>() <= 0.0 {
        return Err(RankingError::NoInformativeFeatures {
            rows: complete.height(),
        }
        .into());
    }

    let mut features: Vec<FeatureImportance> = matrix
        .feature_names
        .into_iter()
        .zip(weights)
        .map(|(feature, importance)| FeatureImportance {
            feature,
            importance,
        })
        .collect();

    // Stable: ties keep design-matrix order
    features.sort_by(|a, b| b.importance.total_cmp(&a.importance));

    tracing::debug!(
        rows_used = complete.height(),
        rows_excluded,
        features = features.len(),
        "ranked features"
    );

    Ok(FeatureRanking {
        features,
        encodings: matrix.encodings,
        rows_used: complete.height(),
        rows_excluded,
        n_trees: config.n_trees,
        seed: config.seed,
    })
}
