//! JSON run report
//!
//! Records everything needed to interpret or reproduce a run: the effective
//! configuration, row counts, cleaning recoveries, the categorical encodings
//! behind the ranking and step timings.

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use super::summary::{RunSummary, StepTiming};
use crate::pipeline::{AnalysisConfig, CategoryEncoding, CleaningStats, FeatureImportance, FeatureRanking};

/// Metadata about the run
#[derive(Serialize)]
pub struct RunMetadata {
    /// Timestamp of the run (ISO 8601 format)
    pub timestamp: String,
    pub leadscope_version: String,
    pub input_file: String,
    pub output_dir: String,
}

/// Row counts through the pipeline
#[derive(Serialize)]
pub struct RowCounts {
    pub loaded: usize,
    pub columns: usize,
    pub used_for_ranking: usize,
    pub excluded_from_ranking: usize,
}

/// Size of one segment table
#[derive(Serialize)]
pub struct SegmentEntry {
    pub name: String,
    pub rows: usize,
}

/// Ranking provenance
#[derive(Serialize)]
pub struct RankingEntry<'a> {
    pub n_trees: usize,
    pub seed: u64,
    pub encodings: &'a [CategoryEncoding],
    pub features: &'a [FeatureImportance],
}

/// Complete run report
#[derive(Serialize)]
pub struct RunReport<'a> {
    pub metadata: RunMetadata,
    pub config: &'a AnalysisConfig,
    pub rows: RowCounts,
    pub cleaning: &'a CleaningStats,
    pub segments: Vec<SegmentEntry>,
    pub ranking: RankingEntry<'a>,
    pub timings: &'a [StepTiming],
}

/// Inputs of a run report
pub struct ReportParams<'a> {
    pub input_file: &'a Path,
    pub output_dir: &'a Path,
    pub config: &'a AnalysisConfig,
    pub cleaning: &'a CleaningStats,
    pub ranking: &'a FeatureRanking,
    pub summary: &'a RunSummary,
}

impl<'a> RunReport<'a> {
    pub fn new(params: &ReportParams<'a>) -> Self {
        let summary = params.summary;
        RunReport {
            metadata: RunMetadata {
                timestamp: Utc::now().to_rfc3339(),
                leadscope_version: env!("CARGO_PKG_VERSION").to_string(),
                input_file: params.input_file.display().to_string(),
                output_dir: params.output_dir.display().to_string(),
            },
            config: params.config,
            rows: RowCounts {
                loaded: summary.rows_loaded,
                columns: summary.columns_loaded,
                used_for_ranking: params.ranking.rows_used,
                excluded_from_ranking: params.ranking.rows_excluded,
            },
            cleaning: params.cleaning,
            segments: summary
                .segment_rows
                .iter()
                .map(|(name, rows)| SegmentEntry {
                    name: name.clone(),
                    rows: *rows,
                })
                .collect(),
            ranking: RankingEntry {
                n_trees: params.ranking.n_trees,
                seed: params.ranking.seed,
                encodings: &params.ranking.encodings,
                features: &params.ranking.features,
            },
            timings: summary.timings(),
        }
    }
}

/// Write the run report as pretty-printed JSON
pub fn write_run_report(params: &ReportParams, path: &Path) -> Result<()> {
    let report = RunReport::new(params);

    let json = serde_json::to_string_pretty(&report).context("Failed to serialize run report to JSON")?;

    std::fs::write(path, json)
        .with_context(|| format!("Failed to write run report to {}", path.display()))?;

    Ok(())
}
