//! Run summary shown at the end of an analysis

use std::time::Duration;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;
use serde::Serialize;

use crate::pipeline::{CleaningStats, FeatureRanking, Segments};

/// Wall-clock time of one pipeline step
#[derive(Debug, Clone, Serialize)]
pub struct StepTiming {
    pub step: String,
    pub seconds: f64,
}

/// Counts and timings collected while the pipeline runs
#[derive(Debug, Default)]
pub struct RunSummary {
    pub rows_loaded: usize,
    pub columns_loaded: usize,
    pub unparseable_dates: usize,
    pub coerced_scores: usize,
    pub unbucketed_scores: usize,
    /// (segment name, result rows) in output order
    pub segment_rows: Vec<(String, usize)>,
    pub features_ranked: usize,
    pub rows_ranked: usize,
    pub rows_excluded: usize,
    pub top_feature: Option<(String, f64)>,
    pub files_written: usize,
    timings: Vec<StepTiming>,
}

impl RunSummary {
    pub fn new(rows_loaded: usize, columns_loaded: usize) -> Self {
        Self {
            rows_loaded,
            columns_loaded,
            ..Default::default()
        }
    }

    pub fn record_cleaning(&mut self, stats: &CleaningStats) {
        self.unparseable_dates = stats.unparseable_dates;
        self.coerced_scores = stats.coerced_phone_scores + stats.coerced_address_scores;
        self.unbucketed_scores = stats.unbucketed_phone_scores + stats.unbucketed_address_scores;
    }

    pub fn record_segments(&mut self, segments: &Segments) {
        self.segment_rows = segments
            .iter()
            .map(|t| (t.segment.name().to_string(), t.table.height()))
            .collect();
    }

    pub fn record_ranking(&mut self, ranking: &FeatureRanking) {
        self.features_ranked = ranking.features.len();
        self.rows_ranked = ranking.rows_used;
        self.rows_excluded = ranking.rows_excluded;
        self.top_feature = ranking
            .features
            .first()
            .map(|f| (f.feature.clone(), f.importance));
    }

    pub fn add_files(&mut self, count: usize) {
        self.files_written += count;
    }

    pub fn record_time(&mut self, step: &str, elapsed: Duration) {
        self.timings.push(StepTiming {
            step: step.to_string(),
            seconds: elapsed.as_secs_f64(),
        });
    }

    pub fn timings(&self) -> &[StepTiming] {
        &self.timings
    }

    pub fn total_seconds(&self) -> f64 {
        self.timings.iter().map(|t| t.seconds).sum()
    }

    fn count_cell(count: usize) -> Cell {
        Cell::new(count).fg(if count == 0 { Color::White } else { Color::Yellow })
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("RUN SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![Cell::new("📁 Leads Loaded"), Cell::new(self.rows_loaded)]);
        table.add_row(vec![Cell::new("📐 Columns"), Cell::new(self.columns_loaded)]);
        table.add_row(vec![
            Cell::new("📅 Unparseable Dates"),
            Self::count_cell(self.unparseable_dates),
        ]);
        table.add_row(vec![
            Cell::new("🔢 Scores Defaulted to 0"),
            Self::count_cell(self.coerced_scores),
        ]);
        table.add_row(vec![
            Cell::new("🪣 Scores Outside Buckets"),
            Self::count_cell(self.unbucketed_scores),
        ]);

        for (name, rows) in &self.segment_rows {
            table.add_row(vec![
                Cell::new(format!("📊 Segment: {}", name)),
                Cell::new(rows).fg(if *rows == 0 { Color::Red } else { Color::Cyan }),
            ]);
        }

        table.add_row(vec![
            Cell::new("🌲 Rows Used for Ranking"),
            Cell::new(format!("{} ({} excluded)", self.rows_ranked, self.rows_excluded)),
        ]);
        table.add_row(vec![
            Cell::new("🧮 Features Ranked"),
            Cell::new(self.features_ranked),
        ]);

        if let Some((feature, importance)) = &self.top_feature {
            table.add_row(vec![
                Cell::new("🏆 Top Feature"),
                Cell::new(format!("{} ({:.3})", feature, importance))
                    .fg(Color::Green)
                    .add_attribute(Attribute::Bold),
            ]);
        }

        table.add_row(vec![
            Cell::new("💾 Files Written"),
            Cell::new(self.files_written)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![
            Cell::new("⏱️  Total Time"),
            Cell::new(format!("{:.2}s", self.total_seconds())),
        ]);

        // Indent the table
        for line in table.to_string().lines() {
            println!("    {}", line);
        }

        if !self.timings.is_empty() {
            println!();
            println!(
                "    {} {}",
                style("⏱️").cyan(),
                style("STEP TIMINGS").white().bold()
            );
            println!("    {}", style("─".repeat(50)).dim());
            for t in &self.timings {
                println!(
                    "      {} {:<24} {}",
                    style("•").dim(),
                    t.step,
                    style(format!("{:.2}s", t.seconds)).dim()
                );
            }
        }
    }
}
