//! Report rendering
//!
//! The pipeline describes what to draw as plain values: a table is a
//! `DataFrame`, a chart is a [`ChartSpec`]. A [`ReportRenderer`] turns either
//! into an image file. [`PngRenderer`] rasterizes with a built-in bitmap font
//! so rendering needs no system fonts.

pub mod canvas;
mod chart;
pub mod font;
mod table;

use std::path::Path;

use anyhow::Result;
use polars::prelude::DataFrame;
use serde::Serialize;

/// Turns report tables and chart specifications into files
pub trait ReportRenderer: Send + Sync {
    fn render_table(&self, table: &DataFrame, title: &str, path: &Path) -> Result<()>;

    fn render_chart(&self, chart: &ChartSpec, path: &Path) -> Result<()>;
}

/// One labelled value
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub label: String,
    pub value: f64,
}

impl Point {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self {
            label: label.into(),
            value,
        }
    }
}

/// Color ramp for heatmap cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Palette {
    /// White to dark blue
    Blues,
    /// Purple through teal to yellow
    Viridis,
}

/// Labelled matrix of optional values
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Grid {
    pub rows: Vec<String>,
    pub columns: Vec<String>,
    /// `cells[row][column]`; None leaves the cell blank
    pub cells: Vec<Vec<Option<f64>>>,
    /// Print each value inside its cell
    pub annotate: bool,
    pub palette: Palette,
}

/// Visual encoding of a chart together with its data
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum ChartKind {
    /// Points joined in order along the x axis
    Line(Vec<Point>),
    /// One bar per point, categories down the y axis in order
    HorizontalBar(Vec<Point>),
    /// One bar per point, categories along the x axis in order
    VerticalBar(Vec<Point>),
    Heatmap(Grid),
}

/// A chart ready to be drawn
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    /// File stem of the rendered chart
    pub id: String,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub kind: ChartKind,
}

/// Renders PNG images with the built-in bitmap font
#[derive(Debug, Clone, Copy, Default)]
pub struct PngRenderer;

impl PngRenderer {
    pub fn new() -> Self {
        Self
    }
}

impl ReportRenderer for PngRenderer {
    fn render_table(&self, table: &DataFrame, title: &str, path: &Path) -> Result<()> {
        let canvas = table::draw_table(table, title)?;
        canvas.save(path)
    }

    fn render_chart(&self, chart: &ChartSpec, path: &Path) -> Result<()> {
        let canvas = chart::draw_chart(chart);
        canvas.save(path)
    }
}

/// Compact number formatting for labels: integers without decimals, other
/// values with at most three
pub(crate) fn format_value(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value.fract() == 0.0 && value.abs() < 1e12 {
        return format!("{}", value as i64);
    }
    let fixed = format!("{:.3}", value);
    let trimmed = fixed.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Shorten a label to at most `max_chars` characters
pub(crate) fn truncate_label(label: &str, max_chars: usize) -> String {
    if label.chars().count() <= max_chars {
        label.to_string()
    } else {
        let kept: String = label.chars().take(max_chars.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
