//! Chart specifications built from the segment tables and the ranking
//!
//! Each chart maps one result table onto a visual encoding. Rows with a null
//! category or value are left out of a chart; they still appear in the
//! tables.

use std::collections::{BTreeSet, HashMap};

use anyhow::{Context, Result};
use polars::prelude::*;

use crate::pipeline::aggregate::{GOOD_RATE, LEADS};
use crate::pipeline::clean::{
    text_values, ADDRESS_BUCKET, CALL_STATUS, DEBT_LEVEL, MONTH, PARTNER, PHONE_BUCKET, WIDGET_NAME,
};
use crate::pipeline::{FeatureRanking, ScoreBucket, Segment, Segments};
use crate::render::{ChartKind, ChartSpec, Grid, Palette, Point};

pub const MONTHLY_GOOD_RATE: &str = "monthly_good_rate";
pub const WIDGET_QUALITY: &str = "widget_quality";
pub const PARTNER_QUALITY: &str = "partner_quality";
pub const CONTACTABILITY_HEATMAP: &str = "contactability_heatmap";
pub const FUNNEL_DISTRIBUTION: &str = "funnel_distribution";
pub const PARTNER_WIDGET_HEATMAP: &str = "partner_widget_heatmap";
pub const DEBT_LEVEL_QUALITY: &str = "debt_level_quality";
pub const FEATURE_IMPORTANCE: &str = "feature_importance";

/// Chart ids in render order
pub const CHART_IDS: [&str; 8] = [
    MONTHLY_GOOD_RATE,
    WIDGET_QUALITY,
    PARTNER_QUALITY,
    CONTACTABILITY_HEATMAP,
    FUNNEL_DISTRIBUTION,
    PARTNER_WIDGET_HEATMAP,
    DEBT_LEVEL_QUALITY,
    FEATURE_IMPORTANCE,
];

/// Widgets shown in the widget chart
pub const TOP_WIDGETS: usize = 15;

/// Features shown in the importance chart
pub const TOP_FEATURES: usize = 20;

fn segment<'a>(segments: &'a Segments, which: Segment) -> Result<&'a DataFrame> {
    segments
        .get(which)
        .with_context(|| format!("Segment '{}' was not computed", which))
}

fn float_values(df: &DataFrame, name: &str) -> Result<Vec<Option<f64>>> {
    let values = df
        .column(name)
        .with_context(|| format!("Column '{}' not found", name))?
        .cast(&DataType::Float64)?
        .f64()?
        .into_iter()
        .collect();
    Ok(values)
}

/// (label, value) pairs in table order, skipping rows where either is null
fn series(df: &DataFrame, label: &str, value: &str) -> Result<Vec<Point>> {
    let labels = text_values(df, label)?;
    let values = float_values(df, value)?;
    Ok(labels
        .into_iter()
        .zip(values)
        .filter_map(|(l, v)| Some(Point::new(l?, v?)))
        .collect())
}

fn spec(id: &str, title: &str, x_label: &str, y_label: &str, kind: ChartKind) -> ChartSpec {
    ChartSpec {
        id: id.to_string(),
        title: title.to_string(),
        x_label: x_label.to_string(),
        y_label: y_label.to_string(),
        kind,
    }
}

/// Pivot a long table into a grid. `rows`/`columns` fix the axis order;
/// keys outside them are ignored.
fn pivot(
    df: &DataFrame,
    row_key: &str,
    column_key: &str,
    value: &str,
    rows: Vec<String>,
    columns: Vec<String>,
) -> Result<Vec<Vec<Option<f64>>>> {
    let row_keys = text_values(df, row_key)?;
    let column_keys = text_values(df, column_key)?;
    let values = float_values(df, value)?;

    let mut lookup: HashMap<(String, String), f64> = HashMap::new();
    for ((r, c), v) in row_keys.into_iter().zip(column_keys).zip(values) {
        if let (Some(r), Some(c), Some(v)) = (r, c, v) {
            lookup.entry((r, c)).or_insert(v);
        }
    }

    Ok(rows
        .iter()
        .map(|r| {
            columns
                .iter()
                .map(|c| lookup.get(&(r.clone(), c.clone())).copied())
                .collect()
        })
        .collect())
}

/// Sorted distinct non-null values of a column
fn sorted_levels(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let levels: BTreeSet<String> = text_values(df, name)?.into_iter().flatten().collect();
    Ok(levels.into_iter().collect())
}

fn contactability_grid(matrix: &DataFrame) -> Result<Grid> {
    let levels: Vec<String> = ScoreBucket::ALL.iter().map(|b| b.to_string()).collect();
    let cells = pivot(matrix, PHONE_BUCKET, ADDRESS_BUCKET, GOOD_RATE, levels.clone(), levels.clone())?;
    Ok(Grid {
        rows: levels.clone(),
        columns: levels,
        cells,
        annotate: true,
        palette: Palette::Blues,
    })
}

fn partner_widget_grid(cross: &DataFrame) -> Result<Grid> {
    let rows = sorted_levels(cross, PARTNER)?;
    let columns = sorted_levels(cross, WIDGET_NAME)?;
    let cells = pivot(cross, PARTNER, WIDGET_NAME, GOOD_RATE, rows.clone(), columns.clone())?;
    Ok(Grid {
        rows,
        columns,
        cells,
        annotate: false,
        palette: Palette::Viridis,
    })
}

/// Build all eight charts
pub fn build_charts(segments: &Segments, ranking: &FeatureRanking) -> Result<Vec<ChartSpec>> {
    let monthly = segment(segments, Segment::Monthly)?;
    let widget = segment(segments, Segment::Widget)?;
    let partner = segment(segments, Segment::Partner)?;
    let matrix = segment(segments, Segment::Matrix)?;
    let funnel = segment(segments, Segment::Funnel)?;
    let cross = segment(segments, Segment::WidgetPartner)?;
    let debt = segment(segments, Segment::Debt)?;

    let mut top_widgets = series(widget, WIDGET_NAME, GOOD_RATE)?;
    top_widgets.truncate(TOP_WIDGETS);

    let top_features: Vec<Point> = ranking
        .top(TOP_FEATURES)
        .iter()
        .map(|f| Point::new(f.feature.clone(), f.importance))
        .collect();

    Ok(vec![
        spec(
            MONTHLY_GOOD_RATE,
            "Monthly Good Lead Rate",
            MONTH,
            GOOD_RATE,
            ChartKind::Line(series(monthly, MONTH, GOOD_RATE)?),
        ),
        spec(
            WIDGET_QUALITY,
            "Top Widgets by Good Lead Rate",
            GOOD_RATE,
            WIDGET_NAME,
            ChartKind::HorizontalBar(top_widgets),
        ),
        spec(
            PARTNER_QUALITY,
            "Partner Lead Quality Comparison",
            GOOD_RATE,
            PARTNER,
            ChartKind::HorizontalBar(series(partner, PARTNER, GOOD_RATE)?),
        ),
        spec(
            CONTACTABILITY_HEATMAP,
            "Heatmap: Lead Quality by Contactability",
            ADDRESS_BUCKET,
            PHONE_BUCKET,
            ChartKind::Heatmap(contactability_grid(matrix)?),
        ),
        spec(
            FUNNEL_DISTRIBUTION,
            "Lead Funnel Distribution",
            CALL_STATUS,
            LEADS,
            ChartKind::VerticalBar(series(funnel, CALL_STATUS, LEADS)?),
        ),
        spec(
            PARTNER_WIDGET_HEATMAP,
            "Partner × Widget Lead Quality",
            WIDGET_NAME,
            PARTNER,
            ChartKind::Heatmap(partner_widget_grid(cross)?),
        ),
        spec(
            DEBT_LEVEL_QUALITY,
            "Good Lead Rate by Debt Level",
            DEBT_LEVEL,
            GOOD_RATE,
            ChartKind::VerticalBar(series(debt, DEBT_LEVEL, GOOD_RATE)?),
        ),
        spec(
            FEATURE_IMPORTANCE,
            "Feature Importances (Top 20)",
            "importance",
            "feature",
            ChartKind::HorizontalBar(top_features),
        ),
    ])
}
