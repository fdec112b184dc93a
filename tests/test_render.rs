//! Tests for PNG rendering of tables and charts

use leadscope::pipeline::{
    clean_leads, rank_features, run_segments, AggregationThresholds, BucketThresholds,
    ForestConfig, LeadClassifier,
};
use leadscope::render::{ChartKind, ChartSpec, Grid, Palette, PngRenderer, Point, ReportRenderer};
use leadscope::report::{build_charts, CHART_IDS};
use polars::prelude::*;
use tempfile::TempDir;

#[path = "common/mod.rs"]
mod common;

const PNG_MAGIC: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

fn assert_png(path: &std::path::Path) -> (u32, u32) {
    let bytes = std::fs::read(path).unwrap();
    assert_eq!(&bytes[..8], &PNG_MAGIC, "{} is not a PNG", path.display());
    let img = image::open(path).unwrap();
    (img.width(), img.height())
}

#[test]
fn test_render_table_png() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("debt.png");
    let table = df! {
        "DebtLevel" => ["high", "low"],
        "leads" => [7u32, 13],
        "good_rate" => [0.428571, 0.384615],
    }
    .unwrap();

    PngRenderer::new().render_table(&table, "debt", &path).unwrap();
    let (width, height) = assert_png(&path);
    assert!(width > 0 && height > 0);
}

#[test]
fn test_render_empty_table_png() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("widget_partner.png");
    let table = df! {
        "WidgetName" => Vec::<String>::new(),
        "Partner" => Vec::<String>::new(),
        "leads" => Vec::<u32>::new(),
    }
    .unwrap();

    PngRenderer::new()
        .render_table(&table, "widget_partner", &path)
        .unwrap();
    assert_png(&path);
}

#[test]
fn test_render_every_chart_kind() {
    let dir = TempDir::new().unwrap();
    let points = vec![Point::new("2023-01", 0.4), Point::new("2023-02", 0.55)];
    let kinds = vec![
        ChartKind::Line(points.clone()),
        ChartKind::HorizontalBar(points.clone()),
        ChartKind::VerticalBar(points),
        ChartKind::Heatmap(Grid {
            rows: vec!["Low".into(), "High".into()],
            columns: vec!["Low".into(), "High".into()],
            cells: vec![vec![Some(0.1), None], vec![Some(0.3), Some(0.9)]],
            annotate: true,
            palette: Palette::Blues,
        }),
    ];

    for (i, kind) in kinds.into_iter().enumerate() {
        let chart = ChartSpec {
            id: format!("chart_{}", i),
            title: "Good Lead Rate".to_string(),
            x_label: "Month".to_string(),
            y_label: "Rate".to_string(),
            kind,
        };
        let path = dir.path().join(format!("{}.png", chart.id));
        PngRenderer::new().render_chart(&chart, &path).unwrap();
        assert_png(&path);
    }
}

#[test]
fn test_render_empty_chart_data() {
    let dir = TempDir::new().unwrap();
    let chart = ChartSpec {
        id: "partner_quality".to_string(),
        title: "Partner Quality".to_string(),
        x_label: "Good Rate".to_string(),
        y_label: "Partner".to_string(),
        kind: ChartKind::HorizontalBar(Vec::new()),
    };
    let path = dir.path().join("partner_quality.png");
    PngRenderer::new().render_chart(&chart, &path).unwrap();
    assert_png(&path);
}

#[test]
fn test_build_and_render_all_report_charts() {
    let (leads, _) = clean_leads(
        &common::funnel_frame(),
        &LeadClassifier::default(),
        &BucketThresholds::default(),
    )
    .unwrap();
    let segments = run_segments(&leads, &AggregationThresholds::default()).unwrap();
    let forest = ForestConfig {
        n_trees: 10,
        ..Default::default()
    };
    let ranking = rank_features(&leads, &forest).unwrap();

    let charts = build_charts(&segments, &ranking).unwrap();
    let ids: Vec<&str> = charts.iter().map(|c| c.id.as_str()).collect();
    assert_eq!(ids, CHART_IDS.to_vec());

    let dir = TempDir::new().unwrap();
    let renderer = PngRenderer::new();
    for chart in &charts {
        let path = dir.path().join(format!("{}.png", chart.id));
        renderer.render_chart(chart, &path).unwrap();
        assert_png(&path);
    }
}
