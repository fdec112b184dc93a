//! End-to-end tests: library pipeline and the compiled binary

use assert_cmd::Command;
use leadscope::pipeline::{
    clean_leads, load_dataset, rank_features, run_segments, AnalysisConfig, LeadClassifier,
    Segment,
};
use leadscope::render::{PngRenderer, ReportRenderer};
use leadscope::report::{
    build_charts, write_feature_importance, write_run_report, write_segment_tables, OutputLayout,
    ReportParams, RunSummary, CHART_IDS,
};
use std::path::Path;
use tempfile::TempDir;

#[path = "common/mod.rs"]
mod common;

use common::{create_temp_csv, funnel_frame};

fn assert_output_tree(root: &Path, rendered: bool) {
    let layout = OutputLayout::new(root);
    for segment in Segment::ALL {
        let csv = layout.table_csv(segment.name());
        assert!(csv.is_file(), "missing {}", csv.display());
        assert_eq!(layout.table_image(segment.name()).is_file(), rendered);
    }
    for id in CHART_IDS {
        assert_eq!(layout.chart_image(id).is_file(), rendered, "chart {}", id);
    }
    assert!(layout.feature_importance_csv().is_file());
    assert!(layout.run_report_json().is_file());
}

#[test]
fn test_library_pipeline_writes_every_output() {
    let mut raw = funnel_frame();
    let (_input_dir, input) = create_temp_csv(&mut raw);
    let out_dir = TempDir::new().unwrap();

    let mut config = AnalysisConfig::default();
    config.forest.n_trees = 10;
    config.validate().unwrap();

    let raw = load_dataset(&input).unwrap();
    let mut summary = RunSummary::new(raw.height(), raw.width());
    let (leads, cleaning) = clean_leads(
        &raw,
        &LeadClassifier::new(&config.statuses),
        &config.buckets,
    )
    .unwrap();
    summary.record_cleaning(&cleaning);

    let segments = run_segments(&leads, &config.aggregation).unwrap();
    summary.record_segments(&segments);
    let ranking = rank_features(&leads, &config.forest).unwrap();
    summary.record_ranking(&ranking);

    let layout = OutputLayout::new(out_dir.path());
    layout.create().unwrap();
    let written = write_segment_tables(&segments, &layout).unwrap();
    assert_eq!(written.len(), 7);
    write_feature_importance(&ranking, &layout).unwrap();

    let renderer = PngRenderer::new();
    for table in segments.iter() {
        let name = table.segment.name();
        renderer
            .render_table(&table.table, name, &layout.table_image(name))
            .unwrap();
    }
    for chart in build_charts(&segments, &ranking).unwrap() {
        renderer
            .render_chart(&chart, &layout.chart_image(&chart.id))
            .unwrap();
    }

    let params = ReportParams {
        input_file: &input,
        output_dir: out_dir.path(),
        config: &config,
        cleaning: &cleaning,
        ranking: &ranking,
        summary: &summary,
    };
    write_run_report(&params, &layout.run_report_json()).unwrap();

    assert_output_tree(out_dir.path(), true);

    let report: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(layout.run_report_json()).unwrap()).unwrap();
    assert_eq!(report["rows"]["loaded"], 20);
    assert_eq!(report["ranking"]["n_trees"], 10);
    assert_eq!(report["cleaning"]["coerced_phone_scores"], 5);
    assert_eq!(report["segments"].as_array().unwrap().len(), 7);
}

#[test]
fn test_binary_full_run() {
    let mut raw = funnel_frame();
    let (_input_dir, input) = create_temp_csv(&mut raw);
    let out_dir = TempDir::new().unwrap();

    Command::cargo_bin("leadscope")
        .unwrap()
        .arg("--input")
        .arg(&input)
        .arg("--output-dir")
        .arg(out_dir.path())
        .args(["--n-trees", "10"])
        .assert()
        .success();

    assert_output_tree(out_dir.path(), true);

    let funnel = std::fs::read_to_string(out_dir.path().join("tables/funnel.csv")).unwrap();
    let mut lines = funnel.lines();
    assert_eq!(lines.next(), Some("CallStatus,leads,good_rate,closed_rate"));
    assert_eq!(lines.count(), 4);
}

#[test]
fn test_binary_skip_render_writes_no_images() {
    let mut raw = funnel_frame();
    let (_input_dir, input) = create_temp_csv(&mut raw);
    let out_dir = TempDir::new().unwrap();

    Command::cargo_bin("leadscope")
        .unwrap()
        .arg("--input")
        .arg(&input)
        .arg("--output-dir")
        .arg(out_dir.path())
        .args(["--n-trees", "5", "--skip-render"])
        .assert()
        .success();

    assert_output_tree(out_dir.path(), false);
}

#[test]
fn test_feature_importance_is_reproducible() {
    let mut raw = funnel_frame();
    let (_input_dir, input) = create_temp_csv(&mut raw);

    let run = || {
        let out_dir = TempDir::new().unwrap();
        Command::cargo_bin("leadscope")
            .unwrap()
            .arg("--input")
            .arg(&input)
            .arg("--output-dir")
            .arg(out_dir.path())
            .args(["--n-trees", "15", "--seed", "11", "--skip-render"])
            .assert()
            .success();
        std::fs::read_to_string(out_dir.path().join("derived_data/feature_importance.csv")).unwrap()
    };

    let first = run();
    let second = run();
    assert!(first.starts_with("feature,importance\n"));
    assert_eq!(first, second);
}
