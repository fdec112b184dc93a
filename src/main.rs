//! Leadscope: Lead Quality Analysis CLI Tool
//!
//! Loads a lead export, derives outcome flags and contactability buckets,
//! writes segment tables and charts, and ranks the drivers of a good lead.

use std::time::Instant;

use anyhow::Result;
use clap::Parser;
use console::style;
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;

use leadscope::cli::Cli;
use leadscope::pipeline::{
    clean_leads, dataset_stats, load_dataset, rank_features, run_segments, FeatureRanking,
    LeadClassifier, Segments,
};
use leadscope::render::{PngRenderer, ReportRenderer};
use leadscope::report::{
    build_charts, write_feature_importance, write_run_report, write_segment_tables, OutputLayout,
    ReportParams, RunSummary,
};
use leadscope::utils::{
    clear_on_error, create_spinner, finish_with_success, finish_with_warning, print_banner,
    print_completion, print_config, print_count, print_info, print_step_header, print_step_time,
    print_success,
};

/// Route diagnostics to stderr so they never mix with the step output
fn init_logging(level: &str) {
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Create the output tree and write every CSV; returns the number of files
fn write_tables(
    segments: &Segments,
    ranking: &FeatureRanking,
    layout: &OutputLayout,
) -> Result<usize> {
    layout.create()?;
    let written = write_segment_tables(segments, layout)?;
    write_feature_importance(ranking, layout)?;
    Ok(written.len() + 1)
}

/// Render table images and charts in parallel; returns the number of charts
fn render_images(
    segments: &Segments,
    ranking: &FeatureRanking,
    layout: &OutputLayout,
) -> Result<usize> {
    let renderer = PngRenderer::new();
    let charts = build_charts(segments, ranking)?;

    segments
        .iter()
        .collect::<Vec<_>>()
        .par_iter()
        .map(|t| {
            let name = t.segment.name();
            renderer.render_table(&t.table, name, &layout.table_image(name))
        })
        .collect::<Result<Vec<_>>>()?;

    charts
        .par_iter()
        .map(|c| renderer.render_chart(c, &layout.chart_image(&c.id)))
        .collect::<Result<Vec<_>>>()?;

    Ok(charts.len())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level);

    // Defaults, then --config, then flags
    let config = cli.resolve_config()?;
    let layout = OutputLayout::new(&cli.output_dir);

    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(&cli.input, &cli.output_dir, &config, cli.skip_render);

    // Step 1: Load dataset
    print_step_header(1, "Load Leads");

    let step_start = Instant::now();
    let spinner = create_spinner("Reading input file...");
    let raw = clear_on_error(&spinner, load_dataset(&cli.input))?;
    finish_with_success(&spinner, "Dataset loaded");

    let (rows, cols, memory_mb) = dataset_stats(&raw);
    println!("\n    {} Dataset Statistics:", style("✧").cyan());
    println!("      Rows: {}", rows);
    println!("      Columns: {}", cols);
    println!("      Estimated memory: {:.2} MB", memory_mb);

    let mut summary = RunSummary::new(rows, cols);
    let elapsed = step_start.elapsed();
    summary.record_time("Load", elapsed);
    print_step_time(elapsed);

    // Step 2: Clean and enrich
    print_step_header(2, "Clean & Flag Leads");

    let step_start = Instant::now();
    let classifier = LeadClassifier::new(&config.statuses);
    let (leads, cleaning) = clean_leads(&raw, &classifier, &config.buckets)?;
    drop(raw);
    summary.record_cleaning(&cleaning);

    print_success("Derived Month, outcome flags and contactability buckets");
    if cleaning.unparseable_dates > 0 {
        print_count(
            "lead(s) with an unreadable LeadCreated",
            cleaning.unparseable_dates,
            Some("(Month left empty)"),
        );
    }
    let coerced = cleaning.coerced_phone_scores + cleaning.coerced_address_scores;
    if coerced > 0 {
        print_count("missing or non-numeric score(s)", coerced, Some("(set to 0)"));
    }
    let elapsed = step_start.elapsed();
    summary.record_time("Clean", elapsed);
    print_step_time(elapsed);

    // Step 3: Segment aggregations
    print_step_header(3, "Segment Analysis");

    let step_start = Instant::now();
    let spinner = create_spinner("Aggregating segments...");
    let segments = clear_on_error(&spinner, run_segments(&leads, &config.aggregation))?;
    finish_with_success(&spinner, &format!("{} segment tables computed", segments.len()));
    summary.record_segments(&segments);

    for table in segments.iter() {
        if table.table.height() == 0 {
            print_info(&format!("Segment '{}' is empty after filtering", table.segment));
        }
    }
    let elapsed = step_start.elapsed();
    summary.record_time("Aggregate", elapsed);
    print_step_time(elapsed);

    // Step 4: Feature importance
    print_step_header(4, "Good-Lead Drivers");

    let step_start = Instant::now();
    let spinner = create_spinner(&format!(
        "Fitting random forest ({} trees)...",
        config.forest.n_trees
    ));
    let ranking = clear_on_error(&spinner, rank_features(&leads, &config.forest))?;
    if ranking.rows_excluded > 0 {
        finish_with_warning(
            &spinner,
            &format!(
                "Ranked {} features ({} incomplete row(s) excluded)",
                ranking.features.len(),
                ranking.rows_excluded
            ),
        );
    } else {
        finish_with_success(&spinner, &format!("Ranked {} features", ranking.features.len()));
    }
    summary.record_ranking(&ranking);

    for (i, f) in ranking.top(5).iter().enumerate() {
        println!(
            "      {}. {} {}",
            i + 1,
            f.feature,
            style(format!("{:.3}", f.importance)).dim()
        );
    }
    let elapsed = step_start.elapsed();
    summary.record_time("Rank", elapsed);
    print_step_time(elapsed);

    // Step 5: Write tables
    print_step_header(5, "Save Tables");

    let step_start = Instant::now();
    let spinner = create_spinner("Writing CSV files...");
    let written = clear_on_error(&spinner, write_tables(&segments, &ranking, &layout))?;
    summary.add_files(written);
    finish_with_success(
        &spinner,
        &format!("Saved to {}", layout.tables_dir().display()),
    );
    let elapsed = step_start.elapsed();
    summary.record_time("Write tables", elapsed);
    print_step_time(elapsed);

    // Step 6: Render images
    if cli.skip_render {
        print_step_header(6, "Render Images");
        print_info("Skipped (--skip-render)");
    } else {
        print_step_header(6, "Render Images");

        let step_start = Instant::now();
        let spinner = create_spinner("Rendering tables and charts...");
        let charts = clear_on_error(&spinner, render_images(&segments, &ranking, &layout))?;

        summary.add_files(segments.len() + charts);
        finish_with_success(
            &spinner,
            &format!("Rendered {} tables and {} charts", segments.len(), charts),
        );
        let elapsed = step_start.elapsed();
        summary.record_time("Render", elapsed);
        print_step_time(elapsed);
    }

    // Run report goes last so it carries every timing
    let params = ReportParams {
        input_file: &cli.input,
        output_dir: &cli.output_dir,
        config: &config,
        cleaning: &cleaning,
        ranking: &ranking,
        summary: &summary,
    };
    write_run_report(&params, &layout.run_report_json())?;
    summary.add_files(1);

    summary.display();
    print_completion(layout.root());

    Ok(())
}
