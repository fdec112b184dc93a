//! Report module - tables, charts and run metadata written after analysis

pub mod charts;
pub mod run_report;
pub mod summary;
pub mod writer;

pub use charts::{build_charts, CHART_IDS};
pub use run_report::{write_run_report, ReportParams};
pub use summary::RunSummary;
pub use writer::{write_csv, write_feature_importance, write_segment_tables, OutputLayout};
