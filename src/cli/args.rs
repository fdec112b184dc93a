//! Command-line argument definitions using clap

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use crate::pipeline::{load_config, AnalysisConfig};

/// Default lead export analysed when no input is given
pub const DEFAULT_INPUT: &str = "data/leads_raw.xls";

/// Default root of the output tree
pub const DEFAULT_OUTPUT_DIR: &str = "outputs";

const LOG_LEVELS: [&str; 6] = ["off", "error", "warn", "info", "debug", "trace"];

/// Leadscope - Lead quality analysis: segment rates, contactability and good-lead drivers
#[derive(Parser, Debug)]
#[command(name = "leadscope")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Input lead file (xls, xlsx, xlsm, xlsb, ods, csv or parquet)
    #[arg(short, long, default_value = DEFAULT_INPUT)]
    pub input: PathBuf,

    /// Output directory; tables/, charts/ and derived_data/ are created inside it
    #[arg(short, long, default_value = DEFAULT_OUTPUT_DIR)]
    pub output_dir: PathBuf,

    /// JSON configuration file overriding status sets, bucket edges,
    /// aggregation thresholds and forest parameters.
    /// Command-line flags below take precedence over the file.
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Number of trees in the random forest (default: 250)
    #[arg(long, value_parser = validate_n_trees)]
    pub n_trees: Option<usize>,

    /// Seed for bootstrap sampling and feature selection (default: 42)
    #[arg(long)]
    pub seed: Option<u64>,

    /// Partners need strictly more leads than this to appear in the partner table (default: 10)
    #[arg(long)]
    pub partner_min_leads: Option<u32>,

    /// Widget/partner pairs need strictly more leads than this to appear (default: 8)
    #[arg(long)]
    pub widget_partner_min_leads: Option<u32>,

    /// Write CSV tables and the run report only, without PNG images
    #[arg(long, default_value = "false")]
    pub skip_render: bool,

    /// Diagnostic log level written to stderr.
    /// Options: off, error, warn, info, debug, trace
    #[arg(long, default_value = "warn", value_parser = validate_log_level)]
    pub log_level: String,
}

impl Cli {
    /// Apply flags that were given on the command line
    pub fn apply_overrides(&self, config: &mut AnalysisConfig) {
        if let Some(n_trees) = self.n_trees {
            config.forest.n_trees = n_trees;
        }
        if let Some(seed) = self.seed {
            config.forest.seed = seed;
        }
        if let Some(min) = self.partner_min_leads {
            config.aggregation.partner_min_leads = min;
        }
        if let Some(min) = self.widget_partner_min_leads {
            config.aggregation.widget_partner_min_leads = min;
        }
    }

    /// Defaults, then the config file, then flags; validated
    pub fn resolve_config(&self) -> Result<AnalysisConfig> {
        let mut config = load_config(self.config.as_deref())?;
        self.apply_overrides(&mut config);
        config.validate()?;
        Ok(config)
    }
}

/// Validator for n_trees parameter
fn validate_n_trees(s: &str) -> Result<usize, String> {
    let value: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if value == 0 {
        Err("n_trees must be at least 1".to_string())
    } else {
        Ok(value)
    }
}

/// Validator for log_level parameter
fn validate_log_level(s: &str) -> Result<String, String> {
    let level = s.to_lowercase();
    if LOG_LEVELS.contains(&level.as_str()) {
        Ok(level)
    } else {
        Err(format!(
            "'{}' is not a log level. Options: {}",
            s,
            LOG_LEVELS.join(", ")
        ))
    }
}
