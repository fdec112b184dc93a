//! Analysis configuration
//!
//! Every knob has a default matching the standard lead report. A JSON file
//! may override any subset of fields; command-line flags are applied on top
//! by the caller before validation.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::aggregate::AggregationThresholds;
use super::buckets::BucketThresholds;
use super::classify::StatusSets;
use super::error::ConfigError;
use super::forest::ForestConfig;

/// Complete configuration of one analysis run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    pub statuses: StatusSets,
    pub buckets: BucketThresholds,
    pub aggregation: AggregationThresholds,
    pub forest: ForestConfig,
}

impl AnalysisConfig {
    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.statuses.validate()?;
        self.buckets.validate()?;
        if self.forest.n_trees == 0 {
            return Err(ConfigError::NoTrees);
        }
        Ok(())
    }
}

/// Load a configuration file, or the defaults when no path is given.
///
/// The result is not validated; call [`AnalysisConfig::validate`] once all
/// overrides have been applied.
pub fn load_config(path: Option<&Path>) -> Result<AnalysisConfig, ConfigError> {
    let Some(path) = path else {
        return Ok(AnalysisConfig::default());
    };

    let unreadable = |message: String| ConfigError::Unreadable {
        path: path.to_path_buf(),
        message,
    };

    let text = fs::read_to_string(path).map_err(|e| unreadable(e.to_string()))?;
    let config: AnalysisConfig =
        serde_json::from_str(&text).map_err(|e| unreadable(e.to_string()))?;

    tracing::debug!(path = %path.display(), "loaded configuration file");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = load_config(None).unwrap();
        assert_eq!(config, AnalysisConfig::default());
        assert!(config.validate().is_ok());
        assert_eq!(config.forest.n_trees, 250);
        assert_eq!(config.aggregation.partner_min_leads, 10);
    }

    #[test]
    fn test_partial_override_keeps_other_defaults() {
        let file = write_config(r#"{ "forest": { "n_trees": 12 }, "aggregation": { "partner_min_leads": 3 } }"#);
        let config = load_config(Some(file.path())).unwrap();
        assert_eq!(config.forest.n_trees, 12);
        assert_eq!(config.forest.seed, 42);
        assert_eq!(config.aggregation.partner_min_leads, 3);
        assert_eq!(config.aggregation.widget_partner_min_leads, 8);
        assert_eq!(config.statuses, StatusSets::default());
    }

    #[test]
    fn test_closed_status_outside_good_set_is_rejected() {
        let file = write_config(r#"{ "statuses": { "good": ["EP Sent"] } }"#);
        let config = load_config(Some(file.path())).unwrap();
        assert!(matches!(config.validate(), Err(ConfigError::ClosedNotGood(_))));
    }

    #[test]
    fn test_zero_trees_is_rejected() {
        let mut config = AnalysisConfig::default();
        config.forest.n_trees = 0;
        assert!(matches!(config.validate(), Err(ConfigError::NoTrees)));
    }

    #[test]
    fn test_malformed_json_is_unreadable() {
        let file = write_config("{ not json");
        let err = load_config(Some(file.path())).unwrap_err();
        assert!(matches!(err, ConfigError::Unreadable { .. }));
    }

    #[test]
    fn test_missing_file_is_unreadable() {
        let err = load_config(Some(Path::new("/nonexistent/leadscope.json"))).unwrap_err();
        assert!(err.to_string().contains("leadscope.json"));
    }
}
