//! Pipeline module - load, clean, aggregate and rank lead data

pub mod aggregate;
pub mod buckets;
pub mod classify;
pub mod clean;
pub mod config;
pub mod encoding;
pub mod error;
pub mod forest;
pub mod importance;
pub mod loader;

pub use aggregate::{run_segments, AggregationThresholds, Segment, SegmentTable, Segments};
pub use buckets::{BucketThresholds, ScoreBucket};
pub use classify::{LeadClassifier, LeadFlags, StatusSets};
pub use clean::{clean_leads, CleaningStats};
pub use config::{load_config, AnalysisConfig};
pub use encoding::{encode_features, CategoryEncoding, DesignMatrix};
pub use error::{ConfigError, InputError, RankingError};
pub use forest::{ForestConfig, RandomForest};
pub use importance::{rank_features, FeatureImportance, FeatureRanking};
pub use loader::{dataset_stats, load_dataset};
