//! Contactability score coercion and bucketing
//!
//! Phone and address scores arrive as free-form spreadsheet cells. They are
//! coerced to numbers (falling back to 0) and mapped onto an ordinal
//! Low/Medium/High tier using upper-inclusive intervals.

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Lower fence of the Low bucket (exclusive). Scores coerced to 0 land in Low.
pub const DEFAULT_LOWER_FENCE: f64 = -1.0;
/// Upper bound (inclusive) of the Low bucket
pub const DEFAULT_LOW_MAX: f64 = 2.0;
/// Upper bound (inclusive) of the Medium bucket
pub const DEFAULT_MEDIUM_MAX: f64 = 3.0;
/// Upper bound (inclusive) of the High bucket
pub const DEFAULT_HIGH_MAX: f64 = 5.0;

/// Ordinal contactability tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ScoreBucket {
    Low,
    Medium,
    High,
}

impl ScoreBucket {
    /// All buckets in ordinal order
    pub const ALL: [ScoreBucket; 3] = [ScoreBucket::Low, ScoreBucket::Medium, ScoreBucket::High];

    pub fn as_str(&self) -> &'static str {
        match self {
            ScoreBucket::Low => "Low",
            ScoreBucket::Medium => "Medium",
            ScoreBucket::High => "High",
        }
    }

    /// Ordinal position (Low = 0)
    pub fn rank(&self) -> u8 {
        match self {
            ScoreBucket::Low => 0,
            ScoreBucket::Medium => 1,
            ScoreBucket::High => 2,
        }
    }
}

impl std::fmt::Display for ScoreBucket {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for ScoreBucket {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Low" => Ok(ScoreBucket::Low),
            "Medium" => Ok(ScoreBucket::Medium),
            "High" => Ok(ScoreBucket::High),
            _ => Err(format!("Unknown score bucket: '{}'", s)),
        }
    }
}

/// Interval edges used to bucket a score.
///
/// Buckets are `(lower_fence, low_max]`, `(low_max, medium_max]` and
/// `(medium_max, high_max]`. Anything outside `(lower_fence, high_max]` has no
/// bucket.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BucketThresholds {
    pub lower_fence: f64,
    pub low_max: f64,
    pub medium_max: f64,
    pub high_max: f64,
}

impl Default for BucketThresholds {
    fn default() -> Self {
        Self {
            lower_fence: DEFAULT_LOWER_FENCE,
            low_max: DEFAULT_LOW_MAX,
            medium_max: DEFAULT_MEDIUM_MAX,
            high_max: DEFAULT_HIGH_MAX,
        }
    }
}

impl BucketThresholds {
    /// Edges must be strictly increasing
    pub fn validate(&self) -> Result<(), ConfigError> {
        let edges = [self.lower_fence, self.low_max, self.medium_max, self.high_max];
        let ordered = edges.windows(2).all(|w| w[0] < w[1]);
        if !ordered || edges.iter().any(|e| e.is_nan()) {
            return Err(ConfigError::UnorderedBuckets(edges));
        }
        Ok(())
    }

    /// Map a coerced score onto its bucket
    pub fn bucket(&self, score: f64) -> Option<ScoreBucket> {
        if score > self.lower_fence && score <= self.low_max {
            Some(ScoreBucket::Low)
        } else if score > self.low_max && score <= self.medium_max {
            Some(ScoreBucket::Medium)
        } else if score > self.medium_max && score <= self.high_max {
            Some(ScoreBucket::High)
        } else {
            None
        }
    }
}

/// Coerce a raw score cell to a number.
///
/// Absent, empty, non-numeric and NaN values become 0. Returns the value and
/// whether a substitution happened.
pub fn coerce_score(raw: Option<&str>) -> (f64, bool) {
    match raw.map(str::trim).and_then(|s| s.parse::<f64>().ok()) {
        Some(v) if !v.is_nan() => (v, false),
        _ => (0.0, true),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_bucket_edges_are_upper_inclusive() {
        let t = BucketThresholds::default();
        assert_eq!(t.bucket(2.0), Some(ScoreBucket::Low));
        assert_eq!(t.bucket(2.0001), Some(ScoreBucket::Medium));
        assert_eq!(t.bucket(3.0), Some(ScoreBucket::Medium));
        assert_eq!(t.bucket(3.5), Some(ScoreBucket::High));
        assert_eq!(t.bucket(5.0), Some(ScoreBucket::High));
    }

    #[test]
    fn test_scores_outside_fences_have_no_bucket() {
        let t = BucketThresholds::default();
        assert_eq!(t.bucket(-1.0), None);
        assert_eq!(t.bucket(-3.0), None);
        assert_eq!(t.bucket(5.01), None);
        assert_eq!(t.bucket(f64::INFINITY), None);
    }

    #[test]
    fn test_zero_and_negative_fraction_are_low() {
        let t = BucketThresholds::default();
        assert_eq!(t.bucket(0.0), Some(ScoreBucket::Low));
        assert_eq!(t.bucket(-0.5), Some(ScoreBucket::Low));
    }

    #[test]
    fn test_bucket_is_null_iff_outside_fence() {
        let t = BucketThresholds::default();
        let mut s = -2.0;
        while s <= 6.0 {
            let outside = s <= -1.0 || s > 5.0;
            assert_eq!(t.bucket(s).is_none(), outside, "score {}", s);
            s += 0.25;
        }
    }

    #[test]
    fn test_coerce_score() {
        assert_eq!(coerce_score(Some("4")), (4.0, false));
        assert_eq!(coerce_score(Some(" 2.5 ")), (2.5, false));
        assert_eq!(coerce_score(Some("N/A")), (0.0, true));
        assert_eq!(coerce_score(Some("")), (0.0, true));
        assert_eq!(coerce_score(Some("NaN")), (0.0, true));
        assert_eq!(coerce_score(None), (0.0, true));
    }

    #[test]
    fn test_custom_thresholds() {
        let t = BucketThresholds {
            lower_fence: 0.0,
            low_max: 10.0,
            medium_max: 20.0,
            high_max: 30.0,
        };
        assert!(t.validate().is_ok());
        assert_eq!(t.bucket(0.0), None);
        assert_eq!(t.bucket(10.0), Some(ScoreBucket::Low));
        assert_eq!(t.bucket(25.0), Some(ScoreBucket::High));
    }

    #[test]
    fn test_unordered_thresholds_rejected() {
        let t = BucketThresholds {
            lower_fence: -1.0,
            low_max: 3.0,
            medium_max: 2.0,
            high_max: 5.0,
        };
        assert!(t.validate().is_err());
    }

    #[test]
    fn test_bucket_parse_and_rank() {
        assert_eq!("Medium".parse::<ScoreBucket>().unwrap(), ScoreBucket::Medium);
        assert!("medium".parse::<ScoreBucket>().is_err());
        assert!(ScoreBucket::Low.rank() < ScoreBucket::High.rank());
    }
}
