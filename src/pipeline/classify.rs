//! Lead outcome classification from call status
//!
//! Each lead gets three independent flags derived from its `CallStatus`.
//! The status sets are plain configuration: swap them per deployment through
//! the JSON config rather than editing this module.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::error::ConfigError;

/// Statuses that count as a good lead
pub const DEFAULT_GOOD_STATUSES: [&str; 4] = ["Closed", "EP Sent", "EP Received", "EP Confirmed"];

/// Statuses that count as a bad lead
pub const DEFAULT_BAD_STATUSES: [&str; 3] = [
    "Unable to contact - Bad Contact Information",
    "Contacted - Invalid Profile",
    "Contacted - Doesn't Qualify",
];

/// Status of a closed lead
pub const DEFAULT_CLOSED_STATUS: &str = "Closed";

/// Outcome flags for a single lead
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeadFlags {
    pub good: bool,
    pub bad: bool,
    pub closed: bool,
}

/// Status sets used to classify leads
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusSets {
    pub good: Vec<String>,
    pub bad: Vec<String>,
    pub closed: String,
}

impl Default for StatusSets {
    fn default() -> Self {
        Self {
            good: DEFAULT_GOOD_STATUSES.iter().map(|s| s.to_string()).collect(),
            bad: DEFAULT_BAD_STATUSES.iter().map(|s| s.to_string()).collect(),
            closed: DEFAULT_CLOSED_STATUS.to_string(),
        }
    }
}

impl StatusSets {
    /// Reject sets that would break `closed => good`
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.good.is_empty() || self.bad.is_empty() {
            return Err(ConfigError::EmptyStatusSet);
        }
        if !self.good.iter().any(|s| s == &self.closed) {
            return Err(ConfigError::ClosedNotGood(self.closed.clone()));
        }
        Ok(())
    }
}

/// Classifies call statuses against a fixed set of outcomes
#[derive(Debug, Clone)]
pub struct LeadClassifier {
    good: HashSet<String>,
    bad: HashSet<String>,
    closed: String,
}

impl LeadClassifier {
    pub fn new(sets: &StatusSets) -> Self {
        Self {
            good: sets.good.iter().cloned().collect(),
            bad: sets.bad.iter().cloned().collect(),
            closed: sets.closed.clone(),
        }
    }

    /// Classify one status. Unknown and missing statuses yield all-false.
    pub fn classify(&self, status: Option<&str>) -> LeadFlags {
        match status {
            Some(s) => LeadFlags {
                good: self.good.contains(s),
                bad: self.bad.contains(s),
                closed: s == self.closed,
            },
            None => LeadFlags::default(),
        }
    }
}

impl Default for LeadClassifier {
    fn default() -> Self {
        Self::new(&StatusSets::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_good_statuses() {
        let c = LeadClassifier::default();
        for status in DEFAULT_GOOD_STATUSES {
            let flags = c.classify(Some(status));
            assert!(flags.good, "{} should be good", status);
            assert!(!flags.bad);
        }
    }

    #[test]
    fn test_closed_implies_good() {
        let c = LeadClassifier::default();
        let flags = c.classify(Some("Closed"));
        assert_eq!(
            flags,
            LeadFlags {
                good: true,
                bad: false,
                closed: true
            }
        );
    }

    #[test]
    fn test_bad_statuses() {
        let c = LeadClassifier::default();
        for status in DEFAULT_BAD_STATUSES {
            let flags = c.classify(Some(status));
            assert!(flags.bad, "{} should be bad", status);
            assert!(!flags.good);
            assert!(!flags.closed);
        }
    }

    #[test]
    fn test_unknown_and_missing_status() {
        let c = LeadClassifier::default();
        assert_eq!(c.classify(Some("Voicemail")), LeadFlags::default());
        assert_eq!(c.classify(Some("closed")), LeadFlags::default());
        assert_eq!(c.classify(Some(" Closed")), LeadFlags::default());
        assert_eq!(c.classify(None), LeadFlags::default());
    }

    #[test]
    fn test_default_sets_are_disjoint() {
        let sets = StatusSets::default();
        assert!(sets.good.iter().all(|g| !sets.bad.contains(g)));
    }

    #[test]
    fn test_overlapping_sets_flag_independently() {
        // Good and bad are not exclusive by contract
        let sets = StatusSets {
            good: vec!["Closed".into(), "Callback".into()],
            bad: vec!["Callback".into()],
            closed: "Closed".into(),
        };
        let flags = LeadClassifier::new(&sets).classify(Some("Callback"));
        assert!(flags.good && flags.bad);
    }

    #[test]
    fn test_validate_closed_must_be_good() {
        let sets = StatusSets {
            closed: "Won".into(),
            ..Default::default()
        };
        let err = sets.validate().unwrap_err();
        assert!(err.to_string().contains("Won"));
        assert!(StatusSets::default().validate().is_ok());
    }
}
