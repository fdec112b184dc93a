//! Bagged ensemble of CART classification trees
//!
//! Every tree is grown on a bootstrap sample with its own RNG, seeded from a
//! sequence drawn up front from the master seed. Trees are fitted in parallel
//! but importances are combined in tree order, so a fit is reproducible bit
//! for bit for a given seed.

mod tree;

pub use tree::DecisionTree;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use tree::TreeParams;

/// Number of trees in the ensemble
pub const DEFAULT_N_TREES: usize = 250;

/// Master seed for bootstrap sampling and feature selection
pub const DEFAULT_SEED: u64 = 42;

/// Ensemble hyper-parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ForestConfig {
    pub n_trees: usize,
    pub seed: u64,
    /// Depth limit per tree; `None` grows trees until leaves are pure
    pub max_depth: Option<usize>,
    pub min_samples_leaf: usize,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: DEFAULT_N_TREES,
            seed: DEFAULT_SEED,
            max_depth: None,
            min_samples_leaf: 1,
        }
    }
}

/// A fitted ensemble
#[derive(Debug, Clone)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    n_features: usize,
}

impl RandomForest {
    /// Fit the ensemble on a feature-major matrix and 0/1 labels.
    ///
    /// Each split considers `max(1, floor(sqrt(n_features)))` random features.
    pub fn fit(columns: &[Vec<f64>], labels: &[u8], config: &ForestConfig) -> Self {
        let n_rows = labels.len();
        let n_features = columns.len();
        let params = TreeParams {
            max_features: ((n_features as f64).sqrt() as usize).max(1),
            max_depth: config.max_depth,
            min_samples_leaf: config.min_samples_leaf.max(1),
        };

        let mut master = StdRng::seed_from_u64(config.seed);
        let tree_seeds: Vec<u64> = (0..config.n_trees).map(|_| master.gen()).collect();

        let trees: Vec<DecisionTree> = tree_seeds
            .par_iter()
            .map(|&seed| {
                let mut rng = StdRng::seed_from_u64(seed);
                let bootstrap: Vec<usize> = (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect();
                DecisionTree::fit(columns, labels, bootstrap, params, &mut rng)
            })
            .collect();

        tracing::debug!(
            trees = trees.len(),
            features = n_features,
            rows = n_rows,
            max_features = params.max_features,
            "fitted random forest"
        );

        Self { trees, n_features }
    }

    /// Mean decrease in impurity per feature.
    ///
    /// Per-tree importances are averaged over trees that split at least once
    /// and renormalized to sum to 1. All zeros when no tree could split.
    pub fn feature_importances(&self) -> Vec<f64> {
        let mut sums = vec![0.0; self.n_features];
        let mut used = 0usize;

        for tree in self.trees.iter().filter(|t| t.node_count() > 1) {
            for (acc, v) in sums.iter_mut().zip(tree.feature_importances()) {
                *acc += v;
            }
            used += 1;
        }

        if used == 0 {
            return sums;
        }

        let means: Vec<f64> = sums.iter().map(|s| s / used as f64).collect();
        let total: f64 = means.iter().sum();
        if total > 0.0 {
            means.iter().map(|m| m / total).collect()
        } else {
            means
        }
    }

    /// Average positive-class probability over all trees
    #[cfg(test)]
    pub(crate) fn predict_proba(&self, row: &[f64]) -> f64 {
        if self.trees.is_empty() {
            return 0.0;
        }
        self.trees.iter().map(|t| t.predict_proba(row)).sum::<f64>() / self.trees.len() as f64
    }

    #[cfg(test)]
    pub(crate) fn trees(&self) -> &[DecisionTree] {
        &self.trees
    }
}
