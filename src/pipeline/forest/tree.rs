//! CART classification tree with Gini impurity splits
//!
//! Trees are grown to purity on a bootstrap sample, evaluating a random subset
//! of features at every node. Each split records its impurity decrease so the
//! tree can report mean-decrease-impurity importances.

use rand::rngs::StdRng;
use rand::Rng;

/// Gini impurity of a binary node: 2 * p * (1 - p)
pub(crate) fn gini_impurity(positives: f64, negatives: f64) -> f64 {
    let total = positives + negatives;
    if total == 0.0 {
        return 0.0;
    }
    let p = positives / total;
    2.0 * p * (1.0 - p)
}

/// Candidate split of one node on one feature
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) struct Split {
    pub threshold: f64,
    /// Parent impurity minus the weighted impurity of the children
    pub gain: f64,
}

/// Find the threshold on a single feature that maximizes the Gini decrease.
///
/// `pairs` holds (value, label) for every sample in the node and is sorted in
/// place. Thresholds sit halfway between consecutive distinct values; samples
/// with `value <= threshold` go left. Returns None when every value is equal
/// or no split leaves `min_leaf` samples on both sides.
pub(crate) fn find_best_split(pairs: &mut [(f64, u8)], min_leaf: usize) -> Option<Split> {
    let n = pairs.len();
    if n < 2 * min_leaf.max(1) {
        return None;
    }

    pairs.sort_unstable_by(|a, b| a.0.total_cmp(&b.0));

    let total_pos = pairs.iter().filter(|(_, y)| *y == 1).count() as f64;
    let total_neg = n as f64 - total_pos;
    let parent_gini = gini_impurity(total_pos, total_neg);

    let mut best: Option<Split> = None;
    let mut left_pos = 0.0f64;
    let mut left_neg = 0.0f64;

    for i in 0..n - 1 {
        if pairs[i].1 == 1 {
            left_pos += 1.0;
        } else {
            left_neg += 1.0;
        }

        let left_count = i + 1;
        let right_count = n - left_count;
        if left_count < min_leaf || right_count < min_leaf {
            continue;
        }

        // No threshold separates equal values
        let (current, next) = (pairs[i].0, pairs[i + 1].0);
        if current >= next {
            continue;
        }

        let right_pos = total_pos - left_pos;
        let right_neg = total_neg - left_neg;

        let left_prop = left_count as f64 / n as f64;
        let right_prop = right_count as f64 / n as f64;
        let weighted_child_gini =
            left_prop * gini_impurity(left_pos, left_neg) + right_prop * gini_impurity(right_pos, right_neg);
        let gain = parent_gini - weighted_child_gini;

        if best.map_or(true, |b| gain > b.gain) {
            let mut threshold = current + (next - current) / 2.0;
            if threshold >= next || !threshold.is_finite() {
                threshold = current;
            }
            best = Some(Split { threshold, gain });
        }
    }

    best
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        // Only read by prediction
        #[cfg_attr(not(test), allow(dead_code))]
        positive_rate: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

/// Growth limits for a single tree
#[derive(Debug, Clone, Copy)]
pub(crate) struct TreeParams {
    pub max_features: usize,
    pub max_depth: Option<usize>,
    pub min_samples_leaf: usize,
}

/// A fitted classification tree
#[derive(Debug, Clone)]
pub struct DecisionTree {
    nodes: Vec<Node>,
    /// Unnormalized impurity decrease per feature (sum of n_node * gain)
    impurity_decrease: Vec<f64>,
}

impl DecisionTree {
    /// Grow a tree on `samples` (row indices, repeats allowed).
    ///
    /// `columns` is feature-major: `columns[f][row]`.
    pub(crate) fn fit(
        columns: &[Vec<f64>],
        labels: &[u8],
        samples: Vec<usize>,
        params: TreeParams,
        rng: &mut StdRng,
    ) -> Self {
        let n_features = columns.len();
        let mut tree = DecisionTree {
            nodes: Vec::new(),
            impurity_decrease: vec![0.0; n_features],
        };

        let mut feature_order: Vec<usize> = (0..n_features).collect();
        let mut pairs: Vec<(f64, u8)> = Vec::with_capacity(samples.len());

        // (node slot, samples, depth)
        tree.nodes.push(Node::Leaf { positive_rate: 0.0 });
        let mut stack = vec![(0usize, samples, 0usize)];

        while let Some((slot, node_samples, depth)) = stack.pop() {
            let n = node_samples.len();
            let positives = node_samples.iter().filter(|&&i| labels[i] == 1).count();
            let positive_rate = if n > 0 { positives as f64 / n as f64 } else { 0.0 };

            let is_pure = positives == 0 || positives == n;
            let depth_reached = params.max_depth.is_some_and(|d| depth >= d);
            if is_pure || depth_reached || n < 2 * params.min_samples_leaf.max(1) {
                tree.nodes[slot] = Node::Leaf { positive_rate };
                continue;
            }

            let best = best_node_split(
                columns,
                labels,
                &node_samples,
                params,
                &mut feature_order,
                &mut pairs,
                rng,
            );

            let Some((feature, split)) = best else {
                tree.nodes[slot] = Node::Leaf { positive_rate };
                continue;
            };

            let (left_samples, right_samples): (Vec<usize>, Vec<usize>) = node_samples
                .iter()
                .partition(|&&i| columns[feature][i] <= split.threshold);

            tree.impurity_decrease[feature] += n as f64 * split.gain;

            let left = tree.nodes.len();
            tree.nodes.push(Node::Leaf { positive_rate: 0.0 });
            let right = tree.nodes.len();
            tree.nodes.push(Node::Leaf { positive_rate: 0.0 });

            tree.nodes[slot] = Node::Split {
                feature,
                threshold: split.threshold,
                left,
                right,
            };

            stack.push((right, right_samples, depth + 1));
            stack.push((left, left_samples, depth + 1));
        }

        tree
    }

    /// Probability that a row (one value per feature) is positive
    #[cfg(test)]
    pub(crate) fn predict_proba(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Leaf { positive_rate } => return *positive_rate,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold { *left } else { *right };
                }
            }
        }
    }

    /// Per-feature importances normalized to sum to 1, or all zeros for a
    /// tree that never split
    pub fn feature_importances(&self) -> Vec<f64> {
        let total: f64 = self.impurity_decrease.iter().sum();
        if total > 0.0 {
            self.impurity_decrease.iter().map(|v| v / total).collect()
        } else {
            vec![0.0; self.impurity_decrease.len()]
        }
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Longest root-to-leaf path, in splits
    #[cfg(test)]
    pub(crate) fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(0usize, 0usize)];
        while let Some((idx, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            if let Node::Split { left, right, .. } = &self.nodes[idx] {
                stack.push((*left, depth + 1));
                stack.push((*right, depth + 1));
            }
        }
        deepest
    }
}

/// Evaluate random features until `max_features` non-constant ones have been
/// seen, returning the best (feature, split) among them.
fn best_node_split(
    columns: &[Vec<f64>],
    labels: &[u8],
    node_samples: &[usize],
    params: TreeParams,
    feature_order: &mut [usize],
    pairs: &mut Vec<(f64, u8)>,
    rng: &mut StdRng,
) -> Option<(usize, Split)> {
    let n_features = feature_order.len();
    let mut best: Option<(usize, Split)> = None;
    let mut visited = 0;

    for i in 0..n_features {
        if visited >= params.max_features && best.is_some() {
            break;
        }

        // Partial Fisher-Yates: draw the next feature without replacement
        let j = rng.gen_range(i..n_features);
        feature_order.swap(i, j);
        let feature = feature_order[i];
        let values = &columns[feature];

        let first = values[node_samples[0]];
        if node_samples.iter().all(|&s| values[s] == first) {
            // Constant features do not count towards max_features
            continue;
        }
        visited += 1;

        pairs.clear();
        pairs.extend(node_samples.iter().map(|&s| (values[s], labels[s])));

        if let Some(split) = find_best_split(pairs, params.min_samples_leaf) {
            if best.map_or(true, |(_, b)| split.gain > b.gain) {
                best = Some((feature, split));
            }
        }
    }

    best
}
