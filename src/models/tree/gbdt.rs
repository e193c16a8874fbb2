//! Gradient-boosted regression trees on squared error.
//!
//! A small native learner: each boosting round fits a depth-limited
//! regression tree to the current residuals by exact greedy
//! variance-reduction splits. Training is fully deterministic unless row
//! subsampling is enabled, in which case rows are drawn from a seeded RNG.

use std::cmp::Ordering;

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Boosting hyperparameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    /// Number of boosting rounds.
    pub n_trees: usize,
    /// Maximum tree depth.
    pub max_depth: usize,
    /// Shrinkage applied to each tree's contribution.
    pub learning_rate: f64,
    /// Fraction of rows drawn per round; 1.0 disables subsampling.
    pub subsample: f64,
    /// Minimum rows per leaf.
    pub min_leaf: usize,
}

impl Default for TreeParams {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 6,
            learning_rate: 0.1,
            subsample: 1.0,
            min_leaf: 1,
        }
    }
}

#[derive(Debug, Clone)]
enum Node {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Debug, Clone)]
struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    fn fit(
        rows: &[Vec<f64>],
        target: &[f64],
        indices: Vec<usize>,
        max_depth: usize,
        min_leaf: usize,
    ) -> Self {
        let mut nodes = Vec::new();
        grow(&mut nodes, rows, target, indices, 0, max_depth, min_leaf);
        Self { nodes }
    }

    fn predict(&self, row: &[f64]) -> f64 {
        let mut at = 0;
        loop {
            match &self.nodes[at] {
                Node::Leaf { value } => return *value,
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    at = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

/// Grow a subtree over `indices`, returning its node id.
fn grow(
    nodes: &mut Vec<Node>,
    rows: &[Vec<f64>],
    target: &[f64],
    indices: Vec<usize>,
    depth: usize,
    max_depth: usize,
    min_leaf: usize,
) -> usize {
    let n = indices.len();
    let sum: f64 = indices.iter().map(|&i| target[i]).sum();
    let mean = sum / n as f64;

    if depth >= max_depth || n < 2 * min_leaf {
        nodes.push(Node::Leaf { value: mean });
        return nodes.len() - 1;
    }

    let Some((feature, threshold)) = best_split(rows, target, &indices, min_leaf) else {
        nodes.push(Node::Leaf { value: mean });
        return nodes.len() - 1;
    };

    let (left_idx, right_idx): (Vec<usize>, Vec<usize>) = indices
        .into_iter()
        .partition(|&i| rows[i][feature] <= threshold);

    let id = nodes.len();
    nodes.push(Node::Split {
        feature,
        threshold,
        left: 0,
        right: 0,
    });
    let left = grow(nodes, rows, target, left_idx, depth + 1, max_depth, min_leaf);
    let right = grow(nodes, rows, target, right_idx, depth + 1, max_depth, min_leaf);
    if let Node::Split {
        left: l, right: r, ..
    } = &mut nodes[id]
    {
        *l = left;
        *r = right;
    }
    id
}

/// Exact greedy search for the split with the largest variance reduction.
///
/// Features are scanned in declaration order and a strictly-greater gain
/// is required to displace the incumbent, so the result is deterministic.
fn best_split(
    rows: &[Vec<f64>],
    target: &[f64],
    indices: &[usize],
    min_leaf: usize,
) -> Option<(usize, f64)> {
    let n = indices.len();
    let total: f64 = indices.iter().map(|&i| target[i]).sum();
    let parent_score = total * total / n as f64;
    let num_features = rows[indices[0]].len();

    let mut best_gain = 1e-12;
    let mut best: Option<(usize, f64)> = None;

    let mut sorted: Vec<(f64, f64)> = Vec::with_capacity(n);
    for feature in 0..num_features {
        sorted.clear();
        sorted.extend(indices.iter().map(|&i| (rows[i][feature], target[i])));
        sorted.sort_unstable_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(Ordering::Equal));

        let mut left_sum = 0.0;
        for k in 1..n {
            left_sum += sorted[k - 1].1;
            if k < min_leaf || n - k < min_leaf {
                continue;
            }
            // Only between distinct feature values.
            if sorted[k - 1].0 >= sorted[k].0 {
                continue;
            }
            let right_sum = total - left_sum;
            let score = left_sum * left_sum / k as f64
                + right_sum * right_sum / (n - k) as f64;
            let gain = score - parent_score;
            if gain > best_gain {
                best_gain = gain;
                best = Some((feature, (sorted[k - 1].0 + sorted[k].0) / 2.0));
            }
        }
    }

    best
}

/// A fitted gradient-boosted tree ensemble.
#[derive(Debug, Clone)]
pub(super) struct GradientBoostedTrees {
    base: f64,
    learning_rate: f64,
    trees: Vec<Tree>,
}

impl GradientBoostedTrees {
    /// Fit to feature rows and targets.
    pub(super) fn fit(params: &TreeParams, rows: &[Vec<f64>], target: &[f64], seed: u64) -> Self {
        let n = target.len();
        let base = target.iter().sum::<f64>() / n as f64;
        let mut predictions = vec![base; n];
        let mut rng = StdRng::seed_from_u64(seed);
        let mut trees = Vec::with_capacity(params.n_trees);

        for _ in 0..params.n_trees {
            let residuals: Vec<f64> = target
                .iter()
                .zip(predictions.iter())
                .map(|(y, p)| y - p)
                .collect();

            let indices: Vec<usize> = if params.subsample < 1.0 {
                let k = ((n as f64 * params.subsample).round() as usize)
                    .clamp(1.min(n), n);
                let mut drawn = rand::seq::index::sample(&mut rng, n, k).into_vec();
                drawn.sort_unstable();
                drawn
            } else {
                (0..n).collect()
            };

            let tree = Tree::fit(rows, &residuals, indices, params.max_depth, params.min_leaf);
            for (i, prediction) in predictions.iter_mut().enumerate() {
                *prediction += params.learning_rate * tree.predict(&rows[i]);
            }
            trees.push(tree);
        }

        Self {
            base,
            learning_rate: params.learning_rate,
            trees,
        }
    }

    /// Predict a single feature row.
    pub(super) fn predict(&self, row: &[f64]) -> f64 {
        self.base
            + self.learning_rate
                * self
                    .trees
                    .iter()
                    .map(|tree| tree.predict(row))
                    .sum::<f64>()
    }
}
