//! CART (Classification and Regression Tree) builder
//!
//! Deterministic exact-greedy regression tree construction over integer
//! features, driven by per-sample gradients and hessians.

use carprice_gbdt::{Node, Tree};

use crate::deterministic::SplitTieBreaker;

/// Fixed-point hessian of one sample under squared-error loss
pub const HESSIAN_UNIT: i64 = 1000;

/// Training parameters for a single tree
#[derive(Clone, Debug)]
pub struct TreeConfig {
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub weight: i64,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 3,
            min_samples_leaf: 1,
            weight: carprice_gbdt::SCALE,
        }
    }
}

/// Split candidate with gain and tie-breaker
#[derive(Debug, Clone)]
struct SplitCandidate {
    feature_idx: usize,
    threshold: i64,
    gain: i128,
    tie_breaker: SplitTieBreaker,
}

impl SplitCandidate {
    fn beats(&self, other: &SplitCandidate) -> bool {
        self.gain > other.gain
            || (self.gain == other.gain && self.tie_breaker < other.tie_breaker)
    }
}

/// Gradient/hessian sums over the rows reaching a node
struct NodeTotals {
    gradient: i128,
    hessian: i128,
    score: i128,
    count: usize,
}

/// Build a regression tree using the exact-greedy CART algorithm
pub struct CartBuilder<'a> {
    config: TreeConfig,
    features: &'a [Vec<i64>],
    gradients: &'a [i64],
    hessians: &'a [i64],
    feature_count: usize,
}

impl<'a> CartBuilder<'a> {
    pub fn new(
        features: &'a [Vec<i64>],
        gradients: &'a [i64],
        hessians: &'a [i64],
        config: TreeConfig,
    ) -> Self {
        debug_assert_eq!(features.len(), gradients.len());
        debug_assert_eq!(features.len(), hessians.len());

        let feature_count = features.first().map_or(0, Vec::len);

        Self {
            config,
            features,
            gradients,
            hessians,
            feature_count,
        }
    }

    pub fn build(&self) -> Tree {
        let mut nodes = Vec::new();
        let indices: Vec<usize> = (0..self.features.len()).collect();

        self.build_node(&indices, 0, &mut nodes, 0);

        Tree::new(nodes, self.config.weight)
    }

    fn build_node(
        &self,
        indices: &[usize],
        depth: usize,
        nodes: &mut Vec<Node>,
        node_id: usize,
    ) -> i32 {
        let current_idx = nodes.len() as i32;

        let split = if depth >= self.config.max_depth
            || indices.len() < 2 * self.config.min_samples_leaf
        {
            None
        } else {
            self.find_best_split(indices, node_id)
        };

        let Some(split) = split else {
            nodes.push(Node::leaf(current_idx, self.leaf_value(indices)));
            return current_idx;
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&idx| self.features[idx][split.feature_idx] <= split.threshold);

        // Children are filled in once both subtrees exist
        nodes.push(Node::internal(
            current_idx,
            split.feature_idx as i32,
            split.threshold,
            -1,
            -1,
        ));

        let left = self.build_node(&left_indices, depth + 1, nodes, node_id * 2 + 1);
        let right = self.build_node(&right_indices, depth + 1, nodes, node_id * 2 + 2);

        let node = &mut nodes[current_idx as usize];
        node.left = left;
        node.right = right;

        current_idx
    }

    /// Keep the highest-gain boundary between two distinct values of any
    /// feature. Splits without positive gain are ignored.
    fn find_best_split(&self, indices: &[usize], node_id: usize) -> Option<SplitCandidate> {
        let (gradient, hessian) = self.sum_gradients_hessians(indices);
        let totals = NodeTotals {
            gradient,
            hessian,
            score: Self::score(gradient, hessian),
            count: indices.len(),
        };

        let mut best: Option<SplitCandidate> = None;
        let mut order = indices.to_vec();

        for feature_idx in 0..self.feature_count {
            if self.is_indicator(indices, feature_idx) {
                self.sweep_indicator(indices, feature_idx, node_id, &totals, &mut best);
            } else {
                order.sort_by_key(|&idx| (self.features[idx][feature_idx], idx));
                self.sweep_sorted(&order, feature_idx, node_id, &totals, &mut best);
            }
        }

        best
    }

    /// True when the column only holds 0/1 at this node
    fn is_indicator(&self, indices: &[usize], feature_idx: usize) -> bool {
        indices
            .iter()
            .all(|&idx| matches!(self.features[idx][feature_idx], 0 | 1))
    }

    /// A 0/1 column has a single boundary (threshold 0), found in one pass
    fn sweep_indicator(
        &self,
        indices: &[usize],
        feature_idx: usize,
        node_id: usize,
        totals: &NodeTotals,
        best: &mut Option<SplitCandidate>,
    ) {
        let mut g_left = 0i128;
        let mut h_left = 0i128;
        let mut left_count = 0usize;

        for &idx in indices {
            if self.features[idx][feature_idx] == 0 {
                g_left += self.gradients[idx] as i128;
                h_left += self.hessians[idx] as i128;
                left_count += 1;
            }
        }

        let key = SplitTieBreaker::new(feature_idx, 0, node_id);
        self.consider(key, left_count, g_left, h_left, totals, best);
    }

    /// Prefix sums over rows sorted by the feature value
    fn sweep_sorted(
        &self,
        order: &[usize],
        feature_idx: usize,
        node_id: usize,
        totals: &NodeTotals,
        best: &mut Option<SplitCandidate>,
    ) {
        let mut g_left = 0i128;
        let mut h_left = 0i128;

        for k in 0..order.len().saturating_sub(1) {
            let idx = order[k];
            g_left += self.gradients[idx] as i128;
            h_left += self.hessians[idx] as i128;

            let value = self.features[idx][feature_idx];
            if value == self.features[order[k + 1]][feature_idx] {
                continue;
            }

            let key = SplitTieBreaker::new(feature_idx, value, node_id);
            self.consider(key, k + 1, g_left, h_left, totals, best);
        }
    }

    fn consider(
        &self,
        key: SplitTieBreaker,
        left_count: usize,
        g_left: i128,
        h_left: i128,
        totals: &NodeTotals,
        best: &mut Option<SplitCandidate>,
    ) {
        let min_leaf = self.config.min_samples_leaf.max(1);
        if left_count < min_leaf || totals.count - left_count < min_leaf {
            return;
        }

        let gain = Self::score(g_left, h_left)
            + Self::score(totals.gradient - g_left, totals.hessian - h_left)
            - totals.score;
        if gain <= 0 {
            return;
        }

        let candidate = SplitCandidate {
            feature_idx: key.feature_idx,
            threshold: key.threshold,
            gain,
            tie_breaker: key,
        };
        if best.as_ref().map_or(true, |current| candidate.beats(current)) {
            *best = Some(candidate);
        }
    }

    /// G² / H, zero for an empty side
    fn score(g: i128, h: i128) -> i128 {
        if h > 0 {
            g * g / h
        } else {
            0
        }
    }

    fn sum_gradients_hessians(&self, indices: &[usize]) -> (i128, i128) {
        indices.iter().fold((0i128, 0i128), |(g, h), &idx| {
            (g + self.gradients[idx] as i128, h + self.hessians[idx] as i128)
        })
    }

    /// Optimal leaf value: -G/H, in the gradients' units
    fn leaf_value(&self, indices: &[usize]) -> i64 {
        let (sum_g, sum_h) = self.sum_gradients_hessians(indices);

        if sum_h == 0 {
            return 0;
        }

        let value = -(sum_g * HESSIAN_UNIT as i128) / sum_h;
        value.clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }
}
