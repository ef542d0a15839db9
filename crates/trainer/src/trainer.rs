//! Gradient Boosted Decision Tree (GBDT) trainer
//!
//! Squared-error boosting with fixed-point arithmetic and exact-greedy CART
//! splits. In-training predictions are updated with the same integer formula
//! `Model::score` uses, so a fitted model reproduces its training outputs
//! exactly.

use carprice_gbdt::{Model, Tree};

use crate::cart::{CartBuilder, TreeConfig, HESSIAN_UNIT};
use crate::dataset::Dataset;
use crate::errors::TrainerError;

/// GBDT training configuration
///
/// Defaults mirror the usual library defaults for a gradient boosting
/// regressor: 100 trees, learning rate 0.1, depth 3, one sample per leaf.
#[derive(Clone, Debug, PartialEq)]
pub struct GbdtConfig {
    pub num_trees: usize,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    pub learning_rate: i64, // Fixed-point, e.g., 100_000 = 0.1
}

impl Default for GbdtConfig {
    fn default() -> Self {
        Self {
            num_trees: 100,
            max_depth: 3,
            min_samples_leaf: 1,
            learning_rate: 100_000,
        }
    }
}

/// GBDT trainer
pub struct GbdtTrainer {
    config: GbdtConfig,
}

impl GbdtTrainer {
    pub fn new(config: GbdtConfig) -> Self {
        Self { config }
    }

    /// Fit an ensemble on the given dataset
    pub fn train(&self, dataset: &Dataset) -> Result<Model, TrainerError> {
        if dataset.is_empty() {
            return Err(TrainerError::InsufficientSamples {
                samples: 0,
                reason: "no training rows".to_string(),
            });
        }
        if self.config.learning_rate <= 0 || self.config.min_samples_leaf == 0 {
            return Err(TrainerError::Training(format!(
                "invalid configuration: {:?}",
                self.config
            )));
        }

        let bias = Self::calculate_bias(&dataset.targets);
        let mut predictions = vec![bias; dataset.len()];
        let hessians = vec![HESSIAN_UNIT; dataset.len()];

        let tree_config = TreeConfig {
            max_depth: self.config.max_depth,
            min_samples_leaf: self.config.min_samples_leaf,
            weight: self.config.learning_rate,
        };

        let mut trees: Vec<Tree> = Vec::with_capacity(self.config.num_trees);

        for tree_idx in 0..self.config.num_trees {
            tracing::trace!("Training tree {}/{}", tree_idx + 1, self.config.num_trees);

            let gradients = Self::calculate_gradients(&dataset.targets, &predictions);

            let tree = CartBuilder::new(
                &dataset.features,
                &gradients,
                &hessians,
                tree_config.clone(),
            )
            .build();

            for (pred, row) in predictions.iter_mut().zip(&dataset.features) {
                *pred = pred.saturating_add(Model::tree_contribution(&tree, row));
            }

            trees.push(tree);
        }

        let model = Model::new(trees, bias, dataset.feature_count, dataset.target_scale);
        model
            .validate()
            .map_err(|err| TrainerError::Training(err.to_string()))?;

        tracing::debug!(
            samples = dataset.len(),
            features = dataset.feature_count,
            trees = model.num_trees(),
            leaves = model.trees.iter().map(Tree::leaf_count).sum::<usize>(),
            bias,
            "fitted gbdt ensemble"
        );

        Ok(model)
    }

    /// Initial prediction: mean of the targets
    fn calculate_bias(targets: &[i64]) -> i64 {
        if targets.is_empty() {
            return 0;
        }

        let sum: i128 = targets.iter().map(|&t| t as i128).sum();
        (sum / targets.len() as i128) as i64
    }

    /// Squared-error gradient: prediction - target
    fn calculate_gradients(targets: &[i64], predictions: &[i64]) -> Vec<i64> {
        targets
            .iter()
            .zip(predictions)
            .map(|(&target, &pred)| pred.saturating_sub(target))
            .collect()
    }
}
