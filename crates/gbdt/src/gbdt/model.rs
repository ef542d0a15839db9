//! Boosted ensemble with deterministic integer scoring

use super::tree::Tree;
use crate::serde_canon::{fingerprint_hex, to_canonical_json, CanonicalError};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelError {
    #[error("Model validation failed: {0}")]
    ValidationFailed(String),

    #[error("Canonical serialization error: {0}")]
    Canonical(#[from] CanonicalError),
}

/// Fixed-point scale for tree weights (1e6 == 1.0)
pub const SCALE: i64 = 1_000_000;

/// Gradient boosted regression ensemble
///
/// `score = bias + Σ leaf(tree) * tree.weight / SCALE`, all in scaled target
/// units. Dividing a score by `target_scale` yields the target in its
/// natural unit (dollars for resale prices).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Model {
    pub trees: Vec<Tree>,
    pub bias: i64,
    pub feature_count: usize,
    pub target_scale: i64,
}

impl Model {
    pub fn new(trees: Vec<Tree>, bias: i64, feature_count: usize, target_scale: i64) -> Self {
        Self {
            trees,
            bias,
            feature_count,
            target_scale,
        }
    }

    pub fn validate(&self) -> Result<(), ModelError> {
        if self.target_scale <= 0 {
            return Err(ModelError::ValidationFailed(format!(
                "Invalid target scale: {}",
                self.target_scale
            )));
        }

        for (i, tree) in self.trees.iter().enumerate() {
            tree.validate(self.feature_count).map_err(|e| {
                ModelError::ValidationFailed(format!("Tree {i} validation failed: {e}"))
            })?;
        }

        Ok(())
    }

    /// Contribution of a single tree, in scaled target units
    pub fn tree_contribution(tree: &Tree, features: &[i64]) -> i64 {
        let weighted = tree.evaluate(features) as i128 * tree.weight as i128;
        (weighted / SCALE as i128) as i64
    }

    /// Raw ensemble score in scaled target units
    pub fn score(&self, features: &[i64]) -> i64 {
        self.trees.iter().fold(self.bias, |sum, tree| {
            sum.saturating_add(Self::tree_contribution(tree, features))
        })
    }

    /// Ensemble output converted back to the target's natural unit
    pub fn predict(&self, features: &[i64]) -> f64 {
        self.score(features) as f64 / self.target_scale as f64
    }

    pub fn num_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn to_canonical_json(&self) -> Result<String, ModelError> {
        Ok(to_canonical_json(self)?)
    }

    /// Hex blake3 digest over the canonical JSON form
    pub fn fingerprint(&self) -> Result<String, ModelError> {
        Ok(fingerprint_hex(self)?)
    }
}
