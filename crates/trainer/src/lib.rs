//! Deterministic offline GBDT trainer
//!
//! Provides tools for training Gradient Boosted Decision Tree regressors
//! with full determinism and reproducibility: a seeded train/test split,
//! exact-greedy integer CART trees and R² scoring on the held-out rows.

pub mod cart;
pub mod dataset;
pub mod deterministic;
pub mod errors;
pub mod metrics;
pub mod trainer;

use carprice_gbdt::Model;

pub use dataset::Dataset;
pub use deterministic::{LcgRng, SplitTieBreaker};
pub use errors::TrainerError;
pub use metrics::{evaluate, r2_score};
pub use trainer::{GbdtConfig, GbdtTrainer};

/// A fitted ensemble together with its held-out R² score
#[derive(Debug, Clone, PartialEq)]
pub struct FittedModel {
    pub model: Model,
    pub r2: f64,
    pub train_samples: usize,
    pub test_samples: usize,
}

/// Split, fit on the training side and score on the test side.
pub fn fit_and_score(
    dataset: &Dataset,
    config: GbdtConfig,
    test_fraction: f64,
    seed: u64,
) -> Result<FittedModel, TrainerError> {
    let (train, test) = dataset.train_test_split(test_fraction, seed)?;
    let model = GbdtTrainer::new(config).train(&train)?;
    let r2 = evaluate(&model, &test)?;

    Ok(FittedModel {
        model,
        r2,
        train_samples: train.len(),
        test_samples: test.len(),
    })
}

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
