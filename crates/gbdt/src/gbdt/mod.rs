//! Gradient Boosted Decision Tree ensemble
//!
//! - **Integer-only scoring**: features, leaves, weights and bias are `i64`
//! - **Deterministic**: the same model and row always produce the same score
//! - **Fingerprinted**: canonical JSON + blake3 identifies a fitted model
//!
//! # Usage
//!
//! ```rust
//! use carprice_gbdt::{Model, Node, Tree, SCALE};
//!
//! // year <= 2016 -> $9,000 else $15,000 (prices in cents)
//! let tree = Tree::new(
//!     vec![
//!         Node::internal(0, 0, 2016, 1, 2),
//!         Node::leaf(1, 900_000),
//!         Node::leaf(2, 1_500_000),
//!     ],
//!     SCALE,
//! );
//! let model = Model::new(vec![tree], 0, 2, 100);
//! assert_eq!(model.predict(&[2018, 40_000]), 15_000.0);
//! ```

pub mod model;
pub mod tree;

pub use model::{Model, ModelError, SCALE};
pub use tree::{Node, Tree};

#[cfg(test)]
mod integration_tests {
    use super::*;

    #[test]
    fn test_two_tree_ensemble() {
        let by_year = Tree::new(
            vec![
                Node::internal(0, 0, 2016, 1, 2),
                Node::leaf(1, 1_000_000),
                Node::leaf(2, 2_000_000),
            ],
            SCALE,
        );
        let by_mileage = Tree::new(
            vec![
                Node::internal(0, 1, 50_000, 1, 2),
                Node::leaf(1, 500_000),
                Node::leaf(2, -500_000),
            ],
            SCALE / 2,
        );

        let model = Model::new(vec![by_year, by_mileage], 0, 2, 100);

        // 1_000_000 + 500_000 / 2
        assert_eq!(model.score(&[2015, 30_000]), 1_250_000);
        // 2_000_000 - 500_000 / 2
        assert_eq!(model.score(&[2019, 80_000]), 1_750_000);
        assert!(model.validate().is_ok());
    }

    #[test]
    fn test_scoring_is_repeatable() {
        let tree = Tree::new(vec![Node::leaf(0, 123_456)], SCALE);
        let model = Model::new(vec![tree], 7, 0, 1);

        let first = model.score(&[]);
        assert!((0..100).all(|_| model.score(&[]) == first));
        assert_eq!(first, 123_463);
    }
}
