//! Integer-only gradient boosted tree ensemble
//!
//! Holds the fitted regressor produced by `carprice-trainer` and evaluates it
//! on encoded listing rows. Modules:
//! - `gbdt`: tree nodes, trees and the boosted ensemble
//! - `serde_canon`: canonical JSON and blake3 fingerprints for fitted models

pub mod gbdt;
pub mod serde_canon;

pub use gbdt::{Model, ModelError, Node, Tree, SCALE};
pub use serde_canon::{fingerprint_hex, to_canonical_json, CanonicalError};

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
