//! Used-vehicle resale price estimation
//!
//! Trains one gradient boosted regressor per manufacturer, with and without
//! model-name features, reports their held-out accuracy, and answers price
//! queries with a confidence label.
//!
//! Modules:
//! - `dataset`: listing corpus loading and normalization
//! - `encoder`: outlier trim and one-hot model-name encoding
//! - `training`: per-manufacturer, per-variant fitting and scoring
//! - `evaluator`: R² confidence bands and the accuracy report
//! - `estimator`: query interface over the trained models
//! - `charts`: numeric series for price charts
//! - `config`: TOML + environment configuration
//! - `errors`: error types

pub mod charts;
pub mod config;
pub mod dataset;
pub mod encoder;
pub mod errors;
pub mod estimator;
pub mod evaluator;
pub mod training;

pub use config::{EstimationConfig, PricingConfig, TrainingConfig};
pub use dataset::{Corpus, ListingRecord};
pub use encoder::{encode, EncodedFeatureSet, FeatureSchema, OutlierTrim, QueryRow, Variant};
pub use errors::{ConfigError, EncodeError, PricingError};
pub use estimator::{PriceEstimator, PriceQuote, QuoteConfidence, NOT_LISTED};
pub use evaluator::{AccuracyReport, ConfidenceBand};
pub use training::{train_all, TrainedModelEntry, TrainingRun};

/// Crate version string
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
