//! Error types for the pricing pipeline

use carprice_trainer::TrainerError;
use std::path::PathBuf;
use thiserror::Error;

use crate::encoder::Variant;

/// Errors raised while encoding one manufacturer's listings
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EncodeError {
    #[error("manufacturer {0} has no listings in the corpus")]
    UnknownManufacturer(String),

    #[error("no listings left for {manufacturer}: {reason}")]
    EmptySubset { manufacturer: String, reason: String },
}

/// Errors surfaced by training and price estimation
///
/// The two user-correctable variants display the exact strings shown to the
/// person filling in the query form.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum PricingError {
    #[error("Error: Mileage must be numbers only")]
    InvalidMileageFormat,

    #[error("Error: fields not complete")]
    IncompleteFields,

    #[error("Error: no model available for {manufacturer}")]
    ModelUnavailable {
        manufacturer: String,
        variant: Variant,
    },

    #[error("insufficient training data for {manufacturer} ({variant}): {reason}")]
    InsufficientTrainingData {
        manufacturer: String,
        variant: Variant,
        reason: String,
    },

    #[error(transparent)]
    Encode(#[from] EncodeError),

    #[error("training failed for {manufacturer} ({variant}): {source}")]
    Training {
        manufacturer: String,
        variant: Variant,
        #[source]
        source: TrainerError,
    },
}

impl PricingError {
    /// Classify a trainer failure for one manufacturer/variant task
    pub fn from_trainer(manufacturer: &str, variant: Variant, err: TrainerError) -> Self {
        if err.is_insufficient_data() {
            PricingError::InsufficientTrainingData {
                manufacturer: manufacturer.to_string(),
                variant,
                reason: err.to_string(),
            }
        } else {
            PricingError::Training {
                manufacturer: manufacturer.to_string(),
                variant,
                source: err,
            }
        }
    }

    pub fn is_insufficient_data(&self) -> bool {
        matches!(self, PricingError::InsufficientTrainingData { .. })
    }
}

/// Configuration loading errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value {value:?} for {var}")]
    Env { var: String, value: String },

    #[error("invalid configuration: {field} {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_facing_messages_are_exact() {
        assert_eq!(
            PricingError::InvalidMileageFormat.to_string(),
            "Error: Mileage must be numbers only"
        );
        assert_eq!(
            PricingError::IncompleteFields.to_string(),
            "Error: fields not complete"
        );
    }

    #[test]
    fn test_trainer_failures_are_classified() {
        let insufficient = PricingError::from_trainer(
            "Fisker",
            Variant::WithModel,
            TrainerError::UndefinedMetric { samples: 1 },
        );
        assert!(insufficient.is_insufficient_data());

        let other = PricingError::from_trainer(
            "Fisker",
            Variant::WithoutModel,
            TrainerError::Training("bad config".into()),
        );
        assert!(!other.is_insufficient_data());
        assert!(other.to_string().contains("without model"));
    }
}
