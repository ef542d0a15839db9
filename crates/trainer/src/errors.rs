use thiserror::Error;

/// Errors returned by the deterministic trainer.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum TrainerError {
    #[error("dataset error: {0}")]
    Dataset(String),

    #[error("insufficient samples: {reason} ({samples} available)")]
    InsufficientSamples { samples: usize, reason: String },

    #[error("R² score is not well-defined with {samples} sample(s)")]
    UndefinedMetric { samples: usize },

    #[error("training error: {0}")]
    Training(String),
}

impl TrainerError {
    /// True for failures caused by too little or too uniform data rather than
    /// malformed input.
    pub fn is_insufficient_data(&self) -> bool {
        matches!(
            self,
            TrainerError::InsufficientSamples { .. } | TrainerError::UndefinedMetric { .. }
        )
    }
}
