//! Per-manufacturer regression training
//!
//! Every manufacturer is trained twice, with and without model-name
//! indicators, on a seeded 80/20 split. Each task is isolated: a failure is
//! recorded against its manufacturer/variant and the batch carries on.

use carprice_gbdt::Model;
use carprice_trainer::fit_and_score;
use tracing::{info, warn};

use crate::config::TrainingConfig;
use crate::dataset::Corpus;
use crate::encoder::{encode, EncodedFeatureSet, FeatureSchema, Variant};
use crate::errors::PricingError;
use crate::evaluator::ConfidenceBand;

/// A fitted regressor for one manufacturer/variant. Never mutated.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedModelEntry {
    pub manufacturer: String,
    pub variant: Variant,
    pub regressor: Model,
    pub r2: f64,
    pub band: ConfidenceBand,
    pub schema: FeatureSchema,
    pub fingerprint: String,
    pub train_samples: usize,
    pub test_samples: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrainingFailure {
    pub manufacturer: String,
    pub variant: Variant,
    pub error: PricingError,
}

/// Everything one training pass produced
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrainingRun {
    /// Manufacturers in corpus discovery order
    pub manufacturers: Vec<String>,
    pub entries: Vec<TrainedModelEntry>,
    pub failures: Vec<TrainingFailure>,
}

impl TrainingRun {
    pub fn entry(&self, manufacturer: &str, variant: Variant) -> Option<&TrainedModelEntry> {
        self.entries
            .iter()
            .find(|e| e.manufacturer == manufacturer && e.variant == variant)
    }
}

/// Fit and score one encoded feature set
pub fn train_variant(
    encoded: &EncodedFeatureSet,
    config: &TrainingConfig,
) -> Result<TrainedModelEntry, PricingError> {
    let manufacturer = encoded.manufacturer.as_str();
    let variant = encoded.variant;
    let to_pricing = |err| PricingError::from_trainer(manufacturer, variant, err);

    let dataset = encoded.to_dataset(config.price_scale).map_err(to_pricing)?;
    let fitted = fit_and_score(
        &dataset,
        config.gbdt_config(),
        config.test_fraction,
        config.seed,
    )
    .map_err(to_pricing)?;

    let fingerprint = fitted
        .model
        .fingerprint()
        .map_err(|err| to_pricing(carprice_trainer::TrainerError::Training(err.to_string())))?;

    Ok(TrainedModelEntry {
        manufacturer: manufacturer.to_string(),
        variant,
        band: ConfidenceBand::from_r2(fitted.r2),
        r2: fitted.r2,
        regressor: fitted.model,
        schema: encoded.schema.clone(),
        fingerprint,
        train_samples: fitted.train_samples,
        test_samples: fitted.test_samples,
    })
}

/// Encode and train one manufacturer/variant task
pub fn train_manufacturer(
    corpus: &Corpus,
    manufacturer: &str,
    variant: Variant,
    config: &TrainingConfig,
) -> Result<TrainedModelEntry, PricingError> {
    let encoded = encode(corpus, manufacturer, variant, &config.encode_options())?;
    train_variant(&encoded, config)
}

/// Train every manufacturer in both variants, sequentially
pub fn train_all(corpus: &Corpus, config: &TrainingConfig) -> TrainingRun {
    let manufacturers = corpus.manufacturers();
    let mut run = TrainingRun {
        manufacturers: manufacturers.clone(),
        ..TrainingRun::default()
    };

    for variant in Variant::ALL {
        for manufacturer in &manufacturers {
            match train_manufacturer(corpus, manufacturer, variant, config) {
                Ok(entry) => {
                    info!(
                        manufacturer = %entry.manufacturer,
                        %variant,
                        r2 = entry.r2,
                        band = %entry.band,
                        train = entry.train_samples,
                        test = entry.test_samples,
                        fingerprint = %&entry.fingerprint[..16],
                        "trained price model"
                    );
                    run.entries.push(entry);
                }
                Err(error) => {
                    warn!(manufacturer = %manufacturer, %variant, %error, "no model trained");
                    run.failures.push(TrainingFailure {
                        manufacturer: manufacturer.clone(),
                        variant,
                        error,
                    });
                }
            }
        }
    }

    info!(
        manufacturers = run.manufacturers.len(),
        models = run.entries.len(),
        failures = run.failures.len(),
        "training pass complete"
    );

    run
}
