//! Price estimation against the trained per-manufacturer models
//!
//! `PriceEstimator` is built once from a training pass and never mutated;
//! every query is a pure lookup plus inference. The presentation layer only
//! needs the query methods on this type.

use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::charts::{self, CategorySeries, ScatterSeries};
use crate::config::{EstimationConfig, PricingConfig};
use crate::dataset::Corpus;
use crate::encoder::{QueryRow, Variant};
use crate::errors::PricingError;
use crate::evaluator::{AccuracyReport, ConfidenceBand};
use crate::training::{train_all, TrainedModelEntry, TrainingRun};

/// Model selection meaning "use the model trained without model names"
pub const NOT_LISTED: &str = "Not listed";

/// Unset selections as they arrive from the query form
pub const YEAR_PLACEHOLDER: &str = "Year";
pub const MAKE_PLACEHOLDER: &str = "Make";
pub const MODEL_PLACEHOLDER: &str = "Model";

/// Confidence attached to a quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum QuoteConfidence {
    Weak,
    Moderate,
    Strong,
    OutOfRange,
}

impl From<ConfidenceBand> for QuoteConfidence {
    /// A negative band is never shown on a quote; it reads as weak.
    fn from(band: ConfidenceBand) -> Self {
        match band {
            ConfidenceBand::Negative | ConfidenceBand::Weak => QuoteConfidence::Weak,
            ConfidenceBand::Moderate => QuoteConfidence::Moderate,
            ConfidenceBand::Strong => QuoteConfidence::Strong,
        }
    }
}

impl fmt::Display for QuoteConfidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            QuoteConfidence::Weak => "weak",
            QuoteConfidence::Moderate => "moderate",
            QuoteConfidence::Strong => "strong",
            QuoteConfidence::OutOfRange => "out of range",
        })
    }
}

/// A predicted price, formatted as `$<dollars>(<confidence>)`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceQuote {
    pub price: i64,
    pub confidence: QuoteConfidence,
    pub variant: Variant,
}

impl fmt::Display for PriceQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "${}({})", self.price, self.confidence)
    }
}

/// Trained models, their report and the corpus they came from
#[derive(Debug, Clone)]
pub struct PriceEstimator {
    corpus: Corpus,
    models: HashMap<(String, Variant), TrainedModelEntry>,
    report: AccuracyReport,
    config: EstimationConfig,
}

impl PriceEstimator {
    /// Run the whole training pass and build the estimator
    pub fn train(corpus: Corpus, config: &PricingConfig) -> Self {
        let run = train_all(&corpus, &config.training);
        Self::from_run(corpus, run, config.estimation.clone())
    }

    pub fn from_run(corpus: Corpus, run: TrainingRun, config: EstimationConfig) -> Self {
        let report = AccuracyReport::from_run(&run);
        let models = run
            .entries
            .into_iter()
            .map(|entry| ((entry.manufacturer.clone(), entry.variant), entry))
            .collect();

        Self {
            corpus,
            models,
            report,
            config,
        }
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    pub fn entry(&self, manufacturer: &str, variant: Variant) -> Option<&TrainedModelEntry> {
        self.models.get(&(manufacturer.to_string(), variant))
    }

    pub fn list_years(&self) -> Vec<i64> {
        self.corpus.years()
    }

    pub fn list_manufacturers(&self) -> Vec<String> {
        self.corpus.manufacturers()
    }

    /// Model names for a manufacturer followed by the `"Not listed"` choice
    pub fn list_models(&self, manufacturer: &str) -> Vec<String> {
        let mut models = self.corpus.models(manufacturer);
        models.push(NOT_LISTED.to_string());
        models
    }

    /// Quote as display text, or one of the user-facing error strings
    pub fn estimate_price(&self, year: &str, make: &str, model: &str, mileage: &str) -> String {
        match self.predict(year, make, model, mileage) {
            Ok(quote) => quote.to_string(),
            Err(err) => err.to_string(),
        }
    }

    /// Validate the query, pick the matching model and predict a price.
    ///
    /// Mileage is checked before the other fields. The stored confidence band
    /// drops to weak below the price floor and becomes "out of range" when
    /// the mileage exceeds anything seen for the manufacturer.
    pub fn predict(
        &self,
        year: &str,
        make: &str,
        model: &str,
        mileage: &str,
    ) -> Result<PriceQuote, PricingError> {
        if mileage.is_empty() || !mileage.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PricingError::InvalidMileageFormat);
        }
        // digits only, so the only parse failure is overflow
        let mileage = mileage.parse::<i64>().unwrap_or(i64::MAX);

        let is_unset = |value: &str, placeholder: &str| {
            let value = value.trim();
            value.is_empty() || value == placeholder
        };
        if is_unset(year, YEAR_PLACEHOLDER)
            || is_unset(make, MAKE_PLACEHOLDER)
            || is_unset(model, MODEL_PLACEHOLDER)
        {
            return Err(PricingError::IncompleteFields);
        }
        let year = year
            .trim()
            .parse::<i64>()
            .map_err(|_| PricingError::IncompleteFields)?;
        let make = make.trim();
        let model = model.trim();

        let variant = if model.eq_ignore_ascii_case(NOT_LISTED) {
            Variant::WithoutModel
        } else {
            Variant::WithModel
        };

        let entry = self
            .entry(make, variant)
            .ok_or_else(|| PricingError::ModelUnavailable {
                manufacturer: make.to_string(),
                variant,
            })?;

        let row = QueryRow {
            year,
            model: (variant == Variant::WithModel).then(|| model.to_string()),
            mileage,
        };
        let features = entry.schema.encode_row(&row);
        let price = entry.regressor.predict(&features).trunc() as i64;

        let mut confidence = QuoteConfidence::from(entry.band);
        if price < self.config.weak_price_floor {
            confidence = QuoteConfidence::Weak;
        }
        if self
            .corpus
            .max_mileage(make)
            .is_some_and(|max_mileage| mileage > max_mileage)
        {
            confidence = QuoteConfidence::OutOfRange;
        }

        tracing::debug!(make, model, year, mileage, price, %confidence, "price quote");

        Ok(PriceQuote {
            price,
            confidence,
            variant,
        })
    }

    pub fn accuracy_report(&self) -> &AccuracyReport {
        &self.report
    }

    pub fn accuracy_report_lines(&self) -> Vec<String> {
        self.report.lines()
    }

    pub fn average_price_by_year(&self) -> CategorySeries<i64> {
        charts::average_price_by_year(&self.corpus)
    }

    pub fn average_price_by_manufacturer(&self) -> CategorySeries<String> {
        charts::average_price_by_manufacturer(&self.corpus)
    }

    pub fn mileage_price_scatter(&self) -> ScatterSeries {
        charts::mileage_price_scatter(&self.corpus)
    }
}
