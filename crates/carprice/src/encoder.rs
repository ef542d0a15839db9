//! Per-manufacturer feature encoding
//!
//! A manufacturer's listings are trimmed of price outliers and turned into
//! integer rows over a fixed column schema: `Year`, `Mileage`, `Price` and,
//! for the with-model variant, one `Model_<name>` indicator per observed model
//! name except the alphabetically first (the reference level).
//!
//! The schema captured at training time is the only way rows are built, both
//! for training and for queries, so a query can never reach the regressor
//! with its columns misaligned.

use carprice_trainer::{Dataset, TrainerError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::dataset::{Corpus, ListingRecord};
use crate::errors::EncodeError;

pub const YEAR_COLUMN: &str = "Year";
pub const MILEAGE_COLUMN: &str = "Mileage";
pub const PRICE_COLUMN: &str = "Price";
pub const MODEL_PREFIX: &str = "Model_";

/// Whether the model name participates in encoding and training
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    WithModel,
    WithoutModel,
}

impl Variant {
    pub const ALL: [Variant; 2] = [Variant::WithModel, Variant::WithoutModel];
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::WithModel => f.write_str("with model"),
            Variant::WithoutModel => f.write_str("without model"),
        }
    }
}

/// Which column the outlier threshold is compared against.
///
/// The threshold is always `mean(price) + sigma * std(price)`. `Year`
/// reproduces the legacy comparison against the model year, which keeps
/// practically every row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutlierTrim {
    #[default]
    Price,
    Year,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EncodeOptions {
    pub outlier_sigma: f64,
    pub trim_on: OutlierTrim,
}

impl Default for EncodeOptions {
    fn default() -> Self {
        Self {
            outlier_sigma: 3.0,
            trim_on: OutlierTrim::Price,
        }
    }
}

/// One row to be encoded: a listing or a price query
#[derive(Debug, Clone, PartialEq)]
pub struct QueryRow {
    pub year: i64,
    pub model: Option<String>,
    pub mileage: i64,
}

impl From<&ListingRecord> for QueryRow {
    fn from(record: &ListingRecord) -> Self {
        Self {
            year: record.year,
            model: Some(record.model.clone()).filter(|m| !m.is_empty()),
            mileage: record.mileage,
        }
    }
}

/// Ordered column names fixed at training time (including `Price`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    columns: Vec<String>,
}

impl FeatureSchema {
    /// Schema for the given variant; `models` are the indicator levels kept
    /// after dropping the reference level.
    fn build(variant: Variant, models: &[String]) -> Self {
        let mut columns = vec![
            YEAR_COLUMN.to_string(),
            MILEAGE_COLUMN.to_string(),
            PRICE_COLUMN.to_string(),
        ];
        if variant == Variant::WithModel {
            columns.extend(models.iter().map(|m| Self::indicator_column(m)));
        }
        Self { columns }
    }

    pub fn indicator_column(model: &str) -> String {
        format!("{MODEL_PREFIX}{model}")
    }

    /// All columns, `Price` included
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Columns fed to the regressor, in order (`Price` dropped)
    pub fn feature_names(&self) -> Vec<&str> {
        self.columns
            .iter()
            .map(String::as_str)
            .filter(|c| *c != PRICE_COLUMN)
            .collect()
    }

    pub fn feature_count(&self) -> usize {
        self.columns.len() - 1
    }

    /// Reindex a row against this schema.
    ///
    /// Every value lands in the column with its training-time name; indicator
    /// columns default to 0, so an unseen model name encodes as all zeros.
    pub fn encode_row(&self, row: &QueryRow) -> Vec<i64> {
        let indicator = row.model.as_deref().map(Self::indicator_column);

        self.feature_names()
            .into_iter()
            .map(|column| match column {
                YEAR_COLUMN => row.year,
                MILEAGE_COLUMN => row.mileage,
                other => i64::from(indicator.as_deref() == Some(other)),
            })
            .collect()
    }
}

/// A manufacturer's listings encoded for one variant
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedFeatureSet {
    pub manufacturer: String,
    pub variant: Variant,
    pub schema: FeatureSchema,
    pub rows: Vec<Vec<i64>>,
    pub prices: Vec<f64>,
    pub trimmed: usize,
}

impl EncodedFeatureSet {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Integer training matrix with prices scaled by `price_scale`
    pub fn to_dataset(&self, price_scale: i64) -> Result<Dataset, TrainerError> {
        let targets = self
            .prices
            .iter()
            .map(|p| (p * price_scale as f64).round() as i64)
            .collect();
        Dataset::new(
            self.rows.clone(),
            targets,
            self.schema.feature_count(),
            price_scale,
        )
    }
}

/// Encode one manufacturer's listings for the given variant
pub fn encode(
    corpus: &Corpus,
    manufacturer: &str,
    variant: Variant,
    options: &EncodeOptions,
) -> Result<EncodedFeatureSet, EncodeError> {
    let subset: Vec<&ListingRecord> = corpus.subset(manufacturer).collect();
    if subset.is_empty() {
        return Err(EncodeError::UnknownManufacturer(manufacturer.to_string()));
    }

    let kept = trim_outliers(&subset, options);
    if kept.is_empty() {
        return Err(EncodeError::EmptySubset {
            manufacturer: manufacturer.to_string(),
            reason: format!("all {} rows removed by the outlier trim", subset.len()),
        });
    }

    let levels: BTreeSet<&str> = kept
        .iter()
        .map(|r| r.model.as_str())
        .filter(|m| !m.is_empty())
        .collect();
    let indicators: Vec<String> = levels.into_iter().skip(1).map(str::to_string).collect();
    let schema = FeatureSchema::build(variant, &indicators);

    let rows = kept
        .iter()
        .map(|record| schema.encode_row(&QueryRow::from(*record)))
        .collect();
    let prices = kept.iter().map(|r| r.price).collect();

    Ok(EncodedFeatureSet {
        manufacturer: manufacturer.to_string(),
        variant,
        schema,
        rows,
        prices,
        trimmed: subset.len() - kept.len(),
    })
}

/// Keep rows at or below `mean(price) + sigma * std(price)` (sample std).
/// With fewer than two rows the deviation is undefined and nothing is cut.
fn trim_outliers<'a>(subset: &[&'a ListingRecord], options: &EncodeOptions) -> Vec<&'a ListingRecord> {
    let n = subset.len();
    if n < 2 {
        return subset.to_vec();
    }

    let mean = subset.iter().map(|r| r.price).sum::<f64>() / n as f64;
    let variance = subset
        .iter()
        .map(|r| (r.price - mean).powi(2))
        .sum::<f64>()
        / (n - 1) as f64;
    let threshold = mean + options.outlier_sigma * variance.sqrt();

    subset
        .iter()
        .copied()
        .filter(|r| match options.trim_on {
            OutlierTrim::Price => r.price <= threshold,
            OutlierTrim::Year => (r.year as f64) <= threshold,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing(make: &str, model: &str, year: i64, mileage: i64, price: f64) -> ListingRecord {
        ListingRecord {
            year,
            make: make.to_string(),
            model: model.to_string(),
            mileage,
            price,
        }
    }

    fn corpus() -> Corpus {
        Corpus::new(vec![
            listing("Toyota", "Corolla", 2016, 80_000, 12_000.0),
            listing("Toyota", "Camry", 2018, 60_000, 18_000.0),
            listing("Honda", "Civic", 2017, 45_000, 15_000.0),
            listing("Toyota", "RAV4", 2019, 30_000, 24_000.0),
            listing("Toyota", "", 2015, 90_000, 9_000.0),
        ])
    }

    #[test]
    fn test_with_model_schema_drops_reference_level() {
        let encoded = encode(&corpus(), "Toyota", Variant::WithModel, &EncodeOptions::default()).unwrap();

        // Camry is alphabetically first and becomes the reference level
        assert_eq!(
            encoded.schema.columns(),
            ["Year", "Mileage", "Price", "Model_Corolla", "Model_RAV4"]
        );
        assert_eq!(encoded.rows[0], vec![2016, 80_000, 1, 0]);
        assert_eq!(encoded.rows[1], vec![2018, 60_000, 0, 0]);
        assert_eq!(encoded.rows[2], vec![2019, 30_000, 0, 1]);
        assert_eq!(encoded.rows[3], vec![2015, 90_000, 0, 0]);
        assert_eq!(encoded.prices, vec![12_000.0, 18_000.0, 24_000.0, 9_000.0]);
    }

    #[test]
    fn test_without_model_schema_has_no_indicators() {
        let encoded = encode(&corpus(), "Toyota", Variant::WithoutModel, &EncodeOptions::default()).unwrap();
        assert_eq!(encoded.schema.columns(), ["Year", "Mileage", "Price"]);
        assert_eq!(encoded.schema.feature_names(), ["Year", "Mileage"]);
        assert_eq!(encoded.rows[1], vec![2018, 60_000]);
    }

    #[test]
    fn test_unknown_manufacturer_fails() {
        let err = encode(&corpus(), "Lada", Variant::WithModel, &EncodeOptions::default()).unwrap_err();
        assert_eq!(err, EncodeError::UnknownManufacturer("Lada".into()));
    }

    #[test]
    fn test_price_outliers_are_trimmed() {
        let mut records: Vec<ListingRecord> = (0..30)
            .map(|i| listing("Ford", "Focus", 2017, 50_000 + i, 10_000.0 + i as f64))
            .collect();
        records.push(listing("Ford", "GT", 2020, 1_000, 500_000.0));
        let corpus = Corpus::new(records);

        let trimmed = encode(&corpus, "Ford", Variant::WithModel, &EncodeOptions::default()).unwrap();
        assert_eq!(trimmed.len(), 30);
        assert_eq!(trimmed.trimmed, 1);
        // only one level remains and it is the reference level
        assert_eq!(trimmed.schema.columns(), ["Year", "Mileage", "Price"]);

        let legacy = EncodeOptions {
            trim_on: OutlierTrim::Year,
            ..EncodeOptions::default()
        };
        let untrimmed = encode(&corpus, "Ford", Variant::WithModel, &legacy).unwrap();
        assert_eq!(untrimmed.len(), 31);
        assert_eq!(untrimmed.schema.columns(), ["Year", "Mileage", "Price", "Model_GT"]);
    }

    #[test]
    fn test_query_reindexing_matches_training_names() {
        let encoded = encode(&corpus(), "Toyota", Variant::WithModel, &EncodeOptions::default()).unwrap();
        let schema = &encoded.schema;

        let query = QueryRow {
            year: 2018,
            model: Some("RAV4".into()),
            mileage: 42_000,
        };
        let row = schema.encode_row(&query);
        let named: Vec<(&str, i64)> = schema.feature_names().into_iter().zip(row).collect();
        assert_eq!(
            named,
            vec![
                ("Year", 2018),
                ("Mileage", 42_000),
                ("Model_Corolla", 0),
                ("Model_RAV4", 1)
            ]
        );

        let unseen = QueryRow {
            model: Some("Supra".into()),
            ..query
        };
        assert_eq!(schema.encode_row(&unseen), vec![2018, 42_000, 0, 0]);
    }

    #[test]
    fn test_to_dataset_scales_prices() {
        let encoded = encode(&corpus(), "Honda", Variant::WithoutModel, &EncodeOptions::default()).unwrap();
        let dataset = encoded.to_dataset(100).unwrap();
        assert_eq!(dataset.targets, vec![1_500_000]);
        assert_eq!(dataset.feature_count, 2);
    }
}
