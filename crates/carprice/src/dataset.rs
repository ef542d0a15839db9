//! Listing corpus loading and normalization
//!
//! Raw rows carry a `Year` field whose first four characters are the model
//! year, a `Name` field of the form `"<Make> <Model...>"`, and numeric
//! `Miles`/`Price`. Rows that cannot be normalized are skipped with a warning;
//! one bad row never aborts the load.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

const REQUIRED_HEADERS: [&str; 4] = ["Year", "Name", "Miles", "Price"];

/// One normalized listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingRecord {
    pub year: i64,
    pub make: String,
    pub model: String,
    pub mileage: i64,
    pub price: f64,
}

/// Row as it appears in the source file
#[derive(Debug, Deserialize)]
struct RawListing {
    #[serde(rename = "Year")]
    year: String,
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Miles")]
    miles: String,
    #[serde(rename = "Price")]
    price: String,
}

/// Why a raw row was skipped
#[derive(Debug, Error, PartialEq)]
pub enum RowRejection {
    #[error("year {0:?} does not start with a 4-digit year")]
    Year(String),
    #[error("name is blank")]
    Name,
    #[error("mileage {0:?} is not a non-negative number")]
    Mileage(String),
    #[error("price {0:?} is not a number")]
    Price(String),
}

impl ListingRecord {
    /// Normalize one raw row into the canonical schema
    pub fn normalize(year: &str, name: &str, miles: &str, price: &str) -> Result<Self, RowRejection> {
        let year_prefix: String = year.trim().chars().take(4).collect();
        let year_value = year_prefix
            .parse::<i64>()
            .map_err(|_| RowRejection::Year(year.to_string()))?;

        let name = name.trim();
        let (make, model) = match name.split_once(char::is_whitespace) {
            Some((make, rest)) => (make, rest.trim()),
            None => (name, ""),
        };
        if make.is_empty() {
            return Err(RowRejection::Name);
        }

        let mileage = parse_number(miles)
            .filter(|m| *m >= 0.0)
            .ok_or_else(|| RowRejection::Mileage(miles.to_string()))? as i64;
        let price = parse_number(price).ok_or_else(|| RowRejection::Price(price.to_string()))?;

        Ok(Self {
            year: year_value,
            make: make.to_string(),
            model: model.to_string(),
            mileage,
            price,
        })
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// The full training corpus, read-only once loaded
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Corpus {
    records: Vec<ListingRecord>,
}

impl Corpus {
    pub fn new(records: Vec<ListingRecord>) -> Self {
        Self { records }
    }

    /// Load listings from a CSV file with `Year,Name,Miles,Price` headers
    pub fn from_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open listings file {}", path.display()))?;
        Self::from_reader(file).with_context(|| format!("Failed to load {}", path.display()))
    }

    /// Load listings from any CSV source
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = csv_reader.headers().context("Failed to read CSV header")?.clone();
        for required in REQUIRED_HEADERS {
            if !headers.iter().any(|h| h == required) {
                bail!("CSV is missing required column {required:?}");
            }
        }

        let mut records = Vec::new();
        let mut skipped = 0usize;

        for (idx, row) in csv_reader.deserialize::<RawListing>().enumerate() {
            // header is line 1
            let line = idx + 2;
            let raw = match row {
                Ok(raw) => raw,
                Err(err) => {
                    warn!(line, %err, "skipping unreadable listing row");
                    skipped += 1;
                    continue;
                }
            };

            match ListingRecord::normalize(&raw.year, &raw.name, &raw.miles, &raw.price) {
                Ok(record) => records.push(record),
                Err(reason) => {
                    warn!(line, %reason, "skipping listing row");
                    skipped += 1;
                }
            }
        }

        if records.is_empty() {
            bail!("Dataset is empty ({skipped} rows skipped)");
        }

        info!(rows = records.len(), skipped, "loaded listing corpus");
        Ok(Self { records })
    }

    pub fn records(&self) -> &[ListingRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Distinct manufacturers in first-seen order
    pub fn manufacturers(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| r.make.as_str()))
    }

    /// Distinct non-empty model names for a manufacturer, first-seen order
    pub fn models(&self, make: &str) -> Vec<String> {
        distinct(
            self.subset(make)
                .map(|r| r.model.as_str())
                .filter(|m| !m.is_empty()),
        )
    }

    /// Distinct model years, ascending
    pub fn years(&self) -> Vec<i64> {
        let mut years: Vec<i64> = self.records.iter().map(|r| r.year).collect();
        years.sort_unstable();
        years.dedup();
        years
    }

    pub fn subset<'a>(&'a self, make: &'a str) -> impl Iterator<Item = &'a ListingRecord> + 'a {
        self.records.iter().filter(move |r| r.make == make)
    }

    /// Highest mileage observed for a manufacturer
    pub fn max_mileage(&self, make: &str) -> Option<i64> {
        self.subset(make).map(|r| r.mileage).max()
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}
