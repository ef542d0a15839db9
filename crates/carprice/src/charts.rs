//! Chart data for the presentation layer
//!
//! Only the numeric series are produced here; rendering is left to the caller.

use serde::Serialize;
use std::collections::BTreeMap;

use crate::dataset::Corpus;

/// Bar chart series: one value per category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySeries<K> {
    pub title: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub categories: Vec<K>,
    pub values: Vec<i64>,
}

/// Scatter series of `(mileage, price)` pairs
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterSeries {
    pub title: &'static str,
    pub x_label: &'static str,
    pub y_label: &'static str,
    pub points: Vec<(i64, f64)>,
}

/// Mean sale price per model year, chronological, truncated to whole dollars
pub fn average_price_by_year(corpus: &Corpus) -> CategorySeries<i64> {
    let mut sums: BTreeMap<i64, (f64, usize)> = BTreeMap::new();
    for record in corpus.records() {
        let slot = sums.entry(record.year).or_default();
        slot.0 += record.price;
        slot.1 += 1;
    }

    let (categories, values) = sums
        .into_iter()
        .map(|(year, (sum, count))| (year, (sum / count as f64) as i64))
        .unzip();

    CategorySeries {
        title: "Average sale price by year",
        x_label: "Year",
        y_label: "Sale Price",
        categories,
        values,
    }
}

/// Mean sale price per manufacturer, in discovery order
pub fn average_price_by_manufacturer(corpus: &Corpus) -> CategorySeries<String> {
    let categories = corpus.manufacturers();
    let values = categories
        .iter()
        .map(|make| {
            let (sum, count) = corpus
                .subset(make)
                .fold((0.0, 0usize), |(sum, count), r| (sum + r.price, count + 1));
            (sum / count.max(1) as f64) as i64
        })
        .collect();

    CategorySeries {
        title: "Average selling price by manufacturer",
        x_label: "Manufacturer",
        y_label: "Average Sale Price",
        categories,
        values,
    }
}

pub fn mileage_price_scatter(corpus: &Corpus) -> ScatterSeries {
    ScatterSeries {
        title: "Correlation between mileage and sale price",
        x_label: "Mileage",
        y_label: "Sale price",
        points: corpus.records().iter().map(|r| (r.mileage, r.price)).collect(),
    }
}
