//! End-to-end tests: CSV ingestion through training to price quotes

use anyhow::Result;
use carprice::encoder::EncodeOptions;
use carprice::{
    encode, ConfidenceBand, Corpus, ListingRecord, PriceEstimator, PricingConfig, PricingError,
    QueryRow, QuoteConfidence, Variant, NOT_LISTED,
};
use proptest::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

const TOYOTA_MODELS: [&str; 3] = ["Camry", "Corolla", "RAV4"];

/// 50 Toyota listings, 2015-2020, 10k-120k miles, roughly $8k-$30k.
/// Newer and lower-mileage cars are worth more; RAV4 carries a premium.
fn toyota_rows() -> Vec<(i64, String, i64, i64)> {
    (0..50)
        .map(|i| {
            let year = 2015 + (i % 6);
            let mileage = 10_000 + ((i * 37) % 50) * 2_200;
            let model = TOYOTA_MODELS[(i % 3) as usize];
            let premium = (i % 3) * 1_000;
            let price = 13_000 + (year - 2015) * 3_000 - mileage / 25 + premium;
            (year, format!("Toyota {model}"), mileage, price)
        })
        .collect()
}

fn write_listings(extra: &[&str]) -> Result<NamedTempFile> {
    let mut file = NamedTempFile::new()?;
    writeln!(file, "Year,Name,Miles,Price")?;
    for (year, name, mileage, price) in toyota_rows() {
        writeln!(file, "{year},{name},{mileage},{price}")?;
    }
    for line in extra {
        writeln!(file, "{line}")?;
    }
    file.flush()?;
    Ok(file)
}

fn trained(extra: &[&str]) -> Result<PriceEstimator> {
    let file = write_listings(extra)?;
    let corpus = Corpus::from_csv(file.path())?;
    Ok(PriceEstimator::train(corpus, &PricingConfig::default()))
}

#[test]
fn test_toyota_quote_is_in_range() -> Result<()> {
    let estimator = trained(&[])?;

    let quote = estimator.predict("2018", "Toyota", "Camry", "60000")?;
    assert_eq!(quote.variant, Variant::WithModel);
    assert!(
        (8_000..=30_000).contains(&quote.price),
        "quote {} outside the listed price range",
        quote.price
    );
    assert_ne!(quote.confidence, QuoteConfidence::OutOfRange);

    let text = estimator.estimate_price("2018", "Toyota", "Camry", "60000");
    assert!(text.starts_with('$'));
    assert!(!text.contains("out of range"));

    Ok(())
}

#[test]
fn test_mileage_beyond_corpus_is_out_of_range() -> Result<()> {
    let estimator = trained(&[])?;

    let quote = estimator.predict("2018", "Toyota", "Camry", "999999")?;
    assert_eq!(quote.confidence, QuoteConfidence::OutOfRange);
    assert!(estimator
        .estimate_price("2018", "Toyota", "Camry", "999999")
        .ends_with("(out of range)"));

    Ok(())
}

#[test]
fn test_not_listed_uses_model_free_regressor() -> Result<()> {
    let estimator = trained(&[])?;

    let quote = estimator.predict("2018", "Toyota", NOT_LISTED, "60000")?;
    assert_eq!(quote.variant, Variant::WithoutModel);
    let lowercase = estimator.predict("2018", "Toyota", "not listed", "60000")?;
    assert_eq!(lowercase, quote);

    let entry = estimator
        .entry("Toyota", Variant::WithoutModel)
        .expect("model-free regressor trained");
    assert_eq!(entry.schema.feature_names(), ["Year", "Mileage"]);
    assert_eq!(entry.train_samples + entry.test_samples, 50);
    assert_eq!(entry.test_samples, 10);

    Ok(())
}

#[test]
fn test_queries_are_idempotent() -> Result<()> {
    let estimator = trained(&[])?;

    let first = estimator.estimate_price("2017", "Toyota", "RAV4", "45000");
    for _ in 0..5 {
        assert_eq!(estimator.estimate_price("2017", "Toyota", "RAV4", "45000"), first);
    }

    Ok(())
}

#[test]
fn test_training_is_reproducible() -> Result<()> {
    let a = trained(&[])?;
    let b = trained(&[])?;

    for variant in Variant::ALL {
        let left = a.entry("Toyota", variant).expect("trained");
        let right = b.entry("Toyota", variant).expect("trained");
        assert_eq!(left.fingerprint, right.fingerprint);
        assert_eq!(left.r2, right.r2);
    }
    assert_eq!(a.accuracy_report_lines(), b.accuracy_report_lines());

    Ok(())
}

#[test]
fn test_tiny_manufacturer_is_isolated() -> Result<()> {
    let estimator = trained(&["2016,Lada Niva,70000,4000"])?;

    // the failing manufacturer does not stop the others
    assert!(estimator.entry("Toyota", Variant::WithModel).is_some());
    assert!(estimator.entry("Lada", Variant::WithModel).is_none());

    let report = estimator.accuracy_report();
    assert_eq!(report.entries.len(), 1);
    assert_eq!(report.entries[0].manufacturer, "Toyota");
    assert_eq!(report.insufficient.len(), 2);
    assert!(report.insufficient.iter().all(|i| i.manufacturer == "Lada"));

    assert_eq!(
        estimator.predict("2016", "Lada", "Niva", "70000"),
        Err(PricingError::ModelUnavailable {
            manufacturer: "Lada".into(),
            variant: Variant::WithModel,
        })
    );
    assert_eq!(estimator.list_manufacturers(), vec!["Toyota", "Lada"]);

    Ok(())
}

#[test]
fn test_report_layout() -> Result<()> {
    let estimator = trained(&[])?;
    let lines = estimator.accuracy_report_lines();

    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("Overall average R2 score: "));
    assert!(lines[3].starts_with("1: Toyota, "));

    let report = estimator.accuracy_report();
    let toyota = &report.entries[0];
    for score in [toyota.with_model, toyota.without_model] {
        let score = score.expect("both variants trained");
        assert_eq!(score.band, ConfidenceBand::from_r2(score.r2));
    }

    // only non-negative scores enter the averages
    let usable: Vec<f64> = [toyota.with_model, toyota.without_model]
        .into_iter()
        .flatten()
        .filter(|s| s.r2 >= 0.0)
        .map(|s| s.r2)
        .collect();
    if usable.is_empty() {
        assert_eq!(report.overall_average_r2, None);
    } else {
        let expected = usable.iter().sum::<f64>() / usable.len() as f64;
        let overall = report.overall_average_r2.expect("average present");
        assert!((overall - expected).abs() < 1e-12);
    }

    Ok(())
}

#[test]
fn test_bad_rows_are_skipped_not_fatal() -> Result<()> {
    let estimator = trained(&[
        "20xx,Toyota Camry,1000,9000",
        "2019,Toyota Camry,lots,9000",
        "2019,,1000,9000",
    ])?;
    assert_eq!(estimator.corpus().len(), 50);
    Ok(())
}

fn model_name() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{1,5}"
}

proptest! {
    #[test]
    fn prop_query_encoding_follows_training_columns(
        models in prop::collection::vec(model_name(), 1..8),
        query_model in prop::option::of(model_name()),
        year in 1990i64..2030,
        mileage in 0i64..500_000,
    ) {
        let records = models
            .iter()
            .enumerate()
            .map(|(i, model)| ListingRecord {
                year: 2010 + i as i64,
                make: "Toyota".into(),
                model: model.clone(),
                mileage: 10_000 * (i as i64 + 1),
                price: 10_000.0,
            })
            .collect();
        let corpus = Corpus::new(records);
        let encoded = encode(&corpus, "Toyota", Variant::WithModel, &EncodeOptions::default())
            .expect("non-empty subset");
        let schema = &encoded.schema;

        let row = schema.encode_row(&QueryRow {
            year,
            model: query_model.clone(),
            mileage,
        });
        let names = schema.feature_names();
        prop_assert_eq!(row.len(), names.len());
        prop_assert_eq!(row[0], year);
        prop_assert_eq!(row[1], mileage);

        let indicator = query_model.map(|m| format!("Model_{m}"));
        for (name, value) in names.iter().zip(&row).skip(2) {
            let expected = i64::from(indicator.as_deref() == Some(*name));
            prop_assert_eq!(*value, expected);
        }
        prop_assert!(row[2..].iter().sum::<i64>() <= 1);
    }
}
