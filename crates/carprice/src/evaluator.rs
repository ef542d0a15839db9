//! Accuracy banding and the per-manufacturer accuracy report

use serde::Serialize;
use std::fmt;

use crate::encoder::Variant;
use crate::training::TrainingRun;

/// Qualitative confidence derived from a held-out R² score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceBand {
    Negative,
    Weak,
    Moderate,
    Strong,
}

impl ConfidenceBand {
    /// `r2 < 0` negative, `[0, 0.3)` weak, `[0.3, 0.7]` moderate, above strong
    pub fn from_r2(r2: f64) -> Self {
        if r2.is_nan() || r2 < 0.0 {
            ConfidenceBand::Negative
        } else if r2 < 0.3 {
            ConfidenceBand::Weak
        } else if r2 <= 0.7 {
            ConfidenceBand::Moderate
        } else {
            ConfidenceBand::Strong
        }
    }

    /// Negative scores never enter an average
    pub fn counts_toward_average(self) -> bool {
        self != ConfidenceBand::Negative
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConfidenceBand::Negative => "negative",
            ConfidenceBand::Weak => "weak",
            ConfidenceBand::Moderate => "moderate",
            ConfidenceBand::Strong => "strong",
        }
    }
}

impl fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct VariantScore {
    pub r2: f64,
    pub band: ConfidenceBand,
}

/// One report line; a variant is `None` when it had insufficient data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ManufacturerAccuracy {
    pub manufacturer: String,
    pub with_model: Option<VariantScore>,
    pub without_model: Option<VariantScore>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsufficientEntry {
    pub manufacturer: String,
    pub variant: Variant,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AccuracyReport {
    pub overall_average_r2: Option<f64>,
    pub average_r2_with_model: Option<f64>,
    pub average_r2_without_model: Option<f64>,
    pub entries: Vec<ManufacturerAccuracy>,
    /// Tasks skipped for too little data; other failures are only logged
    pub insufficient: Vec<InsufficientEntry>,
}

impl AccuracyReport {
    /// Aggregate a training run, keeping manufacturer discovery order
    pub fn from_run(run: &TrainingRun) -> Self {
        let score = |make: &str, variant: Variant| {
            run.entry(make, variant).map(|entry| VariantScore {
                r2: entry.r2,
                band: entry.band,
            })
        };

        let entries: Vec<ManufacturerAccuracy> = run
            .manufacturers
            .iter()
            .map(|make| ManufacturerAccuracy {
                manufacturer: make.clone(),
                with_model: score(make, Variant::WithModel),
                without_model: score(make, Variant::WithoutModel),
            })
            .filter(|e| e.with_model.is_some() || e.without_model.is_some())
            .collect();

        let with_scores = usable_scores(entries.iter().filter_map(|e| e.with_model));
        let without_scores = usable_scores(entries.iter().filter_map(|e| e.without_model));
        let all_scores: Vec<f64> = with_scores.iter().chain(&without_scores).copied().collect();

        let insufficient = run
            .failures
            .iter()
            .filter(|failure| failure.error.is_insufficient_data())
            .map(|failure| InsufficientEntry {
                manufacturer: failure.manufacturer.clone(),
                variant: failure.variant,
                reason: failure.error.to_string(),
            })
            .collect();

        Self {
            overall_average_r2: mean(&all_scores),
            average_r2_with_model: mean(&with_scores),
            average_r2_without_model: mean(&without_scores),
            entries,
            insufficient,
        }
    }

    /// Human-readable report: three average lines, then one line per
    /// manufacturer `"<index>: <make>, <band with>, <band without>, <r2 with>, <r2 without>"`
    pub fn lines(&self) -> Vec<String> {
        let mut lines = vec![
            format!("Overall average R2 score: {}", fmt_average(self.overall_average_r2)),
            format!(
                "Average R2 score when model is included in calculation: {}",
                fmt_average(self.average_r2_with_model)
            ),
            format!(
                "Average R2 score when model is not included in calculation: {}",
                fmt_average(self.average_r2_without_model)
            ),
        ];

        for (idx, entry) in self.entries.iter().enumerate() {
            let (band_with, r2_with) = fmt_score(entry.with_model);
            let (band_without, r2_without) = fmt_score(entry.without_model);
            lines.push(format!(
                "{}: {}, {}, {}, {}, {}",
                idx + 1,
                entry.manufacturer,
                band_with,
                band_without,
                r2_with,
                r2_without
            ));
        }

        lines
    }
}

const MISSING: &str = "insufficient data";

fn usable_scores(scores: impl Iterator<Item = VariantScore>) -> Vec<f64> {
    scores
        .filter(|s| s.band.counts_toward_average())
        .map(|s| s.r2)
        .collect()
}

fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

fn fmt_average(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| v.to_string())
}

fn fmt_score(score: Option<VariantScore>) -> (String, String) {
    match score {
        Some(s) => (s.band.to_string(), s.r2.to_string()),
        None => (MISSING.to_string(), MISSING.to_string()),
    }
}
