//! Goodness-of-fit metrics on held-out data

use carprice_gbdt::Model;

use crate::dataset::Dataset;
use crate::errors::TrainerError;

/// Coefficient of determination `1 - SS_res / SS_tot`.
///
/// Undefined below two samples. When the true values are constant the score
/// is 1.0 for a perfect fit and 0.0 otherwise.
pub fn r2_score(y_true: &[f64], y_pred: &[f64]) -> Result<f64, TrainerError> {
    if y_true.len() != y_pred.len() {
        return Err(TrainerError::Dataset(format!(
            "{} true values but {} predictions",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.len() < 2 {
        return Err(TrainerError::UndefinedMetric {
            samples: y_true.len(),
        });
    }

    let mean = y_true.iter().sum::<f64>() / y_true.len() as f64;
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred)
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }

    Ok(1.0 - ss_res / ss_tot)
}

/// R² of a fitted model on a held-out dataset, in natural target units
pub fn evaluate(model: &Model, test: &Dataset) -> Result<f64, TrainerError> {
    let predictions: Vec<f64> = test.features.iter().map(|row| model.predict(row)).collect();
    r2_score(&test.natural_targets(), &predictions)
}
