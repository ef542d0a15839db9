//! Configuration management
//!
//! Defaults are compiled in, an optional TOML file overrides them, and
//! `CARPRICE_*` environment variables override the file.

use carprice_trainer::GbdtConfig;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::encoder::{EncodeOptions, OutlierTrim};
use crate::errors::ConfigError;

/// Top-level configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PricingConfig {
    /// Listings CSV used as the training corpus
    pub data_path: PathBuf,
    pub training: TrainingConfig,
    pub estimation: EstimationConfig,
    pub logging: LoggingConfig,
}

/// Encoding, split and boosting parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    pub seed: u64,
    pub test_fraction: f64,
    pub outlier_sigma: f64,
    pub trim_outliers_on: OutlierTrim,
    pub num_trees: usize,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// Fixed-point, 100_000 = 0.1
    pub learning_rate: i64,
    /// Prices are multiplied by this before training (100 = cents)
    pub price_scale: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimationConfig {
    /// Quotes below this many dollars are labelled weak
    pub weak_price_floor: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            data_path: PathBuf::from("carvana.csv"),
            training: TrainingConfig::default(),
            estimation: EstimationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for TrainingConfig {
    fn default() -> Self {
        let gbdt = GbdtConfig::default();
        Self {
            seed: 42,
            test_fraction: 0.2,
            outlier_sigma: 3.0,
            trim_outliers_on: OutlierTrim::Price,
            num_trees: gbdt.num_trees,
            max_depth: gbdt.max_depth,
            min_samples_leaf: gbdt.min_samples_leaf,
            learning_rate: gbdt.learning_rate,
            price_scale: 100,
        }
    }
}

impl Default for EstimationConfig {
    fn default() -> Self {
        Self {
            weak_price_floor: 1000,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl TrainingConfig {
    pub fn gbdt_config(&self) -> GbdtConfig {
        GbdtConfig {
            num_trees: self.num_trees,
            max_depth: self.max_depth,
            min_samples_leaf: self.min_samples_leaf,
            learning_rate: self.learning_rate,
        }
    }

    pub fn encode_options(&self) -> EncodeOptions {
        EncodeOptions {
            outlier_sigma: self.outlier_sigma,
            trim_on: self.trim_outliers_on,
        }
    }
}

impl PricingConfig {
    /// Load defaults, then the file (if any), then environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_env_overrides(|key| std::env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Apply `CARPRICE_*` overrides read through `lookup`
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("CARPRICE_DATA") {
            self.data_path = PathBuf::from(path);
        }
        if let Some(level) = lookup("CARPRICE_LOG") {
            self.logging.level = level;
        }
        override_parsed(&lookup, "CARPRICE_SEED", &mut self.training.seed)?;
        override_parsed(&lookup, "CARPRICE_TEST_FRACTION", &mut self.training.test_fraction)?;
        override_parsed(&lookup, "CARPRICE_OUTLIER_SIGMA", &mut self.training.outlier_sigma)?;
        override_parsed(&lookup, "CARPRICE_TREES", &mut self.training.num_trees)?;

        if let Some(value) = lookup("CARPRICE_TRIM_ON") {
            self.training.trim_outliers_on = match value.to_lowercase().as_str() {
                "price" => OutlierTrim::Price,
                "year" => OutlierTrim::Year,
                _ => {
                    return Err(ConfigError::Env {
                        var: "CARPRICE_TRIM_ON".to_string(),
                        value,
                    })
                }
            };
        }

        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.training;
        let invalid = |field, reason: &str| {
            Err(ConfigError::Invalid {
                field,
                reason: reason.to_string(),
            })
        };

        if !(t.test_fraction > 0.0 && t.test_fraction < 1.0) {
            return invalid("training.test_fraction", "must be between 0 and 1");
        }
        if t.num_trees == 0 {
            return invalid("training.num_trees", "must be at least 1");
        }
        if t.max_depth == 0 {
            return invalid("training.max_depth", "must be at least 1");
        }
        if t.min_samples_leaf == 0 {
            return invalid("training.min_samples_leaf", "must be at least 1");
        }
        if t.learning_rate <= 0 {
            return invalid("training.learning_rate", "must be positive");
        }
        if t.price_scale <= 0 {
            return invalid("training.price_scale", "must be positive");
        }
        if !(t.outlier_sigma >= 0.0) {
            return invalid("training.outlier_sigma", "must be non-negative");
        }

        Ok(())
    }
}

fn override_parsed<T, F>(lookup: &F, var: &str, target: &mut T) -> Result<(), ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    if let Some(value) = lookup(var) {
        *target = value.trim().parse().map_err(|_| ConfigError::Env {
            var: var.to_string(),
            value: value.clone(),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults_match_library_defaults() {
        let config = PricingConfig::default();
        assert_eq!(config.training.seed, 42);
        assert_eq!(config.training.test_fraction, 0.2);
        assert_eq!(config.training.gbdt_config(), GbdtConfig::default());
        assert_eq!(config.estimation.weak_price_floor, 1000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = PricingConfig::from_toml_str(
            r#"
            data_path = "listings.csv"

            [training]
            seed = 7
            trim_outliers_on = "year"
            "#,
        )
        .unwrap();

        assert_eq!(config.data_path, PathBuf::from("listings.csv"));
        assert_eq!(config.training.seed, 7);
        assert_eq!(config.training.trim_outliers_on, OutlierTrim::Year);
        assert_eq!(config.training.num_trees, 100);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = [
            ("CARPRICE_SEED", "9"),
            ("CARPRICE_TRIM_ON", "YEAR"),
            ("CARPRICE_DATA", "/tmp/cars.csv"),
        ]
        .into_iter()
        .collect();

        let mut config = PricingConfig::default();
        config
            .apply_env_overrides(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.training.seed, 9);
        assert_eq!(config.training.trim_outliers_on, OutlierTrim::Year);
        assert_eq!(config.data_path, PathBuf::from("/tmp/cars.csv"));
    }

    #[test]
    fn test_bad_env_value_is_rejected() {
        let mut config = PricingConfig::default();
        let err = config
            .apply_env_overrides(|key| (key == "CARPRICE_TREES").then(|| "many".to_string()))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Env { .. }));
    }

    #[test]
    fn test_validate_rejects_bad_fraction() {
        let mut config = PricingConfig::default();
        config.training.test_fraction = 1.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "training.test_fraction",
                ..
            })
        ));
    }
}
