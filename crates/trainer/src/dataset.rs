//! Integer training matrix and seeded train/test splitting
//!
//! Features and targets are fixed-point integers. `target_scale` records how
//! the targets were scaled so a fitted model can report in natural units.

use crate::deterministic::LcgRng;
use crate::errors::TrainerError;

/// Training dataset with integer features and targets
#[derive(Clone, Debug, PartialEq)]
pub struct Dataset {
    pub features: Vec<Vec<i64>>,
    pub targets: Vec<i64>,
    pub feature_count: usize,
    pub target_scale: i64,
}

impl Dataset {
    /// Build a dataset, checking that every row has `feature_count` columns
    pub fn new(
        features: Vec<Vec<i64>>,
        targets: Vec<i64>,
        feature_count: usize,
        target_scale: i64,
    ) -> Result<Self, TrainerError> {
        if features.len() != targets.len() {
            return Err(TrainerError::Dataset(format!(
                "{} feature rows but {} targets",
                features.len(),
                targets.len()
            )));
        }
        if let Some((idx, row)) = features
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != feature_count)
        {
            return Err(TrainerError::Dataset(format!(
                "Row {}: expected {} features, got {}",
                idx,
                feature_count,
                row.len()
            )));
        }
        if target_scale <= 0 {
            return Err(TrainerError::Dataset(format!(
                "Invalid target scale: {target_scale}"
            )));
        }

        Ok(Self {
            features,
            targets,
            feature_count,
            target_scale,
        })
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Rows at the given indices, in that order
    pub fn select(&self, indices: &[usize]) -> Self {
        Self {
            features: indices.iter().map(|&i| self.features[i].clone()).collect(),
            targets: indices.iter().map(|&i| self.targets[i]).collect(),
            feature_count: self.feature_count,
            target_scale: self.target_scale,
        }
    }

    /// Targets converted back to natural units
    pub fn natural_targets(&self) -> Vec<f64> {
        self.targets
            .iter()
            .map(|&t| t as f64 / self.target_scale as f64)
            .collect()
    }

    /// Seeded shuffle-split into `(train, test)`.
    ///
    /// The test side receives `ceil(len * test_fraction)` rows. Fails when
    /// either side would be empty.
    pub fn train_test_split(
        &self,
        test_fraction: f64,
        seed: u64,
    ) -> Result<(Self, Self), TrainerError> {
        if !(test_fraction > 0.0 && test_fraction < 1.0) {
            return Err(TrainerError::Dataset(format!(
                "test fraction must be in (0, 1), got {test_fraction}"
            )));
        }

        let n = self.len();
        let n_test = (n as f64 * test_fraction).ceil() as usize;
        let n_train = n.saturating_sub(n_test);
        if n_test == 0 || n_train == 0 {
            return Err(TrainerError::InsufficientSamples {
                samples: n,
                reason: format!(
                    "a {test_fraction} test split leaves {n_train} training and {n_test} test rows"
                ),
            });
        }

        let mut permutation: Vec<usize> = (0..n).collect();
        LcgRng::new(seed).shuffle(&mut permutation);
        let (test_idx, train_idx) = permutation.split_at(n_test);

        Ok((self.select(train_idx), self.select(test_idx)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing_rows(n: usize) -> Dataset {
        let features = (0..n)
            .map(|i| vec![2015 + (i % 6) as i64, 10_000 + 1_000 * i as i64])
            .collect();
        let targets = (0..n).map(|i| 1_000_000 + 10_000 * i as i64).collect();
        Dataset::new(features, targets, 2, 100).unwrap()
    }

    #[test]
    fn test_rejects_ragged_rows() {
        let err = Dataset::new(vec![vec![1, 2], vec![3]], vec![1, 2], 2, 1).unwrap_err();
        assert!(matches!(err, TrainerError::Dataset(_)));
    }

    #[test]
    fn test_split_sizes_round_test_side_up() {
        let data = listing_rows(11);
        let (train, test) = data.train_test_split(0.2, 42).unwrap();
        assert_eq!(test.len(), 3);
        assert_eq!(train.len(), 8);
    }

    #[test]
    fn test_split_is_deterministic_and_disjoint() {
        let data = listing_rows(50);
        let (train_a, test_a) = data.train_test_split(0.2, 42).unwrap();
        let (train_b, test_b) = data.train_test_split(0.2, 42).unwrap();
        assert_eq!(train_a, train_b);
        assert_eq!(test_a, test_b);

        // mileage is unique per row
        let mut seen: Vec<i64> = train_a
            .features
            .iter()
            .chain(test_a.features.iter())
            .map(|row| row[1])
            .collect();
        seen.sort_unstable();
        seen.dedup();
        assert_eq!(seen.len(), 50);
    }

    #[test]
    fn test_split_of_single_row_is_insufficient() {
        let data = listing_rows(1);
        let err = data.train_test_split(0.2, 42).unwrap_err();
        assert!(err.is_insufficient_data());
    }

    #[test]
    fn test_natural_targets() {
        let data = listing_rows(3);
        assert_eq!(data.natural_targets(), vec![10_000.0, 10_100.0, 10_200.0]);
    }
}
