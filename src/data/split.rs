//! Seeded train / validation / hold-out partitioning

use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use super::Dataset;
use crate::error::{RegressionError, Result};

/// Share of rows used for training
pub const TRAINING_RATIO: f64 = 0.72;
/// Share of rows used for validation
pub const VALIDATION_RATIO: f64 = 0.18;
/// Nominal hold-out share; the hold-out set actually receives the remainder
pub const HOLDOUT_RATIO: f64 = 0.10;

/// Disjoint training, validation and hold-out partitions of one dataset
#[derive(Debug, Clone)]
pub struct DataSplit {
    pub training: Dataset,
    pub validation: Dataset,
    pub holdout: Dataset,
}

impl DataSplit {
    /// Training and validation rows merged, training rows first
    pub fn training_and_validation(&self) -> Result<Dataset> {
        Dataset::concat(&[&self.training, &self.validation])
    }
}

fn shuffled_indices(n: usize, seed: u64) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..n).collect();
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    indices.shuffle(&mut rng);
    indices
}

/// Partition `data` 72 / 18 / 10 after a seeded shuffle.
///
/// Training and validation sizes are rounded; the hold-out set takes whatever
/// is left, so its share can drift slightly from 10%.
pub fn split_data(data: &Dataset, seed: u64) -> Result<DataSplit> {
    let n = data.n_rows();
    let n_train = ((n as f64 * TRAINING_RATIO).round() as usize).min(n);
    let n_val = ((n as f64 * VALIDATION_RATIO).round() as usize).min(n - n_train);

    let indices = shuffled_indices(n, seed);
    Ok(DataSplit {
        training: data.select_rows(&indices[..n_train])?,
        validation: data.select_rows(&indices[n_train..n_train + n_val])?,
        holdout: data.select_rows(&indices[n_train + n_val..])?,
    })
}

/// Divide `data` into `parts` shuffled subsets of size `n / parts`; the first
/// `n % parts` subsets receive one extra row each.
pub fn divide_into(data: &Dataset, parts: usize, seed: u64) -> Result<Vec<Dataset>> {
    if parts == 0 {
        return Err(RegressionError::InvalidInput(
            "cannot divide a dataset into zero parts".to_string(),
        ));
    }

    let n = data.n_rows();
    let base = n / parts;
    let remainder = n % parts;
    let indices = shuffled_indices(n, seed);

    let mut subsets = Vec::with_capacity(parts);
    let mut start = 0;
    for i in 0..parts {
        let size = if i < remainder { base + 1 } else { base };
        subsets.push(data.select_rows(&indices[start..start + size])?);
        start += size;
    }
    Ok(subsets)
}
