//! K-Nearest Neighbors regression
//!
//! Lazy learner: `fit` stores the training fold. Prediction is parallelized
//! over query rows with rayon; for each row the k nearest training rows by
//! Euclidean distance are found with a partial descending bubble sort
//! (k passes, O(k·n)), which leaves the k smallest distances at the tail.

use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::Hyperparameter;
use crate::error::{RegressionError, Result};

use super::model::{ensure_training_data, ensure_width, FitSummary, Regressor};

/// Neighbour counts swept when no grid is configured
pub const DEFAULT_K_VALUES: [usize; 6] = [5, 10, 20, 30, 40, 50];

/// Weighting scheme for neighbors
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum WeightScheme {
    /// All neighbors have equal weight
    #[default]
    Uniform,
    /// Closer neighbors have more weight (inverse distance)
    Distance,
}

/// KNN configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnnConfig {
    /// Number of neighbors
    pub n_neighbors: usize,
    /// Weighting scheme
    pub weights: WeightScheme,
}

impl Default for KnnConfig {
    fn default() -> Self {
        Self {
            n_neighbors: 10,
            weights: WeightScheme::Uniform,
        }
    }
}

/// K-Nearest Neighbors Regressor
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnnRegressor {
    config: KnnConfig,
    features: Vec<String>,
    x_train: Option<Array2<f64>>,
    y_train: Option<Array1<f64>>,
}

impl KnnRegressor {
    pub fn new(config: KnnConfig, features: Vec<String>) -> Self {
        Self {
            config,
            features,
            x_train: None,
            y_train: None,
        }
    }

    /// Create with default config and specified k
    pub fn with_k(k: usize, features: Vec<String>) -> Self {
        Self::new(
            KnnConfig {
                n_neighbors: k,
                ..Default::default()
            },
            features,
        )
    }

    pub fn config(&self) -> &KnnConfig {
        &self.config
    }
}

impl Regressor for KnnRegressor {
    fn name(&self) -> &str {
        "KNN regression"
    }

    /// Stores the training fold after checking k against its size
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<FitSummary> {
        ensure_training_data(x, y)?;
        let k = self.config.n_neighbors;
        if k == 0 || k > x.nrows() {
            return Err(RegressionError::InvalidInput(format!(
                "k = {} must lie in 1..={} (training rows)",
                k,
                x.nrows()
            )));
        }
        self.x_train = Some(x.clone());
        self.y_train = Some(y.clone());
        Ok(FitSummary::Closed)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (x_train, y_train) = match (&self.x_train, &self.y_train) {
            (Some(xt), Some(yt)) => (xt, yt),
            _ => return Err(RegressionError::ModelNotFitted),
        };
        ensure_width(x_train.ncols(), x)?;
        let k = self.config.n_neighbors;
        let weights = self.config.weights;

        let predictions: Vec<f64> = (0..x.nrows())
            .into_par_iter()
            .map(|i| {
                let neighbors = find_k_nearest(x.row(i), x_train, y_train, k);
                weighted_mean_from(&neighbors, weights)
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    fn features(&self) -> &[String] {
        &self.features
    }

    fn set_features(&mut self, features: Vec<String>) -> Result<()> {
        if features.is_empty() {
            return Err(RegressionError::ConfigError(
                "KNN regression needs at least one feature".to_string(),
            ));
        }
        self.features = features;
        Ok(())
    }

    fn default_tuning_grid(&self) -> Vec<Hyperparameter> {
        DEFAULT_K_VALUES.iter().map(|&k| Hyperparameter::K(k)).collect()
    }

    fn apply(&mut self, setting: &Hyperparameter) -> Result<()> {
        match setting {
            Hyperparameter::K(k) => {
                setting.validate()?;
                self.config.n_neighbors = *k;
                Ok(())
            }
            other => Err(RegressionError::ConfigError(format!(
                "{} does not accept '{}'",
                self.name(),
                other
            ))),
        }
    }

    fn describe_hyperparameters(&self) -> String {
        format!("k = {}", self.config.n_neighbors)
    }
}

/// (distance, target) pairs of the k nearest training rows
fn find_k_nearest(
    point: ArrayView1<f64>,
    x_train: &Array2<f64>,
    y_train: &Array1<f64>,
    k: usize,
) -> Vec<(f64, f64)> {
    let mut distances: Vec<(f64, f64)> = x_train
        .rows()
        .into_iter()
        .zip(y_train.iter())
        .map(|(row, &y)| (euclidean(point, row), y))
        .collect();

    bubble_sort_descending(&mut distances, k);
    let start = distances.len().saturating_sub(k);
    distances.split_off(start)
}

/// Run `passes` bubble passes, moving the smallest remaining distance to the
/// end each time
fn bubble_sort_descending(distances: &mut [(f64, f64)], passes: usize) {
    let n = distances.len();
    for pass in 0..passes.min(n) {
        for j in 0..n - 1 - pass {
            if distances[j].0 < distances[j + 1].0 {
                distances.swap(j, j + 1);
            }
        }
    }
}

fn euclidean(a: ArrayView1<f64>, b: ArrayView1<f64>) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(ai, bi)| {
            let d = ai - bi;
            d * d
        })
        .sum::<f64>()
        .sqrt()
}

/// Compute weighted mean for regression
fn weighted_mean_from(neighbors: &[(f64, f64)], weights: WeightScheme) -> f64 {
    let uniform = || neighbors.iter().map(|(_, y)| y).sum::<f64>() / neighbors.len() as f64;
    match weights {
        WeightScheme::Uniform => uniform(),
        WeightScheme::Distance => {
            let mut weighted_sum = 0.0;
            let mut weight_total = 0.0;
            for &(dist, y) in neighbors {
                let w = 1.0 / (dist + 1e-10);
                weighted_sum += w * y;
                weight_total += w;
            }
            if weight_total > 0.0 {
                weighted_sum / weight_total
            } else {
                uniform()
            }
        }
    }
}
