//! Mean baseline
//!
//! Predicts the training-target mean for every row. Any useful model has to
//! beat it.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{RegressionError, Result};
use crate::stats;

use super::model::{ensure_training_data, FitSummary, Regressor};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MeanBaseline {
    #[serde(skip)]
    features: Vec<String>,
    mean: Option<f64>,
}

impl MeanBaseline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fitted training mean
    pub fn mean(&self) -> Option<f64> {
        self.mean
    }
}

impl Regressor for MeanBaseline {
    fn name(&self) -> &str {
        "Mean baseline"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<FitSummary> {
        ensure_training_data(x, y)?;
        let values = y.to_vec();
        self.mean = Some(stats::mean(&values)?);
        Ok(FitSummary::Closed)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let mean = self.mean.ok_or(RegressionError::ModelNotFitted)?;
        Ok(Array1::from_elem(x.nrows(), mean))
    }

    fn features(&self) -> &[String] {
        &self.features
    }

    fn set_features(&mut self, features: Vec<String>) -> Result<()> {
        if !features.is_empty() {
            return Err(RegressionError::ConfigError(
                "the mean baseline uses no features".to_string(),
            ));
        }
        Ok(())
    }

    fn n_predictors(&self) -> usize {
        0
    }

    fn feature_subsets(&self, _candidates: &[String]) -> Vec<Vec<String>> {
        Vec::new()
    }

    fn ranks_features(&self) -> bool {
        false
    }
}
