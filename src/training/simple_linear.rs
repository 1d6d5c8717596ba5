//! Simple linear regression
//!
//! Closed-form ordinary least squares on exactly one feature:
//! `m = cov(x, y) / var(x)`, `b = mean(y) - m * mean(x)`. Both moments use
//! the sample (n - 1) divisor so the ratio is unbiased.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::config::Hyperparameter;
use crate::error::{RegressionError, Result};
use crate::stats;

use super::model::{ensure_training_data, ensure_width, FitSummary, Regressor};

/// z-score thresholds swept for outliers in the model's feature
pub const DEFAULT_OUTLIER_THRESHOLDS: [f64; 17] = [
    2.0, 2.5, 3.0, 3.5, 4.0, 4.5, 5.0, 5.5, 6.0, 6.5, 7.0, 7.5, 8.0, 8.5, 9.0, 9.5, 10.0,
];

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimpleLinearRegression {
    features: Vec<String>,
    slope: Option<f64>,
    intercept: Option<f64>,
}

impl SimpleLinearRegression {
    pub fn new(feature: impl Into<String>) -> Self {
        Self {
            features: vec![feature.into()],
            slope: None,
            intercept: None,
        }
    }

    pub fn feature(&self) -> &str {
        self.features.first().map(String::as_str).unwrap_or_default()
    }

    pub fn slope(&self) -> Option<f64> {
        self.slope
    }

    pub fn intercept(&self) -> Option<f64> {
        self.intercept
    }
}

impl Regressor for SimpleLinearRegression {
    fn name(&self) -> &str {
        "Simple linear regression"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<FitSummary> {
        ensure_training_data(x, y)?;
        ensure_width(1, x)?;

        let xs = x.column(0).to_vec();
        let ys = y.to_vec();
        let var_x = stats::sample_variance(&xs)?;
        if var_x == 0.0 {
            return Err(RegressionError::InvalidInput(format!(
                "feature '{}' has zero variance",
                self.feature()
            )));
        }

        let slope = stats::covariance(&xs, &ys)? / var_x;
        let intercept = stats::mean(&ys)? - slope * stats::mean(&xs)?;
        self.slope = Some(slope);
        self.intercept = Some(intercept);
        Ok(FitSummary::Closed)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let (slope, intercept) = match (self.slope, self.intercept) {
            (Some(m), Some(b)) => (m, b),
            _ => return Err(RegressionError::ModelNotFitted),
        };
        ensure_width(1, x)?;
        Ok(x.column(0).mapv(|v| slope * v + intercept))
    }

    fn features(&self) -> &[String] {
        &self.features
    }

    fn set_features(&mut self, features: Vec<String>) -> Result<()> {
        if features.len() != 1 {
            return Err(RegressionError::ConfigError(format!(
                "simple linear regression takes exactly one feature, got {}",
                features.len()
            )));
        }
        self.features = features;
        Ok(())
    }

    fn default_tuning_grid(&self) -> Vec<Hyperparameter> {
        DEFAULT_OUTLIER_THRESHOLDS
            .iter()
            .map(|&threshold| Hyperparameter::OutlierThreshold {
                column: self.feature().to_string(),
                threshold,
            })
            .collect()
    }

    fn describe_hyperparameters(&self) -> String {
        match (self.slope, self.intercept) {
            (Some(m), Some(b)) => format!("slope = {}, intercept = {}", m, b),
            _ => "none".to_string(),
        }
    }

    /// One candidate at a time
    fn feature_subsets(&self, candidates: &[String]) -> Vec<Vec<String>> {
        candidates.iter().map(|c| vec![c.clone()]).collect()
    }
}
