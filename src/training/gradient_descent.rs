//! Multi-feature linear regression trained by batch gradient descent
//!
//! Weights and intercept start at zero. Each epoch computes the mean squared
//! residual, stops once the absolute change from the previous epoch drops
//! below `convergence_threshold`, and otherwise steps against
//! `dcost/dw_j = -(2/n) * sum(x_ij * r_i)` and `dcost/db = -(2/n) * sum(r_i)`.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::Hyperparameter;
use crate::error::{RegressionError, Result};

use super::model::{ensure_training_data, ensure_width, FitSummary, Regressor};

/// Learning rates swept when no grid is configured
pub const DEFAULT_LEARNING_RATES: [f64; 5] = [1.0, 0.75, 0.5, 0.25, 0.1];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradientDescentConfig {
    pub learning_rate: f64,
    pub max_epochs: usize,
    /// Absolute, not relative, change in cost
    pub convergence_threshold: f64,
}

impl Default for GradientDescentConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            max_epochs: 1000,
            convergence_threshold: 0.1,
        }
    }
}

impl GradientDescentConfig {
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_max_epochs(mut self, max_epochs: usize) -> Self {
        self.max_epochs = max_epochs;
        self
    }

    pub fn with_convergence_threshold(mut self, threshold: f64) -> Self {
        self.convergence_threshold = threshold;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(RegressionError::ConfigError(format!(
                "learning rate must be positive, got {}",
                self.learning_rate
            )));
        }
        if self.max_epochs == 0 {
            return Err(RegressionError::ConfigError(
                "max_epochs must be at least 1".to_string(),
            ));
        }
        if !(self.convergence_threshold >= 0.0) {
            return Err(RegressionError::ConfigError(format!(
                "convergence threshold must be non-negative, got {}",
                self.convergence_threshold
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MultiLinearRegression {
    config: GradientDescentConfig,
    features: Vec<String>,
    weights: Option<Array1<f64>>,
    intercept: f64,
    last_fit: Option<FitSummary>,
}

impl MultiLinearRegression {
    pub fn new(config: GradientDescentConfig, features: Vec<String>) -> Self {
        Self {
            config,
            features,
            weights: None,
            intercept: 0.0,
            last_fit: None,
        }
    }

    pub fn config(&self) -> &GradientDescentConfig {
        &self.config
    }

    pub fn weights(&self) -> Option<&Array1<f64>> {
        self.weights.as_ref()
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    /// Summary of the most recent fit
    pub fn last_fit(&self) -> Option<FitSummary> {
        self.last_fit
    }
}

impl Regressor for MultiLinearRegression {
    fn name(&self) -> &str {
        "Multi-linear regression (gradient descent)"
    }

    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<FitSummary> {
        ensure_training_data(x, y)?;
        self.config.validate()?;

        let n = x.nrows() as f64;
        let lr = self.config.learning_rate;
        let mut w: Array1<f64> = Array1::zeros(x.ncols());
        let mut b = 0.0;
        let mut prev_cost: Option<f64> = None;
        let mut last_change = f64::INFINITY;
        let mut summary = None;

        for epoch in 1..=self.config.max_epochs {
            let residuals = y - &(x.dot(&w) + b);
            let cost = residuals.mapv(|r| r * r).sum() / n;
            if !cost.is_finite() {
                return Err(RegressionError::Diverged {
                    epoch,
                    learning_rate: lr,
                });
            }

            if let Some(prev) = prev_cost {
                last_change = (prev - cost).abs();
                if last_change < self.config.convergence_threshold {
                    debug!(epoch, cost, "gradient descent converged");
                    summary = Some(FitSummary::Converged { epochs: epoch });
                    break;
                }
            }

            let grad_w = x.t().dot(&residuals) * (-2.0 / n);
            let grad_b = -2.0 / n * residuals.sum();
            w.scaled_add(-lr, &grad_w);
            b -= lr * grad_b;
            prev_cost = Some(cost);
        }

        let summary = summary.unwrap_or_else(|| {
            warn!(
                epochs = self.config.max_epochs,
                last_change,
                learning_rate = lr,
                "gradient descent did not converge"
            );
            FitSummary::NotConverged {
                epochs: self.config.max_epochs,
                last_change,
            }
        });

        self.weights = Some(w);
        self.intercept = b;
        self.last_fit = Some(summary);
        Ok(summary)
    }

    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let w = self.weights.as_ref().ok_or(RegressionError::ModelNotFitted)?;
        ensure_width(w.len(), x)?;
        Ok(x.dot(w) + self.intercept)
    }

    fn features(&self) -> &[String] {
        &self.features
    }

    fn set_features(&mut self, features: Vec<String>) -> Result<()> {
        if features.is_empty() {
            return Err(RegressionError::ConfigError(
                "multi-linear regression needs at least one feature".to_string(),
            ));
        }
        self.features = features;
        Ok(())
    }

    fn default_tuning_grid(&self) -> Vec<Hyperparameter> {
        DEFAULT_LEARNING_RATES
            .iter()
            .map(|&lr| Hyperparameter::LearningRate(lr))
            .collect()
    }

    fn apply(&mut self, setting: &Hyperparameter) -> Result<()> {
        match setting {
            Hyperparameter::LearningRate(lr) => {
                setting.validate()?;
                self.config.learning_rate = *lr;
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
        format!(
            "learning rate = {}, max epochs = {}, convergence threshold = {}",
            self.config.learning_rate, self.config.max_epochs, self.config.convergence_threshold
        )
    }
}
