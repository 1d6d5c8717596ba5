//! Regressor trait and lifecycle types

use std::fmt;

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::config::Hyperparameter;
use crate::error::{RegressionError, Result};

/// Outcome of a single `fit` call
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum FitSummary {
    /// Closed-form or lazy fit, nothing to converge
    Closed,
    /// Iterative fit met its convergence test
    Converged { epochs: usize },
    /// Iterative fit ran out of epochs; parameters are usable but unverified
    NotConverged { epochs: usize, last_change: f64 },
}

impl FitSummary {
    pub fn is_converged(&self) -> bool {
        !matches!(self, FitSummary::NotConverged { .. })
    }

    /// Turn a non-converged fit into an error
    pub fn require_converged(self) -> Result<Self> {
        match self {
            FitSummary::NotConverged {
                epochs,
                last_change,
            } => Err(RegressionError::ConvergenceNotReached {
                epochs,
                last_change,
            }),
            other => Ok(other),
        }
    }
}

/// Where a model evaluation is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LifecycleState {
    Raw,
    Preprocessed,
    Split,
    Validated,
    Tuned,
    HoldoutTested,
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Raw => "raw",
            LifecycleState::Preprocessed => "preprocessed",
            LifecycleState::Split => "split",
            LifecycleState::Validated => "validated",
            LifecycleState::Tuned => "tuned",
            LifecycleState::HoldoutTested => "hold-out tested",
        };
        f.write_str(name)
    }
}

/// A regression algorithm that can take part in the evaluation lifecycle.
///
/// Implementors own their feature list and hyperparameters; the evaluator
/// builds feature matrices from [`Regressor::features`] and hands clones of
/// the model to each cross-validation rotation.
pub trait Regressor: Clone + Send + Sync + fmt::Debug {
    /// Display name used in reports
    fn name(&self) -> &str;

    /// Learn from a rows x features matrix and its targets
    fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<FitSummary>;

    /// Predict one value per row of `x`
    fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>>;

    /// Feature columns the model reads, in matrix order
    fn features(&self) -> &[String];

    fn set_features(&mut self, features: Vec<String>) -> Result<()>;

    /// Predictor count used by adjusted R²
    fn n_predictors(&self) -> usize {
        self.features().len()
    }

    /// Settings swept when the profile gives no grid
    fn default_tuning_grid(&self) -> Vec<Hyperparameter> {
        Vec::new()
    }

    /// Apply one model hyperparameter
    fn apply(&mut self, setting: &Hyperparameter) -> Result<()> {
        Err(RegressionError::ConfigError(format!(
            "{} does not accept '{}'",
            self.name(),
            setting
        )))
    }

    /// Human-readable summary of the current hyperparameters
    fn describe_hyperparameters(&self) -> String {
        "none".to_string()
    }

    /// Feature sets tried by feature-selection evaluation: growing prefixes
    fn feature_subsets(&self, candidates: &[String]) -> Vec<Vec<String>> {
        (1..=candidates.len())
            .map(|n| candidates[..n].to_vec())
            .collect()
    }

    /// Whether feature ranking means anything for this model
    fn ranks_features(&self) -> bool {
        true
    }
}

/// Reject a feature matrix whose width differs from what the model was fitted on
pub(crate) fn ensure_width(expected: usize, x: &Array2<f64>) -> Result<()> {
    if x.ncols() != expected {
        return Err(RegressionError::InvalidInput(format!(
            "expected {} feature columns, got {}",
            expected,
            x.ncols()
        )));
    }
    Ok(())
}

/// Reject empty or mismatched training data
pub(crate) fn ensure_training_data(x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
    if x.nrows() == 0 {
        return Err(RegressionError::InvalidInput(
            "cannot fit on an empty training set".to_string(),
        ));
    }
    if x.nrows() != y.len() {
        return Err(RegressionError::InvalidInput(format!(
            "{} feature rows but {} targets",
            x.nrows(),
            y.len()
        )));
    }
    Ok(())
}
