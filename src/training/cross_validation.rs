//! Five-rotation cross-validation
//!
//! The five partitions are the validation split followed by four shuffled
//! subsets of the training split. Rotation `i` validates on partition `i` and
//! trains on the other four merged in partition order.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::{divide_into, DataSplit, Dataset};
use crate::error::{RegressionError, Result};
use crate::metrics::{ErrorMetrics, ErrorReport};

use super::model::{FitSummary, Regressor};

/// Number of rotations (and partitions)
pub const CV_ROTATIONS: usize = 5;

/// Materialised cross-validation partitions
#[derive(Debug, Clone)]
pub struct Folds {
    partitions: Vec<Dataset>,
}

impl Folds {
    /// Validation split plus the training split divided into four
    pub fn from_split(split: &DataSplit, seed: u64) -> Result<Self> {
        let mut partitions = Vec::with_capacity(CV_ROTATIONS);
        partitions.push(split.validation.clone());
        partitions.extend(divide_into(&split.training, CV_ROTATIONS - 1, seed)?);
        Ok(Self { partitions })
    }

    pub fn partitions(&self) -> &[Dataset] {
        &self.partitions
    }

    /// Owned (training fold, validation fold) for one rotation
    pub fn rotation(&self, index: usize) -> Result<(Dataset, Dataset)> {
        let validation = self.partitions.get(index).ok_or_else(|| {
            RegressionError::InvalidInput(format!(
                "rotation {} out of range for {} partitions",
                index,
                self.partitions.len()
            ))
        })?;
        let training_parts: Vec<&Dataset> = self
            .partitions
            .iter()
            .enumerate()
            .filter(|(j, _)| *j != index)
            .map(|(_, p)| p)
            .collect();
        Ok((Dataset::concat(&training_parts)?, validation.clone()))
    }
}

/// Result of one rotation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FoldOutcome {
    pub rotation: usize,
    pub report: ErrorReport,
    pub fit: FitSummary,
    pub n_train: usize,
    pub n_validation: usize,
}

/// Averaged cross-validation result with per-rotation detail
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossValidationReport {
    /// Mean of every metric over the rotations, rounded
    pub report: ErrorReport,
    pub folds: Vec<FoldOutcome>,
}

impl CrossValidationReport {
    /// Whether every rotation's fit converged
    pub fn all_converged(&self) -> bool {
        self.folds.iter().all(|f| f.fit.is_converged())
    }
}

/// Fit on `training`, predict `validation`, score the predictions
pub(crate) fn fit_and_score<M: Regressor>(
    model: &mut M,
    training: &Dataset,
    validation: &Dataset,
    target: &str,
) -> Result<(ErrorReport, FitSummary)> {
    let x_train = training.feature_matrix(model.features())?;
    let y_train = training.target(target)?;
    let fit = model.fit(&x_train, &y_train)?;

    let x_val = validation.feature_matrix(model.features())?;
    let y_val = validation.target(target)?;
    let predicted = model.predict(&x_val)?;
    let report = ErrorMetrics::new(&predicted, &y_val)?.report(model.n_predictors())?;
    Ok((report, fit))
}

/// Cross-validation runner
#[derive(Debug, Clone)]
pub struct CrossValidator {
    target: String,
    parallel: bool,
}

impl CrossValidator {
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            parallel: false,
        }
    }

    /// Run rotations on the rayon pool
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Validate clones of `model` over every rotation; the first error aborts.
    pub fn validate<M: Regressor>(&self, model: &M, folds: &Folds) -> Result<CrossValidationReport> {
        let n = folds.partitions().len();
        let outcomes: Vec<FoldOutcome> = if self.parallel {
            (0..n)
                .into_par_iter()
                .map(|i| self.run_rotation(model, folds, i))
                .collect::<Result<Vec<_>>>()?
        } else {
            (0..n)
                .map(|i| self.run_rotation(model, folds, i))
                .collect::<Result<Vec<_>>>()?
        };

        let reports: Vec<ErrorReport> = outcomes.iter().map(|o| o.report).collect();
        let report = ErrorReport::mean(&reports)?.rounded();
        Ok(CrossValidationReport {
            report,
            folds: outcomes,
        })
    }

    fn run_rotation<M: Regressor>(&self, model: &M, folds: &Folds, rotation: usize) -> Result<FoldOutcome> {
        let (training, validation) = folds.rotation(rotation)?;
        let mut model = model.clone();
        let (report, fit) = fit_and_score(&mut model, &training, &validation, &self.target)?;
        debug!(
            model = model.name(),
            rotation,
            n_train = training.n_rows(),
            n_validation = validation.n_rows(),
            rmse = report.rmse,
            "cross-validation rotation"
        );
        Ok(FoldOutcome {
            rotation,
            report,
            fit,
            n_train: training.n_rows(),
            n_validation: validation.n_rows(),
        })
    }
}
