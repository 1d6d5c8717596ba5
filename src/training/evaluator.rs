//! Model evaluation lifecycle
//!
//! [`ModelEvaluator`] drives one regressor through
//! `Raw -> Preprocessed -> Split -> Validated -> Tuned -> HoldoutTested`.
//! Each operation checks the current state and either advances it, repeats
//! harmlessly within the same state, or fails with
//! [`RegressionError::InvalidState`].

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::config::{EvaluationConfig, Hyperparameter};
use crate::data::{split_data, DataSplit, Dataset};
use crate::error::{RegressionError, Result};
use crate::metrics::ErrorReport;
use crate::preprocessing::{
    rank_features, remove_outliers, FeatureRanking, OutlierMethod, PreprocessReport,
};

use super::cross_validation::{fit_and_score, CrossValidationReport, CrossValidator, Folds};
use super::model::LifecycleState::{self, *};
use super::model::Regressor;

/// Cross-validated metrics for one feature subset
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureStep {
    pub features: Vec<String>,
    /// Feature new to this step
    pub added: String,
    pub report: ErrorReport,
}

/// One setting tried during fine-tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuningTrial {
    pub setting: Hyperparameter,
    /// `None` when the setting was skipped
    pub report: Option<ErrorReport>,
    pub skipped: Option<String>,
}

/// Outcome of fine-tuning
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuningReport {
    pub model: String,
    pub report: ErrorReport,
    /// Winning setting; `None` when there was nothing to sweep
    pub chosen: Option<Hyperparameter>,
    pub features: Vec<String>,
    pub trials: Vec<TuningTrial>,
    pub conclusion: String,
}

impl fmt::Display for TuningReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.conclusion)
    }
}

/// Drives a regressor through preprocessing, validation, tuning and the
/// final hold-out test
#[derive(Debug)]
pub struct ModelEvaluator<M: Regressor> {
    model: M,
    config: EvaluationConfig,
    state: LifecycleState,
    raw: Option<Dataset>,
    prepared: Option<Dataset>,
    preprocess_report: Option<PreprocessReport>,
    splits: Option<DataSplit>,
    last_validation: Option<CrossValidationReport>,
    tuning: Option<TuningReport>,
    holdout: Option<ErrorReport>,
}

impl<M: Regressor> ModelEvaluator<M> {
    pub fn new(model: M, data: Dataset, config: EvaluationConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            model,
            config,
            state: Raw,
            raw: Some(data),
            prepared: None,
            preprocess_report: None,
            splits: None,
            last_validation: None,
            tuning: None,
            holdout: None,
        })
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn config(&self) -> &EvaluationConfig {
        &self.config
    }

    pub fn prepared_data(&self) -> Option<&Dataset> {
        self.prepared.as_ref()
    }

    pub fn splits(&self) -> Option<&DataSplit> {
        self.splits.as_ref()
    }

    pub fn preprocess_report(&self) -> Option<&PreprocessReport> {
        self.preprocess_report.as_ref()
    }

    pub fn last_cross_validation(&self) -> Option<&CrossValidationReport> {
        self.last_validation.as_ref()
    }

    pub fn tuning_report(&self) -> Option<&TuningReport> {
        self.tuning.as_ref()
    }

    pub fn holdout_report(&self) -> Option<ErrorReport> {
        self.holdout
    }

    fn require(&self, operation: &'static str, allowed: &[LifecycleState]) -> Result<()> {
        if allowed.contains(&self.state) {
            Ok(())
        } else {
            Err(RegressionError::InvalidState {
                operation,
                state: self.state,
            })
        }
    }

    fn current_splits(&self) -> Result<&DataSplit> {
        self.splits.as_ref().ok_or_else(|| {
            RegressionError::InvalidInput("dataset has not been split".to_string())
        })
    }

    /// Run the profile's preprocessing plan over the raw data.
    ///
    /// The raw dataset is moved into the plan; if a step fails it is gone and
    /// a new evaluator has to be built.
    pub fn preprocess_data(&mut self) -> Result<&PreprocessReport> {
        self.require("preprocess data", &[Raw, Preprocessed])?;
        if self.state == Raw {
            let raw = self.raw.take().ok_or_else(|| {
                RegressionError::InvalidInput("raw dataset is no longer available".to_string())
            })?;
            let (prepared, report) = self.config.profile.preprocessing.apply(raw)?;
            info!(
                model = self.model.name(),
                rows = prepared.n_rows(),
                columns = prepared.n_columns(),
                "data preprocessed"
            );
            self.prepared = Some(prepared);
            self.preprocess_report = Some(report);
            self.state = Preprocessed;
        }
        self.preprocess_report.as_ref().ok_or_else(|| {
            RegressionError::InvalidInput("preprocessing report missing".to_string())
        })
    }

    /// Partition the prepared data 72 / 18 / 10
    pub fn split_data(&mut self) -> Result<&DataSplit> {
        self.require("split data", &[Preprocessed, Split])?;
        if self.state == Preprocessed {
            let prepared = self.prepared.as_ref().ok_or_else(|| {
                RegressionError::InvalidInput("dataset has not been preprocessed".to_string())
            })?;
            let split = split_data(prepared, self.config.seed)?;
            info!(
                training = split.training.n_rows(),
                validation = split.validation.n_rows(),
                holdout = split.holdout.n_rows(),
                "data split"
            );
            self.splits = Some(split);
            self.state = Split;
        }
        self.current_splits()
    }

    /// Rank the profile's candidate columns against the target on the
    /// training split. Diagnostic only.
    pub fn select_features(&self) -> Result<FeatureRanking> {
        self.require("select features", &[Split, Validated, Tuned, HoldoutTested])?;
        let columns = &self.config.profile.ranking_columns;
        if !self.model.ranks_features() || columns.is_empty() {
            return Ok(FeatureRanking::default());
        }

        let splits = self.current_splits()?;
        let ranking = rank_features(&splits.training, &self.config.target_column, columns)?;
        info!(
            model = self.model.name(),
            order = ?ranking.ordered_features(),
            "features ranked"
        );
        Ok(ranking)
    }

    fn run_cross_validation(&self, model: &M, split: &DataSplit) -> Result<CrossValidationReport> {
        let folds = Folds::from_split(split, self.config.seed)?;
        CrossValidator::new(self.config.target_column.clone())
            .with_parallel(self.config.parallel)
            .validate(model, &folds)
    }

    /// Five-rotation cross-validation of the current model
    pub fn cross_validate(&mut self) -> Result<CrossValidationReport> {
        self.require("cross-validate", &[Split, Validated])?;
        let report = self.run_cross_validation(&self.model, self.current_splits()?)?;
        info!(model = self.model.name(), report = %report.report, "cross-validated");
        self.last_validation = Some(report.clone());
        self.state = Validated;
        Ok(report)
    }

    /// Cross-validate each feature subset the model derives from the
    /// profile's candidate list. The evaluator's own model is not changed.
    pub fn evaluate_feature_selection(&mut self) -> Result<Vec<FeatureStep>> {
        self.require("evaluate feature selection", &[Split, Validated])?;
        let splits = self.current_splits()?;
        let mut trial_model = self.model.clone();
        let mut steps = Vec::new();

        for subset in trial_model.feature_subsets(&self.config.profile.candidate_features) {
            let added = subset.last().cloned().unwrap_or_default();
            trial_model.set_features(subset.clone())?;
            let cv = self.run_cross_validation(&trial_model, splits)?;
            info!(
                model = trial_model.name(),
                n_features = subset.len(),
                added = added.as_str(),
                report = %cv.report,
                "feature subset evaluated"
            );
            steps.push(FeatureStep {
                features: subset,
                added,
                report: cv.report,
            });
        }

        self.state = Validated;
        Ok(steps)
    }

    /// The prepared data with z-score outliers in `column` removed, re-split
    fn filtered_split(&self, column: &str, threshold: f64) -> Result<DataSplit> {
        let prepared = self.prepared.clone().ok_or_else(|| {
            RegressionError::InvalidInput("dataset has not been preprocessed".to_string())
        })?;
        let (filtered, _) = remove_outliers(prepared, column, &OutlierMethod::ZScore { threshold })?;
        split_data(&filtered, self.config.seed)
    }

    /// Sweep the tuning grid, keep the setting with the lowest cross-validated
    /// RMSE, and leave the model configured with it.
    ///
    /// Settings that make gradient descent diverge are recorded as skipped;
    /// any other error aborts the sweep.
    pub fn fine_tune_model(&mut self) -> Result<TuningReport> {
        self.require("fine-tune", &[Split, Validated, Tuned])?;
        let profile = &self.config.profile;

        let mut base = self.model.clone();
        if !profile.tuning_features.is_empty() {
            base.set_features(profile.tuning_features.clone())?;
        }
        let grid = if profile.tuning_grid.is_empty() {
            base.default_tuning_grid()
        } else {
            profile.tuning_grid.clone()
        };

        let mut trials = Vec::with_capacity(grid.len());
        let mut best: Option<(Hyperparameter, ErrorReport, Option<DataSplit>)> = None;

        for setting in &grid {
            setting.validate()?;
            let outcome = match setting {
                Hyperparameter::OutlierThreshold { column, threshold } => {
                    let split = self.filtered_split(column, *threshold)?;
                    self.run_cross_validation(&base, &split)
                        .map(|cv| (cv, Some(split)))
                }
                _ => {
                    let mut candidate = base.clone();
                    candidate.apply(setting)?;
                    self.run_cross_validation(&candidate, self.current_splits()?)
                        .map(|cv| (cv, None))
                }
            };

            match outcome {
                Ok((cv, split)) => {
                    info!(setting = %setting, rmse = cv.report.rmse, "tuning trial");
                    let better = best
                        .as_ref()
                        .map_or(true, |(_, report, _)| cv.report.rmse < report.rmse);
                    if better {
                        best = Some((setting.clone(), cv.report, split));
                    }
                    trials.push(TuningTrial {
                        setting: setting.clone(),
                        report: Some(cv.report),
                        skipped: None,
                    });
                }
                Err(err @ RegressionError::Diverged { .. }) => {
                    warn!(setting = %setting, error = %err, "tuning setting skipped");
                    trials.push(TuningTrial {
                        setting: setting.clone(),
                        report: None,
                        skipped: Some(err.to_string()),
                    });
                }
                Err(err) => return Err(err),
            }
        }

        let (chosen, report) = if grid.is_empty() {
            let cv = self.run_cross_validation(&base, self.current_splits()?)?;
            (None, cv.report)
        } else {
            let (setting, report, split) = best.ok_or_else(|| {
                RegressionError::ConfigError("every tuning setting diverged".to_string())
            })?;
            match split {
                Some(split) => self.splits = Some(split),
                None => base.apply(&setting)?,
            }
            (Some(setting), report)
        };

        let features = base.features().to_vec();
        let hyperparameters = match &chosen {
            Some(setting) if setting.is_preprocessing() => setting.to_string(),
            _ => base.describe_hyperparameters(),
        };
        let conclusion = format!(
            "{}:\nErrors: MAE = {}, RMSE = {}, R-Squared = {}, Adjusted R-Squared = {}\nHyperparameters: {}\nFeatures: {}",
            base.name(),
            report.mae,
            report.rmse,
            report.r_squared,
            report.adjusted_r_squared,
            hyperparameters,
            if features.is_empty() {
                "none".to_string()
            } else {
                features.join(", ")
            }
        );
        info!(model = base.name(), chosen = %hyperparameters, rmse = report.rmse, "fine-tuning complete");

        let tuning = TuningReport {
            model: base.name().to_string(),
            report,
            chosen,
            features,
            trials,
            conclusion,
        };
        self.model = base;
        self.tuning = Some(tuning.clone());
        self.state = Tuned;
        Ok(tuning)
    }

    /// Apply the profile's final features and hyperparameters
    pub fn set_final_hyperparameters(&mut self) -> Result<()> {
        self.require("set final hyperparameters", &[Split, Validated, Tuned])?;
        let profile = self.config.profile.clone();

        if !profile.final_features.is_empty() {
            self.model.set_features(profile.final_features)?;
        }
        for setting in &profile.final_hyperparameters {
            setting.validate()?;
            match setting {
                Hyperparameter::OutlierThreshold { column, threshold } => {
                    self.splits = Some(self.filtered_split(column, *threshold)?);
                }
                _ => self.model.apply(setting)?,
            }
        }
        info!(
            model = self.model.name(),
            features = ?self.model.features(),
            hyperparameters = %self.model.describe_hyperparameters(),
            "final hyperparameters set"
        );
        Ok(())
    }

    /// Train on training + validation, score once on the hold-out set
    pub fn test_with_holdout_data(&mut self) -> Result<ErrorReport> {
        self.require("test with hold-out data", &[Split, Validated, Tuned, HoldoutTested])?;
        if let (HoldoutTested, Some(report)) = (self.state, self.holdout) {
            return Ok(report);
        }

        self.set_final_hyperparameters()?;
        let splits = self.current_splits()?;
        let training = splits.training_and_validation()?;
        let holdout = splits.holdout.clone();

        let (report, fit) =
            fit_and_score(&mut self.model, &training, &holdout, &self.config.target_column)?;
        if !fit.is_converged() {
            warn!(model = self.model.name(), ?fit, "hold-out fit did not converge");
        }
        let report = report.rounded();
        info!(model = self.model.name(), report = %report, "hold-out tested");

        self.holdout = Some(report);
        self.state = HoldoutTested;
        Ok(report)
    }
}
