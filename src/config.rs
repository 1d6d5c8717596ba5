//! Evaluation configuration
//!
//! Everything the lifecycle needs besides the data: which column is the
//! target, the shuffle seed, and a per-model [`ModelProfile`] describing
//! preprocessing, candidate features and the tuning grid.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{RegressionError, Result};
use crate::preprocessing::PreprocessingPlan;

/// A single tunable setting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Hyperparameter {
    /// Neighbour count for KNN
    K(usize),
    /// Step size for gradient descent
    LearningRate(f64),
    /// Remove rows whose |z-score| in `column` exceeds `threshold` before splitting
    OutlierThreshold { column: String, threshold: f64 },
}

impl Hyperparameter {
    /// Whether the setting changes the data rather than the model
    pub fn is_preprocessing(&self) -> bool {
        matches!(self, Hyperparameter::OutlierThreshold { .. })
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Hyperparameter::K(0) => Err(RegressionError::ConfigError(
                "k must be at least 1".to_string(),
            )),
            Hyperparameter::LearningRate(lr) if !lr.is_finite() || *lr <= 0.0 => Err(
                RegressionError::ConfigError(format!("learning rate must be positive, got {}", lr)),
            ),
            Hyperparameter::OutlierThreshold { threshold, .. }
                if !threshold.is_finite() || *threshold <= 0.0 =>
            {
                Err(RegressionError::ConfigError(format!(
                    "outlier threshold must be positive, got {}",
                    threshold
                )))
            }
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Hyperparameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Hyperparameter::K(k) => write!(f, "k = {}", k),
            Hyperparameter::LearningRate(lr) => write!(f, "learning rate = {}", lr),
            Hyperparameter::OutlierThreshold { column, threshold } => {
                write!(f, "z-score threshold for {} outliers = {}", column, threshold)
            }
        }
    }
}

/// Per-model choices that drive the lifecycle
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelProfile {
    /// Steps run by `preprocess_data`
    pub preprocessing: PreprocessingPlan,
    /// Columns ranked by `select_features`
    pub ranking_columns: Vec<String>,
    /// Hand-ordered candidates for `evaluate_feature_selection`
    pub candidate_features: Vec<String>,
    /// Features used while fine-tuning; empty keeps the model's current set
    pub tuning_features: Vec<String>,
    /// Settings swept by `fine_tune_model`; empty uses the model's default grid
    pub tuning_grid: Vec<Hyperparameter>,
    /// Features for the hold-out test; empty keeps the current set
    pub final_features: Vec<String>,
    /// Settings applied before the hold-out test
    pub final_hyperparameters: Vec<Hyperparameter>,
}

impl ModelProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_preprocessing(mut self, plan: PreprocessingPlan) -> Self {
        self.preprocessing = plan;
        self
    }

    pub fn with_ranking_columns(mut self, columns: &[&str]) -> Self {
        self.ranking_columns = to_strings(columns);
        self
    }

    pub fn with_candidate_features(mut self, features: &[&str]) -> Self {
        self.candidate_features = to_strings(features);
        self
    }

    pub fn with_tuning_features(mut self, features: &[&str]) -> Self {
        self.tuning_features = to_strings(features);
        self
    }

    pub fn with_tuning_grid(mut self, grid: Vec<Hyperparameter>) -> Self {
        self.tuning_grid = grid;
        self
    }

    pub fn with_final_features(mut self, features: &[&str]) -> Self {
        self.final_features = to_strings(features);
        self
    }

    pub fn with_final_hyperparameters(mut self, settings: Vec<Hyperparameter>) -> Self {
        self.final_hyperparameters = settings;
        self
    }
}

fn to_strings(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

/// Configuration for one model evaluation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Column to predict
    pub target_column: String,
    /// Seed for every shuffle
    pub seed: u64,
    /// Run cross-validation rotations on the rayon pool
    pub parallel: bool,
    pub profile: ModelProfile,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            target_column: "Price".to_string(),
            seed: 1,
            parallel: false,
            profile: ModelProfile::default(),
        }
    }
}

impl EvaluationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target(mut self, column: impl Into<String>) -> Self {
        self.target_column = column.into();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn with_profile(mut self, profile: ModelProfile) -> Self {
        self.profile = profile;
        self
    }

    /// Check the configuration for obvious mistakes
    pub fn validate(&self) -> Result<()> {
        if self.target_column.trim().is_empty() {
            return Err(RegressionError::ConfigError(
                "target column must not be empty".to_string(),
            ));
        }

        let profile = &self.profile;
        for setting in profile
            .tuning_grid
            .iter()
            .chain(profile.final_hyperparameters.iter())
        {
            setting.validate()?;
        }

        let feature_lists = [
            &profile.ranking_columns,
            &profile.candidate_features,
            &profile.tuning_features,
            &profile.final_features,
        ];
        for list in feature_lists {
            if list.iter().any(|f| *f == self.target_column) {
                return Err(RegressionError::ConfigError(format!(
                    "target column '{}' cannot be used as a feature",
                    self.target_column
                )));
            }
        }
        Ok(())
    }

    /// Parse and validate a JSON configuration
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Write the configuration as pretty JSON
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
