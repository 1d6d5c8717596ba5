//! Price regression - comparing regression models under one lifecycle
//!
//! This crate estimates a numeric target (a price) from tabular features and
//! compares several regression strategies by cross-validation, fine-tuning
//! and a final hold-out test.
//!
//! # Modules
//!
//! ## Numeric core
//! - [`stats`] - Descriptive statistics, scores, percentiles, correlation
//! - [`metrics`] - MAE, RMSE, R² and adjusted R²
//!
//! ## Data
//! - [`data`] - Row-oriented dataset and seeded splitting
//! - [`preprocessing`] - Outlier detection, cleaning, scaling, feature ranking
//!
//! ## Models
//! - [`training`] - Regressor trait, cross-validation, evaluation lifecycle, models
//! - [`config`] - Evaluation configuration and per-model profiles

// Core error handling
pub mod error;

// Numeric core
pub mod metrics;
pub mod stats;

// Data
pub mod data;
pub mod preprocessing;

// Models
pub mod config;
pub mod training;

pub use error::{RegressionError, Result};

/// Re-export commonly used types
pub mod prelude {
    // Error handling
    pub use crate::error::{RegressionError, Result};

    // Configuration
    pub use crate::config::{EvaluationConfig, Hyperparameter, ModelProfile};

    // Data
    pub use crate::data::{Column, ColumnType, DataSplit, Dataset, Value};

    // Metrics
    pub use crate::metrics::{ErrorMetrics, ErrorReport};

    // Preprocessing
    pub use crate::preprocessing::{
        FeatureRanking, ImputeStrategy, OutlierDetector, OutlierMethod, PreprocessStep,
        PreprocessingPlan,
    };

    // Training
    pub use crate::training::{
        CrossValidationReport, FitSummary, GradientDescentConfig, KnnConfig, KnnRegressor,
        LifecycleState, MeanBaseline, ModelEvaluator, MultiLinearRegression, Regressor,
        SimpleLinearRegression, TuningReport, WeightScheme,
    };
}
