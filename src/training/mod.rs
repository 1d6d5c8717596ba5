//! Model training and evaluation
//!
//! Provides:
//! - The [`Regressor`] trait shared by every algorithm
//! - Five-rotation cross-validation
//! - The [`ModelEvaluator`] lifecycle (preprocess, split, validate, tune, hold-out test)
//! - Mean baseline, simple linear (OLS), multi-linear (gradient descent) and KNN regressors

mod evaluator;
mod model;
pub mod cross_validation;
pub mod gradient_descent;
pub mod knn;
pub mod mean_baseline;
pub mod simple_linear;

pub use cross_validation::{CrossValidationReport, CrossValidator, FoldOutcome, Folds, CV_ROTATIONS};
pub use evaluator::{FeatureStep, ModelEvaluator, TuningReport, TuningTrial};
pub use gradient_descent::{GradientDescentConfig, MultiLinearRegression};
pub use knn::{KnnConfig, KnnRegressor, WeightScheme};
pub use mean_baseline::MeanBaseline;
pub use model::{FitSummary, LifecycleState, Regressor};
pub use simple_linear::SimpleLinearRegression;
