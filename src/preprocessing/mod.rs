//! Data preprocessing module
//!
//! Provides:
//! - Outlier detection (z-score, modified z-score, IQR fences)
//! - Cleaning (duplicate removal, missing-value checks, imputation)
//! - Feature scaling (standard, min-max)
//! - A serialisable [`PreprocessingPlan`] that chains the above
//! - Correlation-based feature ranking

mod cleaning;
mod pipeline;
mod scaler;
pub mod feature_selection;
pub mod outlier;

pub use cleaning::{
    check_missing, impute_missing, impute_outliers_with_mean, remove_duplicates, remove_outliers,
    ImputeStrategy,
};
pub use feature_selection::{rank_features, FeatureRanking, FeatureScore};
pub use outlier::{IqrReport, OutlierDetector, OutlierMethod, IQR_FENCE_FACTOR};
pub use pipeline::{OutlierFinding, PreprocessReport, PreprocessStep, PreprocessingPlan};
pub use scaler::{scaled_column_name, Scaler, ScalerParams, ScalerType};
