//! Declarative preprocessing plan
//!
//! A plan is an ordered list of steps applied to an owned dataset. Every step
//! consumes the dataset and hands a new one to the next step.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::data::Dataset;
use crate::error::Result;

use super::cleaning::{self, ImputeStrategy};
use super::outlier::{IqrReport, OutlierDetector, OutlierMethod};
use super::scaler::{Scaler, ScalerType};

/// One preprocessing step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum PreprocessStep {
    /// Count and log missing cells
    CheckMissing,
    /// Keep the first of each set of identical rows
    RemoveDuplicates,
    /// Detect outliers without changing the data
    ReportOutliers { column: String, method: OutlierMethod },
    /// Delete rows flagged by a z-score variant
    RemoveOutliers { column: String, method: OutlierMethod },
    /// Replace flagged values with the column mean
    ImputeOutliersWithMean { column: String, method: OutlierMethod },
    /// Fill missing numeric cells
    ImputeMissing {
        column: String,
        strategy: ImputeStrategy,
    },
    /// Add `"<column> scaled"` with zero mean and unit variance
    Standardise { column: String },
    /// Add `"<column> scaled"` mapped onto [0, 1]
    MinMax { column: String },
}

/// Outlier findings for one `ReportOutliers` step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum OutlierFinding {
    Rows { column: String, rows: Vec<usize> },
    Fences(IqrReport),
}

/// What a plan did to the data
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreprocessReport {
    pub rows_in: usize,
    pub rows_out: usize,
    pub missing_cells: usize,
    pub duplicates_removed: usize,
    pub outliers_removed: usize,
    pub values_imputed: usize,
    pub scaled_columns: Vec<String>,
    pub outlier_findings: Vec<OutlierFinding>,
}

/// Ordered preprocessing steps
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PreprocessingPlan {
    pub steps: Vec<PreprocessStep>,
}

impl PreprocessingPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_step(mut self, step: PreprocessStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every step in order
    pub fn apply(&self, data: Dataset) -> Result<(Dataset, PreprocessReport)> {
        let mut report = PreprocessReport {
            rows_in: data.n_rows(),
            ..Default::default()
        };

        let mut data = data;
        for step in &self.steps {
            data = apply_step(step, data, &mut report)?;
        }

        report.rows_out = data.n_rows();
        info!(
            rows_in = report.rows_in,
            rows_out = report.rows_out,
            steps = self.steps.len(),
            "preprocessing complete"
        );
        Ok((data, report))
    }
}

fn apply_step(step: &PreprocessStep, data: Dataset, report: &mut PreprocessReport) -> Result<Dataset> {
    match step {
        PreprocessStep::CheckMissing => {
            let missing = cleaning::check_missing(&data);
            if missing > 0 {
                warn!(missing, "dataset contains missing values");
            }
            report.missing_cells += missing;
            Ok(data)
        }
        PreprocessStep::RemoveDuplicates => {
            let (data, removed) = cleaning::remove_duplicates(data);
            report.duplicates_removed += removed;
            Ok(data)
        }
        PreprocessStep::ReportOutliers { column, method } => {
            let detector = OutlierDetector::new(&data);
            let finding = match method {
                OutlierMethod::Iqr => OutlierFinding::Fences(detector.iqr(column)?),
                _ => OutlierFinding::Rows {
                    column: column.clone(),
                    rows: detector.locate(column, method)?,
                },
            };
            report.outlier_findings.push(finding);
            Ok(data)
        }
        PreprocessStep::RemoveOutliers { column, method } => {
            let (data, removed) = cleaning::remove_outliers(data, column, method)?;
            report.outliers_removed += removed;
            Ok(data)
        }
        PreprocessStep::ImputeOutliersWithMean { column, method } => {
            let (data, imputed) = cleaning::impute_outliers_with_mean(data, column, method)?;
            report.values_imputed += imputed;
            Ok(data)
        }
        PreprocessStep::ImputeMissing { column, strategy } => {
            let (data, imputed) = cleaning::impute_missing(data, column, *strategy)?;
            report.values_imputed += imputed;
            Ok(data)
        }
        PreprocessStep::Standardise { column } => scale(ScalerType::Standard, column, data, report),
        PreprocessStep::MinMax { column } => scale(ScalerType::MinMax, column, data, report),
    }
}

fn scale(
    scaler_type: ScalerType,
    column: &str,
    data: Dataset,
    report: &mut PreprocessReport,
) -> Result<Dataset> {
    let data = Scaler::new(scaler_type).scale_column(data, column)?;
    report.scaled_columns.push(super::scaler::scaled_column_name(column));
    Ok(data)
}
