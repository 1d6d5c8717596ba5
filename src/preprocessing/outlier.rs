//! Outlier detection
//!
//! Flags anomalous rows of one numeric column at a time. The detector never
//! mutates the dataset; removal or imputation is up to the caller.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::data::Dataset;
use crate::error::{RegressionError, Result};
use crate::stats;

/// Tukey fence multiplier for the IQR method
pub const IQR_FENCE_FACTOR: f64 = 1.5;

/// Method for outlier detection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "method", rename_all = "snake_case")]
pub enum OutlierMethod {
    /// Standard deviations from the mean
    ZScore { threshold: f64 },
    /// Modified z-score using median and MAD, robust to skew and heavy tails
    ModifiedZScore { threshold: f64 },
    /// Interquartile range fences; reports only
    Iqr,
}

impl OutlierMethod {
    /// Whether this method yields row indices
    pub fn returns_indices(&self) -> bool {
        !matches!(self, OutlierMethod::Iqr)
    }
}

/// Result of the IQR method
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IqrReport {
    pub column: String,
    pub q1: f64,
    pub q3: f64,
    pub iqr: f64,
    pub lower_fence: f64,
    pub upper_fence: f64,
    pub n_outliers: usize,
}

/// Outlier detector over one dataset
#[derive(Debug, Clone, Copy)]
pub struct OutlierDetector<'a> {
    data: &'a Dataset,
}

impl<'a> OutlierDetector<'a> {
    pub fn new(data: &'a Dataset) -> Self {
        Self { data }
    }

    /// Rows whose |z-score| exceeds `threshold`
    pub fn z_score(&self, column: &str, threshold: f64) -> Result<Vec<usize>> {
        let values = self.data.column_values(column)?;
        let mean = stats::mean(&values)?;
        let std = stats::std_dev(&values)?;

        let mut flagged = Vec::new();
        for (i, &v) in values.iter().enumerate() {
            let score = stats::z_score(v, mean, std)?;
            if score.abs() > threshold {
                debug!(column, row = i, value = v, z_score = score, "outlier");
                flagged.push(i);
            }
        }
        Ok(flagged)
    }

    /// Rows whose |modified z-score| exceeds `threshold`
    pub fn modified_z_score(&self, column: &str, threshold: f64) -> Result<Vec<usize>> {
        let values = self.data.column_values(column)?;
        let median = stats::median(&values)?;
        let mad = stats::median_abs_dev(&values)?;

        let mut flagged = Vec::new();
        for (i, &v) in values.iter().enumerate() {
            let score = stats::modified_z_score(v, median, mad)?;
            if score.abs() > threshold {
                debug!(column, row = i, value = v, modified_z_score = score, "outlier");
                flagged.push(i);
            }
        }
        Ok(flagged)
    }

    /// Fences `[Q1 - 1.5 IQR, Q3 + 1.5 IQR]` and how many values fall outside
    pub fn iqr(&self, column: &str) -> Result<IqrReport> {
        let values = self.data.column_values(column)?;
        let sorted = stats::sorted_copy(&values);
        let q1 = stats::percentile(&sorted, 0.25)?;
        let q3 = stats::percentile(&sorted, 0.75)?;
        let iqr = q3 - q1;
        let lower_fence = q1 - IQR_FENCE_FACTOR * iqr;
        let upper_fence = q3 + IQR_FENCE_FACTOR * iqr;

        let mut n_outliers = 0;
        for (i, &v) in values.iter().enumerate() {
            if v < lower_fence || v > upper_fence {
                debug!(column, row = i, value = v, "outlier outside IQR fences");
                n_outliers += 1;
            }
        }

        Ok(IqrReport {
            column: column.to_string(),
            q1,
            q3,
            iqr,
            lower_fence,
            upper_fence,
            n_outliers,
        })
    }

    /// Row indices flagged by a z-score variant
    pub fn locate(&self, column: &str, method: &OutlierMethod) -> Result<Vec<usize>> {
        match method {
            OutlierMethod::ZScore { threshold } => self.z_score(column, *threshold),
            OutlierMethod::ModifiedZScore { threshold } => {
                self.modified_z_score(column, *threshold)
            }
            OutlierMethod::Iqr => Err(RegressionError::ConfigError(format!(
                "IQR detection on '{}' only reports fences; use a z-score method to locate rows",
                column
            ))),
        }
    }
}
