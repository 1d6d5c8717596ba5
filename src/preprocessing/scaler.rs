//! Feature scaling
//!
//! Scaled values are written to a new `"<column> scaled"` column so the raw
//! column stays available for reporting.

use serde::{Deserialize, Serialize};

use crate::data::Dataset;
use crate::error::{RegressionError, Result};
use crate::stats;

/// Type of scaler to use
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ScalerType {
    /// Standard scaling (z-score normalization): (x - mean) / std
    Standard,
    /// Min-Max scaling: (x - min) / (max - min)
    MinMax,
}

/// Parameters of a fitted scaler
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScalerParams {
    /// mean or min
    pub center: f64,
    /// std or range
    pub scale: f64,
}

/// Name of the column a scaler writes for `column`
pub fn scaled_column_name(column: &str) -> String {
    format!("{} scaled", column)
}

/// Single-column feature scaler
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scaler {
    scaler_type: ScalerType,
    params: Option<ScalerParams>,
}

impl Scaler {
    pub fn new(scaler_type: ScalerType) -> Self {
        Self {
            scaler_type,
            params: None,
        }
    }

    pub fn standard() -> Self {
        Self::new(ScalerType::Standard)
    }

    pub fn min_max() -> Self {
        Self::new(ScalerType::MinMax)
    }

    pub fn params(&self) -> Option<ScalerParams> {
        self.params
    }

    /// Fit the scaler to a column of values
    pub fn fit(&mut self, values: &[f64]) -> Result<&mut Self> {
        let params = match self.scaler_type {
            ScalerType::Standard => {
                let center = stats::mean(values)?;
                let scale = stats::std_dev(values)?;
                if scale == 0.0 {
                    return Err(RegressionError::InvalidInput(
                        "cannot standardise a column with zero standard deviation".to_string(),
                    ));
                }
                ScalerParams { center, scale }
            }
            ScalerType::MinMax => {
                stats::ensure_valid_sample(values, "min-max scaling")?;
                let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                let range = max - min;
                if range == 0.0 {
                    return Err(RegressionError::InvalidInput(
                        "cannot min-max scale a column with zero range".to_string(),
                    ));
                }
                ScalerParams {
                    center: min,
                    scale: range,
                }
            }
        };
        self.params = Some(params);
        Ok(self)
    }

    /// Scale values with the fitted parameters
    pub fn transform(&self, values: &[f64]) -> Result<Vec<f64>> {
        let params = self.params.ok_or(RegressionError::ModelNotFitted)?;
        Ok(values
            .iter()
            .map(|v| (v - params.center) / params.scale)
            .collect())
    }

    pub fn fit_transform(&mut self, values: &[f64]) -> Result<Vec<f64>> {
        self.fit(values)?;
        self.transform(values)
    }

    /// Fit on `column` and add its scaled copy to the dataset
    pub fn scale_column(&mut self, data: Dataset, column: &str) -> Result<Dataset> {
        let values = data.column_values(column)?;
        let scaled = self.fit_transform(&values)?;
        data.with_numeric_column(&scaled_column_name(column), scaled)
    }
}
