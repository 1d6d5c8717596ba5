//! Regression error metrics
//!
//! [`ErrorMetrics`] wraps a pair of parallel predicted/actual vectors and
//! computes MAE, RMSE, R² and adjusted R². [`ErrorReport`] is the 4-tuple
//! produced once per validation pass.

use ndarray::Array1;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{RegressionError, Result};
use crate::stats;

/// Decimal places every reported metric is rounded to
pub const REPORT_DECIMALS: i32 = 6;

/// Round to `decimals` places
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// MAE, RMSE, R² and adjusted R² of one validation pass
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ErrorReport {
    pub mae: f64,
    pub rmse: f64,
    pub r_squared: f64,
    pub adjusted_r_squared: f64,
}

impl ErrorReport {
    /// Metric-wise arithmetic mean of several reports
    pub fn mean(reports: &[ErrorReport]) -> Result<ErrorReport> {
        if reports.is_empty() {
            return Err(RegressionError::InvalidInput(
                "cannot average zero error reports".to_string(),
            ));
        }
        let n = reports.len() as f64;
        Ok(ErrorReport {
            mae: reports.iter().map(|r| r.mae).sum::<f64>() / n,
            rmse: reports.iter().map(|r| r.rmse).sum::<f64>() / n,
            r_squared: reports.iter().map(|r| r.r_squared).sum::<f64>() / n,
            adjusted_r_squared: reports.iter().map(|r| r.adjusted_r_squared).sum::<f64>() / n,
        })
    }

    /// Copy with every metric rounded to [`REPORT_DECIMALS`] places
    pub fn rounded(&self) -> ErrorReport {
        ErrorReport {
            mae: round_to(self.mae, REPORT_DECIMALS),
            rmse: round_to(self.rmse, REPORT_DECIMALS),
            r_squared: round_to(self.r_squared, REPORT_DECIMALS),
            adjusted_r_squared: round_to(self.adjusted_r_squared, REPORT_DECIMALS),
        }
    }
}

impl fmt::Display for ErrorReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MAE = {}, RMSE = {}, R-Squared = {}, Adjusted R-Squared = {}",
            self.mae, self.rmse, self.r_squared, self.adjusted_r_squared
        )
    }
}

/// Error metrics calculator over parallel predicted/actual vectors
#[derive(Debug, Clone)]
pub struct ErrorMetrics<'a> {
    predicted: &'a Array1<f64>,
    actual: &'a Array1<f64>,
}

impl<'a> ErrorMetrics<'a> {
    /// Pair up predictions with actual values; lengths must agree
    pub fn new(predicted: &'a Array1<f64>, actual: &'a Array1<f64>) -> Result<Self> {
        if predicted.len() != actual.len() {
            return Err(RegressionError::LengthMismatch {
                predicted: predicted.len(),
                actual: actual.len(),
            });
        }
        if actual.is_empty() {
            return Err(RegressionError::InvalidInput(
                "error metrics need at least one prediction".to_string(),
            ));
        }
        Ok(Self { predicted, actual })
    }

    fn residuals(&self) -> impl Iterator<Item = f64> + '_ {
        self.actual
            .iter()
            .zip(self.predicted.iter())
            .map(|(a, p)| a - p)
    }

    fn n(&self) -> f64 {
        self.actual.len() as f64
    }

    /// Mean absolute error
    pub fn mae(&self) -> f64 {
        self.residuals().map(f64::abs).sum::<f64>() / self.n()
    }

    /// Mean squared error
    pub fn mse(&self) -> f64 {
        self.residuals().map(|r| r * r).sum::<f64>() / self.n()
    }

    /// Root mean squared error
    pub fn rmse(&self) -> f64 {
        self.mse().sqrt()
    }

    /// Coefficient of determination, `1 - SS_res / SS_tot`
    pub fn r_squared(&self) -> Result<f64> {
        let actual_mean = stats::mean(&self.actual.to_vec())?;
        let ss_res: f64 = self.residuals().map(|r| r * r).sum();
        let ss_tot: f64 = self.actual.iter().map(|a| (a - actual_mean).powi(2)).sum();
        if ss_tot == 0.0 {
            return Err(RegressionError::InvalidInput(
                "R-squared is undefined when every actual value is identical".to_string(),
            ));
        }
        Ok(1.0 - ss_res / ss_tot)
    }

    /// Adjusted R² for `n_predictors` predictors, `1 - (1 - R²)(n - 1)/(n - p - 1)`
    pub fn adjusted_r_squared(&self, n_predictors: usize) -> Result<f64> {
        let r2 = self.r_squared()?;
        if n_predictors == 0 {
            return Ok(r2);
        }
        let n = self.actual.len();
        if n <= n_predictors + 1 {
            return Err(RegressionError::InvalidInput(format!(
                "adjusted R-squared needs more than {} observations for {} predictors, got {}",
                n_predictors + 1,
                n_predictors,
                n
            )));
        }
        let n = n as f64;
        let p = n_predictors as f64;
        Ok(1.0 - (1.0 - r2) * (n - 1.0) / (n - p - 1.0))
    }

    /// All four metrics at once
    pub fn report(&self, n_predictors: usize) -> Result<ErrorReport> {
        Ok(ErrorReport {
            mae: self.mae(),
            rmse: self.rmse(),
            r_squared: self.r_squared()?,
            adjusted_r_squared: self.adjusted_r_squared(n_predictors)?,
        })
    }
}
