//! Statistics library
//!
//! Pure, stateless numeric functions over `f64` slices:
//! - Descriptive statistics (mean, mode, median, variance, covariance)
//! - Standard and robust scores (z-score, modified z-score, MAD)
//! - Rank statistics (merge sort, inclusive percentile)
//! - Correlation coefficients (Pearson, point-biserial)
//!
//! Every function that divides reports the degenerate case as
//! [`RegressionError::InvalidInput`](crate::error::RegressionError::InvalidInput)
//! instead of returning NaN or infinity.

mod correlation;
mod descriptive;
mod sorting;

pub use correlation::{pearson, point_biserial};
pub use descriptive::{
    covariance, mean, median, median_abs_dev, mode, modified_z_score, sample_variance, std_dev,
    variance, z_score, MODIFIED_Z_SCALE,
};
pub use sorting::{merge_sort, percentile, sorted_copy};

use crate::error::{RegressionError, Result};

/// Reject empty input and NaN or infinite values, naming the statistic
pub(crate) fn ensure_valid_sample(values: &[f64], what: &str) -> Result<()> {
    if values.is_empty() {
        return Err(RegressionError::InvalidInput(format!(
            "{} of an empty sample is undefined",
            what
        )));
    }
    if let Some((i, v)) = values.iter().enumerate().find(|(_, v)| !v.is_finite()) {
        return Err(RegressionError::InvalidInput(format!(
            "{} needs finite values, found {} at position {}",
            what, v, i
        )));
    }
    Ok(())
}

/// Reject paired samples of unequal length
pub(crate) fn ensure_paired(xs: &[f64], ys: &[f64], what: &str) -> Result<()> {
    if xs.len() != ys.len() {
        return Err(RegressionError::InvalidInput(format!(
            "{} needs paired samples, got {} and {} values",
            what,
            xs.len(),
            ys.len()
        )));
    }
    Ok(())
}
