//! Descriptive statistics and scores

use std::collections::HashMap;

use super::{ensure_paired, ensure_valid_sample, sorting::sorted_copy};
use crate::error::{RegressionError, Result};

/// Scale constant of the modified z-score (the 0.75 quantile of the standard normal)
pub const MODIFIED_Z_SCALE: f64 = 0.6745;

/// Arithmetic mean
pub fn mean(values: &[f64]) -> Result<f64> {
    ensure_valid_sample(values, "mean")?;
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

/// Most frequent value.
///
/// When several values share the highest count, the first of them in input
/// order wins.
pub fn mode(values: &[f64]) -> Result<f64> {
    ensure_valid_sample(values, "mode")?;

    // Keyed by bit pattern: f64 is not Hash. -0.0 and 0.0 count separately.
    let mut counts: HashMap<u64, usize> = HashMap::new();
    for v in values {
        *counts.entry(v.to_bits()).or_insert(0) += 1;
    }

    let mut best = values[0];
    let mut best_count = 0;
    for v in values {
        let count = counts[&v.to_bits()];
        if count > best_count {
            best = *v;
            best_count = count;
        }
    }
    Ok(best)
}

/// Median of a sample; the input is copied and merge-sorted
pub fn median(values: &[f64]) -> Result<f64> {
    ensure_valid_sample(values, "median")?;
    let sorted = sorted_copy(values);
    let n = sorted.len();
    if n % 2 == 1 {
        Ok(sorted[n / 2])
    } else {
        Ok((sorted[n / 2 - 1] + sorted[n / 2]) / 2.0)
    }
}

/// Population variance (divisor n)
pub fn variance(values: &[f64]) -> Result<f64> {
    let m = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Ok(sum_sq / values.len() as f64)
}

/// Sample variance (divisor n - 1), the counterpart of [`covariance`]
pub fn sample_variance(values: &[f64]) -> Result<f64> {
    if values.len() < 2 {
        return Err(RegressionError::InvalidInput(format!(
            "sample variance needs at least 2 values, got {}",
            values.len()
        )));
    }
    let m = mean(values)?;
    let sum_sq: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Ok(sum_sq / (values.len() - 1) as f64)
}

/// Population standard deviation
pub fn std_dev(values: &[f64]) -> Result<f64> {
    Ok(variance(values)?.sqrt())
}

/// Sample covariance (divisor n - 1)
pub fn covariance(xs: &[f64], ys: &[f64]) -> Result<f64> {
    ensure_paired(xs, ys, "covariance")?;
    if xs.len() < 2 {
        return Err(RegressionError::InvalidInput(format!(
            "covariance needs at least 2 pairs, got {}",
            xs.len()
        )));
    }
    let x_mean = mean(xs)?;
    let y_mean = mean(ys)?;
    let sum_products: f64 = xs
        .iter()
        .zip(ys.iter())
        .map(|(x, y)| (x - x_mean) * (y - y_mean))
        .sum();
    Ok(sum_products / (xs.len() - 1) as f64)
}

/// Standard score of `value`
pub fn z_score(value: f64, mean: f64, std_dev: f64) -> Result<f64> {
    if std_dev == 0.0 || !std_dev.is_finite() {
        return Err(RegressionError::InvalidInput(format!(
            "z-score needs a positive finite standard deviation, got {}",
            std_dev
        )));
    }
    Ok((value - mean) / std_dev)
}

/// Median absolute deviation: `median(|x_i - median(x)|)`
pub fn median_abs_dev(values: &[f64]) -> Result<f64> {
    let med = median(values)?;
    let deviations: Vec<f64> = values.iter().map(|v| (v - med).abs()).collect();
    median(&deviations)
}

/// Robust score `0.6745 * (value - median) / mad`
pub fn modified_z_score(value: f64, median: f64, mad: f64) -> Result<f64> {
    if mad == 0.0 || !mad.is_finite() {
        return Err(RegressionError::InvalidInput(format!(
            "modified z-score needs a positive finite median absolute deviation, got {}",
            mad
        )));
    }
    Ok(MODIFIED_Z_SCALE * (value - median) / mad)
}
