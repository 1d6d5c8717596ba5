//! Correlation coefficients

use super::{descriptive, ensure_paired, ensure_valid_sample};
use crate::error::{RegressionError, Result};

/// Pearson product-moment correlation
pub fn pearson(xs: &[f64], ys: &[f64]) -> Result<f64> {
    ensure_paired(xs, ys, "pearson correlation")?;
    ensure_valid_sample(xs, "pearson correlation")?;

    let x_mean = descriptive::mean(xs)?;
    let y_mean = descriptive::mean(ys)?;

    let mut sum_products = 0.0;
    let mut x_sum_sq = 0.0;
    let mut y_sum_sq = 0.0;
    for (x, y) in xs.iter().zip(ys.iter()) {
        let dx = x - x_mean;
        let dy = y - y_mean;
        sum_products += dx * dy;
        x_sum_sq += dx * dx;
        y_sum_sq += dy * dy;
    }

    let denom = (x_sum_sq * y_sum_sq).sqrt();
    if denom == 0.0 {
        return Err(RegressionError::InvalidInput(
            "pearson correlation is undefined for a constant variable".to_string(),
        ));
    }
    Ok(sum_products / denom)
}

/// Point-biserial correlation between a {0, 1} variable and a continuous one.
///
/// `(mean(y | x = 1) - mean(y | x = 0)) * sqrt(n0 * n1 / (n * (n - 1))) / std_dev(y)`
pub fn point_biserial(x_binary: &[f64], ys: &[f64]) -> Result<f64> {
    ensure_paired(x_binary, ys, "point-biserial correlation")?;
    if ys.len() < 2 {
        return Err(RegressionError::InvalidInput(format!(
            "point-biserial correlation needs at least 2 observations, got {}",
            ys.len()
        )));
    }

    let mut group0 = Vec::new();
    let mut group1 = Vec::new();
    for (i, (&x, &y)) in x_binary.iter().zip(ys.iter()).enumerate() {
        if x == 0.0 {
            group0.push(y);
        } else if x == 1.0 {
            group1.push(y);
        } else {
            return Err(RegressionError::InvalidInput(format!(
                "point-biserial correlation needs a 0/1 variable, found {} at position {}",
                x, i
            )));
        }
    }
    if group0.is_empty() || group1.is_empty() {
        return Err(RegressionError::InvalidInput(
            "point-biserial correlation needs both 0 and 1 observations".to_string(),
        ));
    }

    let std = descriptive::std_dev(ys)?;
    if std == 0.0 {
        return Err(RegressionError::InvalidInput(
            "point-biserial correlation is undefined for a constant variable".to_string(),
        ));
    }

    let n0 = group0.len() as f64;
    let n1 = group1.len() as f64;
    let n = ys.len() as f64;
    let correction = (n0 * n1 / (n * (n - 1.0))).sqrt();
    Ok((descriptive::mean(&group1)? - descriptive::mean(&group0)?) * correction / std)
}
