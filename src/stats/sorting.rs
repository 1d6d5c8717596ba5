//! Merge sort and rank statistics

use super::ensure_valid_sample;
use crate::error::{RegressionError, Result};

/// Stable ascending merge sort, in place
pub fn merge_sort(values: &mut [f64]) {
    if values.len() <= 1 {
        return;
    }
    let mid = values.len() / 2;
    let mut left = values[..mid].to_vec();
    let mut right = values[mid..].to_vec();
    merge_sort(&mut left);
    merge_sort(&mut right);
    merge(values, &left, &right);
}

fn merge(out: &mut [f64], left: &[f64], right: &[f64]) {
    let (mut i, mut j, mut k) = (0, 0, 0);
    while i < left.len() && j < right.len() {
        // `<=` keeps equal elements in their original order
        if left[i] <= right[j] {
            out[k] = left[i];
            i += 1;
        } else {
            out[k] = right[j];
            j += 1;
        }
        k += 1;
    }
    for &v in &left[i..] {
        out[k] = v;
        k += 1;
    }
    for &v in &right[j..] {
        out[k] = v;
        k += 1;
    }
}

/// Merge-sorted copy of `values`
pub fn sorted_copy(values: &[f64]) -> Vec<f64> {
    let mut sorted = values.to_vec();
    merge_sort(&mut sorted);
    sorted
}

/// Inclusive percentile by linear interpolation at index `(n - 1) * p`.
///
/// `sorted` must already be in ascending order; `p` is a fraction in `[0, 1]`.
pub fn percentile(sorted: &[f64], p: f64) -> Result<f64> {
    ensure_valid_sample(sorted, "percentile")?;
    if !(0.0..=1.0).contains(&p) {
        return Err(RegressionError::InvalidInput(format!(
            "percentile fraction must lie in [0, 1], got {}",
            p
        )));
    }

    let index = (sorted.len() - 1) as f64 * p;
    let lower = index.floor() as usize;
    let upper = index.ceil() as usize;
    if lower == upper {
        return Ok(sorted[lower]);
    }
    Ok(sorted[lower] + (index - lower as f64) * (sorted[upper] - sorted[lower]))
}
