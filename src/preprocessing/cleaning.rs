//! Row cleaning and value imputation

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::data::{Dataset, Value};
use crate::error::{RegressionError, Result};
use crate::stats;

use super::outlier::{OutlierDetector, OutlierMethod};

/// How to fill missing numeric cells
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ImputeStrategy {
    Mean,
    Mode,
}

/// Count missing cells, warning once per cell
pub fn check_missing(data: &Dataset) -> usize {
    let cells = data.missing_cells();
    for (row, column) in &cells {
        warn!(row, column, "missing value");
    }
    cells.len()
}

/// Drop duplicate rows; returns the cleaned dataset and how many were removed
pub fn remove_duplicates(data: Dataset) -> (Dataset, usize) {
    let (data, removed) = data.dedup_rows();
    if removed > 0 {
        info!(removed, rows = data.n_rows(), "removed duplicate rows");
    }
    (data, removed)
}

/// Delete rows flagged by a z-score variant
pub fn remove_outliers(
    data: Dataset,
    column: &str,
    method: &OutlierMethod,
) -> Result<(Dataset, usize)> {
    let flagged = OutlierDetector::new(&data).locate(column, method)?;
    let removed = flagged.len();
    let data = data.without_rows(&flagged);
    info!(column, removed, rows = data.n_rows(), "removed outliers");
    Ok((data, removed))
}

/// Replace flagged values with the mean computed before replacement
pub fn impute_outliers_with_mean(
    mut data: Dataset,
    column: &str,
    method: &OutlierMethod,
) -> Result<(Dataset, usize)> {
    let flagged = OutlierDetector::new(&data).locate(column, method)?;
    let mean = stats::mean(&data.column_values(column)?)?;
    for &row in &flagged {
        data.set_value(row, column, Value::Number(mean))?;
    }
    info!(column, imputed = flagged.len(), mean, "imputed outliers with mean");
    Ok((data, flagged.len()))
}

/// Fill the missing cells of a numeric column
pub fn impute_missing(
    mut data: Dataset,
    column: &str,
    strategy: ImputeStrategy,
) -> Result<(Dataset, usize)> {
    let mut present = Vec::with_capacity(data.n_rows());
    let mut missing = Vec::new();
    for row in 0..data.n_rows() {
        match data.value(row, column)? {
            Value::Number(v) => present.push(*v),
            Value::Missing => missing.push(row),
            Value::Category(s) => {
                return Err(RegressionError::InvalidInput(format!(
                    "cannot impute non-numeric column '{}' (found '{}')",
                    column, s
                )))
            }
        }
    }
    if missing.is_empty() {
        return Ok((data, 0));
    }

    let fill = match strategy {
        ImputeStrategy::Mean => stats::mean(&present)?,
        ImputeStrategy::Mode => stats::mode(&present)?,
    };
    for &row in &missing {
        data.set_value(row, column, Value::Number(fill))?;
    }
    info!(column, imputed = missing.len(), fill, ?strategy, "imputed missing values");
    Ok((data, missing.len()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Column;

    fn with_missing() -> Dataset {
        let mut data = Dataset::new(vec![Column::numeric("v")]).unwrap();
        for v in [Value::Number(1.0), Value::Missing, Value::Number(3.0), Value::Number(3.0)] {
            data.push_row(vec![v]).unwrap();
        }
        data
    }

    #[test]
    fn test_check_missing() {
        assert_eq!(check_missing(&with_missing()), 1);
    }

    #[test]
    fn test_impute_missing_mean_and_mode() {
        let (data, n) = impute_missing(with_missing(), "v", ImputeStrategy::Mean).unwrap();
        assert_eq!(n, 1);
        assert!((data.column_values("v").unwrap()[1] - 7.0 / 3.0).abs() < 1e-12);

        let (data, _) = impute_missing(with_missing(), "v", ImputeStrategy::Mode).unwrap();
        assert_eq!(data.column_values("v").unwrap()[1], 3.0);
    }

    #[test]
    fn test_remove_duplicates() {
        let data = Dataset::from_columns(vec![("v", vec![1.0, 2.0, 1.0, 2.0, 5.0])]).unwrap();
        let (data, removed) = remove_duplicates(data);
        assert_eq!(removed, 2);
        assert_eq!(data.column_values("v").unwrap(), vec![1.0, 2.0, 5.0]);
    }

    #[test]
    fn test_impute_outliers_uses_pre_replacement_mean() {
        let mut values: Vec<f64> = (0..20).map(|i| 10.0 + (i % 5) as f64).collect();
        values[3] = 100.0;
        let mean = values.iter().sum::<f64>() / 20.0;
        let data = Dataset::from_columns(vec![("v", values)]).unwrap();

        let method = OutlierMethod::ZScore { threshold: 3.0 };
        let (data, n) = impute_outliers_with_mean(data, "v", &method).unwrap();
        assert_eq!(n, 1);
        assert!((data.column_values("v").unwrap()[3] - mean).abs() < 1e-12);
    }
}
