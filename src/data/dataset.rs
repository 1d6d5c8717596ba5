//! Row-oriented dataset with typed columns

use std::collections::{HashMap, HashSet};

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::error::{RegressionError, Result};

/// A single cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Value {
    Number(f64),
    Category(String),
    Missing,
}

impl Value {
    /// Numeric content, if any
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Value::Missing)
    }

    /// Whether the cell may be stored in a column of type `kind`
    pub fn fits(&self, kind: ColumnType) -> bool {
        match self {
            Value::Missing => true,
            Value::Number(_) => kind == ColumnType::Numeric,
            Value::Category(_) => kind == ColumnType::Categorical,
        }
    }

    /// Hashable identity used for duplicate detection
    fn key(&self) -> String {
        match self {
            Value::Number(v) => format!("n:{}", v.to_bits()),
            Value::Category(s) => format!("c:{}", s),
            Value::Missing => "m".to_string(),
        }
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Number(v)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Category(s.to_string())
    }
}

/// Column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ColumnType {
    Numeric,
    Categorical,
}

/// Column schema entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub kind: ColumnType,
}

impl Column {
    pub fn numeric(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnType::Numeric,
        }
    }

    pub fn categorical(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ColumnType::Categorical,
        }
    }
}

/// Ordered rows over a fixed column schema
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "DatasetParts")]
pub struct Dataset {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
    #[serde(skip)]
    index: HashMap<String, usize>,
}

/// Wire form of a dataset; the column lookup table is rebuilt on load
#[derive(Deserialize)]
struct DatasetParts {
    columns: Vec<Column>,
    rows: Vec<Vec<Value>>,
}

impl TryFrom<DatasetParts> for Dataset {
    type Error = RegressionError;

    fn try_from(parts: DatasetParts) -> Result<Self> {
        let mut dataset = Dataset::new(parts.columns)?;
        for row in parts.rows {
            dataset.push_row(row)?;
        }
        Ok(dataset)
    }
}

impl PartialEq for Dataset {
    fn eq(&self, other: &Self) -> bool {
        self.columns == other.columns && self.rows == other.rows
    }
}

impl Dataset {
    /// Create an empty dataset with the given schema
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let mut index = HashMap::with_capacity(columns.len());
        for (i, col) in columns.iter().enumerate() {
            if index.insert(col.name.clone(), i).is_some() {
                return Err(RegressionError::InvalidInput(format!(
                    "duplicate column name '{}'",
                    col.name
                )));
            }
        }
        Ok(Self {
            columns,
            rows: Vec::new(),
            index,
        })
    }

    /// Build an all-numeric dataset from named columns of equal length
    pub fn from_columns(columns: Vec<(&str, Vec<f64>)>) -> Result<Self> {
        let n_rows = columns.first().map(|(_, v)| v.len()).unwrap_or(0);
        if let Some((name, values)) = columns.iter().find(|(_, v)| v.len() != n_rows) {
            return Err(RegressionError::InvalidInput(format!(
                "column '{}' has {} values, expected {}",
                name,
                values.len(),
                n_rows
            )));
        }

        let schema = columns.iter().map(|(name, _)| Column::numeric(*name)).collect();
        let mut dataset = Self::new(schema)?;
        dataset.rows = (0..n_rows)
            .map(|i| columns.iter().map(|(_, v)| Value::Number(v[i])).collect())
            .collect();
        Ok(dataset)
    }

    /// Empty dataset sharing this schema
    pub fn empty_like(&self) -> Self {
        Self {
            columns: self.columns.clone(),
            rows: Vec::new(),
            index: self.index.clone(),
        }
    }

    /// Append a row; its width and cell types must match the schema
    pub fn push_row(&mut self, row: Vec<Value>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(RegressionError::InvalidInput(format!(
                "row has {} values, schema has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        for (column, value) in self.columns.iter().zip(&row) {
            check_cell(column, value)?;
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_ok()
    }

    pub fn rows(&self) -> &[Vec<Value>] {
        &self.rows
    }

    fn column_index(&self, name: &str) -> Result<usize> {
        self.index
            .get(name)
            .copied()
            .ok_or_else(|| RegressionError::FeatureNotFound(name.to_string()))
    }

    /// Cell at `row` in column `name`
    pub fn value(&self, row: usize, name: &str) -> Result<&Value> {
        let col = self.column_index(name)?;
        self.rows
            .get(row)
            .map(|r| &r[col])
            .ok_or_else(|| {
                RegressionError::InvalidInput(format!(
                    "row {} out of range for {} rows",
                    row,
                    self.rows.len()
                ))
            })
    }

    /// Overwrite a single cell
    pub fn set_value(&mut self, row: usize, name: &str, value: Value) -> Result<()> {
        let col = self.column_index(name)?;
        check_cell(&self.columns[col], &value)?;
        let n_rows = self.rows.len();
        let cell = self
            .rows
            .get_mut(row)
            .map(|r| &mut r[col])
            .ok_or_else(|| {
                RegressionError::InvalidInput(format!(
                    "row {} out of range for {} rows",
                    row, n_rows
                ))
            })?;
        *cell = value;
        Ok(())
    }

    /// Numeric values of a column.
    ///
    /// A categorical column, a missing cell or a NaN/infinite number is an error.
    pub fn column_values(&self, name: &str) -> Result<Vec<f64>> {
        let col = self.column_index(name)?;
        if self.columns[col].kind == ColumnType::Categorical {
            return Err(RegressionError::InvalidInput(format!(
                "column '{}' is categorical, not numeric",
                name
            )));
        }
        self.rows
            .iter()
            .enumerate()
            .map(|(i, row)| match &row[col] {
                Value::Number(v) if v.is_finite() => Ok(*v),
                Value::Number(v) => Err(RegressionError::InvalidInput(format!(
                    "non-finite value {} in column '{}' at row {}",
                    v, name, i
                ))),
                Value::Missing => Err(RegressionError::InvalidInput(format!(
                    "missing value in column '{}' at row {}",
                    name, i
                ))),
                Value::Category(s) => Err(RegressionError::InvalidInput(format!(
                    "non-numeric value '{}' in column '{}' at row {}",
                    s, name, i
                ))),
            })
            .collect()
    }

    /// Target column as an array
    pub fn target(&self, name: &str) -> Result<Array1<f64>> {
        Ok(Array1::from_vec(self.column_values(name)?))
    }

    /// Rows x features matrix of the named numeric columns
    pub fn feature_matrix(&self, features: &[String]) -> Result<Array2<f64>> {
        let mut x = Array2::zeros((self.rows.len(), features.len()));
        for (j, feature) in features.iter().enumerate() {
            let values = self.column_values(feature)?;
            for (i, v) in values.into_iter().enumerate() {
                x[[i, j]] = v;
            }
        }
        Ok(x)
    }

    /// Copy of the given rows, in the given order
    pub fn select_rows(&self, indices: &[usize]) -> Result<Dataset> {
        let mut out = self.empty_like();
        out.rows.reserve(indices.len());
        for &i in indices {
            let row = self.rows.get(i).ok_or_else(|| {
                RegressionError::InvalidInput(format!(
                    "row {} out of range for {} rows",
                    i,
                    self.rows.len()
                ))
            })?;
            out.rows.push(row.clone());
        }
        Ok(out)
    }

    /// Drop the given rows, keeping the order of the rest
    pub fn without_rows(mut self, indices: &[usize]) -> Dataset {
        let drop: HashSet<usize> = indices.iter().copied().collect();
        let mut i = 0;
        self.rows.retain(|_| {
            let keep = !drop.contains(&i);
            i += 1;
            keep
        });
        self
    }

    /// Drop repeated rows, keeping each first occurrence
    pub fn dedup_rows(mut self) -> (Dataset, usize) {
        let before = self.rows.len();
        let mut seen = HashSet::with_capacity(before);
        self.rows.retain(|row| {
            let key: Vec<String> = row.iter().map(Value::key).collect();
            seen.insert(key)
        });
        let removed = before - self.rows.len();
        (self, removed)
    }

    /// Add a numeric column, or replace it if the name already exists
    pub fn with_numeric_column(mut self, name: &str, values: Vec<f64>) -> Result<Dataset> {
        if values.len() != self.rows.len() {
            return Err(RegressionError::InvalidInput(format!(
                "column '{}' has {} values, dataset has {} rows",
                name,
                values.len(),
                self.rows.len()
            )));
        }

        match self.column_index(name) {
            Ok(col) => {
                self.columns[col].kind = ColumnType::Numeric;
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row[col] = Value::Number(v);
                }
            }
            Err(_) => {
                self.index.insert(name.to_string(), self.columns.len());
                self.columns.push(Column::numeric(name));
                for (row, v) in self.rows.iter_mut().zip(values) {
                    row.push(Value::Number(v));
                }
            }
        }
        Ok(self)
    }

    /// Positions of missing cells as (row, column name)
    pub fn missing_cells(&self) -> Vec<(usize, &str)> {
        let mut cells = Vec::new();
        for (i, row) in self.rows.iter().enumerate() {
            for (j, value) in row.iter().enumerate() {
                if value.is_missing() {
                    cells.push((i, self.columns[j].name.as_str()));
                }
            }
        }
        cells
    }

    /// Stack datasets with identical schemas
    pub fn concat(parts: &[&Dataset]) -> Result<Dataset> {
        let first = parts.first().ok_or_else(|| {
            RegressionError::InvalidInput("cannot concatenate zero datasets".to_string())
        })?;
        let mut out = first.empty_like();
        out.rows.reserve(parts.iter().map(|p| p.n_rows()).sum());
        for part in parts {
            if part.columns != first.columns {
                return Err(RegressionError::InvalidInput(
                    "cannot concatenate datasets with different schemas".to_string(),
                ));
            }
            out.rows.extend(part.rows.iter().cloned());
        }
        Ok(out)
    }
}

fn check_cell(column: &Column, value: &Value) -> Result<()> {
    if value.fits(column.kind) {
        return Ok(());
    }
    Err(RegressionError::InvalidInput(format!(
        "{:?} does not fit {:?} column '{}'",
        value, column.kind, column.name
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Dataset {
        Dataset::from_columns(vec![
            ("a", vec![1.0, 2.0, 3.0, 2.0]),
            ("b", vec![10.0, 20.0, 30.0, 20.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_column_values_and_matrix() {
        let ds = sample();
        assert_eq!(ds.column_values("a").unwrap(), vec![1.0, 2.0, 3.0, 2.0]);

        let x = ds.feature_matrix(&["b".to_string(), "a".to_string()]).unwrap();
        assert_eq!(x.dim(), (4, 2));
        assert_eq!(x[[2, 0]], 30.0);
        assert_eq!(x[[2, 1]], 3.0);
    }

    #[test]
    fn test_unknown_column() {
        let ds = sample();
        assert!(matches!(
            ds.column_values("missing"),
            Err(RegressionError::FeatureNotFound(_))
        ));
    }

    #[test]
    fn test_non_numeric_values_are_rejected() {
        let mut ds = Dataset::new(vec![Column::numeric("x"), Column::categorical("colour")]).unwrap();
        ds.push_row(vec![Value::from(1.0), Value::from("red")]).unwrap();
        ds.push_row(vec![Value::Missing, Value::from("blue")]).unwrap();

        assert!(matches!(
            ds.column_values("colour"),
            Err(RegressionError::InvalidInput(_))
        ));
        assert!(matches!(
            ds.column_values("x"),
            Err(RegressionError::InvalidInput(_))
        ));
        assert_eq!(ds.missing_cells(), vec![(1, "x")]);
    }

    #[test]
    fn test_cells_must_match_column_type() {
        let mut ds = Dataset::new(vec![Column::numeric("x"), Column::categorical("colour")]).unwrap();
        assert!(matches!(
            ds.push_row(vec![Value::from("1"), Value::from("red")]),
            Err(RegressionError::InvalidInput(_))
        ));
        assert!(matches!(
            ds.push_row(vec![Value::from(1.0), Value::from(2.0)]),
            Err(RegressionError::InvalidInput(_))
        ));
        assert!(ds.is_empty());

        ds.push_row(vec![Value::Missing, Value::Missing]).unwrap();
        assert!(ds.set_value(0, "colour", Value::from(3.0)).is_err());
        ds.set_value(0, "x", Value::from(3.0)).unwrap();
        assert_eq!(ds.column_values("x").unwrap(), vec![3.0]);
    }

    #[test]
    fn test_categorical_column_is_never_numeric() {
        let mut ds = Dataset::new(vec![Column::categorical("colour")]).unwrap();
        ds.push_row(vec![Value::Missing]).unwrap();
        assert!(matches!(
            ds.feature_matrix(&["colour".to_string()]),
            Err(RegressionError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_non_finite_numbers_are_rejected() {
        let ds = Dataset::from_columns(vec![("a", vec![1.0, f64::NAN]), ("b", vec![f64::INFINITY, 2.0])])
            .unwrap();
        assert!(matches!(ds.column_values("a"), Err(RegressionError::InvalidInput(_))));
        assert!(ds.target("b").is_err());
        assert!(ds.feature_matrix(&["a".to_string()]).is_err());
    }

    #[test]
    fn test_dedup_and_without_rows() {
        let (ds, removed) = sample().dedup_rows();
        assert_eq!(removed, 1);
        assert_eq!(ds.n_rows(), 3);

        let ds = ds.without_rows(&[0]);
        assert_eq!(ds.column_values("a").unwrap(), vec![2.0, 3.0]);
    }

    #[test]
    fn test_with_numeric_column() {
        let ds = sample()
            .with_numeric_column("a scaled", vec![0.0, 0.5, 1.0, 0.5])
            .unwrap();
        assert_eq!(ds.n_columns(), 3);
        assert_eq!(ds.column_values("a scaled").unwrap()[2], 1.0);

        let ds = ds.with_numeric_column("a", vec![9.0; 4]).unwrap();
        assert_eq!(ds.n_columns(), 3);
        assert_eq!(ds.column_values("a").unwrap(), vec![9.0; 4]);
    }

    #[test]
    fn test_concat_and_select() {
        let ds = sample();
        let head = ds.select_rows(&[0, 1]).unwrap();
        let tail = ds.select_rows(&[2, 3]).unwrap();
        let joined = Dataset::concat(&[&head, &tail]).unwrap();
        assert_eq!(joined, ds);
    }

    #[test]
    fn test_serde_round_trip_rebuilds_lookup() {
        let ds = sample();
        let json = serde_json::to_string(&ds).unwrap();
        let back: Dataset = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ds);
        assert_eq!(back.column_values("b").unwrap(), ds.column_values("b").unwrap());
    }
}
