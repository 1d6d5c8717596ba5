//! Tabular data and deterministic partitioning
//!
//! A [`Dataset`] is an ordered sequence of rows over a fixed set of named,
//! typed columns. Transforming operations consume the dataset and hand back a
//! new one, so a stage never mutates data another stage still holds.

mod dataset;
mod split;

pub use dataset::{Column, ColumnType, Dataset, Value};
pub use split::{
    divide_into, split_data, DataSplit, HOLDOUT_RATIO, TRAINING_RATIO, VALIDATION_RATIO,
};
