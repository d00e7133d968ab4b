//! Tabular dataset helpers
//!
//! Small compute-kernel wrappers used by the blob and table layers:
//! row filtering by acceptable-value sets, ordered concatenation for
//! appends, and first-occurrence de-duplication on identifier columns.

use crate::error::{EazureError, Result};
use arrow::array::{Array, ArrayRef, AsArray, BooleanArray};
use arrow::compute::{cast, concat_batches, filter_record_batch};
use arrow::datatypes::{DataType, Float64Type, Int64Type};
use arrow::record_batch::RecordBatch;
use std::collections::HashSet;

/// A scalar comparison value for filters.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Str(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Self::Str(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl Scalar {
    /// Whether the value at `row` in `column` equals this scalar. A null
    /// cell or a column of a different type never matches.
    fn matches(&self, column: &ArrayRef, row: usize) -> bool {
        if !column.is_valid(row) {
            return false;
        }
        match (column.data_type(), self) {
            (DataType::Utf8, Scalar::Str(expected)) => {
                column.as_string::<i32>().value(row) == expected
            }
            (DataType::Int64, Scalar::Int(expected)) => {
                column.as_primitive::<Int64Type>().value(row) == *expected
            }
            (DataType::Int64, Scalar::Float(expected)) => {
                column.as_primitive::<Int64Type>().value(row) as f64 == *expected
            }
            (DataType::Float64, Scalar::Float(expected)) => {
                column.as_primitive::<Float64Type>().value(row) == *expected
            }
            (DataType::Float64, Scalar::Int(expected)) => {
                column.as_primitive::<Float64Type>().value(row) == *expected as f64
            }
            (DataType::Boolean, Scalar::Bool(expected)) => {
                column.as_boolean().value(row) == *expected
            }
            _ => false,
        }
    }

    /// OData literal rendering for table filter expressions.
    pub(crate) fn to_odata(&self) -> String {
        match self {
            Scalar::Str(value) => format!("'{}'", value.replace('\'', "''")),
            Scalar::Int(value) => value.to_string(),
            Scalar::Float(value) => value.to_string(),
            Scalar::Bool(value) => value.to_string(),
        }
    }
}

/// One column's acceptable-value set.
#[derive(Debug, Clone)]
pub struct ColumnFilter {
    pub column: String,
    pub accept: Vec<Scalar>,
}

impl ColumnFilter {
    pub fn new(column: impl Into<String>, accept: Vec<Scalar>) -> Self {
        Self {
            column: column.into(),
            accept,
        }
    }
}

/// Keep the rows whose value in every filtered column lies in that
/// column's acceptable set (AND across columns, OR within a set).
/// Row order is preserved.
pub fn filter_rows(batch: &RecordBatch, filters: &[ColumnFilter]) -> Result<RecordBatch> {
    let mut mask = vec![true; batch.num_rows()];

    for filter in filters {
        let column = batch.column_by_name(&filter.column).ok_or_else(|| {
            EazureError::invalid_argument(format!("No such column: {}", filter.column))
        })?;
        for (row, keep) in mask.iter_mut().enumerate() {
            if *keep {
                *keep = filter
                    .accept
                    .iter()
                    .any(|scalar| scalar.matches(column, row));
            }
        }
    }

    let mask = BooleanArray::from(mask);
    Ok(filter_record_batch(batch, &mask)?)
}

/// Concatenate two frames, existing rows first. Schema mismatches surface
/// as the codec layer's native Arrow error.
pub fn concat_frames(existing: &RecordBatch, incoming: &RecordBatch) -> Result<RecordBatch> {
    Ok(concat_batches(
        &existing.schema(),
        [existing, incoming],
    )?)
}

/// Drop later duplicates of the value tuple formed by `id_columns`,
/// keeping the first occurrence of each tuple in row order.
pub fn dedup_rows(batch: &RecordBatch, id_columns: &[String]) -> Result<RecordBatch> {
    if id_columns.is_empty() {
        return Ok(batch.clone());
    }

    let mut key_columns = Vec::with_capacity(id_columns.len());
    for name in id_columns {
        let column = batch
            .column_by_name(name)
            .ok_or_else(|| EazureError::invalid_argument(format!("No such column: {name}")))?;
        key_columns.push(cast(column, &DataType::Utf8)?);
    }

    let mut seen = HashSet::with_capacity(batch.num_rows());
    let mut mask = Vec::with_capacity(batch.num_rows());
    for row in 0..batch.num_rows() {
        let mut key = String::new();
        for column in &key_columns {
            let values = column.as_string::<i32>();
            if values.is_valid(row) {
                key.push('v');
                key.push_str(values.value(row));
            } else {
                key.push('n');
            }
            key.push('\u{1f}');
        }
        mask.push(seen.insert(key));
    }

    let mask = BooleanArray::from(mask);
    Ok(filter_record_batch(batch, &mask)?)
}
