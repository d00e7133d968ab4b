//! Key assignment for tabular datasets
//!
//! Before a frame can be inserted into a table it needs string-typed
//! `PartitionKey` and `RowKey` columns. Keys come from existing columns
//! (cast to string), from a fixed partition literal, or from generated
//! row identifiers.

use crate::error::{EazureError, Result};
use arrow::array::{Array, ArrayRef, AsArray, StringArray};
use arrow::compute::{can_cast_types, cast};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use std::sync::Arc;
use uuid::Uuid;

/// Where the partition key of each row comes from.
#[derive(Debug, Clone)]
pub enum PartitionKeySource {
    /// Cast an existing column to string.
    Column(String),
    /// One fixed literal for every row.
    Literal(String),
}

/// Where the row key of each row comes from.
#[derive(Debug, Clone)]
pub enum RowKeySource {
    /// Cast an existing column to string.
    Column(String),
    /// `{partition}-{NNN}`: the row's partition key plus a zero-padded
    /// row counter, unique within the frame.
    Sequence,
    /// A fresh UUID per row.
    Uuid,
}

/// Key assignment spec for [`add_keys`].
#[derive(Debug, Clone)]
pub struct KeySpec {
    pub partition: PartitionKeySource,
    pub row: RowKeySource,
}

impl KeySpec {
    /// Both keys from existing columns.
    pub fn from_columns(partition: impl Into<String>, row: impl Into<String>) -> Self {
        Self {
            partition: PartitionKeySource::Column(partition.into()),
            row: RowKeySource::Column(row.into()),
        }
    }

    /// Fixed partition literal, generated sequential row keys.
    pub fn literal(partition: impl Into<String>) -> Self {
        Self {
            partition: PartitionKeySource::Literal(partition.into()),
            row: RowKeySource::Sequence,
        }
    }

    pub fn with_row_source(mut self, row: RowKeySource) -> Self {
        self.row = row;
        self
    }
}

/// Produce a new frame with string `PartitionKey` and `RowKey` columns
/// appended. Existing columns with those names are replaced. Key source
/// columns that cannot be represented as strings, or that contain nulls,
/// fail with [`EazureError::InvalidKey`].
pub fn add_keys(batch: &RecordBatch, spec: &KeySpec) -> Result<RecordBatch> {
    let rows = batch.num_rows();

    let partition = match &spec.partition {
        PartitionKeySource::Column(name) => cast_key_column(batch, name)?,
        PartitionKeySource::Literal(value) => {
            StringArray::from(vec![value.clone(); rows])
        }
    };

    let row = match &spec.row {
        RowKeySource::Column(name) => cast_key_column(batch, name)?,
        RowKeySource::Sequence => {
            let width = rows.to_string().len();
            let values: Vec<String> = (0..rows)
                .map(|i| format!("{}-{:0width$}", partition.value(i), i))
                .collect();
            StringArray::from(values)
        }
        RowKeySource::Uuid => {
            let values: Vec<String> = (0..rows).map(|_| Uuid::new_v4().to_string()).collect();
            StringArray::from(values)
        }
    };

    let mut fields: Vec<Field> = Vec::with_capacity(batch.num_columns() + 2);
    let mut columns: Vec<ArrayRef> = Vec::with_capacity(batch.num_columns() + 2);
    for (field, column) in batch.schema_ref().fields().iter().zip(batch.columns()) {
        if field.name() == "PartitionKey" || field.name() == "RowKey" {
            continue;
        }
        fields.push(field.as_ref().clone());
        columns.push(column.clone());
    }
    fields.push(Field::new("PartitionKey", DataType::Utf8, false));
    columns.push(Arc::new(partition));
    fields.push(Field::new("RowKey", DataType::Utf8, false));
    columns.push(Arc::new(row));

    Ok(RecordBatch::try_new(Arc::new(Schema::new(fields)), columns)?)
}

fn cast_key_column(batch: &RecordBatch, name: &str) -> Result<StringArray> {
    let column = batch
        .column_by_name(name)
        .ok_or_else(|| EazureError::invalid_key(name, "no such column"))?;
    if !can_cast_types(column.data_type(), &DataType::Utf8) {
        return Err(EazureError::invalid_key(
            name.to_string(),
            format!(
                "values of type {} cannot be represented as strings",
                column.data_type()
            ),
        ));
    }
    let casted = cast(column, &DataType::Utf8)?;
    if casted.null_count() > 0 {
        return Err(EazureError::invalid_key(name, "key values must be non-null"));
    }
    Ok(casted.as_string::<i32>().clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use arrow::array::Int64Array;
    use std::collections::HashSet;

    fn sample_batch(rows: i64) -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("region", DataType::Utf8, false),
            Field::new("id", DataType::Int64, false),
        ]));
        let regions: Vec<String> = (0..rows).map(|i| format!("r{}", i % 3)).collect();
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(regions)),
                Arc::new(Int64Array::from((0..rows).collect::<Vec<_>>())),
            ],
        )
        .unwrap()
    }

    fn key_column<'a>(batch: &'a RecordBatch, name: &str) -> &'a StringArray {
        batch.column_by_name(name).unwrap().as_string::<i32>()
    }

    #[test]
    fn keys_from_columns_are_cast_to_string() {
        let batch = sample_batch(4);
        let keyed = add_keys(&batch, &KeySpec::from_columns("region", "id")).unwrap();

        assert_eq!(keyed.num_columns(), 4);
        assert_eq!(key_column(&keyed, "PartitionKey").value(1), "r1");
        assert_eq!(key_column(&keyed, "RowKey").value(2), "2");
    }

    #[test]
    fn literal_partition_with_sequence_rows() {
        let batch = sample_batch(12);
        let keyed = add_keys(&batch, &KeySpec::literal("run-7")).unwrap();

        let partition = key_column(&keyed, "PartitionKey");
        assert!((0..12).all(|i| partition.value(i) == "run-7"));
        let row = key_column(&keyed, "RowKey");
        assert_eq!(row.value(0), "run-7-00");
        assert_eq!(row.value(11), "run-7-11");
    }

    #[test]
    fn generated_row_keys_are_pairwise_unique() {
        let batch = sample_batch(120);

        for source in [RowKeySource::Sequence, RowKeySource::Uuid] {
            let keyed = add_keys(&batch, &KeySpec::literal("p").with_row_source(source)).unwrap();
            let row = key_column(&keyed, "RowKey");
            let unique: HashSet<&str> = (0..row.len()).map(|i| row.value(i)).collect();
            assert_eq!(unique.len(), 120);
        }
    }

    #[test]
    fn key_columns_are_string_typed_and_non_null() {
        let batch = sample_batch(5);
        let keyed = add_keys(&batch, &KeySpec::from_columns("region", "id")).unwrap();
        for name in ["PartitionKey", "RowKey"] {
            let column = keyed.column_by_name(name).unwrap();
            assert_eq!(column.data_type(), &DataType::Utf8);
            assert_eq!(column.null_count(), 0);
        }
    }

    #[test]
    fn missing_key_source_column_is_invalid() {
        let batch = sample_batch(3);
        let error = add_keys(&batch, &KeySpec::from_columns("nope", "id")).unwrap_err();
        assert!(matches!(error, EazureError::InvalidKey { .. }));
    }

    #[test]
    fn existing_key_columns_are_replaced() {
        let batch = sample_batch(3);
        let keyed = add_keys(&batch, &KeySpec::literal("a")).unwrap();
        let rekeyed = add_keys(&keyed, &KeySpec::literal("b")).unwrap();

        assert_eq!(rekeyed.num_columns(), 4);
        assert_eq!(key_column(&rekeyed, "PartitionKey").value(0), "b");
    }
}
