//! Data models for table storage operations
//!
//! `TableEntity` is the wire shape: the two key fields plus a flattened
//! property map, which is exactly what the service serializes. Frames and
//! entities convert through row-oriented JSON so queried columns come back
//! as the union of all retrieved entities' fields.

use crate::error::{EazureError, Result};
use crate::frame::Scalar;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::error::ArrowError;
use arrow::json::reader::infer_json_schema_from_iterator;
use arrow::json::{ArrayWriter, ReaderBuilder};
use arrow::record_batch::RecordBatch;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

/// One schema-less table row, addressed by its (partition, row) key pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableEntity {
    #[serde(rename = "PartitionKey")]
    pub partition_key: String,
    #[serde(rename = "RowKey")]
    pub row_key: String,
    #[serde(flatten)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

impl TableEntity {
    pub fn new(partition_key: impl Into<String>, row_key: impl Into<String>) -> Self {
        Self {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_property(
        mut self,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.properties.insert(name.into(), value.into());
        self
    }

    pub fn property(&self, name: &str) -> Option<&serde_json::Value> {
        self.properties.get(name)
    }

    /// Drop the `odata.*` annotations the service attaches to query
    /// results.
    pub(crate) fn strip_odata(&mut self) {
        self.properties.retain(|key, _| !key.starts_with("odata."));
    }

    /// Drop the service-managed timestamp, required before re-inserting a
    /// queried entity elsewhere.
    pub(crate) fn strip_timestamp(&mut self) {
        self.properties.remove("Timestamp");
    }
}

/// Comparison operators accepted by table query filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl FilterOp {
    fn odata(&self) -> &'static str {
        match self {
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Gt => "gt",
            Self::Ge => "ge",
            Self::Lt => "lt",
            Self::Le => "le",
        }
    }
}

/// One column/operator/value condition of a query filter.
#[derive(Debug, Clone)]
pub struct FilterCond {
    pub column: String,
    pub op: FilterOp,
    pub value: Scalar,
}

impl FilterCond {
    pub fn new(column: impl Into<String>, op: FilterOp, value: impl Into<Scalar>) -> Self {
        Self {
            column: column.into(),
            op,
            value: value.into(),
        }
    }
}

/// Render conditions as an OData `$filter` expression, AND-combined.
pub(crate) fn odata_filter(conditions: &[FilterCond]) -> String {
    conditions
        .iter()
        .map(|c| format!("{} {} {}", c.column, c.op.odata(), c.value.to_odata()))
        .collect::<Vec<_>>()
        .join(" and ")
}

fn key_schema() -> Arc<Schema> {
    Arc::new(Schema::new(vec![
        Field::new("PartitionKey", DataType::Utf8, false),
        Field::new("RowKey", DataType::Utf8, false),
    ]))
}

/// Rebuild a tabular dataset from queried entities. Columns are the union
/// of every entity's fields; entities missing a field get a null there.
pub fn entities_to_frame(entities: &[TableEntity]) -> Result<RecordBatch> {
    if entities.is_empty() {
        return Ok(RecordBatch::new_empty(key_schema()));
    }

    let values = entities
        .iter()
        .map(serde_json::to_value)
        .collect::<std::result::Result<Vec<_>, _>>()?;
    let schema = infer_json_schema_from_iterator(
        values.iter().map(|value| Ok::<_, ArrowError>(value.clone())),
    )?;
    let schema = Arc::new(schema);

    let mut decoder = ReaderBuilder::new(schema.clone()).build_decoder()?;
    decoder.serialize(&values)?;
    let batch = decoder
        .flush()?
        .unwrap_or_else(|| RecordBatch::new_empty(schema));
    Ok(batch)
}

/// Turn a keyed dataset into entities, validating the key columns before
/// anything leaves the process.
pub fn frame_to_entities(batch: &RecordBatch) -> Result<Vec<TableEntity>> {
    validate_key_column(batch, "PartitionKey")?;
    validate_key_column(batch, "RowKey")?;

    let mut writer = ArrayWriter::new(Vec::new());
    writer.write(batch)?;
    writer.finish()?;
    let entities: Vec<TableEntity> = serde_json::from_slice(&writer.into_inner())?;
    Ok(entities)
}

fn validate_key_column(batch: &RecordBatch, name: &str) -> Result<()> {
    let column = batch
        .column_by_name(name)
        .ok_or_else(|| EazureError::invalid_key(name, "column is missing"))?;
    if column.data_type() != &DataType::Utf8 {
        return Err(EazureError::invalid_key(
            name.to_string(),
            format!("must be string-typed, found {}", column.data_type()),
        ));
    }
    if column.null_count() > 0 {
        return Err(EazureError::invalid_key(name, "key values must be non-null"));
    }
    Ok(())
}
