//! Transaction chunking for bulk table operations
//!
//! The table service accepts at most 100 operations per transaction, and
//! every operation in one transaction must target the same partition.
//! `plan_chunks` turns an arbitrary row sequence into a chunk sequence
//! honoring both bounds: rows are grouped by partition key (stable,
//! first-seen partition order) and each group is split into consecutive
//! runs of at most 100.
//!
//! Chunks are submitted strictly in order, one request each. There is no
//! cross-chunk transaction: if a submission fails, earlier chunks stay
//! applied and later ones are never attempted.

use crate::error::{EazureError, Result};
use crate::table::manager::TableStore;
use crate::table::models::{frame_to_entities, TableEntity};
use arrow::record_batch::RecordBatch;
use azure_core::request_options::IfMatchCondition;
use azure_data_tables::prelude::*;
use std::collections::HashMap;

/// Service limit on operations per transaction.
pub const MAX_BATCH_OPERATIONS: usize = 100;

/// One planned transaction: a partition key and at most
/// [`MAX_BATCH_OPERATIONS`] rows that share it.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchChunk<T> {
    pub partition_key: String,
    pub rows: Vec<T>,
}

/// Split rows into submission-ready chunks.
///
/// Grouping is stable: partitions appear in first-seen order and rows
/// keep their relative order within a partition. The concatenation of all
/// chunk rows is a permutation-free regrouping of the input — every row
/// appears exactly once.
pub fn plan_chunks<T, F>(rows: Vec<T>, partition_key_of: F) -> Vec<BatchChunk<T>>
where
    F: Fn(&T) -> &str,
{
    let mut order: Vec<String> = Vec::new();
    let mut groups: HashMap<String, Vec<T>> = HashMap::new();
    for row in rows {
        let key = partition_key_of(&row).to_string();
        groups
            .entry(key.clone())
            .or_insert_with(|| {
                order.push(key.clone());
                Vec::new()
            })
            .push(row);
    }

    let mut chunks = Vec::new();
    for key in order {
        let Some(group) = groups.remove(&key) else {
            continue;
        };
        let mut current = Vec::new();
        for row in group {
            current.push(row);
            if current.len() == MAX_BATCH_OPERATIONS {
                chunks.push(BatchChunk {
                    partition_key: key.clone(),
                    rows: std::mem::take(&mut current),
                });
            }
        }
        if !current.is_empty() {
            chunks.push(BatchChunk {
                partition_key: key.clone(),
                rows: current,
            });
        }
    }
    chunks
}

impl TableStore {
    /// Insert entities in transactions of at most 100 same-partition
    /// rows. Returns the number of rows submitted; a mid-sequence failure
    /// leaves earlier chunks applied.
    pub async fn insert_entities_batched(
        &self,
        table: &str,
        entities: Vec<TableEntity>,
    ) -> Result<usize> {
        let total = entities.len();
        let chunks = plan_chunks(entities, |e| e.partition_key.as_str());
        let table_client = self.service().table_client(table);

        for chunk in chunks {
            let partition_client = table_client.partition_key_client(&chunk.partition_key);
            let mut transaction = TableTransaction::default();
            for entity in &chunk.rows {
                transaction.insert(entity).map_err(|e| {
                    EazureError::serialization(format!("Failed to serialize entity: {e}"))
                })?;
            }
            partition_client
                .submit_transaction(&transaction)
                .await
                .map_err(|e| {
                    EazureError::azure_api(format!(
                        "Failed to submit insert batch for partition '{}': {e}",
                        chunk.partition_key
                    ))
                })?;
            tracing::debug!(
                table,
                partition_key = %chunk.partition_key,
                rows = chunk.rows.len(),
                "submitted insert batch"
            );
        }
        Ok(total)
    }

    /// Insert a keyed frame in chunked transactions.
    pub async fn insert_frame_batched(&self, table: &str, frame: &RecordBatch) -> Result<usize> {
        let entities = frame_to_entities(frame)?;
        self.insert_entities_batched(table, entities).await
    }

    /// Delete every entity in chunked transactions.
    pub async fn delete_all_rows_batched(&self, table: &str) -> Result<usize> {
        let entities = self.query_entities(table, None).await?;
        let total = entities.len();
        let chunks = plan_chunks(entities, |e| e.partition_key.as_str());
        let table_client = self.service().table_client(table);

        for chunk in chunks {
            let partition_client = table_client.partition_key_client(&chunk.partition_key);
            let mut transaction = TableTransaction::default();
            for entity in &chunk.rows {
                transaction.delete(&entity.row_key, IfMatchCondition::Any);
            }
            partition_client
                .submit_transaction(&transaction)
                .await
                .map_err(|e| {
                    EazureError::azure_api(format!(
                        "Failed to submit delete batch for partition '{}': {e}",
                        chunk.partition_key
                    ))
                })?;
            tracing::debug!(
                table,
                partition_key = %chunk.partition_key,
                rows = chunk.rows.len(),
                "submitted delete batch"
            );
        }
        Ok(total)
    }

    /// Upload a keyed frame in chunked transactions, creating the table
    /// if missing and optionally truncating it first.
    pub async fn write_frame_batched(
        &self,
        table: &str,
        frame: &RecordBatch,
        truncate: bool,
    ) -> Result<usize> {
        if !self.table_exists(table).await? {
            self.create_table(table).await?;
        }
        if truncate {
            self.delete_all_rows_batched(table).await?;
        }
        self.insert_frame_batched(table, frame).await
    }
}
