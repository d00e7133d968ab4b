//! Core table store for entity CRUD operations
//!
//! Every method issues one request at a time against a fresh service
//! handle. Row-at-a-time operations here are O(n) network round-trips;
//! the chunked variants live in `table::batch`.

use crate::access::StorageConnection;
use crate::error::{EazureError, Result};
use crate::table::models::{
    entities_to_frame, frame_to_entities, odata_filter, FilterCond, TableEntity,
};
use crate::utils::network::{is_conflict, is_not_found};
use arrow::record_batch::RecordBatch;
use azure_core::request_options::IfMatchCondition;
use azure_data_tables::operations::{GetEntityResponse, InsertEntityResponse};
use azure_data_tables::prelude::*;
use futures::TryStreamExt;

/// Entity operations against one storage account's table service.
pub struct TableStore {
    connection: StorageConnection,
}

impl TableStore {
    pub fn new(connection: StorageConnection) -> Self {
        Self { connection }
    }

    pub(crate) fn service(&self) -> TableServiceClient {
        self.connection.table_service()
    }

    /// Whether a table exists. "Does not exist" is a `false`, never an
    /// error; only connectivity and auth failures propagate.
    pub async fn table_exists(&self, table: &str) -> Result<bool> {
        let mut stream = self.service().list().into_stream();
        while let Some(page) = stream
            .try_next()
            .await
            .map_err(|e| EazureError::azure_api(format!("Failed to list tables: {e}")))?
        {
            if page.tables.iter().any(|t| t.name == table) {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Create a table. Success if it already exists.
    pub async fn create_table(&self, table: &str) -> Result<()> {
        match self.service().table_client(table).create().await {
            Ok(_) => {
                tracing::debug!(table, "created table");
                Ok(())
            }
            Err(e) if is_conflict(&e) => {
                tracing::debug!(table, "table already exists");
                Ok(())
            }
            Err(e) => Err(EazureError::azure_api(format!(
                "Failed to create table '{table}': {e}"
            ))),
        }
    }

    /// Drop a table. Absence is a success; the flag says whether anything
    /// was removed.
    pub async fn delete_table_if_exists(&self, table: &str) -> Result<bool> {
        match self.service().table_client(table).delete().await {
            Ok(_) => {
                tracing::debug!(table, "deleted table");
                Ok(true)
            }
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(EazureError::azure_api(format!(
                "Failed to delete table '{table}': {e}"
            ))),
        }
    }

    /// All entities of a table as a frame; columns are the union of the
    /// retrieved entities' fields.
    pub async fn query_all(&self, table: &str) -> Result<RecordBatch> {
        let entities = self.query_entities(table, None).await?;
        entities_to_frame(&entities)
    }

    /// Entities matching the AND-combined conditions, as a frame.
    pub async fn query_filtered(
        &self,
        table: &str,
        conditions: &[FilterCond],
    ) -> Result<RecordBatch> {
        let filter = if conditions.is_empty() {
            None
        } else {
            Some(odata_filter(conditions))
        };
        let entities = self.query_entities(table, filter).await?;
        entities_to_frame(&entities)
    }

    /// Exactly one entity by its key pair, or `EntityNotFound`.
    pub async fn query_entity(
        &self,
        table: &str,
        partition_key: &str,
        row_key: &str,
    ) -> Result<TableEntity> {
        let entity_client = self
            .service()
            .table_client(table)
            .partition_key_client(partition_key)
            .entity_client(row_key);

        let response: std::result::Result<GetEntityResponse<TableEntity>, _> =
            entity_client.get().await;
        match response {
            Ok(response) => {
                let mut entity = response.entity;
                entity.strip_odata();
                Ok(entity)
            }
            Err(e) if is_not_found(&e) => {
                Err(EazureError::entity_not_found(partition_key, row_key))
            }
            Err(e) => Err(EazureError::azure_api(format!(
                "Failed to get entity '{partition_key}'/'{row_key}': {e}"
            ))),
        }
    }

    /// Raw entity listing, optionally filtered, across all result pages.
    pub async fn query_entities(
        &self,
        table: &str,
        filter: Option<String>,
    ) -> Result<Vec<TableEntity>> {
        let table_client = self.service().table_client(table);
        let mut builder = table_client.query();
        if let Some(expression) = filter {
            builder = builder.filter(expression);
        }

        let mut stream = builder.into_stream::<TableEntity>();
        let mut entities = Vec::new();
        while let Some(page) = stream
            .try_next()
            .await
            .map_err(|e| EazureError::azure_api(format!("Failed to query table '{table}': {e}")))?
        {
            entities.extend(page.entities);
        }
        for entity in &mut entities {
            entity.strip_odata();
        }
        tracing::debug!(table, count = entities.len(), "queried entities");
        Ok(entities)
    }

    /// Insert entities one request per row.
    pub async fn insert_entities(&self, table: &str, entities: &[TableEntity]) -> Result<usize> {
        let table_client = self.service().table_client(table);
        for entity in entities {
            let _: InsertEntityResponse<TableEntity> = table_client
                .insert(entity)
                .map_err(|e| {
                    EazureError::serialization(format!("Failed to serialize entity: {e}"))
                })?
                .await
                .map_err(|e| {
                    EazureError::azure_api(format!(
                        "Failed to insert entity '{}'/'{}': {e}",
                        entity.partition_key, entity.row_key
                    ))
                })?;
        }
        tracing::debug!(table, count = entities.len(), "inserted entities");
        Ok(entities.len())
    }

    /// Insert a keyed frame one request per row. Key columns are
    /// validated before the first request.
    pub async fn insert_frame(&self, table: &str, frame: &RecordBatch) -> Result<usize> {
        let entities = frame_to_entities(frame)?;
        self.insert_entities(table, &entities).await
    }

    /// Delete every entity, one request per row.
    pub async fn delete_all_rows(&self, table: &str) -> Result<usize> {
        let entities = self.query_entities(table, None).await?;
        let table_client = self.service().table_client(table);
        for entity in &entities {
            table_client
                .partition_key_client(&entity.partition_key)
                .entity_client(&entity.row_key)
                .delete()
                .await
                .map_err(|e| {
                    EazureError::azure_api(format!(
                        "Failed to delete entity '{}'/'{}': {e}",
                        entity.partition_key, entity.row_key
                    ))
                })?;
        }
        tracing::debug!(table, count = entities.len(), "deleted all rows");
        Ok(entities.len())
    }

    /// Upload a keyed frame row by row, creating the table if missing and
    /// optionally truncating it first.
    pub async fn write_frame(
        &self,
        table: &str,
        frame: &RecordBatch,
        truncate: bool,
    ) -> Result<usize> {
        if !self.table_exists(table).await? {
            self.create_table(table).await?;
        }
        if truncate {
            self.delete_all_rows(table).await?;
        }
        self.insert_frame(table, frame).await
    }

    /// Move a table's contents under a new name: create the target, copy
    /// every entity, drop the source. Any existing table under the new
    /// name is dropped first. Row-at-a-time, O(n) round-trips.
    pub async fn rename_table(&self, old_name: &str, new_name: &str) -> Result<()> {
        self.delete_table_if_exists(new_name).await?;
        self.create_table(new_name).await?;

        let mut entities = self.query_entities(old_name, None).await?;
        for entity in &mut entities {
            entity.strip_timestamp();
        }
        self.insert_entities(new_name, &entities).await?;

        self.delete_table_if_exists(old_name).await?;
        tracing::info!(old_name, new_name, "renamed table");
        Ok(())
    }

    /// Copy a property to a new name on every entity carrying it.
    pub async fn copy_column(
        &self,
        table: &str,
        old_column: &str,
        new_column: &str,
    ) -> Result<usize> {
        let entities = self.query_entities(table, None).await?;
        let table_client = self.service().table_client(table);

        let mut updated = 0;
        for mut entity in entities {
            let Some(value) = entity.property(old_column).cloned() else {
                continue;
            };
            entity.strip_timestamp();
            entity.properties.insert(new_column.to_string(), value);

            table_client
                .partition_key_client(entity.partition_key.clone())
                .entity_client(entity.row_key.clone())
                .update(&entity, IfMatchCondition::Any)
                .map_err(|e| {
                    EazureError::serialization(format!("Failed to serialize entity: {e}"))
                })?
                .await
                .map_err(|e| {
                    EazureError::azure_api(format!("Failed to update entity: {e}"))
                })?;
            updated += 1;
        }
        Ok(updated)
    }

    /// Remove a property from every entity carrying it.
    pub async fn delete_column(&self, table: &str, column: &str) -> Result<usize> {
        let entities = self.query_entities(table, None).await?;
        let table_client = self.service().table_client(table);

        let mut updated = 0;
        for mut entity in entities {
            if entity.properties.remove(column).is_none() {
                continue;
            }
            entity.strip_timestamp();

            table_client
                .partition_key_client(entity.partition_key.clone())
                .entity_client(entity.row_key.clone())
                .update(&entity, IfMatchCondition::Any)
                .map_err(|e| {
                    EazureError::serialization(format!("Failed to serialize entity: {e}"))
                })?
                .await
                .map_err(|e| {
                    EazureError::azure_api(format!("Failed to update entity: {e}"))
                })?;
            updated += 1;
        }
        Ok(updated)
    }

    /// Rename a property on every entity carrying it: copy, then delete.
    pub async fn rename_column(
        &self,
        table: &str,
        old_column: &str,
        new_column: &str,
    ) -> Result<usize> {
        self.copy_column(table, old_column, new_column).await?;
        self.delete_column(table, old_column).await
    }
}
