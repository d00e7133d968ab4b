//! Core blob store for format-aware file operations

use crate::access::StorageConnection;
use crate::blob::models::BlobInfo;
use crate::codec::{self, FileFormat, FormatOptions, Payload};
use crate::error::{EazureError, Result};
use crate::frame::{concat_frames, dedup_rows, filter_rows, ColumnFilter};
use crate::utils::network::is_not_found;
use arrow::record_batch::RecordBatch;
use azure_storage_blobs::prelude::*;
use bytes::Bytes;
use chrono::Utc;
use futures::TryStreamExt;

/// Format-aware operations against one blob container.
///
/// The store holds only the connection and the container name; each call
/// builds its clients fresh and awaits a single request at a time.
pub struct BlobStore {
    connection: StorageConnection,
    container: String,
}

impl BlobStore {
    pub fn new(connection: StorageConnection, container: impl Into<String>) -> Self {
        Self {
            connection,
            container: container.into(),
        }
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    fn blob_client(&self, name: &str) -> BlobClient {
        self.connection
            .container_client(&self.container)
            .blob_client(name)
    }

    /// Download and decode a blob. The payload type follows the extension:
    /// tabular formats yield a data frame, `.txt` text, `.json` and
    /// `.pkl`/`.pickle` a generic value.
    pub async fn read(&self, name: &str, options: &FormatOptions) -> Result<Payload> {
        let format = FileFormat::from_name(name)?;
        let bytes = self.download(name).await?;
        tracing::debug!(blob = name, len = bytes.len(), "downloaded blob");
        codec::decode(format, &bytes, options)
    }

    /// Download a blob that must decode to a tabular dataset. Extensions
    /// that never yield one (`.json`, `.txt`, `.pkl`) are rejected before
    /// any network call.
    pub async fn read_frame(&self, name: &str, options: &FormatOptions) -> Result<RecordBatch> {
        require_tabular(name)?;
        self.read(name, options).await?.into_frame()
    }

    /// Encode a payload in memory and upload it, overwriting any existing
    /// blob at that path.
    pub async fn write(&self, name: &str, payload: &Payload, options: &FormatOptions) -> Result<()> {
        let format = FileFormat::from_name(name)?;
        let bytes = codec::encode(format, payload, options)?;
        self.upload(name, bytes).await
    }

    /// Append rows to a tabular blob, existing rows first. A missing blob
    /// is treated as empty with the incoming columns. When `id_columns` is
    /// non-empty, later duplicates of those column tuples are dropped.
    pub async fn append_rows(
        &self,
        name: &str,
        rows: &RecordBatch,
        id_columns: &[String],
        options: &FormatOptions,
    ) -> Result<()> {
        // Resolve the format up front so an unsupported or non-tabular
        // extension fails before the existence probe.
        require_tabular(name)?;

        let combined = if self.exists(name).await? {
            let existing = self.read_frame(name, options).await?;
            concat_frames(&existing, rows)?
        } else {
            rows.clone()
        };
        let combined = dedup_rows(&combined, id_columns)?;

        self.write(name, &Payload::Frame(combined), options).await
    }

    /// Rewrite a tabular blob keeping only the rows accepted by every
    /// column filter. An empty result still overwrites the blob with an
    /// empty dataset.
    pub async fn filter_in_place(
        &self,
        name: &str,
        filters: &[ColumnFilter],
        options: &FormatOptions,
    ) -> Result<()> {
        let frame = self.read_frame(name, options).await?;
        let filtered = filter_rows(&frame, filters)?;
        tracing::debug!(
            blob = name,
            kept = filtered.num_rows(),
            total = frame.num_rows(),
            "filtered blob rows"
        );
        self.write(name, &Payload::Frame(filtered), options).await
    }

    /// Delete a path: the blob at `path` if one exists, otherwise every
    /// blob under it as a `/`-delimited prefix. Returns the number of
    /// blobs removed; zero for an absent path.
    pub async fn delete(&self, path: &str) -> Result<usize> {
        if self.delete_if_exists(path).await? {
            return Ok(1);
        }
        self.delete_prefix(path).await
    }

    /// Delete one blob. Absence is a success, not an error; the returned
    /// flag says whether anything was actually removed.
    pub async fn delete_if_exists(&self, name: &str) -> Result<bool> {
        match self.blob_client(name).delete().await {
            Ok(_) => {
                tracing::debug!(blob = name, "deleted blob");
                Ok(true)
            }
            Err(e) if is_not_found(&e) => {
                tracing::debug!(blob = name, "blob already absent, nothing to delete");
                Ok(false)
            }
            Err(e) => Err(EazureError::azure_api(format!(
                "Failed to delete blob '{name}': {e}"
            ))),
        }
    }

    /// Delete every blob under a `/`-delimited prefix. Returns how many
    /// blobs were removed; an empty prefix listing is a no-op.
    pub async fn delete_prefix(&self, prefix: &str) -> Result<usize> {
        let names: Vec<String> = self
            .list(Some(&normalize_prefix(prefix)))
            .await?
            .into_iter()
            .map(|info| info.name)
            .collect();

        let mut deleted = 0;
        for name in names {
            if self.delete_if_exists(&name).await? {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    /// Whether a blob exists at this path.
    pub async fn exists(&self, name: &str) -> Result<bool> {
        match self.blob_client(name).exists().await {
            Ok(exists) => Ok(exists),
            Err(e) if is_not_found(&e) => Ok(false),
            Err(e) => Err(EazureError::azure_api(format!(
                "Failed to check blob '{name}': {e}"
            ))),
        }
    }

    /// List blobs, optionally restricted to a prefix.
    pub async fn list(&self, prefix: Option<&str>) -> Result<Vec<BlobInfo>> {
        let container_client = self.connection.container_client(&self.container);

        let mut list_builder = container_client.list_blobs();
        if let Some(prefix) = prefix {
            list_builder = list_builder.prefix(prefix.to_string());
        }

        let mut stream = list_builder.into_stream();
        let mut infos = Vec::new();
        while let Some(page) = stream
            .try_next()
            .await
            .map_err(|e| EazureError::azure_api(format!("Failed to list blobs: {e}")))?
        {
            for blob_item in page.blobs.blobs() {
                let last_modified = {
                    let timestamp = blob_item.properties.last_modified.unix_timestamp();
                    chrono::DateTime::from_timestamp(timestamp, 0).unwrap_or_else(Utc::now)
                };
                infos.push(BlobInfo {
                    name: blob_item.name.clone(),
                    size: blob_item.properties.content_length,
                    content_type: blob_item.properties.content_type.clone(),
                    last_modified,
                    etag: blob_item.properties.etag.to_string(),
                });
            }
        }

        Ok(infos)
    }

    async fn download(&self, name: &str) -> Result<Vec<u8>> {
        let blob_client = self.blob_client(name);

        // Probe properties first: a missing blob maps to the not-found
        // error, and a 0-byte blob is returned directly because
        // get_content() answers HTTP 416 for empty ranges.
        let properties = match blob_client.get_properties().await {
            Ok(properties) => properties,
            Err(e) if is_not_found(&e) => return Err(EazureError::blob_not_found(name)),
            Err(e) => {
                return Err(EazureError::azure_api(format!(
                    "Failed to check blob '{name}': {e}"
                )))
            }
        };
        if properties.blob.properties.content_length == 0 {
            return Ok(Vec::new());
        }

        blob_client.get_content().await.map_err(|e| {
            if is_not_found(&e) {
                EazureError::blob_not_found(name)
            } else {
                EazureError::azure_api(format!("Failed to download blob '{name}': {e}"))
            }
        })
    }

    async fn upload(&self, name: &str, bytes: Vec<u8>) -> Result<()> {
        let content_type = mime_guess::from_path(name)
            .first_or_octet_stream()
            .to_string();
        let size = bytes.len();

        self.blob_client(name)
            .put_block_blob(Bytes::from(bytes))
            .content_type(&content_type)
            .await
            .map_err(|e| EazureError::azure_api(format!("Failed to upload blob '{name}': {e}")))?;

        tracing::debug!(blob = name, size, content_type = %content_type, "uploaded blob");
        Ok(())
    }
}

/// Resolve a blob name to a format that decodes to a tabular dataset.
fn require_tabular(name: &str) -> Result<FileFormat> {
    let format = FileFormat::from_name(name)?;
    if !format.decodes_frames() {
        return Err(EazureError::invalid_argument(format!(
            "Blob '{name}' does not decode to a tabular dataset"
        )));
    }
    Ok(format)
}

/// Ensure a non-empty prefix ends with '/' so it matches a virtual
/// directory rather than a name prefix.
fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim();
    if trimmed.is_empty() || trimmed.ends_with('/') {
        trimmed.to_string()
    } else {
        format!("{trimmed}/")
    }
}
