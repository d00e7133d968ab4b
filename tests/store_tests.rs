//! Pre-network failure paths of the blob and table stores.
//!
//! These run against a syntactically valid connection string for an
//! account that does not exist: any request that actually left the
//! process would surface as an Azure API error, so getting the typed
//! dispatch/validation errors back proves the calls failed before any
//! network traffic.

use arrow::array::{Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use eazure::{
    BlobStore, EazureError, FormatOptions, Payload, StorageConnection, TableStore,
};
use std::sync::Arc;

const FAKE_CONNECTION_STRING: &str = "DefaultEndpointsProtocol=https;AccountName=eazuretest;AccountKey=Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==;EndpointSuffix=core.windows.net";

fn blob_store() -> BlobStore {
    let connection = StorageConnection::from_connection_string(FAKE_CONNECTION_STRING).unwrap();
    BlobStore::new(connection, "test-container")
}

fn table_store() -> TableStore {
    let connection = StorageConnection::from_connection_string(FAKE_CONNECTION_STRING).unwrap();
    TableStore::new(connection)
}

#[tokio::test]
async fn blob_read_rejects_unsupported_extensions_without_io() {
    let store = blob_store();
    let error = store
        .read("outputs/model.hdf", &FormatOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(error, EazureError::UnsupportedFormat { .. }));
}

#[tokio::test]
async fn blob_write_rejects_unsupported_extensions_without_io() {
    let store = blob_store();
    let error = store
        .write(
            "outputs/report.gbq",
            &Payload::Text("irrelevant".to_string()),
            &FormatOptions::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(error, EazureError::UnsupportedFormat { .. }));
}

#[tokio::test]
async fn blob_append_rejects_non_tabular_targets_without_io() {
    let schema = Arc::new(Schema::new(vec![Field::new("a", DataType::Int64, false)]));
    let rows =
        RecordBatch::try_new(schema, vec![Arc::new(Int64Array::from(vec![1, 2]))]).unwrap();

    let store = blob_store();
    let error = store
        .append_rows("state.pkl", &rows, &[], &FormatOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(error, EazureError::InvalidArgument(_)));
}

#[tokio::test]
async fn table_insert_rejects_non_string_keys_without_io() {
    let schema = Arc::new(Schema::new(vec![
        Field::new("PartitionKey", DataType::Int64, false),
        Field::new("RowKey", DataType::Utf8, false),
        Field::new("v", DataType::Int64, false),
    ]));
    let frame = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(vec![1])),
            Arc::new(StringArray::from(vec!["0"])),
            Arc::new(Int64Array::from(vec![7])),
        ],
    )
    .unwrap();

    let store = table_store();
    let error = store.insert_frame("metrics", &frame).await.unwrap_err();
    assert!(matches!(error, EazureError::InvalidKey { .. }));

    let error = store
        .insert_frame_batched("metrics", &frame)
        .await
        .unwrap_err();
    assert!(matches!(error, EazureError::InvalidKey { .. }));
}

#[tokio::test]
async fn table_insert_rejects_missing_key_columns_without_io() {
    let schema = Arc::new(Schema::new(vec![Field::new("v", DataType::Int64, false)]));
    let frame =
        RecordBatch::try_new(schema, vec![Arc::new(Int64Array::from(vec![7]))]).unwrap();

    let store = table_store();
    let error = store.insert_frame("metrics", &frame).await.unwrap_err();
    assert!(matches!(error, EazureError::InvalidKey { .. }));
}
