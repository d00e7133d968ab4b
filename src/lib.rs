//! eazure - Azure Blob & Table convenience layer
//!
//! Convenience operations over Azure Blob Storage and Azure Table Storage:
//! extension-dispatched reading and writing of tabular and generic
//! payloads, table entity CRUD, and transaction chunking for bulk inserts
//! and deletes.

pub mod access;
pub mod blob;
pub mod codec;
pub mod config;
pub mod error;
pub mod frame;
pub mod table;
pub mod utils;

// Re-export commonly used types
pub use access::StorageConnection;
pub use blob::{BlobInfo, BlobStore};
pub use codec::{CsvOptions, ExcelOptions, FileFormat, FormatOptions, Payload};
pub use config::StorageSettings;
pub use error::{EazureError, Result};
pub use frame::{ColumnFilter, Scalar};
pub use table::{
    add_keys, plan_chunks, BatchChunk, FilterCond, FilterOp, KeySpec, PartitionKeySource,
    RowKeySource, TableEntity, TableStore, MAX_BATCH_OPERATIONS,
};
