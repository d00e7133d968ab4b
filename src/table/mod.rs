//! Azure Table Storage operations
//!
//! Entity CRUD, key assignment for tabular datasets, and transaction
//! chunking against the table service. Entities travel as flattened
//! JSON maps and re-materialize as Arrow record batches on query.

pub mod batch;
pub mod keys;
pub mod manager;
pub mod models;

pub use batch::{plan_chunks, BatchChunk, MAX_BATCH_OPERATIONS};
pub use keys::{add_keys, KeySpec, PartitionKeySource, RowKeySource};
pub use manager::TableStore;
pub use models::{entities_to_frame, frame_to_entities, FilterCond, FilterOp, TableEntity};
