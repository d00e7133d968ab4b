//! Data models for blob storage operations

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Properties of a stored blob, as returned by listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobInfo {
    pub name: String,
    pub size: u64,
    pub content_type: String,
    pub last_modified: DateTime<Utc>,
    pub etag: String,
}
