//! Storage access and credential handling
//!
//! This module turns a stored connection string (or an ambient Azure
//! identity) into live blob and table service handles. Connections are
//! passed explicitly into each operation; there is no process-wide
//! singleton.

pub mod provider;

pub use provider::StorageConnection;
