//! Configuration management module
//!
//! Settings are environment-driven: the library itself is stateless and
//! every operation receives its connection explicitly.

pub mod settings;

pub use settings::StorageSettings;
