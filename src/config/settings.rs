//! Configuration settings management
//!
//! This module handles loading library settings from the environment
//! and validating them before a connection is built.

use crate::access::StorageConnection;
use crate::error::{EazureError, Result};
use serde::{Deserialize, Serialize};

/// Environment variable expected to hold the storage connection string
/// when no other variable name is configured.
pub const DEFAULT_CONNECTION_STRING_VAR: &str = "AZURE_STORAGE_CONNECTION_STRING";

fn default_connection_string_var() -> String {
    DEFAULT_CONNECTION_STRING_VAR.to_string()
}

fn default_batched_writes() -> bool {
    true
}

/// Library settings, loaded from `EAZURE_`-prefixed environment variables.
///
/// `EAZURE_CONNECTION_STRING_VAR` names the variable holding the actual
/// connection string; the secret itself never passes through this struct.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageSettings {
    #[serde(default = "default_connection_string_var")]
    pub connection_string_var: String,
    #[serde(default)]
    pub default_container: Option<String>,
    #[serde(default = "default_batched_writes")]
    pub batched_writes: bool,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            connection_string_var: default_connection_string_var(),
            default_container: None,
            batched_writes: default_batched_writes(),
        }
    }
}

impl StorageSettings {
    /// Load settings from the process environment.
    pub fn load() -> Result<Self> {
        let settings: Self = config::Config::builder()
            .add_source(config::Environment::with_prefix("EAZURE"))
            .build()?
            .try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.connection_string_var.trim().is_empty() {
            return Err(EazureError::config(
                "Connection string variable name cannot be empty",
            ));
        }
        Ok(())
    }

    /// Build a connection from the configured environment variable.
    pub fn connection(&self) -> Result<StorageConnection> {
        StorageConnection::from_env_var(&self.connection_string_var)
    }

    /// Build a blob store for the configured default container.
    pub fn blob_store(&self) -> Result<crate::blob::BlobStore> {
        let container = self.default_container.clone().ok_or_else(|| {
            EazureError::config("No default container configured (EAZURE_DEFAULT_CONTAINER)")
        })?;
        Ok(crate::blob::BlobStore::new(self.connection()?, container))
    }
}
