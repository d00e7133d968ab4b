//! Connection provider for the blob and table services
//!
//! A `StorageConnection` is parsed once from a connection string and then
//! hands out fresh SDK clients per call. The SDK keeps its own HTTP
//! connection pooling underneath; nothing is cached here.

use crate::error::{EazureError, Result};
use azure_core::auth::TokenCredential;
use azure_identity::{DefaultAzureCredential, TokenCredentialOptions};
use azure_storage::{CloudLocation, ConnectionString, StorageCredentials};
use azure_storage_blobs::prelude::{BlobServiceClient, ClientBuilder, ContainerClient};
use azure_data_tables::prelude::TableServiceClient;
use std::sync::Arc;
use url::Url;
use zeroize::Zeroizing;

/// A parsed, reusable handle to one storage account.
#[derive(Clone)]
pub struct StorageConnection {
    account: String,
    credentials: StorageCredentials,
    blob_location: Option<CloudLocation>,
}

impl std::fmt::Debug for StorageConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Credentials deliberately omitted
        f.debug_struct("StorageConnection")
            .field("account", &self.account)
            .finish()
    }
}

impl StorageConnection {
    /// Parse a `DefaultEndpointsProtocol=...;AccountName=...;AccountKey=...`
    /// connection string. A `BlobEndpoint=` entry switches the blob client
    /// to that endpoint (Azurite and other emulators).
    pub fn from_connection_string(raw: &str) -> Result<Self> {
        let raw = Zeroizing::new(raw.to_string());
        let parsed = ConnectionString::new(&raw)
            .map_err(|e| EazureError::config(format!("Invalid connection string: {e}")))?;

        let account = parsed
            .account_name
            .ok_or_else(|| EazureError::config("Connection string is missing AccountName"))?
            .to_string();
        let credentials = parsed
            .storage_credentials()
            .map_err(|e| EazureError::config(format!("Invalid storage credentials: {e}")))?;
        let blob_location = parsed
            .blob_endpoint
            .map(emulator_location)
            .transpose()?;

        Ok(Self {
            account,
            credentials,
            blob_location,
        })
    }

    /// Read the connection string from `AZURE_STORAGE_CONNECTION_STRING`.
    pub fn from_env() -> Result<Self> {
        Self::from_env_var(crate::config::settings::DEFAULT_CONNECTION_STRING_VAR)
    }

    /// Read the connection string from a caller-named environment variable.
    pub fn from_env_var(var_name: &str) -> Result<Self> {
        let raw = Zeroizing::new(std::env::var(var_name).map_err(|_| {
            EazureError::config(format!(
                "Connection string not found in environment variable '{var_name}'"
            ))
        })?);
        Self::from_connection_string(&raw)
    }

    /// Authenticate with the ambient Azure identity (environment, managed
    /// identity, CLI) instead of an account key.
    pub fn with_default_credential(account: impl Into<String>) -> Result<Self> {
        let credential = DefaultAzureCredential::create(TokenCredentialOptions::default())
            .map_err(|e| {
                EazureError::authentication(format!("Failed to create DefaultAzureCredential: {e}"))
            })?;
        let credential: Arc<dyn TokenCredential> = Arc::new(credential);

        Ok(Self {
            account: account.into(),
            credentials: StorageCredentials::token_credential(credential),
            blob_location: None,
        })
    }

    pub fn account(&self) -> &str {
        &self.account
    }

    /// Fresh blob service handle.
    pub fn blob_service(&self) -> BlobServiceClient {
        match &self.blob_location {
            Some(location) => {
                ClientBuilder::with_location(location.clone(), self.credentials.clone())
                    .blob_service_client()
            }
            None => ClientBuilder::new(self.account.clone(), self.credentials.clone())
                .blob_service_client(),
        }
    }

    /// Fresh container handle.
    pub fn container_client(&self, container: &str) -> ContainerClient {
        self.blob_service().container_client(container)
    }

    /// Fresh table service handle.
    pub fn table_service(&self) -> TableServiceClient {
        TableServiceClient::new(self.account.clone(), self.credentials.clone())
    }
}

/// Map a custom blob endpoint to an emulator location.
fn emulator_location(endpoint: &str) -> Result<CloudLocation> {
    let url = Url::parse(endpoint)
        .map_err(|e| EazureError::config(format!("Invalid BlobEndpoint '{endpoint}': {e}")))?;
    let address = url
        .host_str()
        .ok_or_else(|| EazureError::config(format!("BlobEndpoint '{endpoint}' has no host")))?
        .to_string();
    let port = url.port().unwrap_or(10000);

    Ok(CloudLocation::Emulator { address, port })
}

#[cfg(test)]
mod tests {
    use super::*;

    const AZURITE_KEY: &str =
        "Eby8vdM02xNOcqFlqUwJPLlmEtlCDXJ1OUzFT50uSRZ6IFsuFq2UVErCz4I6tq/K1SZFPTOtr/KBHBeksoGMGw==";

    #[test]
    fn parses_a_standard_connection_string() {
        let raw = format!(
            "DefaultEndpointsProtocol=https;AccountName=example;AccountKey={AZURITE_KEY};EndpointSuffix=core.windows.net"
        );
        let connection = StorageConnection::from_connection_string(&raw).unwrap();
        assert_eq!(connection.account(), "example");
    }

    #[test]
    fn missing_account_name_is_a_config_error() {
        let raw = format!("DefaultEndpointsProtocol=https;AccountKey={AZURITE_KEY}");
        let error = StorageConnection::from_connection_string(&raw).unwrap_err();
        assert!(matches!(error, EazureError::ConfigError(_)));
    }

    #[test]
    fn missing_env_var_is_a_config_error() {
        let error = StorageConnection::from_env_var("EAZURE_TEST_NO_SUCH_VARIABLE").unwrap_err();
        assert!(matches!(error, EazureError::ConfigError(_)));
    }

    #[test]
    fn blob_endpoint_maps_to_emulator_location() {
        let location = emulator_location("http://127.0.0.1:10000/devstoreaccount1").unwrap();
        match location {
            CloudLocation::Emulator { address, port } => {
                assert_eq!(address, "127.0.0.1");
                assert_eq!(port, 10000);
            }
            other => panic!("unexpected location: {other:?}"),
        }
    }
}
