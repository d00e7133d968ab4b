use thiserror::Error;

/// Main error type for eazure operations
#[derive(Debug, Error)]
pub enum EazureError {
    #[error("Unsupported file extension: {extension}")]
    UnsupportedFormat { extension: String },

    #[error("Unsupported file extension for storing {payload} payloads: {extension}")]
    UnsupportedPayload {
        extension: String,
        payload: &'static str,
    },

    #[error("Blob not found: {name}")]
    BlobNotFound { name: String },

    #[error("Entity not found: partition '{partition_key}', row '{row_key}'")]
    EntityNotFound {
        partition_key: String,
        row_key: String,
    },

    #[error("Invalid key column '{column}': {details}")]
    InvalidKey { column: String, details: String },

    #[error("Authentication failed: {0}")]
    AuthenticationError(String),

    #[error("Azure API error: {0}")]
    AzureApiError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),

    #[error("Parquet error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),

    #[error("Spreadsheet read error: {0}")]
    ExcelReadError(#[from] calamine::Error),

    #[error("Spreadsheet write error: {0}")]
    ExcelWriteError(#[from] rust_xlsxwriter::XlsxError),

    #[error("Pickle error: {0}")]
    PickleError(#[from] serde_pickle::Error),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration loading error: {0}")]
    ConfigLoadError(#[from] config::ConfigError),
}

impl EazureError {
    pub fn unsupported_format<S: Into<String>>(extension: S) -> Self {
        Self::UnsupportedFormat {
            extension: extension.into(),
        }
    }

    pub fn unsupported_payload<S: Into<String>>(extension: S, payload: &'static str) -> Self {
        Self::UnsupportedPayload {
            extension: extension.into(),
            payload,
        }
    }

    pub fn blob_not_found<S: Into<String>>(name: S) -> Self {
        Self::BlobNotFound { name: name.into() }
    }

    pub fn entity_not_found<S: Into<String>>(partition_key: S, row_key: S) -> Self {
        Self::EntityNotFound {
            partition_key: partition_key.into(),
            row_key: row_key.into(),
        }
    }

    pub fn invalid_key<S: Into<String>>(column: S, details: S) -> Self {
        Self::InvalidKey {
            column: column.into(),
            details: details.into(),
        }
    }

    pub fn authentication<S: Into<String>>(msg: S) -> Self {
        Self::AuthenticationError(msg.into())
    }

    pub fn azure_api<S: Into<String>>(msg: S) -> Self {
        Self::AzureApiError(msg.into())
    }

    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::ConfigError(msg.into())
    }

    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        Self::SerializationError(msg.into())
    }

    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        Self::InvalidArgument(msg.into())
    }
}

/// Result type alias for eazure operations
pub type Result<T> = std::result::Result<T, EazureError>;

/// Convert Azure Core errors to EazureError
impl From<azure_core::Error> for EazureError {
    fn from(error: azure_core::Error) -> Self {
        Self::AzureApiError(error.to_string())
    }
}
