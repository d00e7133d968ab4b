//! Extension-based format dispatch
//!
//! Maps a file name's extension to a concrete encode/decode pair before any
//! network traffic happens. Unknown extensions fail fast with
//! [`EazureError::UnsupportedFormat`]. Dispatch is a pure mapping; the
//! actual encoding and decoding is delegated to the Arrow, Parquet,
//! calamine/xlsxwriter, serde_json and serde-pickle codecs.

pub mod frame;
pub mod object;

use crate::error::{EazureError, Result};
use arrow::record_batch::RecordBatch;
use std::path::Path;

/// The set of file formats this crate can move in and out of blob storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    /// `.csv` — tabular
    Csv,
    /// `.xlsx` / `.xls` / `.xlsm` — tabular
    Excel,
    /// `.parquet` — tabular
    Parquet,
    /// `.feather` / `.f` — tabular (Arrow IPC file)
    Feather,
    /// `.json` — generic value on read, tabular or generic on write
    Json,
    /// `.txt` — plain UTF-8 text
    Text,
    /// `.pkl` / `.pickle` — pickled generic value
    Pickle,
}

impl FileFormat {
    /// Resolve the format from a blob name, case-insensitively.
    pub fn from_name(name: &str) -> Result<Self> {
        let extension = Path::new(name)
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        Self::from_extension(&extension)
            .ok_or_else(|| EazureError::unsupported_format(extension))
    }

    /// Static extension mapping. Lowercase input expected.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "csv" => Some(Self::Csv),
            "xlsx" | "xls" | "xlsm" => Some(Self::Excel),
            "parquet" => Some(Self::Parquet),
            "feather" | "f" => Some(Self::Feather),
            "json" => Some(Self::Json),
            "txt" => Some(Self::Text),
            "pkl" | "pickle" => Some(Self::Pickle),
            _ => None,
        }
    }

    /// Whether a decode of this format yields a tabular dataset.
    pub fn decodes_frames(&self) -> bool {
        matches!(
            self,
            Self::Csv | Self::Excel | Self::Parquet | Self::Feather
        )
    }
}

/// Per-format decode/encode options.
///
/// This is the typed replacement for pandas-style keyword forwarding: each
/// format exposes the narrow set of knobs it actually honors.
#[derive(Debug, Clone, Default)]
pub struct FormatOptions {
    pub csv: CsvOptions,
    pub excel: ExcelOptions,
}

#[derive(Debug, Clone)]
pub struct CsvOptions {
    /// Field delimiter, `,` by default.
    pub delimiter: u8,
    /// Whether the first row carries column names.
    pub header: bool,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            delimiter: b',',
            header: true,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ExcelOptions {
    /// Worksheet to read or write; first sheet / `Sheet1` when unset.
    pub sheet: Option<String>,
}

/// A decoded blob payload.
#[derive(Debug, Clone)]
pub enum Payload {
    /// Tabular dataset
    Frame(RecordBatch),
    /// Plain text
    Text(String),
    /// Generic JSON-shaped value (also the carrier for pickled data)
    Value(serde_json::Value),
}

impl Payload {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Frame(_) => "data frame",
            Self::Text(_) => "text",
            Self::Value(_) => "value",
        }
    }

    pub fn as_frame(&self) -> Option<&RecordBatch> {
        match self {
            Self::Frame(batch) => Some(batch),
            _ => None,
        }
    }

    pub fn into_frame(self) -> Result<RecordBatch> {
        match self {
            Self::Frame(batch) => Ok(batch),
            other => Err(EazureError::invalid_argument(format!(
                "Expected a tabular payload, got {}",
                other.kind()
            ))),
        }
    }
}

impl From<RecordBatch> for Payload {
    fn from(batch: RecordBatch) -> Self {
        Self::Frame(batch)
    }
}

impl From<String> for Payload {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<serde_json::Value> for Payload {
    fn from(value: serde_json::Value) -> Self {
        Self::Value(value)
    }
}

/// Decode raw bytes according to the dispatched format.
pub fn decode(format: FileFormat, bytes: &[u8], options: &FormatOptions) -> Result<Payload> {
    match format {
        FileFormat::Csv => frame::decode_csv(bytes, &options.csv).map(Payload::Frame),
        FileFormat::Excel => frame::decode_excel(bytes, &options.excel).map(Payload::Frame),
        FileFormat::Parquet => frame::decode_parquet(bytes).map(Payload::Frame),
        FileFormat::Feather => frame::decode_feather(bytes).map(Payload::Frame),
        FileFormat::Json => object::decode_json(bytes).map(Payload::Value),
        FileFormat::Text => object::decode_text(bytes).map(Payload::Text),
        FileFormat::Pickle => object::decode_pickle(bytes).map(Payload::Value),
    }
}

/// Encode a payload according to the dispatched format.
///
/// Mismatched combinations (a data frame into `.pkl`, a generic value into
/// `.parquet`) fail with [`EazureError::UnsupportedPayload`] before any
/// upload happens.
pub fn encode(format: FileFormat, payload: &Payload, options: &FormatOptions) -> Result<Vec<u8>> {
    match (format, payload) {
        (FileFormat::Csv, Payload::Frame(batch)) => frame::encode_csv(batch, &options.csv),
        (FileFormat::Excel, Payload::Frame(batch)) => frame::encode_excel(batch, &options.excel),
        (FileFormat::Parquet, Payload::Frame(batch)) => frame::encode_parquet(batch),
        (FileFormat::Feather, Payload::Frame(batch)) => frame::encode_feather(batch),
        (FileFormat::Json, Payload::Frame(batch)) => frame::encode_json(batch),
        (FileFormat::Json, Payload::Text(text)) => {
            object::encode_json(&serde_json::Value::String(text.clone()))
        }
        (FileFormat::Json, Payload::Value(value)) => object::encode_json(value),
        (FileFormat::Text, Payload::Text(text)) => Ok(object::encode_text(text)),
        (FileFormat::Pickle, Payload::Text(text)) => {
            object::encode_pickle(&serde_json::Value::String(text.clone()))
        }
        (FileFormat::Pickle, Payload::Value(value)) => object::encode_pickle(value),
        (format, payload) => Err(EazureError::unsupported_payload(
            format_extension(format),
            payload_label(payload),
        )),
    }
}

fn format_extension(format: FileFormat) -> &'static str {
    match format {
        FileFormat::Csv => "csv",
        FileFormat::Excel => "xlsx",
        FileFormat::Parquet => "parquet",
        FileFormat::Feather => "feather",
        FileFormat::Json => "json",
        FileFormat::Text => "txt",
        FileFormat::Pickle => "pkl",
    }
}

fn payload_label(payload: &Payload) -> &'static str {
    match payload {
        Payload::Frame(_) => "data frame",
        _ => "non-data frame",
    }
}
