//! Generic object codecs: UTF-8 text, JSON values, and pickled values.
//!
//! Pickled payloads round-trip through `serde_json::Value`, which covers
//! the scalar/list/dict shapes the Python tooling on the other side of
//! these blobs actually writes. Pickled dataframes are not decodable here
//! and are rejected by the dispatcher.

use crate::error::{EazureError, Result};
use serde_pickle::{DeOptions, SerOptions};

pub fn decode_text(bytes: &[u8]) -> Result<String> {
    String::from_utf8(bytes.to_vec())
        .map_err(|e| EazureError::serialization(format!("Blob is not valid UTF-8: {e}")))
}

pub fn encode_text(text: &str) -> Vec<u8> {
    text.as_bytes().to_vec()
}

pub fn decode_json(bytes: &[u8]) -> Result<serde_json::Value> {
    Ok(serde_json::from_slice(bytes)?)
}

pub fn encode_json(value: &serde_json::Value) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec(value)?)
}

pub fn decode_pickle(bytes: &[u8]) -> Result<serde_json::Value> {
    Ok(serde_pickle::from_slice(bytes, DeOptions::default())?)
}

pub fn encode_pickle(value: &serde_json::Value) -> Result<Vec<u8>> {
    Ok(serde_pickle::to_vec(value, SerOptions::default())?)
}
