//! # JSON Serialization Module
//!
//! High-performance JSON parsing using simd-json, serialization via serde_json.
//! Shared by the request body accessors and the router's result coercion.

use crate::error::{Error, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Parse JSON string to a typed value using simd-json
///
/// # Errors
///
/// Returns [`Error::Serialization`] if parsing fails
pub fn parse_json<T: DeserializeOwned>(json_str: &str) -> Result<T> {
    let mut bytes = json_str.as_bytes().to_vec();

    simd_json::from_slice(&mut bytes).map_err(|e| Error::Serialization {
        reason: format!("Parse error: {e}"),
    })
}

/// Parse JSON bytes to a typed value using simd-json
///
/// More efficient than string parsing, avoids an extra copy. The slice is
/// mutated in place by the parser.
///
/// # Errors
///
/// Returns [`Error::Serialization`] if parsing fails
pub fn parse_json_bytes<T: DeserializeOwned>(bytes: &mut [u8]) -> Result<T> {
    simd_json::from_slice(bytes).map_err(|e| Error::Serialization {
        reason: format!("Parse error: {e}"),
    })
}

/// Serialize a value to JSON string
///
/// # Errors
///
/// Returns [`Error::Serialization`] if encoding fails
pub fn to_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(|e| Error::Serialization {
        reason: format!("Serialize error: {e}"),
    })
}

/// Serialize a value to pretty-printed JSON string
///
/// # Errors
///
/// Returns [`Error::Serialization`] if encoding fails
pub fn to_json_pretty<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).map_err(|e| Error::Serialization {
        reason: format!("Serialize error: {e}"),
    })
}
