//! JSON encoding of stored values.
//!
//! Values cross the storage boundary as JSON text. Encoding failures are
//! surfaced to the caller; decoding failures are left to the caller to treat as
//! "nothing stored".

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, StoreError};

/// Encode `value` into its persisted representation.
pub fn encode<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string(value).map_err(StoreError::Encode)
}

/// Decode a persisted representation.
pub fn decode<T: DeserializeOwned>(raw: &str) -> Result<T, serde_json::Error> {
    serde_json::from_str(raw)
}
