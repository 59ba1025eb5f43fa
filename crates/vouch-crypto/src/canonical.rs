//! Canonical JSON serialization (RFC 8785, JCS).
//!
//! Two documents that differ only in member order produce identical bytes.

use serde::Serialize;
use serde_json::Value;

use crate::error::CryptoError;

/// Canonical string form of a JSON value.
pub fn canonicalize(value: &Value) -> Result<String, CryptoError> {
    serde_jcs::to_string(value).map_err(|e| CryptoError::Canonicalization(e.to_string()))
}

/// Serialize any value to canonical JSON bytes.
pub fn canonical_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, CryptoError> {
    serde_jcs::to_vec(value).map_err(|e| CryptoError::Canonicalization(e.to_string()))
}
