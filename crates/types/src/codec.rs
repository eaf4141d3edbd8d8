//! Canonical binary encoding for table rows.
//!
//! Row keys and payloads persist as postcard bytes. Failures in either
//! direction surface as one [`CodecError`] tagged with the direction, since
//! callers treat any codec failure the same way: the row is unusable.

use serde::{Serialize, de::DeserializeOwned};
use snafu::{ResultExt, Snafu};

/// A row payload could not be encoded or decoded.
#[derive(Debug, Snafu)]
#[snafu(display("Row payload {op} failed: {source}"))]
pub struct CodecError {
    /// Which direction failed: `"encoding"` or `"decoding"`.
    op: &'static str,
    /// The underlying postcard error.
    source: postcard::Error,
}

/// Encodes a row payload to bytes.
///
/// # Errors
///
/// Returns a [`CodecError`] if serialization fails.
pub fn encode<T: Serialize>(value: &T) -> Result<Vec<u8>, CodecError> {
    postcard::to_allocvec(value).context(CodecSnafu { op: "encoding" })
}

/// Decodes a row payload from bytes.
///
/// # Errors
///
/// Returns a [`CodecError`] if deserialization fails.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, CodecError> {
    postcard::from_bytes(bytes).context(CodecSnafu { op: "decoding" })
}
