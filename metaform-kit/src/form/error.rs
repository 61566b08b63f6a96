//! Form Engine Errors
//!
//! Every fallible operation in the engine reports a [`FormError`]. Most of
//! these never cross a field boundary: the widget that hits them logs or
//! surfaces them locally and keeps going.

use std::io;

/// Errors produced by the form engine.
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// A schema, record or response body could not be decoded
    #[error("failed to decode {what}: {source}")]
    Decode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// A payload could not be encoded
    #[error("failed to encode {what}: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The HTTP request itself failed (connect, timeout, body read)
    #[error("request to {url} failed: {message}")]
    Http { url: String, message: String },

    /// The server answered with a non-success status
    #[error("request to {url} returned status {status}")]
    Status { url: String, status: u16 },

    /// User input did not parse under the field's date mode
    #[error("'{input}' is not a valid {expected}")]
    InvalidDate {
        input: String,
        expected: &'static str,
    },

    /// A selected file could not be read
    #[error("failed to read file \"{name}\": {source}")]
    FileRead {
        name: String,
        #[source]
        source: io::Error,
    },

    /// The field does not accept the requested interaction
    #[error("field '{field}' does not support {operation}")]
    Unsupported {
        field: String,
        operation: &'static str,
    },

    /// The field is declared read-only
    #[error("field '{0}' is not editable")]
    ReadOnly(String),

    /// Invalid engine configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl FormError {
    /// Wrap a serde_json error with a short description of what was decoded
    pub fn decode(what: &'static str, source: serde_json::Error) -> Self {
        FormError::Decode { what, source }
    }
}

/// Result alias used throughout the form engine.
pub type Result<T> = std::result::Result<T, FormError>;
