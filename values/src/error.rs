//! Error types for the value system.
//!
//! Every failure names the offending dtype or buffer so callers can surface
//! it without re-inspecting the value.

use thiserror::Error;
use crate::dtype::Dtype;

/// Result type for value operations.
pub type ValueResult<T> = Result<T, ValueError>;

/// Errors that can occur when classifying, encoding or decoding values.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValueError {
    /// The value kind has no representation on the requested path.
    #[error("Unsupported value kind '{dtype}' for {context}")]
    UnsupportedValueKind {
        dtype: Dtype,
        context: &'static str,
    },

    /// A dtype tag that is not part of the closed tag set.
    #[error("Unknown dtype: '{tag}'")]
    UnknownDtype {
        tag: String,
    },

    /// Buffer length does not match the element count implied by the shape.
    #[error("Malformed {dtype} buffer: expected {expected} bytes, got {actual}")]
    MalformedBuffer {
        dtype: Dtype,
        expected: usize,
        actual: usize,
    },

    /// Shape does not describe the number of elements supplied.
    #[error("Shape {shape:?} does not describe {len} elements")]
    ShapeMismatch {
        shape: Vec<usize>,
        len: usize,
    },

    /// Image dimensions or channel count are invalid.
    #[error("Invalid image: {message}")]
    InvalidImage {
        message: String,
    },

    /// A `data:` URL that could not be decoded.
    #[error("Invalid data URL: {message}")]
    InvalidDataUrl {
        message: String,
    },

    /// Predictor tag is not of the form `@username/name`.
    #[error("Invalid predictor tag '{tag}'")]
    InvalidTag {
        tag: String,
    },

    /// Invalid value for the given type.
    #[error("Invalid value: {message}")]
    InvalidValue {
        message: String,
    },

    /// Serialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Deserialization error.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

impl ValueError {
    pub(crate) fn unsupported(dtype: Dtype, context: &'static str) -> Self {
        ValueError::UnsupportedValueKind { dtype, context }
    }
}

impl From<serde_json::Error> for ValueError {
    fn from(err: serde_json::Error) -> Self {
        ValueError::SerializationError(err.to_string())
    }
}
