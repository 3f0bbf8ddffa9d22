//! Error types for record marshaling.

use thiserror::Error;

/// Errors raised while converting structured values into native ones.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarshalError {
    #[error("Missing field '{field}' for record '{record}'")]
    MissingField { record: String, field: String },

    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Unknown field '{field}' in '{record}'")]
    UnknownField { record: String, field: String },

    #[error("Array holds {expected} elements, got {got}")]
    ArrayTooLong { expected: usize, got: usize },

    #[error("Buffer too small: need {needed} bytes, have {available}")]
    BufferTooSmall { needed: usize, available: usize },
}

impl MarshalError {
    pub(crate) fn mismatch(expected: impl Into<String>, got: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            got: got.into(),
        }
    }
}
