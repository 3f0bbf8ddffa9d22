//! Unified error type for the ffi-marshal library.
//!
//! Every module reports its own error enum; [`Error`] wraps them all so
//! application code can use a single `?`-friendly type.

use thiserror::Error;

use crate::call::{CallError, DescriptorError};
#[cfg(feature = "config")]
use crate::config::ConfigError;
use crate::marshal::MarshalError;
use crate::types::SchemaError;

/// Unified error type for all ffi-marshal operations.
///
/// # Example
///
/// ```ignore
/// use ffi_marshal::{Args, CallSpec, Result};
///
/// fn lookup(spec: &CallSpec) -> Result<()> {
///     let sid = spec.invoke(Args::new().arg(22u32))?;
///     println!("{sid:?}");
///     Ok(())
/// }
/// ```
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed record or union registration.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Malformed parameter descriptor or parameter set.
    #[error(transparent)]
    Descriptor(#[from] DescriptorError),

    /// Structured value could not be converted to its native type.
    #[error(transparent)]
    Marshal(#[from] MarshalError),

    /// Failure while binding, performing, or checking a native call.
    #[error(transparent)]
    Call(#[from] CallError),

    /// Configuration could not be loaded.
    #[cfg(feature = "config")]
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// A [`Result`] type alias using the unified [`Error`] type.
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Returns `true` if this is a type registration error.
    pub fn is_schema(&self) -> bool {
        matches!(self, Self::Schema(_))
    }

    /// Returns `true` if this is a descriptor or parameter set error.
    pub fn is_descriptor(&self) -> bool {
        matches!(self, Self::Descriptor(_))
    }

    /// Returns `true` if a structured value failed to marshal, whether
    /// directly or while preparing a call.
    pub fn is_marshal(&self) -> bool {
        matches!(self, Self::Marshal(_) | Self::Call(CallError::Marshal(_)))
    }

    /// Returns `true` if a convention hook reported a failed native call.
    pub fn is_native_failure(&self) -> bool {
        matches!(self, Self::Call(CallError::NativeCallFailed { .. }))
    }

    /// Returns `true` if this is a configuration error.
    #[cfg(feature = "config")]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_predicates() {
        let err = Error::from(CallError::NativeCallFailed {
            symbol: "CloseHandle".to_string(),
            code: 0,
            last_error: Some(6),
        });
        assert!(err.is_native_failure());
        assert!(!err.is_marshal());
        assert!(err.to_string().contains("CloseHandle"));

        let err = Error::from(CallError::from(MarshalError::ArrayTooLong { expected: 1, got: 2 }));
        assert!(err.is_marshal());
        assert!(Error::from(SchemaError::EmptyTypeName).is_schema());
    }
}
