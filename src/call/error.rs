//! Error types for parameter descriptors and native calls.

use thiserror::Error;

use super::invoker::InvokeError;
use crate::marshal::MarshalError;

/// Structural errors detected while binding a call.
///
/// These are raised at setup time, never per invocation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("Invalid descriptor '{name}': {reason}")]
    InvalidDescriptor { name: String, reason: String },

    #[error("Invalid parameter set: {reason}")]
    InvalidParameterSet { reason: String },
}

/// Errors raised by [`CallSpec::invoke`](super::CallSpec::invoke).
#[derive(Error, Debug)]
pub enum CallError {
    /// Raised by a convention hook when the native return signals failure.
    #[error("Native call '{symbol}' failed with code {code} (last error: {last_error:?})")]
    NativeCallFailed {
        symbol: String,
        code: i64,
        last_error: Option<u32>,
    },

    #[error("'{symbol}' takes {expected} arguments, got {got}")]
    TooManyArguments {
        symbol: String,
        expected: usize,
        got: usize,
    },

    #[error("'{symbol}' has no parameter named '{name}'")]
    UnknownParameter { symbol: String, name: String },

    #[error("Parameter '{name}' of '{symbol}' bound twice")]
    DuplicateArgument { symbol: String, name: String },

    #[error("Missing value for input parameter '{name}' of '{symbol}'")]
    MissingArgument { symbol: String, name: String },

    #[error("Invoker returned {got} arguments for '{symbol}', expected {expected}")]
    ArgumentCountMismatch {
        symbol: String,
        expected: usize,
        got: usize,
    },

    #[error("Cannot check return value of '{symbol}': {got}")]
    UncheckableReturn { symbol: String, got: String },

    #[error(transparent)]
    Invoke(#[from] InvokeError),

    #[error(transparent)]
    Marshal(#[from] MarshalError),
}
