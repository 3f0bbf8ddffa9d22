//! Return-value conventions.
//!
//! Each ABI family signals failure its own way. A [`Convention`] inspects
//! the raw return after every call, and either raises
//! [`CallError::NativeCallFailed`] or produces the values the call returns.

use std::fmt;

use super::error::CallError;
use super::spec::CallSpec;
use crate::logging::error;
use crate::resolve::DiscriminatorContext;
use crate::value::{NativeValue, ResolvedValue, Scalar};

/// What a convention hook hands back to the call spec.
#[derive(Debug, Clone, PartialEq)]
pub struct Returned {
    /// Resolved values of the return-flagged parameters, in declaration
    /// order.
    pub selected: Vec<ResolvedValue>,
    /// Result of the call when no parameter is return-flagged.
    pub passthrough: ResolvedValue,
}

impl Returned {
    /// Collapse into the call result: nothing selected yields the
    /// pass-through, one value is returned unwrapped, more become a
    /// sequence.
    pub fn shape(self) -> ResolvedValue {
        let Self {
            mut selected,
            passthrough,
        } = self;
        if selected.len() > 1 {
            ResolvedValue::Sequence(selected)
        } else {
            selected.pop().unwrap_or(passthrough)
        }
    }
}

/// Checks the raw return of a native call.
pub trait Convention: Send + Sync {
    fn check(
        &self,
        raw_return: Option<&NativeValue>,
        spec: &CallSpec,
        args: &[NativeValue],
    ) -> Result<Returned, CallError>;
}

/// Source of the thread's last native error code.
pub type LastError = fn() -> u32;

fn resolve_return(raw_return: Option<&NativeValue>, spec: &CallSpec) -> ResolvedValue {
    raw_return
        .map(|raw| spec.resolver().resolve(raw, &DiscriminatorContext::default()))
        .unwrap_or(ResolvedValue::Absent)
}

/// The numeric view of a return value; a pointer counts as 0 when null.
fn return_code(raw_return: Option<&NativeValue>, spec: &CallSpec) -> Result<i64, CallError> {
    let uncheckable = |got: String| CallError::UncheckableReturn {
        symbol: spec.symbol().to_string(),
        got,
    };
    match raw_return {
        Some(NativeValue::Scalar(s)) => match s {
            Scalar::U64(v) => Ok(*v as i64),
            other => other.as_i64().ok_or_else(|| uncheckable(other.kind().name().to_string())),
        },
        Some(NativeValue::Pointer(p)) => Ok(i64::from(p.is_some())),
        Some(other) => Err(uncheckable(other.kind_name())),
        None => Err(uncheckable("void".to_string())),
    }
}

fn failed(spec: &CallSpec, code: i64, last_error: Option<LastError>) -> CallError {
    let last_error = last_error.map(|f| f());
    error!(symbol = spec.symbol(), code, ?last_error, "native call failed");
    CallError::NativeCallFailed {
        symbol: spec.symbol().to_string(),
        code,
        last_error,
    }
}

fn standard(
    raw_return: Option<&NativeValue>,
    spec: &CallSpec,
    args: &[NativeValue],
) -> Result<Returned, CallError> {
    Ok(Returned {
        selected: spec.collect_returns(args)?,
        passthrough: resolve_return(raw_return, spec),
    })
}

macro_rules! last_error_builder {
    ($ty:ident) => {
        impl $ty {
            /// A convention that does not read the last native error.
            pub fn new() -> Self {
                Self::default()
            }

            /// Capture the last native error code when the call fails.
            pub fn with_last_error(mut self, last_error: LastError) -> Self {
                self.last_error = Some(last_error);
                self
            }
        }

        impl fmt::Debug for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.debug_struct(stringify!($ty))
                    .field("last_error", &self.last_error.is_some())
                    .finish()
            }
        }
    };
}

/// Never fails. The return value becomes the pass-through.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unchecked;

impl Convention for Unchecked {
    fn check(
        &self,
        raw_return: Option<&NativeValue>,
        spec: &CallSpec,
        args: &[NativeValue],
    ) -> Result<Returned, CallError> {
        standard(raw_return, spec, args)
    }
}

/// Boolean-style returns: 0 means failure.
#[derive(Clone, Copy, Default)]
pub struct ZeroIsFailure {
    last_error: Option<LastError>,
}

last_error_builder!(ZeroIsFailure);

impl Convention for ZeroIsFailure {
    fn check(
        &self,
        raw_return: Option<&NativeValue>,
        spec: &CallSpec,
        args: &[NativeValue],
    ) -> Result<Returned, CallError> {
        let code = return_code(raw_return, spec)?;
        if code == 0 {
            return Err(failed(spec, code, self.last_error));
        }
        standard(raw_return, spec, args)
    }
}

/// Status-code returns: anything but 0 is a failure code.
#[derive(Clone, Copy, Default)]
pub struct NonZeroIsFailure {
    last_error: Option<LastError>,
}

last_error_builder!(NonZeroIsFailure);

impl Convention for NonZeroIsFailure {
    fn check(
        &self,
        raw_return: Option<&NativeValue>,
        spec: &CallSpec,
        args: &[NativeValue],
    ) -> Result<Returned, CallError> {
        let code = return_code(raw_return, spec)?;
        if code != 0 {
            return Err(failed(spec, code, self.last_error));
        }
        standard(raw_return, spec, args)
    }
}

/// Handle returns: 0 and -1 are invalid handles. On success the handle
/// itself is the result and no parameter is selected.
#[derive(Clone, Copy, Default)]
pub struct InvalidHandle {
    last_error: Option<LastError>,
}

last_error_builder!(InvalidHandle);

impl Convention for InvalidHandle {
    fn check(
        &self,
        raw_return: Option<&NativeValue>,
        spec: &CallSpec,
        _args: &[NativeValue],
    ) -> Result<Returned, CallError> {
        let code = match raw_return {
            Some(NativeValue::Scalar(Scalar::U32(u32::MAX))) => -1,
            other => return_code(other, spec)?,
        };
        if code == 0 || code == -1 {
            return Err(failed(spec, code, self.last_error));
        }
        Ok(Returned {
            selected: Vec::new(),
            passthrough: resolve_return(raw_return, spec),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape() {
        let none = Returned {
            selected: vec![],
            passthrough: 1u32.into(),
        };
        assert_eq!(none.shape(), ResolvedValue::from(1u32));

        let one = Returned {
            selected: vec![vec![1u8, 2].into()],
            passthrough: ResolvedValue::Absent,
        };
        assert_eq!(one.shape(), ResolvedValue::Bytes(vec![1, 2]));

        let many = Returned {
            selected: vec![1u8.into(), 2u8.into()],
            passthrough: ResolvedValue::Absent,
        };
        assert_eq!(
            many.shape(),
            ResolvedValue::Sequence(vec![1u8.into(), 2u8.into()])
        );
    }
}
