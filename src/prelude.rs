//! Convenient re-exports for common usage patterns.
//!
//! # Example
//!
//! ```ignore
//! use ffi_marshal::prelude::*;
//!
//! let point = RecordType::builder("point")
//!     .field("x", ScalarKind::I32)
//!     .field("y", ScalarKind::I32)
//!     .build()?;
//! let native = RecordMarshaler::default().build(&point, &Mapping::new().with("x", 1i32).with("y", 2i32))?;
//! ```

// Unified error handling
pub use crate::error::{Error, Result};

// Types and values
pub use crate::types::{NativeType, RecordType, ScalarKind, UnionType};
pub use crate::value::{ArrayValue, Mapping, NativeValue, RecordValue, ResolvedValue, Scalar, UnionValue};

// Conversion
pub use crate::config::MarshalConfig;
pub use crate::marshal::RecordMarshaler;
pub use crate::resolve::{DiscriminatorContext, ValueResolver};

// Calls
pub use crate::call::{
    Args, CallOutcome, CallSpec, Convention, Direction, InvalidHandle, InvokeError, Invoker,
    Module, NativeCall, NonZeroIsFailure, ParamDescriptor, Unchecked, ZeroIsFailure,
};
