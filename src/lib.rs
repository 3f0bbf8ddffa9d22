//! Generic native-call marshaling.
//!
//! This library describes native functions by their parameters, synthesizes
//! one call per invocation with fresh argument storage, and converts the
//! native values that come back (scalars, pointers, fixed arrays, records,
//! and untagged unions selected by a runtime discriminant) into structured
//! [`ResolvedValue`]s. It also goes the other way, building native records
//! from name-keyed mappings.
//!
//! # Quick Start
//!
//! ```ignore
//! use ffi_marshal::prelude::*;
//!
//! let advapi = Module::open("advapi32", my_invoker);
//! let sid = NativeType::array_of(ScalarKind::U8.into(), 68);
//!
//! let create = CallSpec::new("CreateWellKnownSid", advapi, ScalarKind::I32.into(), ZeroIsFailure::new())
//!     .with_params([
//!         ParamDescriptor::input("code", ScalarKind::U32).build()?,
//!         ParamDescriptor::output("sid", NativeType::pointer_to(sid.clone()))
//!             .generator(|| NativeValue::pointer(NativeValue::zeroed(&sid).unwrap_or(NativeValue::null())))
//!             .returned()
//!             .build()?,
//!     ])?;
//!
//! // A single return-flagged parameter comes back unwrapped.
//! let bytes = create.invoke(Args::new().arg(22u32))?;
//! ```
//!
//! # Modules
//!
//! - [`types`] - Native type descriptions and capability queries
//! - [`value`] - Native values and resolved values
//! - [`resolve`] - Recursive resolution of native value graphs
//! - [`marshal`] - Record flattening and construction
//! - [`call`] - Parameter descriptors, call specs, invokers and conventions
//! - [`config`] - Byte order and null-pointer policy
//!
//! # Feature Flags
//!
//! - `config` - Load [`MarshalConfig`] from TOML (enabled by default)
//! - `logging` - Enable library-level tracing (consumers provide their own subscriber)
//! - `full` - Enable all features

pub mod call;
pub mod config;
mod logging;
pub mod marshal;
pub mod prelude;
pub mod resolve;
pub mod types;
pub mod value;

mod error;

// Re-export the unified error type
pub use error::{Error, Result};

pub use call::{
    ArgOrigin, ArgSlot, ArgValue, Args, CallError, CallOutcome, CallSpec, Convention,
    DescriptorError, Direction, InvalidHandle, InvokeError, Invoker, Module, NativeCall,
    NonZeroIsFailure, ParamBuilder, ParamDescriptor, Returned, Unchecked, ZeroIsFailure,
};
#[cfg(feature = "config")]
pub use config::ConfigError;
pub use config::{ByteOrder, MarshalConfig, NullPointerPolicy};
pub use marshal::{FlatRecord, MarshalError, RecordMarshaler};
pub use resolve::{DiscriminatorContext, Resolve, ValueResolver};
pub use types::{
    DiscriminatorLink, Field, NativeType, RecordType, ScalarKind, SchemaError, UnionType,
};
pub use value::{ArrayValue, Mapping, NativeValue, RecordValue, ResolvedValue, Scalar, UnionValue};
