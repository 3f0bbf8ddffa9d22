//! Native call synthesis.
//!
//! A [`CallSpec`] binds a native symbol to an ordered list of
//! [`ParamDescriptor`]s. Each [`CallSpec::invoke`] runs the same pipeline:
//!
//! 1. bind positional and named arguments to descriptors, converting
//!    structured arguments through the [`RecordMarshaler`](crate::RecordMarshaler);
//! 2. run every generator for fresh storage;
//! 3. hand the direction table to the module's [`Invoker`];
//! 4. let the [`Convention`] check the raw return and select the
//!    return-flagged parameters, resolved with the call's discriminator
//!    side table;
//! 5. shape the result: nothing selected gives the pass-through, one value
//!    is returned as-is, several become a sequence.
//!
//! # Module Organization
//!
//! - [`param`]: Parameter descriptors and their builder
//! - [`spec`]: Call specifications and argument binding
//! - [`invoker`]: The native invocation seam and module handles
//! - [`convention`]: Return-value checks per ABI family

pub mod convention;
mod error;
pub mod invoker;
pub mod param;
pub mod spec;

pub use convention::{
    Convention, InvalidHandle, LastError, NonZeroIsFailure, Returned, Unchecked, ZeroIsFailure,
};
pub use error::{CallError, DescriptorError};
pub use invoker::{ArgOrigin, ArgSlot, CallOutcome, InvokeError, Invoker, Module, NativeCall};
pub use param::{Direction, Generator, ParamBuilder, ParamDescriptor};
pub use spec::{ArgValue, Args, CallSpec};
