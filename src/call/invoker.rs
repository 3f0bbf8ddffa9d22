//! The native invocation seam and module handles.
//!
//! The engine never performs a native call itself. It hands a
//! [`NativeCall`] to the [`Invoker`] owned by the call's [`Module`] and
//! gets back the raw return value and the post-call arguments.

use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use super::param::Direction;
use crate::logging::info;
use crate::types::NativeType;
use crate::value::NativeValue;

/// Where a slot's value came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgOrigin {
    /// Passed by the caller of `invoke`.
    Supplied,
    /// Produced by the parameter's generator for this call.
    Generated,
    /// Zero-initialized storage for an output nobody supplied.
    Zeroed,
}

/// One entry of the per-call direction table.
#[derive(Debug, Clone, PartialEq)]
pub struct ArgSlot {
    pub direction: Direction,
    pub name: String,
    pub ty: NativeType,
    pub value: NativeValue,
    pub origin: ArgOrigin,
}

/// Everything an invoker needs to perform one native call.
///
/// Slots are in parameter declaration order, which is the native argument
/// order.
#[derive(Debug)]
pub struct NativeCall<'a> {
    pub symbol: &'a str,
    pub module: &'a str,
    pub return_type: &'a NativeType,
    pub slots: Vec<ArgSlot>,
}

impl NativeCall<'_> {
    /// The slot bound to parameter `name`.
    pub fn slot(&self, name: &str) -> Option<&ArgSlot> {
        self.slots.iter().find(|s| s.name == name)
    }
}

/// Result of a native call: the raw return and the arguments after the
/// callee wrote to them.
#[derive(Debug, Clone, PartialEq)]
pub struct CallOutcome {
    /// `None` for a `void` function.
    pub return_value: Option<NativeValue>,
    pub args: Vec<NativeValue>,
}

impl CallOutcome {
    /// Outcome whose arguments are the call's slot values as they are now.
    pub fn from_slots(return_value: Option<NativeValue>, slots: Vec<ArgSlot>) -> Self {
        Self {
            return_value,
            args: slots.into_iter().map(|s| s.value).collect(),
        }
    }
}

/// Errors reported by an invoker.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InvokeError {
    #[error("Symbol '{symbol}' not found in module '{module}'")]
    SymbolNotFound { symbol: String, module: String },

    #[error("Native invocation of '{symbol}' failed: {reason}")]
    Failed { symbol: String, reason: String },
}

/// Performs native calls using the right calling convention.
pub trait Invoker: Send + Sync {
    fn invoke(&self, call: NativeCall<'_>) -> Result<CallOutcome, InvokeError>;
}

impl<F> Invoker for F
where
    F: Fn(NativeCall<'_>) -> Result<CallOutcome, InvokeError> + Send + Sync,
{
    fn invoke(&self, call: NativeCall<'_>) -> Result<CallOutcome, InvokeError> {
        self(call)
    }
}

/// An opened native module.
///
/// Owns the invoker used for calls into the module. Shared by every call
/// spec bound to it and closed when the last one is dropped.
pub struct Module {
    name: String,
    invoker: Box<dyn Invoker>,
}

impl Module {
    /// Open a module backed by `invoker`. The module closes when the last handle drops.
    pub fn open(name: impl Into<String>, invoker: impl Invoker + 'static) -> Arc<Self> {
        let name = name.into();
        info!(module = %name, "opened native module");
        Arc::new(Self {
            name,
            invoker: Box::new(invoker),
        })
    }

    /// Name the module was opened with.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The invoker performing calls into this module.
    pub fn invoker(&self) -> &dyn Invoker {
        self.invoker.as_ref()
    }
}

impl fmt::Debug for Module {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Module").field("name", &self.name).finish_non_exhaustive()
    }
}

impl Drop for Module {
    fn drop(&mut self) {
        info!(module = %self.name, "closed native module");
    }
}
