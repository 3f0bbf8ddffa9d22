//! Call specifications: a native function bound to its parameters.

use std::fmt;
use std::sync::Arc;

use super::convention::Convention;
use super::error::{CallError, DescriptorError};
use super::invoker::{ArgOrigin, ArgSlot, Module, NativeCall};
use super::param::ParamDescriptor;
use crate::config::MarshalConfig;
use crate::logging::{debug, trace};
use crate::marshal::RecordMarshaler;
use crate::resolve::{DiscriminatorContext, ValueResolver};
use crate::types::NativeType;
use crate::value::{Mapping, NativeValue, ResolvedValue, Scalar};

/// An argument passed to [`CallSpec::invoke`].
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    /// Already native; handed to the invoker unchanged.
    Native(NativeValue),
    /// Converted by the parameter's type before the call.
    Structured(ResolvedValue),
}

impl From<NativeValue> for ArgValue {
    fn from(v: NativeValue) -> Self {
        Self::Native(v)
    }
}

impl From<ResolvedValue> for ArgValue {
    fn from(v: ResolvedValue) -> Self {
        Self::Structured(v)
    }
}

impl From<Mapping> for ArgValue {
    fn from(m: Mapping) -> Self {
        Self::Structured(ResolvedValue::Mapping(m))
    }
}

impl From<Scalar> for ArgValue {
    fn from(s: Scalar) -> Self {
        Self::Structured(ResolvedValue::Scalar(s))
    }
}

macro_rules! arg_from_primitive {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for ArgValue {
                fn from(v: $ty) -> Self {
                    Self::Structured(ResolvedValue::Scalar(Scalar::from(v)))
                }
            }
        )*
    };
}

arg_from_primitive!(bool, i8, u8, i16, u16, i32, u32, i64, u64, f32, f64);

/// Positional and named arguments for one call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args {
    positional: Vec<ArgValue>,
    named: Vec<(String, ArgValue)>,
}

impl Args {
    /// No arguments.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a positional argument.
    pub fn arg(mut self, value: impl Into<ArgValue>) -> Self {
        self.positional.push(value.into());
        self
    }

    /// Add a named argument.
    pub fn named(mut self, name: impl Into<String>, value: impl Into<ArgValue>) -> Self {
        self.named.push((name.into(), value.into()));
        self
    }

    /// Number of arguments.
    pub fn len(&self) -> usize {
        self.positional.len() + self.named.len()
    }

    /// Whether no arguments were given.
    pub fn is_empty(&self) -> bool {
        self.positional.is_empty() && self.named.is_empty()
    }
}

/// A native function: symbol, module, return type, and ordered parameters.
///
/// Holds no per-call state. Every [`CallSpec::invoke`] builds its own
/// argument values, so one spec can be shared and invoked from several
/// threads at once.
pub struct CallSpec {
    symbol: String,
    module: Arc<Module>,
    return_type: NativeType,
    params: Vec<ParamDescriptor>,
    convention: Box<dyn Convention>,
    config: MarshalConfig,
}

impl CallSpec {
    /// Describe `symbol` in `module`. Parameters are set with [`CallSpec::set_params`].
    pub fn new(
        symbol: impl Into<String>,
        module: Arc<Module>,
        return_type: NativeType,
        convention: impl Convention + 'static,
    ) -> Self {
        Self {
            symbol: symbol.into(),
            module,
            return_type,
            params: Vec::new(),
            convention: Box::new(convention),
            config: MarshalConfig::default(),
        }
    }

    /// Use `config` for argument marshaling and result resolution.
    pub fn with_config(mut self, config: MarshalConfig) -> Self {
        self.config = config;
        self
    }

    /// Builder-style [`CallSpec::set_params`].
    pub fn with_params(
        mut self,
        params: impl IntoIterator<Item = ParamDescriptor>,
    ) -> Result<Self, DescriptorError> {
        self.set_params(params)?;
        Ok(self)
    }

    /// Replace the parameter list.
    ///
    /// Names must be unique and non-empty, and every discriminator must
    /// name another parameter of the set.
    pub fn set_params(
        &mut self,
        params: impl IntoIterator<Item = ParamDescriptor>,
    ) -> Result<(), DescriptorError> {
        let params: Vec<_> = params.into_iter().collect();
        let invalid = |reason: String| DescriptorError::InvalidParameterSet { reason };

        for (i, param) in params.iter().enumerate() {
            if param.name().is_empty() {
                return Err(invalid(format!("parameter {i} has an empty name")));
            }
            if params.iter().take(i).any(|p| p.name() == param.name()) {
                return Err(invalid(format!("duplicate parameter '{}'", param.name())));
            }
            if let Some(d) = param.discriminator()
                && !params.iter().any(|p| p.name() == d && p.name() != param.name())
            {
                return Err(invalid(format!(
                    "'{}' is discriminated by unknown parameter '{d}'",
                    param.name()
                )));
            }
        }

        self.params = params;
        Ok(())
    }

    /// Native symbol name.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Module the symbol lives in.
    pub fn module(&self) -> &Arc<Module> {
        &self.module
    }

    /// Declared return type.
    pub fn return_type(&self) -> &NativeType {
        &self.return_type
    }

    /// Parameters in declaration order.
    pub fn params(&self) -> &[ParamDescriptor] {
        &self.params
    }

    /// Parameter descriptor by name.
    pub fn param(&self, name: &str) -> Option<&ParamDescriptor> {
        self.params.iter().find(|p| p.name() == name)
    }

    /// The spec's marshaling configuration.
    pub fn config(&self) -> &MarshalConfig {
        &self.config
    }

    /// A resolver using the spec's configuration.
    pub fn resolver(&self) -> ValueResolver {
        ValueResolver::new(self.config)
    }

    /// A marshaler using the spec's configuration.
    pub fn marshaler(&self) -> RecordMarshaler {
        RecordMarshaler::new(self.config)
    }

    /// Side table linking each discriminated parameter to its source.
    pub fn discriminator_context(&self) -> DiscriminatorContext {
        let mut ctx = DiscriminatorContext::new();
        for param in &self.params {
            if let Some(d) = param.discriminator() {
                ctx.insert(param.name(), d);
            }
        }
        ctx
    }

    /// Perform one native call.
    pub fn invoke(&self, args: Args) -> Result<ResolvedValue, CallError> {
        debug!(
            symbol = %self.symbol,
            module = self.module.name(),
            argc = args.len(),
            "invoking native function"
        );
        let bound = self.bind(args)?;
        let marshaler = self.marshaler();

        let mut slots = Vec::with_capacity(self.params.len());
        for (param, arg) in self.params.iter().zip(bound) {
            let generated = param.generate();
            let (value, origin) = match (arg, generated) {
                (Some(ArgValue::Native(v)), _) => (v, ArgOrigin::Supplied),
                (Some(ArgValue::Structured(v)), _) => {
                    (marshaler.to_native(param.ty(), &v)?, ArgOrigin::Supplied)
                }
                (None, Some(v)) => (v, ArgOrigin::Generated),
                (None, None) => match zeroed_output(param) {
                    Some(v) => (v, ArgOrigin::Zeroed),
                    None => {
                        return Err(CallError::MissingArgument {
                            symbol: self.symbol.clone(),
                            name: param.name().to_string(),
                        });
                    }
                },
            };
            trace!(param = param.name(), direction = ?param.direction(), ?origin, "built argument slot");
            slots.push(ArgSlot {
                direction: param.direction(),
                name: param.name().to_string(),
                ty: param.ty().clone(),
                value,
                origin,
            });
        }

        let outcome = self.module.invoker().invoke(NativeCall {
            symbol: &self.symbol,
            module: self.module.name(),
            return_type: &self.return_type,
            slots,
        })?;
        self.check_arg_count(&outcome.args)?;

        let returned = self
            .convention
            .check(outcome.return_value.as_ref(), self, &outcome.args)?;
        Ok(returned.shape())
    }

    /// Resolve the post-call arguments the caller can observe.
    ///
    /// The mapping holds every writable parameter, every return-flagged
    /// parameter, and every parameter serving as a discriminator source.
    /// Discriminated parameters are resolved through
    /// [`CallSpec::discriminator_context`].
    pub fn resolve_arguments(&self, args: &[NativeValue]) -> Result<Mapping, CallError> {
        self.check_arg_count(args)?;
        let ctx = self.discriminator_context();
        let fields = self
            .params
            .iter()
            .zip(args)
            .filter(|(p, _)| {
                p.direction().is_writable()
                    || p.is_returned()
                    || ctx.links().iter().any(|l| l.discriminant == p.name())
            })
            .map(|(p, a)| (p.name(), a));
        Ok(self.resolver().resolve_fields(fields, &[], &ctx))
    }

    /// Resolved values of the return-flagged parameters, in declaration
    /// order.
    pub fn collect_returns(&self, args: &[NativeValue]) -> Result<Vec<ResolvedValue>, CallError> {
        let resolved = self.resolve_arguments(args)?;
        Ok(self
            .params
            .iter()
            .filter(|p| p.is_returned())
            .map(|p| resolved.get(p.name()).cloned().unwrap_or(ResolvedValue::Absent))
            .collect())
    }

    fn bind(&self, args: Args) -> Result<Vec<Option<ArgValue>>, CallError> {
        let Args { positional, named } = args;
        if positional.len() > self.params.len() {
            return Err(CallError::TooManyArguments {
                symbol: self.symbol.clone(),
                expected: self.params.len(),
                got: positional.len(),
            });
        }

        let mut bound: Vec<Option<ArgValue>> = vec![None; self.params.len()];
        for (slot, value) in bound.iter_mut().zip(positional) {
            *slot = Some(value);
        }
        for (name, value) in named {
            let unknown = || CallError::UnknownParameter {
                symbol: self.symbol.clone(),
                name: name.clone(),
            };
            let index = self
                .params
                .iter()
                .position(|p| p.name() == name)
                .ok_or_else(unknown)?;
            let slot = bound.get_mut(index).ok_or_else(unknown)?;
            if slot.is_some() {
                return Err(CallError::DuplicateArgument {
                    symbol: self.symbol.clone(),
                    name,
                });
            }
            *slot = Some(value);
        }
        Ok(bound)
    }

    fn check_arg_count(&self, args: &[NativeValue]) -> Result<(), CallError> {
        if args.len() != self.params.len() {
            return Err(CallError::ArgumentCountMismatch {
                symbol: self.symbol.clone(),
                expected: self.params.len(),
                got: args.len(),
            });
        }
        Ok(())
    }
}

impl fmt::Debug for CallSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallSpec")
            .field("symbol", &self.symbol)
            .field("module", &self.module.name())
            .field("return_type", &self.return_type.describe())
            .field("params", &self.params)
            .finish_non_exhaustive()
    }
}

/// Storage for an output parameter nobody supplied. Pointers get a
/// zeroed pointee to write into.
fn zeroed_output(param: &ParamDescriptor) -> Option<NativeValue> {
    if !param.direction().is_writable() {
        return None;
    }
    match param.ty() {
        NativeType::Pointer(inner) => match NativeValue::zeroed(inner) {
            Some(pointee) => Some(NativeValue::pointer(pointee)),
            None => Some(NativeValue::null()),
        },
        ty => NativeValue::zeroed(ty),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::call::convention::Unchecked;
    use crate::call::invoker::{CallOutcome, InvokeError};
    use crate::types::ScalarKind;

    fn echo() -> Arc<Module> {
        fn invoker(call: NativeCall<'_>) -> Result<CallOutcome, InvokeError> {
            Ok(CallOutcome::from_slots(Some(NativeValue::from(1u32)), call.slots))
        }
        Module::open("echo", invoker)
    }

    fn spec() -> CallSpec {
        CallSpec::new("f", echo(), ScalarKind::U32.into(), Unchecked)
            .with_params([
                ParamDescriptor::input("a", ScalarKind::U32).build().unwrap(),
                ParamDescriptor::input("b", ScalarKind::U32).returned().build().unwrap(),
            ])
            .unwrap()
    }

    #[test]
    fn test_bind_positional_and_named() {
        let got = spec().invoke(Args::new().arg(1u32).named("b", 2u32)).unwrap();
        assert_eq!(got, ResolvedValue::from(2u32));
    }

    #[test]
    fn test_bind_errors() {
        let spec = spec();
        let err = spec.invoke(Args::new().arg(1u32).arg(2u32).arg(3u32)).unwrap_err();
        assert!(matches!(err, CallError::TooManyArguments { expected: 2, got: 3, .. }));

        let err = spec.invoke(Args::new().arg(1u32).named("c", 2u32)).unwrap_err();
        assert!(matches!(err, CallError::UnknownParameter { ref name, .. } if name == "c"));

        let err = spec.invoke(Args::new().arg(1u32).named("a", 2u32)).unwrap_err();
        assert!(matches!(err, CallError::DuplicateArgument { ref name, .. } if name == "a"));

        let err = spec.invoke(Args::new().arg(1u32)).unwrap_err();
        assert!(matches!(err, CallError::MissingArgument { ref name, .. } if name == "b"));
    }

    #[test]
    fn test_structured_scalar_is_coerced() {
        let err = spec().invoke(Args::new().arg(1u32).arg(-1i32)).unwrap_err();
        assert!(matches!(err, CallError::Marshal(_)));
        let got = spec().invoke(Args::new().arg(1u8).arg(7u8)).unwrap();
        assert_eq!(got, ResolvedValue::Scalar(Scalar::U32(7)));
    }

    #[test]
    fn test_zeroed_output_pointer() {
        let param = ParamDescriptor::output("len", NativeType::pointer_to(ScalarKind::U32.into()))
            .build()
            .unwrap();
        assert_eq!(
            zeroed_output(&param),
            Some(NativeValue::pointer(NativeValue::from(0u32)))
        );
        let input = ParamDescriptor::input("x", ScalarKind::U8).build().unwrap();
        assert_eq!(zeroed_output(&input), None);
    }
}
