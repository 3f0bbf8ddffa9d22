//! Parameter descriptors.

use std::fmt;
use std::sync::Arc;

use super::error::DescriptorError;
use crate::types::NativeType;
use crate::value::NativeValue;

/// Which way a parameter flows across the native call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    In,
    Out,
    InOut,
}

impl Direction {
    /// Native parameter flags: 1 input, 2 output, 3 both.
    pub const fn flags(self) -> u32 {
        match self {
            Self::In => 1,
            Self::Out => 2,
            Self::InOut => 3,
        }
    }

    /// Whether the callee may write through this parameter.
    pub const fn is_writable(self) -> bool {
        matches!(self, Self::Out | Self::InOut)
    }
}

/// Factory producing a fresh native value for every call.
pub type Generator = Arc<dyn Fn() -> NativeValue + Send + Sync>;

/// Static description of one parameter of a native function.
///
/// Built through [`ParamBuilder`] and immutable afterwards.
#[derive(Clone)]
pub struct ParamDescriptor {
    name: String,
    direction: Direction,
    ty: NativeType,
    generator: Option<Generator>,
    returned: bool,
    discriminator: Option<String>,
}

impl ParamDescriptor {
    /// Start describing a parameter of `ty` passed in `direction`.
    pub fn builder(direction: Direction, name: impl Into<String>, ty: NativeType) -> ParamBuilder {
        ParamBuilder {
            name: name.into(),
            direction,
            ty,
            generator: None,
            returned: false,
            discriminator: None,
        }
    }

    /// Start an input parameter.
    pub fn input(name: impl Into<String>, ty: impl Into<NativeType>) -> ParamBuilder {
        Self::builder(Direction::In, name, ty.into())
    }

    /// Start an output parameter.
    pub fn output(name: impl Into<String>, ty: impl Into<NativeType>) -> ParamBuilder {
        Self::builder(Direction::Out, name, ty.into())
    }

    /// Start an input/output parameter.
    pub fn in_out(name: impl Into<String>, ty: impl Into<NativeType>) -> ParamBuilder {
        Self::builder(Direction::InOut, name, ty.into())
    }

    /// Parameter name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// How the callee uses the parameter.
    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Declared native type.
    pub fn ty(&self) -> &NativeType {
        &self.ty
    }

    /// Whether the parameter's resolved value is part of the call result.
    pub fn is_returned(&self) -> bool {
        self.returned
    }

    /// Sibling parameter holding this parameter's union discriminant.
    pub fn discriminator(&self) -> Option<&str> {
        self.discriminator.as_deref()
    }

    /// Whether a default generator is attached.
    pub fn has_generator(&self) -> bool {
        self.generator.is_some()
    }

    /// A fresh value from the generator, if there is one.
    pub fn generate(&self) -> Option<NativeValue> {
        self.generator.as_ref().map(|g| g())
    }
}

impl fmt::Debug for ParamDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamDescriptor")
            .field("name", &self.name)
            .field("direction", &self.direction)
            .field("ty", &self.ty.describe())
            .field("generator", &self.generator.is_some())
            .field("returned", &self.returned)
            .field("discriminator", &self.discriminator)
            .finish()
    }
}

/// Builder for [`ParamDescriptor`].
pub struct ParamBuilder {
    name: String,
    direction: Direction,
    ty: NativeType,
    generator: Option<Generator>,
    returned: bool,
    discriminator: Option<String>,
}

impl ParamBuilder {
    /// Generate this parameter's value on every call.
    pub fn generator(mut self, generator: impl Fn() -> NativeValue + Send + Sync + 'static) -> Self {
        self.generator = Some(Arc::new(generator));
        self
    }

    /// Include the parameter in the call result.
    pub fn returned(mut self) -> Self {
        self.returned = true;
        self
    }

    /// Select the union arm using the value of parameter `name`.
    pub fn discriminated_by(mut self, name: impl Into<String>) -> Self {
        self.discriminator = Some(name.into());
        self
    }

    /// Validate and finish the descriptor.
    pub fn build(self) -> Result<ParamDescriptor, DescriptorError> {
        let invalid = |reason: String| DescriptorError::InvalidDescriptor {
            name: self.name.clone(),
            reason,
        };
        if self.name.is_empty() {
            return Err(invalid("parameter name is empty".to_string()));
        }
        if matches!(self.ty, NativeType::Void) {
            return Err(invalid("parameter type is void".to_string()));
        }
        if let Some(discriminator) = &self.discriminator {
            if !self.ty.base().is_union() {
                return Err(invalid(format!(
                    "{} is not a union, cannot be discriminated by '{}'",
                    self.ty.describe(),
                    discriminator
                )));
            }
            if *discriminator == self.name {
                return Err(invalid("parameter cannot discriminate itself".to_string()));
            }
        }

        Ok(ParamDescriptor {
            name: self.name,
            direction: self.direction,
            ty: self.ty,
            generator: self.generator,
            returned: self.returned,
            discriminator: self.discriminator,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{ScalarKind, UnionType};

    #[test]
    fn test_generator_values_are_fresh() {
        let param = ParamDescriptor::output("size", NativeType::pointer_to(ScalarKind::U32.into()))
            .generator(|| NativeValue::pointer(NativeValue::from(68u32)))
            .build()
            .unwrap();
        let mut first = param.generate().unwrap();
        let second = param.generate().unwrap();
        *first.deref_all_mut().unwrap() = NativeValue::from(1u32);
        assert_eq!(second.deref_all(), Some(&NativeValue::from(68u32)));
    }

    #[test]
    fn test_discriminator_requires_union() {
        let err = ParamDescriptor::output("info", ScalarKind::U32)
            .discriminated_by("class")
            .build()
            .unwrap_err();
        assert!(matches!(err, DescriptorError::InvalidDescriptor { ref name, .. } if name == "info"));

        let union = UnionType::builder("info").arm("a", ScalarKind::U8).build().unwrap();
        let ok = ParamDescriptor::output("info", NativeType::pointer_to(union.into()))
            .discriminated_by("class")
            .returned()
            .build()
            .unwrap();
        assert_eq!(ok.discriminator(), Some("class"));
        assert!(ok.is_returned());
        assert!(!ok.has_generator());
    }

    #[test]
    fn test_rejects_empty_name_and_void() {
        assert!(ParamDescriptor::input("", ScalarKind::U8).build().is_err());
        assert!(ParamDescriptor::builder(Direction::In, "v", NativeType::Void).build().is_err());
    }

    #[test]
    fn test_direction_flags() {
        assert_eq!(Direction::In.flags(), 1);
        assert_eq!(Direction::Out.flags(), 2);
        assert_eq!(Direction::InOut.flags(), 3);
        assert!(!Direction::In.is_writable());
        assert!(Direction::InOut.is_writable());
    }
}
