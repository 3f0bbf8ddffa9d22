//! Native type descriptions and the capability queries the engine relies on.
//!
//! The engine never inspects a concrete ABI. It only asks a [`NativeType`]
//! what kind it is (pointer, record, union, array, scalar) and walks the
//! matching accessor. Record and union types are registered once through
//! their builders and shared behind an [`Arc`] afterwards.
//!
//! # Module Organization
//!
//! - [`error`]: Schema errors raised during type registration
//! - [`layout`]: C layout rules (size and alignment)

mod error;
pub mod layout;

pub use error::SchemaError;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Primitive kinds a native scalar can take.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Bool,
    I8,
    U8,
    I16,
    U16,
    I32,
    U32,
    I64,
    U64,
    F32,
    F64,
}

impl ScalarKind {
    /// Size of the scalar in bytes.
    #[inline]
    pub const fn size(self) -> usize {
        match self {
            Self::Bool | Self::I8 | Self::U8 => 1,
            Self::I16 | Self::U16 => 2,
            Self::I32 | Self::U32 | Self::F32 => 4,
            Self::I64 | Self::U64 | Self::F64 => 8,
        }
    }

    /// Check if the kind is a signed integer.
    #[inline]
    pub const fn is_signed(self) -> bool {
        matches!(self, Self::I8 | Self::I16 | Self::I32 | Self::I64)
    }

    /// Check if the kind is floating point.
    #[inline]
    pub const fn is_float(self) -> bool {
        matches!(self, Self::F32 | Self::F64)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::I8 => "i8",
            Self::U8 => "u8",
            Self::I16 => "i16",
            Self::U16 => "u16",
            Self::I32 => "i32",
            Self::U32 => "u32",
            Self::I64 => "i64",
            Self::U64 => "u64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A native type as seen by the marshaling engine.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeType {
    /// No value; only meaningful as a return type.
    Void,
    Scalar(ScalarKind),
    /// Nullable pointer to a value of the inner type.
    Pointer(Box<NativeType>),
    /// Fixed-length array: element type and element count.
    Array(Box<NativeType>, usize),
    Record(Arc<RecordType>),
    /// Untagged union; the active arm is chosen by an external discriminant.
    Union(Arc<UnionType>),
}

impl NativeType {
    /// Pointer to `ty`.
    pub fn pointer_to(ty: NativeType) -> Self {
        Self::Pointer(Box::new(ty))
    }

    /// Fixed-length array of `len` elements of `elem`.
    pub fn array_of(elem: NativeType, len: usize) -> Self {
        Self::Array(Box::new(elem), len)
    }

    /// Whether this is a pointer type.
    #[inline]
    pub fn is_pointer(&self) -> bool {
        matches!(self, Self::Pointer(_))
    }

    /// Whether this is a record type.
    #[inline]
    pub fn is_record(&self) -> bool {
        matches!(self, Self::Record(_))
    }

    /// Whether this is a union type.
    #[inline]
    pub fn is_union(&self) -> bool {
        matches!(self, Self::Union(_))
    }

    /// Whether this is a fixed-length array type.
    #[inline]
    pub fn is_array(&self) -> bool {
        matches!(self, Self::Array(..))
    }

    /// Whether this is a scalar type.
    #[inline]
    pub fn is_scalar(&self) -> bool {
        matches!(self, Self::Scalar(_))
    }

    /// The pointed-to type, if this is a pointer.
    pub fn pointee(&self) -> Option<&NativeType> {
        match self {
            Self::Pointer(inner) => Some(inner),
            _ => None,
        }
    }

    /// Follow pointer indirection down to the first non-pointer type.
    pub fn base(&self) -> &NativeType {
        let mut ty = self;
        while let Self::Pointer(inner) = ty {
            ty = inner;
        }
        ty
    }

    /// Number of pointer levels wrapped around [`NativeType::base`].
    pub fn indirection(&self) -> usize {
        let mut depth = 0;
        let mut ty = self;
        while let Self::Pointer(inner) = ty {
            depth += 1;
            ty = inner;
        }
        depth
    }

    /// The record type, if this is one.
    pub fn as_record(&self) -> Option<&Arc<RecordType>> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    /// The union type, if this is one.
    pub fn as_union(&self) -> Option<&Arc<UnionType>> {
        match self {
            Self::Union(u) => Some(u),
            _ => None,
        }
    }

    /// Element type and length, if this is an array.
    pub fn as_array(&self) -> Option<(&NativeType, usize)> {
        match self {
            Self::Array(elem, len) => Some((elem, *len)),
            _ => None,
        }
    }

    /// The scalar kind, if this is a scalar.
    pub fn as_scalar(&self) -> Option<ScalarKind> {
        match self {
            Self::Scalar(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Human-readable type name used in error messages.
    pub fn describe(&self) -> String {
        match self {
            Self::Void => "void".to_string(),
            Self::Scalar(kind) => kind.name().to_string(),
            Self::Pointer(inner) => format!("*{}", inner.describe()),
            Self::Array(elem, len) => format!("[{}; {}]", elem.describe(), len),
            Self::Record(r) => format!("struct {}", r.name()),
            Self::Union(u) => format!("union {}", u.name()),
        }
    }
}

impl From<ScalarKind> for NativeType {
    fn from(kind: ScalarKind) -> Self {
        Self::Scalar(kind)
    }
}

impl From<Arc<RecordType>> for NativeType {
    fn from(record: Arc<RecordType>) -> Self {
        Self::Record(record)
    }
}

impl From<Arc<UnionType>> for NativeType {
    fn from(union: Arc<UnionType>) -> Self {
        Self::Union(union)
    }
}

/// A named member of a record or an arm of a union.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: NativeType,
}

/// Declares that a union-valued field is selected by a sibling field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscriminatorLink {
    /// Field holding the union (or a pointer to it).
    pub union_field: String,
    /// Sibling field holding the discriminant.
    pub discriminant: String,
}

/// A native record (C struct) type.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordType {
    name: String,
    fields: Vec<Field>,
    discriminators: Vec<DiscriminatorLink>,
}

impl RecordType {
    /// Start registering a record type.
    pub fn builder(name: impl Into<String>) -> RecordBuilder {
        RecordBuilder {
            name: name.into(),
            fields: Vec::new(),
            discriminators: Vec::new(),
        }
    }

    /// Registered name of the record.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared fields, in layout order.
    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    /// Look up a field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// The record's discriminator table.
    pub fn discriminators(&self) -> &[DiscriminatorLink] {
        &self.discriminators
    }

    /// Name of the sibling field that selects the arm of `union_field`.
    pub fn discriminant_for(&self, union_field: &str) -> Option<&str> {
        self.discriminators
            .iter()
            .find(|d| d.union_field == union_field)
            .map(|d| d.discriminant.as_str())
    }
}

/// Builder for [`RecordType`].
#[derive(Debug)]
pub struct RecordBuilder {
    name: String,
    fields: Vec<Field>,
    discriminators: Vec<DiscriminatorLink>,
}

impl RecordBuilder {
    /// Append a field.
    pub fn field(mut self, name: impl Into<String>, ty: impl Into<NativeType>) -> Self {
        self.fields.push(Field {
            name: name.into(),
            ty: ty.into(),
        });
        self
    }

    /// Declare that `union_field` is selected by the value of `discriminant`.
    pub fn discriminated_by(
        mut self,
        union_field: impl Into<String>,
        discriminant: impl Into<String>,
    ) -> Self {
        self.discriminators.push(DiscriminatorLink {
            union_field: union_field.into(),
            discriminant: discriminant.into(),
        });
        self
    }

    /// Validate and register the record type.
    pub fn build(self) -> Result<Arc<RecordType>, SchemaError> {
        if self.name.is_empty() {
            return Err(SchemaError::EmptyTypeName);
        }
        check_fields(&self.name, &self.fields)?;

        for link in &self.discriminators {
            let union_field = self
                .fields
                .iter()
                .find(|f| f.name == link.union_field)
                .ok_or_else(|| SchemaError::UnknownField {
                    ty: self.name.clone(),
                    field: link.union_field.clone(),
                })?;
            if !union_field.ty.base().is_union() {
                return Err(SchemaError::NotAUnion {
                    ty: self.name.clone(),
                    field: link.union_field.clone(),
                });
            }

            let discriminant = self
                .fields
                .iter()
                .find(|f| f.name == link.discriminant)
                .ok_or_else(|| SchemaError::UnknownField {
                    ty: self.name.clone(),
                    field: link.discriminant.clone(),
                })?;
            if !discriminant.ty.base().is_scalar() {
                return Err(SchemaError::NotAScalar {
                    ty: self.name.clone(),
                    field: link.discriminant.clone(),
                });
            }
        }

        Ok(Arc::new(RecordType {
            name: self.name,
            fields: self.fields,
            discriminators: self.discriminators,
        }))
    }
}

/// A native union type with an optional discriminant-to-arm table.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionType {
    name: String,
    arms: Vec<Field>,
    selectors: BTreeMap<i64, String>,
}

impl UnionType {
    /// Start registering a union type.
    pub fn builder(name: impl Into<String>) -> UnionBuilder {
        UnionBuilder {
            name: name.into(),
            arms: Vec::new(),
            selectors: Vec::new(),
        }
    }

    /// Registered name of the union.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Arms in declaration order.
    pub fn arms(&self) -> &[Field] {
        &self.arms
    }

    /// Look up an arm by name.
    pub fn arm(&self, name: &str) -> Option<&Field> {
        self.arms.iter().find(|a| a.name == name)
    }

    /// Arm selected by `discriminant`, if the table maps it.
    pub fn arm_for(&self, discriminant: i64) -> Option<&Field> {
        self.selectors
            .get(&discriminant)
            .and_then(|name| self.arm(name))
    }

    /// Whether the union carries a discriminant table at all.
    pub fn is_tagged(&self) -> bool {
        !self.selectors.is_empty()
    }
}

/// Builder for [`UnionType`].
#[derive(Debug)]
pub struct UnionBuilder {
    name: String,
    arms: Vec<Field>,
    selectors: Vec<(i64, String)>,
}

impl UnionBuilder {
    /// Append an arm.
    pub fn arm(mut self, name: impl Into<String>, ty: impl Into<NativeType>) -> Self {
        self.arms.push(Field {
            name: name.into(),
            ty: ty.into(),
        });
        self
    }

    /// Map a discriminant value to an arm name.
    pub fn select(mut self, discriminant: i64, arm: impl Into<String>) -> Self {
        self.selectors.push((discriminant, arm.into()));
        self
    }

    /// Validate and register the union type.
    pub fn build(self) -> Result<Arc<UnionType>, SchemaError> {
        if self.name.is_empty() {
            return Err(SchemaError::EmptyTypeName);
        }
        check_fields(&self.name, &self.arms)?;

        let mut selectors = BTreeMap::new();
        for (discriminant, arm) in self.selectors {
            if !self.arms.iter().any(|a| a.name == arm) {
                return Err(SchemaError::UnknownArm {
                    ty: self.name,
                    arm,
                });
            }
            if selectors.insert(discriminant, arm).is_some() {
                return Err(SchemaError::DuplicateDiscriminant {
                    ty: self.name,
                    discriminant,
                });
            }
        }

        Ok(Arc::new(UnionType {
            name: self.name,
            arms: self.arms,
            selectors,
        }))
    }
}

fn check_fields(ty: &str, fields: &[Field]) -> Result<(), SchemaError> {
    for (i, field) in fields.iter().enumerate() {
        if field.name.is_empty() {
            return Err(SchemaError::EmptyFieldName { ty: ty.to_string() });
        }
        if matches!(field.ty, NativeType::Void) {
            return Err(SchemaError::VoidField {
                ty: ty.to_string(),
                field: field.name.clone(),
            });
        }
        if fields.iter().take(i).any(|f| f.name == field.name) {
            return Err(SchemaError::DuplicateField {
                ty: ty.to_string(),
                field: field.name.clone(),
            });
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn payload() -> Arc<UnionType> {
        UnionType::builder("payload")
            .arm("arm1", ScalarKind::U32)
            .arm("arm4", ScalarKind::I16)
            .select(1, "arm1")
            .select(4, "arm4")
            .build()
            .unwrap()
    }

    #[test]
    fn test_capability_queries() {
        let ptr = NativeType::pointer_to(NativeType::pointer_to(payload().into()));
        assert!(ptr.is_pointer());
        assert!(!ptr.is_union());
        assert!(ptr.base().is_union());
        assert_eq!(ptr.indirection(), 2);
        assert!(ptr.pointee().unwrap().is_pointer());

        let arr = NativeType::array_of(ScalarKind::U8.into(), 8);
        assert_eq!(arr.as_array().map(|(e, n)| (e.as_scalar(), n)), Some((Some(ScalarKind::U8), 8)));
        assert_eq!(arr.describe(), "[u8; 8]");
    }

    #[test]
    fn test_union_arm_table() {
        let u = payload();
        assert!(u.is_tagged());
        assert_eq!(u.arm_for(4).map(|a| a.name.as_str()), Some("arm4"));
        assert!(u.arm_for(2).is_none());
    }

    #[test]
    fn test_union_rejects_unknown_arm() {
        let err = UnionType::builder("u")
            .arm("a", ScalarKind::U8)
            .select(1, "b")
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownArm {
                ty: "u".to_string(),
                arm: "b".to_string()
            }
        );
    }

    #[test]
    fn test_union_rejects_duplicate_discriminant() {
        let err = UnionType::builder("u")
            .arm("a", ScalarKind::U8)
            .arm("b", ScalarKind::U16)
            .select(1, "a")
            .select(1, "b")
            .build()
            .unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateDiscriminant { discriminant: 1, .. }));
    }

    #[test]
    fn test_record_discriminator_validation() {
        let ok = RecordType::builder("tagged")
            .field("switch", ScalarKind::U32)
            .field("payload", payload())
            .discriminated_by("payload", "switch")
            .build()
            .unwrap();
        assert_eq!(ok.discriminant_for("payload"), Some("switch"));
        assert_eq!(ok.discriminant_for("switch"), None);

        let not_union = RecordType::builder("bad")
            .field("switch", ScalarKind::U32)
            .field("payload", ScalarKind::U32)
            .discriminated_by("payload", "switch")
            .build()
            .unwrap_err();
        assert!(matches!(not_union, SchemaError::NotAUnion { .. }));

        let missing = RecordType::builder("bad")
            .field("payload", payload())
            .discriminated_by("payload", "switch")
            .build()
            .unwrap_err();
        assert!(matches!(missing, SchemaError::UnknownField { .. }));
    }

    #[test]
    fn test_record_rejects_duplicate_fields() {
        let err = RecordType::builder("dup")
            .field("a", ScalarKind::U8)
            .field("a", ScalarKind::U16)
            .build()
            .unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateField {
                ty: "dup".to_string(),
                field: "a".to_string()
            }
        );
    }
}
