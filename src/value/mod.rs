//! Native values and their resolved counterparts.
//!
//! # Module Organization
//!
//! - [`buffer`]: Byte-level scalar encoding and decoding
//! - [`resolved`]: The structured result of resolution

pub mod buffer;
mod resolved;

pub use resolved::{Mapping, ResolvedValue};

use std::fmt;
use std::sync::Arc;

use crate::marshal::MarshalError;
use crate::types::{NativeType, RecordType, ScalarKind, UnionType};

/// A native scalar value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Scalar {
    Bool(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    U64(u64),
    F32(f32),
    F64(f64),
}

impl Scalar {
    /// The kind of this scalar.
    pub fn kind(self) -> ScalarKind {
        match self {
            Self::Bool(_) => ScalarKind::Bool,
            Self::I8(_) => ScalarKind::I8,
            Self::U8(_) => ScalarKind::U8,
            Self::I16(_) => ScalarKind::I16,
            Self::U16(_) => ScalarKind::U16,
            Self::I32(_) => ScalarKind::I32,
            Self::U32(_) => ScalarKind::U32,
            Self::I64(_) => ScalarKind::I64,
            Self::U64(_) => ScalarKind::U64,
            Self::F32(_) => ScalarKind::F32,
            Self::F64(_) => ScalarKind::F64,
        }
    }

    /// The zero value of `kind`.
    pub fn zero(kind: ScalarKind) -> Self {
        match kind {
            ScalarKind::Bool => Self::Bool(false),
            ScalarKind::I8 => Self::I8(0),
            ScalarKind::U8 => Self::U8(0),
            ScalarKind::I16 => Self::I16(0),
            ScalarKind::U16 => Self::U16(0),
            ScalarKind::I32 => Self::I32(0),
            ScalarKind::U32 => Self::U32(0),
            ScalarKind::I64 => Self::I64(0),
            ScalarKind::U64 => Self::U64(0),
            ScalarKind::F32 => Self::F32(0.0),
            ScalarKind::F64 => Self::F64(0.0),
        }
    }

    fn as_i128(self) -> Option<i128> {
        match self {
            Self::Bool(v) => Some(i128::from(v)),
            Self::I8(v) => Some(i128::from(v)),
            Self::U8(v) => Some(i128::from(v)),
            Self::I16(v) => Some(i128::from(v)),
            Self::U16(v) => Some(i128::from(v)),
            Self::I32(v) => Some(i128::from(v)),
            Self::U32(v) => Some(i128::from(v)),
            Self::I64(v) => Some(i128::from(v)),
            Self::U64(v) => Some(i128::from(v)),
            Self::F32(_) | Self::F64(_) => None,
        }
    }

    /// Integer view of the scalar, used for discriminants and return codes.
    ///
    /// Floats and `u64` values above `i64::MAX` have no integer view.
    pub fn as_i64(self) -> Option<i64> {
        self.as_i128().and_then(|v| i64::try_from(v).ok())
    }

    /// Convert to `kind` without losing information.
    ///
    /// Integers convert to any integer kind that holds them and to either
    /// float kind; `bool` accepts only 0 and 1; floats never become integers.
    pub fn coerce(self, kind: ScalarKind) -> Option<Scalar> {
        if let Some(n) = self.as_i128() {
            return match kind {
                ScalarKind::Bool => match n {
                    0 => Some(Self::Bool(false)),
                    1 => Some(Self::Bool(true)),
                    _ => None,
                },
                ScalarKind::I8 => i8::try_from(n).ok().map(Self::I8),
                ScalarKind::U8 => u8::try_from(n).ok().map(Self::U8),
                ScalarKind::I16 => i16::try_from(n).ok().map(Self::I16),
                ScalarKind::U16 => u16::try_from(n).ok().map(Self::U16),
                ScalarKind::I32 => i32::try_from(n).ok().map(Self::I32),
                ScalarKind::U32 => u32::try_from(n).ok().map(Self::U32),
                ScalarKind::I64 => i64::try_from(n).ok().map(Self::I64),
                ScalarKind::U64 => u64::try_from(n).ok().map(Self::U64),
                ScalarKind::F32 => Some(Self::F32(n as f32)),
                ScalarKind::F64 => Some(Self::F64(n as f64)),
            };
        }
        match (self, kind) {
            (Self::F32(v), ScalarKind::F32) => Some(Self::F32(v)),
            (Self::F32(v), ScalarKind::F64) => Some(Self::F64(f64::from(v))),
            (Self::F64(v), ScalarKind::F64) => Some(Self::F64(v)),
            (Self::F64(v), ScalarKind::F32) => Some(Self::F32(v as f32)),
            _ => None,
        }
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::I8(v) => write!(f, "{v}"),
            Self::U8(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::U16(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::I64(v) => write!(f, "{v}"),
            Self::U64(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{v}"),
            Self::F64(v) => write!(f, "{v}"),
        }
    }
}

macro_rules! scalar_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Scalar {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }

            impl From<$ty> for NativeValue {
                fn from(v: $ty) -> Self {
                    Self::Scalar(Scalar::$variant(v))
                }
            }

            impl From<$ty> for ResolvedValue {
                fn from(v: $ty) -> Self {
                    Self::Scalar(Scalar::$variant(v))
                }
            }
        )*
    };
}

scalar_from! {
    bool => Bool,
    i8 => I8,
    u8 => U8,
    i16 => I16,
    u16 => U16,
    i32 => I32,
    u32 => U32,
    i64 => I64,
    u64 => U64,
    f32 => F32,
    f64 => F64,
}

/// A value in native representation.
///
/// Every value produced for a call is owned by that call; cloning is a deep
/// copy, so two calls never share storage.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Scalar(Scalar),
    /// `None` is the null pointer.
    Pointer(Option<Box<NativeValue>>),
    Array(ArrayValue),
    Record(RecordValue),
    Union(UnionValue),
}

impl NativeValue {
    /// Pointer to `value`.
    pub fn pointer(value: NativeValue) -> Self {
        Self::Pointer(Some(Box::new(value)))
    }

    /// A null pointer.
    pub fn null() -> Self {
        Self::Pointer(None)
    }

    /// Zero-initialized value of `ty`; pointers are null.
    ///
    /// Returns `None` for `void`, which has no values.
    pub fn zeroed(ty: &NativeType) -> Option<Self> {
        Some(match ty {
            NativeType::Void => return None,
            NativeType::Scalar(kind) => Self::Scalar(Scalar::zero(*kind)),
            NativeType::Pointer(_) => Self::Pointer(None),
            NativeType::Array(elem, len) => Self::Array(ArrayValue::zeroed(elem, *len)?),
            NativeType::Record(r) => Self::Record(RecordValue::zeroed(r)?),
            NativeType::Union(u) => Self::Union(UnionValue::zeroed(u)?),
        })
    }

    /// Whether this is a null pointer.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Pointer(None))
    }

    /// The scalar, if this is one.
    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            Self::Scalar(s) => Some(*s),
            _ => None,
        }
    }

    /// The record, if this is one.
    pub fn as_record(&self) -> Option<&RecordValue> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    /// Mutable access to the record, if this is one.
    pub fn as_record_mut(&mut self) -> Option<&mut RecordValue> {
        match self {
            Self::Record(r) => Some(r),
            _ => None,
        }
    }

    /// The union, if this is one.
    pub fn as_union(&self) -> Option<&UnionValue> {
        match self {
            Self::Union(u) => Some(u),
            _ => None,
        }
    }

    /// The array, if this is one.
    pub fn as_array(&self) -> Option<&ArrayValue> {
        match self {
            Self::Array(a) => Some(a),
            _ => None,
        }
    }

    /// Follow pointers to the first non-pointer value; `None` on a null link.
    pub fn deref_all(&self) -> Option<&NativeValue> {
        match self {
            Self::Pointer(Some(target)) => target.deref_all(),
            Self::Pointer(None) => None,
            other => Some(other),
        }
    }

    /// Mutable counterpart of [`NativeValue::deref_all`].
    pub fn deref_all_mut(&mut self) -> Option<&mut NativeValue> {
        match self {
            Self::Pointer(Some(target)) => target.deref_all_mut(),
            Self::Pointer(None) => None,
            other => Some(other),
        }
    }

    /// Short kind name used in error messages.
    pub fn kind_name(&self) -> String {
        match self {
            Self::Scalar(s) => s.kind().name().to_string(),
            Self::Pointer(None) => "null pointer".to_string(),
            Self::Pointer(Some(_)) => "pointer".to_string(),
            Self::Array(a) => format!("[{}; {}]", a.elem_type().describe(), a.len()),
            Self::Record(r) => format!("struct {}", r.ty().name()),
            Self::Union(u) => format!("union {}", u.ty().name()),
        }
    }
}

impl From<Scalar> for NativeValue {
    fn from(s: Scalar) -> Self {
        Self::Scalar(s)
    }
}

impl From<RecordValue> for NativeValue {
    fn from(r: RecordValue) -> Self {
        Self::Record(r)
    }
}

impl From<UnionValue> for NativeValue {
    fn from(u: UnionValue) -> Self {
        Self::Union(u)
    }
}

impl From<ArrayValue> for NativeValue {
    fn from(a: ArrayValue) -> Self {
        Self::Array(a)
    }
}

/// A fixed-length native array.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayValue {
    elem: NativeType,
    items: Vec<NativeValue>,
}

impl ArrayValue {
    /// Array of `elem` holding exactly `items`.
    pub fn new(elem: NativeType, items: Vec<NativeValue>) -> Self {
        Self { elem, items }
    }

    /// `len` zeroed elements of `elem`. `None` for a void element type.
    pub fn zeroed(elem: &NativeType, len: usize) -> Option<Self> {
        let zero = NativeValue::zeroed(elem)?;
        Some(Self {
            elem: elem.clone(),
            items: vec![zero; len],
        })
    }

    /// Array of `kind` scalars, e.g. a raw byte buffer.
    pub fn from_scalars(kind: ScalarKind, values: impl IntoIterator<Item = Scalar>) -> Self {
        Self {
            elem: NativeType::Scalar(kind),
            items: values.into_iter().map(NativeValue::Scalar).collect(),
        }
    }

    /// Declared element type.
    pub fn elem_type(&self) -> &NativeType {
        &self.elem
    }

    /// Elements in index order.
    pub fn items(&self) -> &[NativeValue] {
        &self.items
    }

    /// Mutable elements; the length is fixed.
    pub fn items_mut(&mut self) -> &mut [NativeValue] {
        &mut self.items
    }

    /// Element at `index`.
    pub fn get(&self, index: usize) -> Option<&NativeValue> {
        self.items.get(index)
    }

    /// Number of elements.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Whether the array has no elements.
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// A native record instance.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordValue {
    ty: Arc<RecordType>,
    fields: Vec<(String, NativeValue)>,
}

impl RecordValue {
    /// Zero-initialized instance of `ty`.
    pub fn zeroed(ty: &Arc<RecordType>) -> Option<Self> {
        let fields = ty
            .fields()
            .iter()
            .map(|f| Some((f.name.clone(), NativeValue::zeroed(&f.ty)?)))
            .collect::<Option<Vec<_>>>()?;
        Some(Self {
            ty: Arc::clone(ty),
            fields,
        })
    }

    /// The record's registered type.
    pub fn ty(&self) -> &Arc<RecordType> {
        &self.ty
    }

    /// Field values in declaration order.
    pub fn fields(&self) -> &[(String, NativeValue)] {
        &self.fields
    }

    /// Field value by name.
    pub fn get(&self, name: &str) -> Option<&NativeValue> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Mutable field value by name.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut NativeValue> {
        self.fields
            .iter_mut()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    /// Overwrite a field with a native value.
    pub fn set(&mut self, name: &str, value: impl Into<NativeValue>) -> Result<(), MarshalError> {
        let record = self.ty.name().to_string();
        let slot = self.get_mut(name).ok_or_else(|| MarshalError::UnknownField {
            record,
            field: name.to_string(),
        })?;
        *slot = value.into();
        Ok(())
    }
}

/// A native union instance.
///
/// Each arm keeps its own storage; which one is meaningful is decided by
/// the discriminant carried elsewhere.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionValue {
    ty: Arc<UnionType>,
    arms: Vec<(String, NativeValue)>,
}

impl UnionValue {
    /// Zero-initialized instance of `ty`.
    pub fn zeroed(ty: &Arc<UnionType>) -> Option<Self> {
        let arms = ty
            .arms()
            .iter()
            .map(|a| Some((a.name.clone(), NativeValue::zeroed(&a.ty)?)))
            .collect::<Option<Vec<_>>>()?;
        Some(Self {
            ty: Arc::clone(ty),
            arms,
        })
    }

    /// The union's registered type.
    pub fn ty(&self) -> &Arc<UnionType> {
        &self.ty
    }

    /// Stored value of every arm, in declaration order.
    pub fn arms(&self) -> &[(String, NativeValue)] {
        &self.arms
    }

    /// Value of arm `name`.
    pub fn arm(&self, name: &str) -> Option<&NativeValue> {
        self.arms.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Mutable value of arm `name`.
    pub fn arm_mut(&mut self, name: &str) -> Option<&mut NativeValue> {
        self.arms.iter_mut().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    /// Overwrite an arm with a native value.
    pub fn set_arm(&mut self, name: &str, value: impl Into<NativeValue>) -> Result<(), MarshalError> {
        let union = self.ty.name().to_string();
        let slot = self.arm_mut(name).ok_or_else(|| MarshalError::UnknownField {
            record: union,
            field: name.to_string(),
        })?;
        *slot = value.into();
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_integers() {
        assert_eq!(Scalar::U32(22).coerce(ScalarKind::U8), Some(Scalar::U8(22)));
        assert_eq!(Scalar::U32(300).coerce(ScalarKind::U8), None);
        assert_eq!(Scalar::I32(-1).coerce(ScalarKind::U32), None);
        assert_eq!(Scalar::I32(-1).coerce(ScalarKind::I64), Some(Scalar::I64(-1)));
        assert_eq!(Scalar::U64(u64::MAX).coerce(ScalarKind::I64), None);
    }

    #[test]
    fn test_coerce_bool_and_float() {
        assert_eq!(Scalar::U8(1).coerce(ScalarKind::Bool), Some(Scalar::Bool(true)));
        assert_eq!(Scalar::U8(2).coerce(ScalarKind::Bool), None);
        assert_eq!(Scalar::Bool(true).coerce(ScalarKind::U32), Some(Scalar::U32(1)));
        assert_eq!(Scalar::I16(3).coerce(ScalarKind::F64), Some(Scalar::F64(3.0)));
        assert_eq!(Scalar::F64(1.5).coerce(ScalarKind::I32), None);
        assert_eq!(Scalar::F32(0.5).coerce(ScalarKind::F64), Some(Scalar::F64(0.5)));
    }

    #[test]
    fn test_as_i64() {
        assert_eq!(Scalar::U32(4).as_i64(), Some(4));
        assert_eq!(Scalar::I8(-4).as_i64(), Some(-4));
        assert_eq!(Scalar::U64(u64::MAX).as_i64(), None);
        assert_eq!(Scalar::F32(1.0).as_i64(), None);
    }

    #[test]
    fn test_zeroed_record_has_null_pointers() {
        let ty = RecordType::builder("sid_and_attributes")
            .field("sid", NativeType::pointer_to(NativeType::array_of(ScalarKind::U8.into(), 68)))
            .field("attributes", ScalarKind::U32)
            .build()
            .unwrap();
        let value = RecordValue::zeroed(&ty).unwrap();
        assert!(value.get("sid").unwrap().is_null());
        assert_eq!(value.get("attributes"), Some(&NativeValue::from(0u32)));
    }

    #[test]
    fn test_deref_all() {
        let v = NativeValue::pointer(NativeValue::pointer(NativeValue::from(54u32)));
        assert_eq!(v.deref_all(), Some(&NativeValue::from(54u32)));
        let broken = NativeValue::pointer(NativeValue::null());
        assert!(broken.deref_all().is_none());
    }

    #[test]
    fn test_set_unknown_field() {
        let ty = RecordType::builder("r").field("a", ScalarKind::U8).build().unwrap();
        let mut value = RecordValue::zeroed(&ty).unwrap();
        value.set("a", 7u8).unwrap();
        assert_eq!(value.get("a"), Some(&NativeValue::from(7u8)));
        let err = value.set("b", 1u8).unwrap_err();
        assert!(matches!(err, MarshalError::UnknownField { .. }));
    }
}
