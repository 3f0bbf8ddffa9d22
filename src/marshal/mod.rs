//! Conversion between native records and name-keyed mappings.
//!
//! [`RecordMarshaler::flatten`] exposes one level of a native record as a
//! mapping; [`RecordMarshaler::build`] goes the other way and constructs a
//! fresh native record from structured input. Field access on records goes
//! through the explicit pair [`RecordValue::field_resolved`] and
//! [`RecordValue::set_field_from`].

mod error;

pub use error::MarshalError;

use std::sync::Arc;

use crate::config::MarshalConfig;
use crate::logging::trace;
use crate::resolve::ValueResolver;
use crate::types::{DiscriminatorLink, NativeType, RecordType, UnionType};
use crate::value::buffer::{decode_packed, is_packed_scalar};
use crate::value::{ArrayValue, Mapping, NativeValue, RecordValue, ResolvedValue, UnionValue};

/// One level of a native record, keyed by field name.
///
/// Scalar fields appear as [`ResolvedValue::Scalar`]; every other field is
/// carried as [`ResolvedValue::Unresolved`] so nested records stay native.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatRecord {
    pub fields: Mapping,
    /// The record's discriminator table, if it declares one.
    pub discriminators: Vec<DiscriminatorLink>,
}

impl FlatRecord {
    /// The flattened fields, dropping the discriminator table.
    pub fn into_mapping(self) -> Mapping {
        self.fields
    }
}

/// Builds native records from mappings and flattens them back.
#[derive(Debug, Clone, Copy, Default)]
pub struct RecordMarshaler {
    config: MarshalConfig,
}

impl RecordMarshaler {
    /// A marshaler using `config`.
    pub fn new(config: MarshalConfig) -> Self {
        Self { config }
    }

    /// The marshaler's configuration.
    pub fn config(&self) -> &MarshalConfig {
        &self.config
    }

    /// Flatten the immediate fields of `record`. Nested records are not
    /// descended into.
    pub fn flatten(&self, record: &RecordValue) -> FlatRecord {
        let fields = record
            .fields()
            .iter()
            .map(|(name, value)| {
                let flat = match value {
                    NativeValue::Scalar(s) => ResolvedValue::Scalar(*s),
                    other => ResolvedValue::Unresolved(other.clone()),
                };
                (name.clone(), flat)
            })
            .collect();
        FlatRecord {
            fields,
            discriminators: record.ty().discriminators().to_vec(),
        }
    }

    /// Construct a fresh native record of `ty` from `mapping`.
    ///
    /// Every non-pointer field must be present; a missing pointer field is
    /// left null. Keys the record does not declare are ignored.
    pub fn build(
        &self,
        ty: &Arc<RecordType>,
        mapping: &Mapping,
    ) -> Result<RecordValue, MarshalError> {
        trace!(record = ty.name(), keys = mapping.len(), "building record");
        let mut record = RecordValue::zeroed(ty).ok_or_else(|| {
            MarshalError::mismatch(format!("struct {}", ty.name()), "void field")
        })?;

        for field in ty.fields() {
            let Some(value) = mapping.get(&field.name) else {
                if field.ty.is_pointer() {
                    continue;
                }
                return Err(MarshalError::MissingField {
                    record: ty.name().to_string(),
                    field: field.name.clone(),
                });
            };
            let native = self.field_to_native(ty, &field.name, &field.ty, value, mapping)?;
            record.set(&field.name, native)?;
        }
        Ok(record)
    }

    /// Convert a structured value to a native value of `ty`.
    ///
    /// [`ResolvedValue::Unresolved`] input is taken as already native.
    pub fn to_native(
        &self,
        ty: &NativeType,
        value: &ResolvedValue,
    ) -> Result<NativeValue, MarshalError> {
        if let ResolvedValue::Unresolved(native) = value {
            return Ok(native.clone());
        }

        match (ty, value) {
            (NativeType::Pointer(_), ResolvedValue::Absent) => Ok(NativeValue::null()),
            (NativeType::Pointer(inner), _) => {
                Ok(NativeValue::pointer(self.to_native(inner, value)?))
            }
            (NativeType::Scalar(kind), ResolvedValue::Scalar(s)) => s
                .coerce(*kind)
                .map(NativeValue::Scalar)
                .ok_or_else(|| MarshalError::mismatch(kind.name(), s.kind().name())),
            (NativeType::Array(elem, len), _) => self.build_array(elem, *len, value),
            (NativeType::Record(record), ResolvedValue::Mapping(m)) => {
                Ok(NativeValue::Record(self.build(record, m)?))
            }
            (NativeType::Union(union), ResolvedValue::Mapping(m)) => {
                Ok(NativeValue::Union(self.build_union(union, m)?))
            }
            _ => Err(MarshalError::mismatch(ty.describe(), value.kind_name())),
        }
    }

    /// Convert one field value, honoring the record's discriminator table.
    ///
    /// A union field whose discriminant is present in `siblings` takes the
    /// value of the selected arm, which is the shape the resolver produces.
    fn field_to_native(
        &self,
        record: &RecordType,
        field: &str,
        ty: &NativeType,
        value: &ResolvedValue,
        siblings: &Mapping,
    ) -> Result<NativeValue, MarshalError> {
        if value.is_unresolved() || value.is_absent() {
            return self.to_native(ty, value);
        }

        let selected = ty.base().as_union().and_then(|union| {
            let discriminant = record.discriminant_for(field)?;
            let d = siblings.get(discriminant)?.as_scalar()?.as_i64()?;
            Some((union, union.arm_for(d)?))
        });
        let Some((union, arm)) = selected else {
            return self.to_native(ty, value);
        };

        let mut union_value = UnionValue::zeroed(union)
            .ok_or_else(|| MarshalError::mismatch(format!("union {}", union.name()), "void arm"))?;
        union_value.set_arm(&arm.name, self.to_native(&arm.ty, value)?)?;

        let mut native = NativeValue::Union(union_value);
        for _ in 0..ty.indirection() {
            native = NativeValue::pointer(native);
        }
        Ok(native)
    }

    /// Build a union from a partial arm mapping; arms not named stay zeroed.
    fn build_union(
        &self,
        ty: &Arc<UnionType>,
        mapping: &Mapping,
    ) -> Result<UnionValue, MarshalError> {
        let mut union = UnionValue::zeroed(ty)
            .ok_or_else(|| MarshalError::mismatch(format!("union {}", ty.name()), "void arm"))?;
        for (name, value) in mapping.iter() {
            let arm = ty.arm(name).ok_or_else(|| MarshalError::UnknownField {
                record: ty.name().to_string(),
                field: name.to_string(),
            })?;
            union.set_arm(name, self.to_native(&arm.ty, value)?)?;
        }
        Ok(union)
    }

    /// Build a fixed-length array from a sequence or, for scalar storage,
    /// from raw bytes. Missing trailing elements are zeroed.
    fn build_array(
        &self,
        elem: &NativeType,
        len: usize,
        value: &ResolvedValue,
    ) -> Result<NativeValue, MarshalError> {
        let zero = NativeValue::zeroed(elem)
            .ok_or_else(|| MarshalError::mismatch("array element", "void"))?;

        let items = match value {
            ResolvedValue::Sequence(items) => {
                if items.len() > len {
                    return Err(MarshalError::ArrayTooLong {
                        expected: len,
                        got: items.len(),
                    });
                }
                let mut out = items
                    .iter()
                    .map(|item| self.to_native(elem, item))
                    .collect::<Result<Vec<_>, _>>()?;
                out.resize(len, zero);
                out
            }
            ResolvedValue::Bytes(bytes) if is_packed_scalar(elem) => {
                let elem_size = elem.size();
                let count = match elem_size {
                    0 if bytes.is_empty() => 0,
                    0 => {
                        return Err(MarshalError::ArrayTooLong {
                            expected: 0,
                            got: bytes.len(),
                        });
                    }
                    n => bytes.len().div_ceil(n),
                };
                if count > len {
                    return Err(MarshalError::ArrayTooLong {
                        expected: len,
                        got: count,
                    });
                }
                let mut offset = 0;
                let mut out = Vec::with_capacity(len);
                for _ in 0..count {
                    out.push(decode_packed(elem, bytes, &mut offset, self.config.byte_order)?);
                }
                out.resize(len, zero);
                out
            }
            _ => {
                return Err(MarshalError::mismatch(
                    NativeType::array_of(elem.clone(), len).describe(),
                    value.kind_name(),
                ));
            }
        };
        Ok(NativeValue::Array(ArrayValue::new(elem.clone(), items)))
    }
}

impl RecordValue {
    /// Resolved value of one field, with the record's own discriminators
    /// applied.
    pub fn field_resolved(
        &self,
        name: &str,
        resolver: &ValueResolver,
    ) -> Result<ResolvedValue, MarshalError> {
        resolver
            .resolve_field(self, name)
            .ok_or_else(|| MarshalError::UnknownField {
                record: self.ty().name().to_string(),
                field: name.to_string(),
            })
    }

    /// Store a structured value into one field.
    ///
    /// A discriminated union field takes the value of the arm selected by
    /// the record's current discriminant.
    pub fn set_field_from(
        &mut self,
        name: &str,
        value: &ResolvedValue,
        marshaler: &RecordMarshaler,
    ) -> Result<(), MarshalError> {
        let ty = Arc::clone(self.ty());
        let field = ty.field(name).ok_or_else(|| MarshalError::UnknownField {
            record: ty.name().to_string(),
            field: name.to_string(),
        })?;

        let siblings: Mapping = ty
            .discriminant_for(name)
            .and_then(|d| Some((d, self.get(d)?.deref_all()?.as_scalar()?)))
            .into_iter()
            .collect();
        let native = marshaler.field_to_native(&ty, name, &field.ty, value, &siblings)?;
        self.set(name, native)
    }
}
