//! Recursive resolution of native value graphs.
//!
//! [`ValueResolver`] walks a native value guided by its shape: scalars are
//! copied out, pointers are followed, scalar arrays become owned byte
//! sequences, and records become ordered mappings. Unions carry no tag of
//! their own, so a union is only resolved when a sibling discriminant is
//! known, either from the record's discriminator table or from a
//! [`DiscriminatorContext`] supplied by the caller. Otherwise it is passed
//! through as [`ResolvedValue::Unresolved`].
//!
//! Input graphs must be acyclic; owned [`NativeValue`] trees always are.

use crate::config::{MarshalConfig, NullPointerPolicy};
use crate::logging::{trace, warn};
use crate::marshal::FlatRecord;
use crate::types::DiscriminatorLink;
use crate::value::buffer::{encode_packed, is_packed_scalar};
use crate::value::{ArrayValue, Mapping, NativeValue, RecordValue, ResolvedValue, UnionValue};

/// Side table of discriminator links injected by a caller.
///
/// A call spec uses it to wire a union-typed parameter to the sibling
/// parameter holding its discriminant. It applies to the top-level mapping
/// being resolved only; nested records use their own tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscriminatorContext {
    links: Vec<DiscriminatorLink>,
}

impl DiscriminatorContext {
    /// An empty side table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style [`DiscriminatorContext::insert`].
    pub fn with(mut self, union_field: impl Into<String>, discriminant: impl Into<String>) -> Self {
        self.insert(union_field, discriminant);
        self
    }

    /// Link `union_field` to `discriminant`, replacing an earlier link.
    pub fn insert(&mut self, union_field: impl Into<String>, discriminant: impl Into<String>) {
        let union_field = union_field.into();
        let discriminant = discriminant.into();
        match self.links.iter_mut().find(|l| l.union_field == union_field) {
            Some(link) => link.discriminant = discriminant,
            None => self.links.push(DiscriminatorLink {
                union_field,
                discriminant,
            }),
        }
    }

    /// Discriminant field linked to `union_field`.
    pub fn discriminant_for(&self, union_field: &str) -> Option<&str> {
        self.links
            .iter()
            .find(|l| l.union_field == union_field)
            .map(|l| l.discriminant.as_str())
    }

    /// All links in insertion order.
    pub fn links(&self) -> &[DiscriminatorLink] {
        &self.links
    }

    /// Number of links.
    pub fn len(&self) -> usize {
        self.links.len()
    }

    /// Whether the table has no links.
    pub fn is_empty(&self) -> bool {
        self.links.is_empty()
    }
}

impl FromIterator<DiscriminatorLink> for DiscriminatorContext {
    fn from_iter<I: IntoIterator<Item = DiscriminatorLink>>(iter: I) -> Self {
        let mut ctx = Self::new();
        for link in iter {
            ctx.insert(link.union_field, link.discriminant);
        }
        ctx
    }
}

/// Values the resolver knows how to walk.
pub trait Resolve {
    fn resolve_with(&self, resolver: &ValueResolver, ctx: &DiscriminatorContext) -> ResolvedValue;
}

impl Resolve for NativeValue {
    fn resolve_with(&self, resolver: &ValueResolver, ctx: &DiscriminatorContext) -> ResolvedValue {
        resolver.resolve_native(self, ctx)
    }
}

impl Resolve for RecordValue {
    fn resolve_with(&self, resolver: &ValueResolver, ctx: &DiscriminatorContext) -> ResolvedValue {
        ResolvedValue::Mapping(resolver.resolve_record(self, ctx))
    }
}

/// Already resolved; returned unchanged.
impl Resolve for ResolvedValue {
    fn resolve_with(&self, _: &ValueResolver, _: &DiscriminatorContext) -> ResolvedValue {
        self.clone()
    }
}

/// An entry of a name-keyed input: native, or already resolved.
#[derive(Clone, Copy)]
enum Entry<'a> {
    Native(&'a NativeValue),
    Resolved(&'a ResolvedValue),
}

impl<'a> Entry<'a> {
    fn union(self) -> Option<&'a UnionValue> {
        match self {
            Self::Native(v) | Self::Resolved(ResolvedValue::Unresolved(v)) => {
                v.deref_all()?.as_union()
            }
            Self::Resolved(_) => None,
        }
    }

    fn is_null(self) -> bool {
        match self {
            Self::Native(v) | Self::Resolved(ResolvedValue::Unresolved(v)) => {
                v.deref_all().is_none()
            }
            Self::Resolved(v) => v.is_absent(),
        }
    }

    fn passthrough(self) -> ResolvedValue {
        match self {
            Self::Native(v) => ResolvedValue::Unresolved(v.clone()),
            Self::Resolved(v) => v.clone(),
        }
    }
}

/// Converts native values into [`ResolvedValue`]s.
#[derive(Debug, Clone, Copy, Default)]
pub struct ValueResolver {
    config: MarshalConfig,
}

impl ValueResolver {
    /// A resolver using `config`.
    pub fn new(config: MarshalConfig) -> Self {
        Self { config }
    }

    /// The resolver's configuration.
    pub fn config(&self) -> &MarshalConfig {
        &self.config
    }

    /// Resolve `value`, consulting `ctx` for discriminators of top-level
    /// union fields.
    pub fn resolve<T: Resolve + ?Sized>(&self, value: &T, ctx: &DiscriminatorContext) -> ResolvedValue {
        value.resolve_with(self, ctx)
    }

    /// Resolve a record's fields into a mapping in declaration order.
    pub fn resolve_record(&self, record: &RecordValue, ctx: &DiscriminatorContext) -> Mapping {
        self.resolve_fields(
            record.fields().iter().map(|(n, v)| (n.as_str(), v)),
            record.ty().discriminators(),
            ctx,
        )
    }

    /// Resolve a name-keyed set of native values.
    ///
    /// `own` is the discriminator table declared by the container; `ctx`
    /// is consulted for union fields `own` does not cover.
    pub fn resolve_fields<'a>(
        &self,
        fields: impl IntoIterator<Item = (&'a str, &'a NativeValue)>,
        own: &[DiscriminatorLink],
        ctx: &DiscriminatorContext,
    ) -> Mapping {
        let entries: Vec<_> = fields
            .into_iter()
            .map(|(name, value)| (name, Entry::Native(value)))
            .collect();
        self.resolve_entries(&entries, own, ctx)
    }

    /// Resolve the one-level mapping produced by
    /// [`RecordMarshaler::flatten`](crate::RecordMarshaler::flatten), using
    /// its discriminator table.
    pub fn resolve_flat(&self, flat: &FlatRecord, ctx: &DiscriminatorContext) -> Mapping {
        let entries: Vec<_> = flat
            .fields
            .iter()
            .map(|(name, value)| match value {
                ResolvedValue::Unresolved(native) => (name, Entry::Native(native)),
                other => (name, Entry::Resolved(other)),
            })
            .collect();
        self.resolve_entries(&entries, &flat.discriminators, ctx)
    }

    /// Resolve a single field of `record`, applying the record's own
    /// discriminator for it. `None` if the record has no such field.
    pub fn resolve_field(&self, record: &RecordValue, name: &str) -> Option<ResolvedValue> {
        let value = record.get(name)?;
        let mut entries = vec![(name, Entry::Native(value))];
        if let Some(d) = record.ty().discriminant_for(name)
            && let Some(dv) = record.get(d)
        {
            entries.push((d, Entry::Native(dv)));
        }
        let resolved = self.resolve_entries(&entries, record.ty().discriminators(), &DiscriminatorContext::default());
        Some(resolved.get(name).cloned().unwrap_or(ResolvedValue::Absent))
    }

    fn resolve_native(&self, value: &NativeValue, ctx: &DiscriminatorContext) -> ResolvedValue {
        match value {
            NativeValue::Scalar(s) => ResolvedValue::Scalar(*s),
            NativeValue::Pointer(None) => ResolvedValue::Absent,
            NativeValue::Pointer(Some(target)) => self.resolve_native(target, ctx),
            NativeValue::Array(array) => self.resolve_array(array),
            NativeValue::Record(record) => ResolvedValue::Mapping(self.resolve_record(record, ctx)),
            NativeValue::Union(union) => {
                warn!(ty = union.ty().name(), "union without discriminator left unresolved");
                ResolvedValue::Unresolved(value.clone())
            }
        }
    }

    fn resolve_array(&self, array: &ArrayValue) -> ResolvedValue {
        let empty = DiscriminatorContext::default();
        if is_packed_scalar(array.elem_type()) {
            let mut bytes = Vec::new();
            let packed = array
                .items()
                .iter()
                .try_for_each(|item| encode_packed(item, self.config.byte_order, &mut bytes));
            if packed.is_ok() {
                trace!(len = bytes.len(), "copied scalar array");
                return ResolvedValue::Bytes(bytes);
            }
        }
        ResolvedValue::Sequence(
            array
                .items()
                .iter()
                .map(|item| self.resolve_native(item, &empty))
                .collect(),
        )
    }

    fn resolve_entries(
        &self,
        entries: &[(&str, Entry<'_>)],
        own: &[DiscriminatorLink],
        ctx: &DiscriminatorContext,
    ) -> Mapping {
        let empty = DiscriminatorContext::default();
        let omit_null = self.config.null_pointers == NullPointerPolicy::Omit;
        let mut out = Mapping::new();

        for &(name, entry) in entries {
            if omit_null && entry.is_null() {
                trace!(field = name, "omitting null field");
                continue;
            }

            let Some(union) = entry.union() else {
                let resolved = match entry {
                    Entry::Native(value) => self.resolve_native(value, &empty),
                    Entry::Resolved(value) => value.clone(),
                };
                out.insert(name, resolved);
                continue;
            };

            let source = own
                .iter()
                .find(|l| l.union_field == name)
                .map(|l| l.discriminant.as_str())
                .or_else(|| ctx.discriminant_for(name));
            let Some(source) = source else {
                warn!(field = name, ty = union.ty().name(), "no discriminator, union left unresolved");
                out.insert(name, entry.passthrough());
                continue;
            };

            let discriminant = entries
                .iter()
                .find(|(n, _)| *n == source)
                .map(|&(_, e)| match e {
                    Entry::Native(value) => self.resolve_native(value, &empty),
                    Entry::Resolved(value) => value.clone(),
                });
            let arm = discriminant
                .as_ref()
                .and_then(ResolvedValue::as_scalar)
                .and_then(|s| s.as_i64())
                .and_then(|d| union.ty().arm_for(d));

            if let Some(discriminant) = discriminant
                && !(omit_null && discriminant.is_absent())
            {
                out.insert(source, discriminant);
            }

            match arm.and_then(|arm| union.arm(&arm.name)) {
                Some(arm_value) => {
                    trace!(field = name, discriminant = source, "resolving union arm");
                    out.insert(name, self.resolve_native(arm_value, &empty));
                }
                None => {
                    warn!(
                        field = name,
                        discriminant = source,
                        ty = union.ty().name(),
                        "discriminant selects no arm, union left unresolved"
                    );
                    out.insert(name, entry.passthrough());
                }
            }
        }
        out
    }
}
