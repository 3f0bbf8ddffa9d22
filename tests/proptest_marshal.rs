//! Property-based tests for resolution and record marshaling.
//!
//! These tests verify that build(flatten(x)) == x, that resolving an
//! already resolved value changes nothing, and that scalar coercion never
//! loses information.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use ffi_marshal::value::buffer::{read_scalar, write_scalar};
use ffi_marshal::{
    ByteOrder, DiscriminatorContext, MarshalConfig, NativeType, NativeValue, RecordMarshaler,
    RecordType, RecordValue, ResolvedValue, Scalar, ScalarKind, ValueResolver,
};
use proptest::prelude::*;

fn inner_type() -> Arc<RecordType> {
    RecordType::builder("inner")
        .field("flag", ScalarKind::Bool)
        .field("ratio", ScalarKind::F64)
        .build()
        .unwrap()
}

/// A record mixing scalars, a byte array, a nested record, and an array of
/// records.
fn record_type() -> Arc<RecordType> {
    RecordType::builder("sample")
        .field("id", ScalarKind::U32)
        .field("delta", ScalarKind::I16)
        .field("tag", NativeType::array_of(ScalarKind::U8.into(), 4))
        .field("words", NativeType::array_of(ScalarKind::U16.into(), 2))
        .field("inner", inner_type())
        .field("more", NativeType::array_of(inner_type().into(), 2))
        .build()
        .unwrap()
}

fn inner_value(flag: bool, ratio: f64) -> NativeValue {
    let mut inner = RecordValue::zeroed(&inner_type()).unwrap();
    inner.set("flag", flag).unwrap();
    inner.set("ratio", ratio).unwrap();
    inner.into()
}

fn arb_ratio() -> impl Strategy<Value = f64> {
    -1.0e9f64..1.0e9f64
}

prop_compose! {
    fn arb_record()(
        id in any::<u32>(),
        delta in any::<i16>(),
        tag in proptest::array::uniform4(any::<u8>()),
        words in proptest::array::uniform2(any::<u16>()),
        inner in (any::<bool>(), arb_ratio()),
        more in proptest::array::uniform2((any::<bool>(), arb_ratio())),
    ) -> RecordValue {
        let ty = record_type();
        let mut record = RecordValue::zeroed(&ty).unwrap();
        record.set("id", id).unwrap();
        record.set("delta", delta).unwrap();
        record
            .set("tag", ffi_marshal::ArrayValue::from_scalars(ScalarKind::U8, tag.map(Scalar::from)))
            .unwrap();
        record
            .set("words", ffi_marshal::ArrayValue::from_scalars(ScalarKind::U16, words.map(Scalar::from)))
            .unwrap();
        record.set("inner", inner_value(inner.0, inner.1)).unwrap();
        let items = more.map(|(f, r)| inner_value(f, r)).to_vec();
        record
            .set("more", ffi_marshal::ArrayValue::new(inner_type().into(), items))
            .unwrap();
        record
    }
}

fn arb_byte_order() -> impl Strategy<Value = ByteOrder> {
    prop_oneof![
        Just(ByteOrder::Native),
        Just(ByteOrder::Little),
        Just(ByteOrder::Big),
    ]
}

proptest! {
    #[test]
    fn build_of_flatten_is_identity(record in arb_record()) {
        let marshaler = RecordMarshaler::default();
        let flat = marshaler.flatten(&record);
        let rebuilt = marshaler.build(record.ty(), &flat.into_mapping()).unwrap();
        prop_assert_eq!(rebuilt, record);
    }

    #[test]
    fn build_of_resolve_is_identity(record in arb_record(), order in arb_byte_order()) {
        let config = MarshalConfig::default().with_byte_order(order);
        let resolved = ValueResolver::new(config).resolve(&record, &DiscriminatorContext::default());
        let mapping = resolved.as_mapping().unwrap();
        let rebuilt = RecordMarshaler::new(config).build(record.ty(), mapping).unwrap();
        prop_assert_eq!(rebuilt, record);
    }

    #[test]
    fn resolve_is_idempotent(record in arb_record()) {
        let resolver = ValueResolver::default();
        let ctx = DiscriminatorContext::default();
        let once = resolver.resolve(&record, &ctx);
        let twice = resolver.resolve(&once, &ctx);
        prop_assert_eq!(twice, once);
    }

    #[test]
    fn resolved_records_preserve_field_order(record in arb_record()) {
        let resolved = ValueResolver::default().resolve(&record, &DiscriminatorContext::default());
        let keys: Vec<_> = resolved.as_mapping().unwrap().keys().map(str::to_string).collect();
        let declared: Vec<_> = record.ty().fields().iter().map(|f| f.name.clone()).collect();
        prop_assert_eq!(keys, declared);
    }

    #[test]
    fn byte_arrays_resolve_to_owned_copies(tag in proptest::array::uniform4(any::<u8>())) {
        let array = NativeValue::from(ffi_marshal::ArrayValue::from_scalars(
            ScalarKind::U8,
            tag.map(Scalar::from),
        ));
        let resolved = ValueResolver::default().resolve(&array, &DiscriminatorContext::default());
        prop_assert_eq!(resolved, ResolvedValue::Bytes(tag.to_vec()));
    }

    #[test]
    fn coerce_never_loses_information(v in any::<i64>()) {
        let scalar = Scalar::I64(v);
        match scalar.coerce(ScalarKind::U8) {
            Some(Scalar::U8(b)) => prop_assert_eq!(i64::from(b), v),
            Some(other) => prop_assert!(false, "unexpected {:?}", other),
            None => prop_assert!(!(0..=255).contains(&v)),
        }
        match scalar.coerce(ScalarKind::U64) {
            Some(wide) => prop_assert_eq!(wide.coerce(ScalarKind::I64), Some(scalar)),
            None => prop_assert!(v < 0),
        }
    }

    #[test]
    fn scalar_bytes_roundtrip(v in any::<u64>(), order in arb_byte_order()) {
        let mut buffer = Vec::new();
        write_scalar(&mut buffer, Scalar::U64(v), order);
        prop_assert_eq!(buffer.len(), 8);
        prop_assert_eq!(read_scalar(&buffer, 0, ScalarKind::U64, order).unwrap(), Scalar::U64(v));
    }
}
