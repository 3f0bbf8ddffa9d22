//! Common test utilities and fixtures.
//!
//! Native calls are simulated by invokers that write into the argument
//! slots the way a native callee writes through its pointers.

#![allow(dead_code)]

use std::sync::Arc;

use ffi_marshal::{
    ArgSlot, CallOutcome, InvokeError, Module, NativeCall, NativeType, NativeValue, RecordType,
    ScalarKind, UnionType,
};

// =============================================================================
// Type Definitions
// =============================================================================

/// Size of the security identifier buffer.
pub const SID_LEN: usize = 68;

/// Token information class selecting the `user` arm.
pub const TOKEN_USER: u32 = 1;

/// Token information class selecting the `elevation` arm.
pub const TOKEN_ELEVATION: u32 = 20;

pub fn sid_type() -> NativeType {
    NativeType::array_of(ScalarKind::U8.into(), SID_LEN)
}

pub fn sid_and_attributes() -> Arc<RecordType> {
    RecordType::builder("sid_and_attributes")
        .field("sid", NativeType::pointer_to(sid_type()))
        .field("attributes", ScalarKind::U32)
        .build()
        .unwrap()
}

pub fn token_user() -> Arc<RecordType> {
    RecordType::builder("token_user")
        .field("user", sid_and_attributes())
        .build()
        .unwrap()
}

pub fn token_elevation() -> Arc<RecordType> {
    RecordType::builder("token_elevation")
        .field("token_is_elevated", ScalarKind::U32)
        .build()
        .unwrap()
}

/// Untagged union of token information records, selected by class.
pub fn token_information() -> Arc<UnionType> {
    UnionType::builder("token_information")
        .arm("user", token_user())
        .arm("elevation", token_elevation())
        .select(i64::from(TOKEN_USER), "user")
        .select(i64::from(TOKEN_ELEVATION), "elevation")
        .build()
        .unwrap()
}

pub fn point() -> Arc<RecordType> {
    RecordType::builder("point")
        .field("x", ScalarKind::I32)
        .field("y", ScalarKind::I32)
        .build()
        .unwrap()
}

// =============================================================================
// Simulated Native Side
// =============================================================================

/// Open a module whose calls are served by `f`.
pub fn module<F>(name: &str, f: F) -> Arc<Module>
where
    F: Fn(NativeCall<'_>) -> Result<CallOutcome, InvokeError> + Send + Sync + 'static,
{
    Module::open(name, f)
}

/// Integer value of the named slot.
pub fn slot_int(call: &NativeCall<'_>, name: &str) -> Option<i64> {
    call.slot(name)?.value.deref_all()?.as_scalar()?.as_i64()
}

/// Mutable access to the storage behind a pointer slot.
pub fn pointee_mut<'a>(slots: &'a mut [ArgSlot], name: &str) -> Option<&'a mut NativeValue> {
    slots
        .iter_mut()
        .find(|s| s.name == name)?
        .value
        .deref_all_mut()
}

/// Bytes of a security identifier whose first byte is `code`.
pub fn sid_bytes(code: u8) -> Vec<u8> {
    let mut bytes = vec![0u8; SID_LEN];
    if let Some(first) = bytes.first_mut() {
        *first = code;
    }
    if let Some(second) = bytes.get_mut(1) {
        *second = 5;
    }
    bytes
}

/// Overwrite a native `u8` array with `bytes`.
pub fn write_bytes(target: &mut NativeValue, bytes: &[u8]) {
    if let NativeValue::Array(array) = target {
        for (item, byte) in array.items_mut().iter_mut().zip(bytes) {
            *item = NativeValue::from(*byte);
        }
    }
}
