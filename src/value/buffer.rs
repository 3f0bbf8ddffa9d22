//! Buffer read/write helpers for native scalar storage.
//!
//! Scalar arrays resolve to raw byte sequences and can be rebuilt from them;
//! both directions go through these helpers so the byte order stays in one
//! place.

use crate::config::ByteOrder;
use crate::marshal::MarshalError;
use crate::types::{NativeType, ScalarKind};

use super::{ArrayValue, NativeValue, Scalar};

macro_rules! to_bytes {
    ($v:expr, $order:expr) => {
        match $order {
            ByteOrder::Native => $v.to_ne_bytes().to_vec(),
            ByteOrder::Little => $v.to_le_bytes().to_vec(),
            ByteOrder::Big => $v.to_be_bytes().to_vec(),
        }
    };
}

macro_rules! from_bytes {
    ($ty:ty, $bytes:expr, $order:expr) => {
        match $order {
            ByteOrder::Native => <$ty>::from_ne_bytes($bytes),
            ByteOrder::Little => <$ty>::from_le_bytes($bytes),
            ByteOrder::Big => <$ty>::from_be_bytes($bytes),
        }
    };
}

/// Append the storage bytes of `scalar` to `buffer`.
pub fn write_scalar(buffer: &mut Vec<u8>, scalar: Scalar, order: ByteOrder) {
    let bytes = match scalar {
        Scalar::Bool(v) => vec![u8::from(v)],
        Scalar::I8(v) => to_bytes!(v, order),
        Scalar::U8(v) => vec![v],
        Scalar::I16(v) => to_bytes!(v, order),
        Scalar::U16(v) => to_bytes!(v, order),
        Scalar::I32(v) => to_bytes!(v, order),
        Scalar::U32(v) => to_bytes!(v, order),
        Scalar::I64(v) => to_bytes!(v, order),
        Scalar::U64(v) => to_bytes!(v, order),
        Scalar::F32(v) => to_bytes!(v, order),
        Scalar::F64(v) => to_bytes!(v, order),
    };
    buffer.extend_from_slice(&bytes);
}

/// Read a `kind` scalar stored at `offset`.
pub fn read_scalar(
    buffer: &[u8],
    offset: usize,
    kind: ScalarKind,
    order: ByteOrder,
) -> Result<Scalar, MarshalError> {
    Ok(match kind {
        ScalarKind::Bool => Scalar::Bool(read_byte(buffer, offset)? != 0),
        ScalarKind::U8 => Scalar::U8(read_byte(buffer, offset)?),
        ScalarKind::I8 => Scalar::I8(from_bytes!(i8, read_array(buffer, offset)?, order)),
        ScalarKind::I16 => Scalar::I16(from_bytes!(i16, read_array(buffer, offset)?, order)),
        ScalarKind::U16 => Scalar::U16(from_bytes!(u16, read_array(buffer, offset)?, order)),
        ScalarKind::I32 => Scalar::I32(from_bytes!(i32, read_array(buffer, offset)?, order)),
        ScalarKind::U32 => Scalar::U32(from_bytes!(u32, read_array(buffer, offset)?, order)),
        ScalarKind::I64 => Scalar::I64(from_bytes!(i64, read_array(buffer, offset)?, order)),
        ScalarKind::U64 => Scalar::U64(from_bytes!(u64, read_array(buffer, offset)?, order)),
        ScalarKind::F32 => Scalar::F32(from_bytes!(f32, read_array(buffer, offset)?, order)),
        ScalarKind::F64 => Scalar::F64(from_bytes!(f64, read_array(buffer, offset)?, order)),
    })
}

/// Safe buffer read helper - returns error instead of panicking.
#[inline]
pub fn read_byte(buffer: &[u8], offset: usize) -> Result<u8, MarshalError> {
    buffer
        .get(offset)
        .copied()
        .ok_or(MarshalError::BufferTooSmall {
            needed: offset + 1,
            available: buffer.len(),
        })
}

/// Safe buffer slice read helper.
#[inline]
pub fn read_slice(buffer: &[u8], start: usize, len: usize) -> Result<&[u8], MarshalError> {
    buffer
        .get(start..start + len)
        .ok_or(MarshalError::BufferTooSmall {
            needed: start + len,
            available: buffer.len(),
        })
}

/// Whether `ty` is plain scalar storage: a scalar or a (nested) scalar array.
pub fn is_packed_scalar(ty: &NativeType) -> bool {
    match ty {
        NativeType::Scalar(_) => true,
        NativeType::Array(elem, _) => is_packed_scalar(elem),
        _ => false,
    }
}

/// Append the bytes of a scalar or scalar array, element after element.
pub fn encode_packed(
    value: &NativeValue,
    order: ByteOrder,
    buffer: &mut Vec<u8>,
) -> Result<(), MarshalError> {
    match value {
        NativeValue::Scalar(s) => {
            write_scalar(buffer, *s, order);
            Ok(())
        }
        NativeValue::Array(array) => {
            for item in array.items() {
                encode_packed(item, order, buffer)?;
            }
            Ok(())
        }
        other => Err(MarshalError::mismatch("scalar storage", other.kind_name())),
    }
}

/// Decode one `ty` value at `*offset`, advancing the offset past it.
pub fn decode_packed(
    ty: &NativeType,
    buffer: &[u8],
    offset: &mut usize,
    order: ByteOrder,
) -> Result<NativeValue, MarshalError> {
    match ty {
        NativeType::Scalar(kind) => {
            let scalar = read_scalar(buffer, *offset, *kind, order)?;
            *offset += kind.size();
            Ok(NativeValue::Scalar(scalar))
        }
        NativeType::Array(elem, len) => {
            let items = (0..*len)
                .map(|_| decode_packed(elem, buffer, offset, order))
                .collect::<Result<Vec<_>, _>>()?;
            Ok(NativeValue::Array(ArrayValue::new((**elem).clone(), items)))
        }
        other => Err(MarshalError::mismatch("scalar storage", other.describe())),
    }
}

fn read_array<const N: usize>(buffer: &[u8], offset: usize) -> Result<[u8; N], MarshalError> {
    read_slice(buffer, offset, N)?
        .try_into()
        .map_err(|_| MarshalError::BufferTooSmall {
            needed: offset + N,
            available: buffer.len(),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_write_respects_byte_order() {
        let mut le = Vec::new();
        write_scalar(&mut le, Scalar::U32(0x0102_0304), ByteOrder::Little);
        assert_eq!(le, vec![4, 3, 2, 1]);

        let mut be = Vec::new();
        write_scalar(&mut be, Scalar::U32(0x0102_0304), ByteOrder::Big);
        assert_eq!(be, vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_read_back_what_was_written() {
        let mut buffer = Vec::new();
        write_scalar(&mut buffer, Scalar::I16(-2), ByteOrder::Big);
        write_scalar(&mut buffer, Scalar::F64(2.5), ByteOrder::Big);
        assert_eq!(read_scalar(&buffer, 0, ScalarKind::I16, ByteOrder::Big).unwrap(), Scalar::I16(-2));
        assert_eq!(read_scalar(&buffer, 2, ScalarKind::F64, ByteOrder::Big).unwrap(), Scalar::F64(2.5));
    }

    #[test]
    fn test_packed_nested_array() {
        let ty = NativeType::array_of(NativeType::array_of(ScalarKind::U16.into(), 2), 2);
        assert!(is_packed_scalar(&ty));
        let bytes = [1, 0, 2, 0, 3, 0, 4, 0];
        let mut offset = 0;
        let value = decode_packed(&ty, &bytes, &mut offset, ByteOrder::Little).unwrap();
        assert_eq!(offset, 8);

        let mut out = Vec::new();
        encode_packed(&value, ByteOrder::Little, &mut out).unwrap();
        assert_eq!(out, bytes);
    }

    #[test]
    fn test_read_past_end() {
        let err = read_scalar(&[1, 2], 1, ScalarKind::U32, ByteOrder::Native).unwrap_err();
        assert!(matches!(
            err,
            MarshalError::BufferTooSmall {
                needed: 5,
                available: 2
            }
        ));
    }
}
