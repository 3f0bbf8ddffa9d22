//! C layout rules for native types.
//!
//! Size-carrying parameters ("length of the buffer I am handing you") are
//! generated from these values, so they follow the platform C rules:
//! fields aligned to their natural alignment, records padded to a multiple
//! of their widest member, unions as large as their largest arm.

use super::NativeType;

/// Pointer width of the host.
pub const POINTER_SIZE: usize = std::mem::size_of::<usize>();

/// Align a value up to the nearest multiple of alignment.
#[inline]
pub fn align_to(val: usize, align: usize) -> usize {
    (val + align - 1) & !(align - 1)
}

impl NativeType {
    /// Size in bytes, including trailing padding.
    pub fn size(&self) -> usize {
        match self {
            Self::Void => 0,
            Self::Scalar(kind) => kind.size(),
            Self::Pointer(_) => POINTER_SIZE,
            Self::Array(elem, len) => elem.size() * len,
            Self::Record(r) => {
                let mut offset = 0;
                for field in r.fields() {
                    offset = align_to(offset, field.ty.align()) + field.ty.size();
                }
                align_to(offset, self.align())
            }
            Self::Union(u) => {
                let largest = u.arms().iter().map(|a| a.ty.size()).max().unwrap_or(0);
                align_to(largest, self.align())
            }
        }
    }

    /// Alignment in bytes (never zero).
    pub fn align(&self) -> usize {
        match self {
            Self::Void => 1,
            Self::Scalar(kind) => kind.size(),
            Self::Pointer(_) => POINTER_SIZE,
            Self::Array(elem, _) => elem.align(),
            Self::Record(r) => r.fields().iter().map(|f| f.ty.align()).max().unwrap_or(1),
            Self::Union(u) => u.arms().iter().map(|a| a.ty.align()).max().unwrap_or(1),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::{RecordType, ScalarKind, UnionType};

    #[test]
    fn test_align_to() {
        assert_eq!(align_to(0, 4), 0);
        assert_eq!(align_to(1, 4), 4);
        assert_eq!(align_to(8, 8), 8);
        assert_eq!(align_to(9, 2), 10);
    }

    #[test]
    fn test_record_padding() {
        // struct { u8 a; u32 b; u16 c; } => 1 + 3 pad + 4 + 2 + 2 pad
        let ty: NativeType = RecordType::builder("padded")
            .field("a", ScalarKind::U8)
            .field("b", ScalarKind::U32)
            .field("c", ScalarKind::U16)
            .build()
            .unwrap()
            .into();
        assert_eq!(ty.size(), 12);
        assert_eq!(ty.align(), 4);
    }

    #[test]
    fn test_union_size_is_largest_arm() {
        let ty: NativeType = UnionType::builder("u")
            .arm("byte", ScalarKind::U8)
            .arm("bytes", NativeType::array_of(ScalarKind::U8.into(), 68))
            .arm("wide", ScalarKind::U32)
            .build()
            .unwrap()
            .into();
        assert_eq!(ty.align(), 4);
        assert_eq!(ty.size(), 68);
    }

    #[test]
    fn test_array_and_pointer_sizes() {
        assert_eq!(NativeType::array_of(ScalarKind::U16.into(), 5).size(), 10);
        assert_eq!(NativeType::pointer_to(ScalarKind::U8.into()).size(), POINTER_SIZE);
        assert_eq!(NativeType::Void.size(), 0);
    }
}
