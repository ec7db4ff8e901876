// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Zero-copy views over native buffers.
//!
//! A view is a borrowed slice plus a [`NativeLayout`]: primitive accessors read
//! straight from the precomputed offset, strings and sequences are returned as
//! sub-slices, and embedded pointers are translated back into offsets of the
//! same slice. Nothing is copied unless `string()` or `to_owned()` is called.
//!
//! Views borrow the source buffer, so they cannot outlive it:
//!
//! ```rust
//! use hdds_cdr::dynamic::{DynamicValue, PrimitiveKind, TypeDescriptorBuilder};
//! use hdds_cdr::native::{marshal_native, NativeLayout};
//! use hdds_cdr::view::StructView;
//! use std::sync::Arc;
//!
//! let desc = Arc::new(TypeDescriptorBuilder::new("Reading")
//!     .field("id", PrimitiveKind::U32)
//!     .string_field("label")
//!     .build());
//! let layout = NativeLayout::of(&desc).unwrap();
//!
//! let mut value = DynamicValue::default_for(&desc);
//! value.set_field("id", DynamicValue::U32(7));
//! value.set_field("label", "gauge".into());
//! let native = marshal_native(&value, &layout).unwrap();
//!
//! let view = StructView::new(native.as_slice(), &layout).unwrap();
//! assert_eq!(view.get::<u32>("id").unwrap(), 7);
//! assert_eq!(view.str_bytes("label").unwrap(), b"gauge");
//! ```
//!
//! [`NativeLayout`]: crate::native::NativeLayout

mod sequence_view;
mod struct_view;
mod union_view;
mod value_view;

pub use sequence_view::SequenceView;
pub use struct_view::StructView;
pub use union_view::UnionView;
pub use value_view::ValueView;

use crate::error::{CdrError, Result};
use crate::native::layout::PTR_SIZE;
use crate::native::{NativePtr, NativeScalar};

/// Read a host-order scalar at `offset`.
pub(crate) fn scalar_at<T: NativeScalar>(buf: &[u8], offset: usize) -> Result<T> {
    buf.get(offset..)
        .and_then(T::from_ne_slice)
        .ok_or(CdrError::BufferUnderrun {
            offset,
            needed: T::SIZE,
            available: buf.len().saturating_sub(offset),
        })
}

pub(crate) fn ptr_at(buf: &[u8], offset: usize) -> Result<NativePtr> {
    let raw = offset
        .checked_add(PTR_SIZE)
        .and_then(|end| buf.get(offset..end))
        .and_then(|bytes| <[u8; PTR_SIZE]>::try_from(bytes).ok())
        .ok_or(CdrError::BufferUnderrun {
            offset,
            needed: PTR_SIZE,
            available: buf.len().saturating_sub(offset),
        })?;
    Ok(NativePtr(usize::from_ne_bytes(raw)))
}

/// Translate an embedded pointer into an offset of `buf`, requiring `len`
/// bytes behind it.
pub(crate) fn resolve(buf: &[u8], ptr: NativePtr, len: usize) -> Result<usize> {
    let base = buf.as_ptr() as usize;
    ptr.0
        .checked_sub(base)
        .filter(|offset| {
            offset
                .checked_add(len)
                .is_some_and(|end| end <= buf.len())
        })
        .ok_or_else(|| {
            CdrError::invalid_state(format!(
                "pointer {:#x} ({} bytes) outside view buffer {:#x}+{}",
                ptr.0,
                len,
                base,
                buf.len()
            ))
        })
}

/// Bytes from `offset` up to the first NUL, searching at most `limit` bytes.
pub(crate) fn c_str(buf: &[u8], offset: usize, limit: Option<usize>) -> Result<&[u8]> {
    let end = match limit {
        Some(limit) => offset.saturating_add(limit).min(buf.len()),
        None => buf.len(),
    };
    let region = buf.get(offset..end).unwrap_or_default();
    region
        .iter()
        .position(|b| *b == 0)
        .map(|nul| &region[..nul])
        .ok_or_else(|| CdrError::invalid_state(format!("unterminated string at offset {}", offset)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_bounds() {
        let buf = [0u8; 16];
        let base = buf.as_ptr() as usize;
        assert_eq!(resolve(&buf, NativePtr(base + 4), 12).unwrap(), 4);
        assert!(matches!(
            resolve(&buf, NativePtr(base + 4), 13),
            Err(CdrError::InvalidState(_))
        ));
        assert!(resolve(&buf, NativePtr(base.wrapping_sub(1)), 1).is_err());
        assert!(resolve(&buf, NativePtr::NULL, 0).is_err());
    }

    #[test]
    fn test_c_str_scan() {
        let buf = *b"ab\0cd";
        assert_eq!(c_str(&buf, 0, None).unwrap(), b"ab");
        assert_eq!(c_str(&buf, 2, None).unwrap(), b"");
        assert!(c_str(&buf, 3, None).is_err());
        assert!(c_str(&buf, 0, Some(2)).is_err());
    }

    #[test]
    fn test_scalar_underrun() {
        let buf = [1u8, 0, 0];
        assert!(matches!(
            scalar_at::<u32>(&buf, 0),
            Err(CdrError::BufferUnderrun { needed: 4, .. })
        ));
        assert_eq!(scalar_at::<u16>(&buf, 0).unwrap(), u16::from_ne_bytes([1, 0]));
    }
}
