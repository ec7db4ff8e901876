// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bump allocator over a caller-supplied buffer.
//!
//! # Buffer Layout
//!
//! ```text
//! 0            head_size                       tail               len
//! |  head      |  strings, sequence buffers,   |  free            |
//! |  (zeroed)  |  optional members (zeroed)    |                  |
//! ```
//!
//! The head holds the fixed-size part of the top-level value; every
//! variable-size part is allocated behind it by advancing a single tail
//! cursor. Nothing is ever freed or grown: presize with [`ArenaSizer`].
//!
//! Pointers written into the buffer are real addresses (`base + offset`), so
//! the buffer must not move while a consumer reads it. [`PinnedBuffer`]
//! provides such storage.
//!
//! [`PinnedBuffer`]: super::PinnedBuffer

use super::layout::{
    align_up, MAX_NATIVE_ALIGN, SEQ_BUFFER_OFFSET, SEQ_LENGTH_OFFSET, SEQ_MAXIMUM_OFFSET,
    SEQ_RELEASE_OFFSET,
};
use crate::dynamic::PrimitiveKind;
use crate::error::{CdrError, Result};

/// Address of a native allocation; `NULL` is zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct NativePtr(pub usize);

impl NativePtr {
    pub const NULL: Self = Self(0);

    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// Native sequence header (`dds_sequence_t`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NativeSequence {
    pub maximum: u32,
    pub length: u32,
    pub buffer: NativePtr,
    pub release: bool,
}

impl NativeSequence {
    pub const EMPTY: Self = Self {
        maximum: 0,
        length: 0,
        buffer: NativePtr::NULL,
        release: false,
    };
}

/// Plain values that can be copied into native memory in host byte order.
pub trait NativeScalar: Copy {
    const KIND: PrimitiveKind;
    const SIZE: usize = Self::KIND.size();
    const ALIGN: usize;

    fn with_ne_bytes<R>(self, f: impl FnOnce(&[u8]) -> R) -> R;

    /// `None` when `bytes` is shorter than `SIZE`.
    fn from_ne_slice(bytes: &[u8]) -> Option<Self>;
}

macro_rules! impl_native_scalar {
    ($ty:ty, $kind:ident) => {
        impl NativeScalar for $ty {
            const KIND: PrimitiveKind = PrimitiveKind::$kind;
            const ALIGN: usize = std::mem::align_of::<$ty>();

            #[inline]
            fn with_ne_bytes<R>(self, f: impl FnOnce(&[u8]) -> R) -> R {
                f(&self.to_ne_bytes())
            }

            #[inline]
            fn from_ne_slice(bytes: &[u8]) -> Option<Self> {
                let raw = bytes.get(..std::mem::size_of::<$ty>())?;
                raw.try_into().ok().map(<$ty>::from_ne_bytes)
            }
        }
    };
}

impl_native_scalar!(u8, U8);
impl_native_scalar!(i8, I8);
impl_native_scalar!(u16, U16);
impl_native_scalar!(i16, I16);
impl_native_scalar!(u32, U32);
impl_native_scalar!(i32, I32);
impl_native_scalar!(u64, U64);
impl_native_scalar!(i64, I64);
impl_native_scalar!(f32, F32);
impl_native_scalar!(f64, F64);

impl NativeScalar for bool {
    const KIND: PrimitiveKind = PrimitiveKind::Bool;
    const ALIGN: usize = 1;

    fn with_ne_bytes<R>(self, f: impl FnOnce(&[u8]) -> R) -> R {
        f(&[u8::from(self)])
    }

    fn from_ne_slice(bytes: &[u8]) -> Option<Self> {
        bytes.first().map(|b| *b != 0)
    }
}

/// Destination of native marshalling: the real arena or a sizer.
///
/// Both implementations advance the same tail for the same calls, which is
/// what makes [`ArenaSizer`] an exact presizing pass.
pub trait NativeSink {
    /// Reserve `size` zeroed bytes aligned to `align`; returns their offset.
    fn allocate(&mut self, size: usize, align: usize) -> Result<usize>;

    /// Copy `bytes` into an already allocated region.
    fn write_at(&mut self, offset: usize, bytes: &[u8]) -> Result<()>;

    fn ptr_at(&self, offset: usize) -> NativePtr;

    /// Bytes consumed so far, head included.
    fn used(&self) -> usize;

    fn write_scalar<T: NativeScalar>(&mut self, offset: usize, value: T) -> Result<()> {
        value.with_ne_bytes(|bytes| self.write_at(offset, bytes))
    }

    fn write_ptr(&mut self, offset: usize, ptr: NativePtr) -> Result<()> {
        self.write_at(offset, &ptr.0.to_ne_bytes())
    }

    fn write_sequence(&mut self, offset: usize, seq: &NativeSequence) -> Result<()> {
        self.write_scalar(offset + SEQ_MAXIMUM_OFFSET, seq.maximum)?;
        self.write_scalar(offset + SEQ_LENGTH_OFFSET, seq.length)?;
        self.write_ptr(offset + SEQ_BUFFER_OFFSET, seq.buffer)?;
        self.write_scalar(offset + SEQ_RELEASE_OFFSET, seq.release)
    }

    /// Copy a string plus NUL; `None` yields a null pointer.
    fn create_string(&mut self, value: Option<&str>) -> Result<NativePtr> {
        let Some(value) = value else {
            return Ok(NativePtr::NULL);
        };
        let offset = self.allocate(value.len() + 1, 1)?;
        self.write_at(offset, value.as_bytes())?;
        Ok(self.ptr_at(offset))
    }

    /// Copy scalar elements into a fresh buffer and describe it.
    fn create_sequence<T: NativeScalar>(&mut self, items: &[T]) -> Result<NativeSequence> {
        if items.is_empty() {
            return Ok(NativeSequence::EMPTY);
        }
        let length = u32::try_from(items.len())
            .map_err(|_| CdrError::invalid_value("sequence longer than u32::MAX"))?;
        let offset = self.allocate(array_size(T::SIZE, items.len())?, T::ALIGN)?;
        for (i, item) in items.iter().enumerate() {
            self.write_scalar(offset + i * T::SIZE, *item)?;
        }
        Ok(NativeSequence {
            maximum: length,
            length,
            buffer: self.ptr_at(offset),
            release: false,
        })
    }

    /// Zero-filled room for `count` elements of `T`.
    fn allocate_array<T: NativeScalar>(&mut self, count: usize) -> Result<NativePtr> {
        let offset = self.allocate(array_size(T::SIZE, count)?, T::ALIGN)?;
        Ok(self.ptr_at(offset))
    }
}

pub(crate) fn array_size(element_size: usize, count: usize) -> Result<usize> {
    element_size
        .checked_mul(count)
        .ok_or(CdrError::ArenaOverflow {
            requested: usize::MAX,
            remaining: 0,
        })
}

/// Tail step for an allocation: padding plus size, checked.
fn reserve(tail: usize, size: usize, align: usize, capacity: usize) -> Result<(usize, usize)> {
    let start = align_up(tail, align.max(1));
    let end = start.checked_add(size).filter(|end| *end <= capacity);
    match end {
        Some(end) => Ok((start, end)),
        None => Err(CdrError::ArenaOverflow {
            requested: size,
            remaining: capacity.saturating_sub(tail),
        }),
    }
}

/// Bump allocator writing into a borrowed buffer.
#[derive(Debug)]
pub struct NativeArena<'a> {
    buf: &'a mut [u8],
    base: usize,
    tail: usize,
}

impl<'a> NativeArena<'a> {
    /// Take over `buffer`, zeroing its first `head_size` bytes.
    ///
    /// # Errors
    ///
    /// `InvalidState` unless the buffer starts at a `MAX_NATIVE_ALIGN`
    /// boundary: offsets and addresses must share alignment for the head and
    /// every allocation to be aligned in memory. Use [`within`](Self::within)
    /// for an arbitrary buffer. `ArenaOverflow` when `head_size` exceeds it.
    pub fn new(buffer: &'a mut [u8], head_size: usize) -> Result<Self> {
        if head_size > buffer.len() {
            return Err(CdrError::ArenaOverflow {
                requested: head_size,
                remaining: buffer.len(),
            });
        }
        let base = buffer.as_ptr() as usize;
        if base % MAX_NATIVE_ALIGN != 0 {
            return Err(CdrError::invalid_state(format!(
                "arena buffer at {:#x} is not {}-byte aligned",
                base, MAX_NATIVE_ALIGN
            )));
        }
        buffer[..head_size].fill(0);
        Ok(Self {
            buf: buffer,
            base,
            tail: head_size,
        })
    }

    /// Take over the aligned part of an arbitrary `buffer`: leading bytes up
    /// to the first `MAX_NATIVE_ALIGN` boundary are skipped. The head starts
    /// at [`base_address`](Self::base_address). Needs up to
    /// `MAX_NATIVE_ALIGN - 1` bytes more than the presized footprint.
    pub fn within(buffer: &'a mut [u8], head_size: usize) -> Result<Self> {
        let lead = align_up(buffer.as_ptr() as usize, MAX_NATIVE_ALIGN)
            - buffer.as_ptr() as usize;
        if lead > buffer.len() {
            return Err(CdrError::ArenaOverflow {
                requested: head_size.saturating_add(lead),
                remaining: buffer.len(),
            });
        }
        Self::new(&mut buffer[lead..], head_size)
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.tail
    }

    pub fn base_address(&self) -> usize {
        self.base
    }

    /// Bytes written so far.
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.tail]
    }
}

impl NativeSink for NativeArena<'_> {
    fn allocate(&mut self, size: usize, align: usize) -> Result<usize> {
        let (start, end) = reserve(self.tail, size, align, self.buf.len())?;
        self.buf[self.tail..end].fill(0);
        self.tail = end;
        Ok(start)
    }

    fn write_at(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        let end = offset
            .checked_add(bytes.len())
            .filter(|end| *end <= self.tail)
            .ok_or_else(|| {
                CdrError::invalid_state(format!(
                    "write of {} bytes at {} outside allocated arena ({} bytes)",
                    bytes.len(),
                    offset,
                    self.tail
                ))
            })?;
        self.buf[offset..end].copy_from_slice(bytes);
        Ok(())
    }

    fn ptr_at(&self, offset: usize) -> NativePtr {
        NativePtr(self.base + offset)
    }

    fn used(&self) -> usize {
        self.tail
    }
}

/// Counts what a [`NativeArena`] would consume, without a buffer.
#[derive(Debug, Clone, Default)]
pub struct ArenaSizer {
    tail: usize,
}

impl ArenaSizer {
    pub fn new(head_size: usize) -> Self {
        Self { tail: head_size }
    }
}

impl NativeSink for ArenaSizer {
    fn allocate(&mut self, size: usize, align: usize) -> Result<usize> {
        let (start, end) = reserve(self.tail, size, align, usize::MAX)?;
        self.tail = end;
        Ok(start)
    }

    fn write_at(&mut self, offset: usize, bytes: &[u8]) -> Result<()> {
        match offset.checked_add(bytes.len()) {
            Some(end) if end <= self.tail => Ok(()),
            _ => Err(CdrError::invalid_state(format!(
                "write of {} bytes at {} outside allocated arena ({} bytes)",
                bytes.len(),
                offset,
                self.tail
            ))),
        }
    }

    /// Placeholder address; only nullness matters while sizing.
    fn ptr_at(&self, offset: usize) -> NativePtr {
        NativePtr(MAX_NATIVE_ALIGN + offset)
    }

    fn used(&self) -> usize {
        self.tail
    }
}
