// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::{ptr_at, resolve, scalar_at, ValueView};
use crate::dynamic::{DynamicValue, PrimitiveKind};
use crate::error::{CdrError, Result};
use crate::native::layout::{SEQ_BUFFER_OFFSET, SEQ_LENGTH_OFFSET};
use crate::native::{NativeLayout, NativeScalar, NativeShape};

/// Span over the elements of a native sequence or array.
#[derive(Debug, Clone, Copy)]
pub struct SequenceView<'a> {
    buf: &'a [u8],
    data: usize,
    len: usize,
    element: &'a NativeLayout,
}

impl<'a> SequenceView<'a> {
    /// Follow a `{maximum, length, buffer, release}` header at `offset`.
    pub(crate) fn from_header(
        buf: &'a [u8],
        offset: usize,
        element: &'a NativeLayout,
    ) -> Result<Self> {
        let len = scalar_at::<u32>(buf, offset + SEQ_LENGTH_OFFSET)? as usize;
        let data = if len == 0 {
            0
        } else {
            let ptr = ptr_at(buf, offset + SEQ_BUFFER_OFFSET)?;
            resolve(buf, ptr, span(element, len)?)?
        };
        Ok(Self {
            buf,
            data,
            len,
            element,
        })
    }

    pub(crate) fn inline(
        buf: &'a [u8],
        offset: usize,
        element: &'a NativeLayout,
        len: usize,
    ) -> Result<Self> {
        let size = span(element, len)?;
        if !offset.checked_add(size).is_some_and(|end| end <= buf.len()) {
            return Err(CdrError::BufferUnderrun {
                offset,
                needed: size,
                available: buf.len().saturating_sub(offset),
            });
        }
        Ok(Self {
            buf,
            data: offset,
            len,
            element,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn element_layout(&self) -> &'a NativeLayout {
        self.element
    }

    pub fn get(&self, index: usize) -> Result<ValueView<'a>> {
        if index >= self.len {
            return Err(CdrError::invalid_state(format!(
                "index {} out of bounds for {} elements",
                index, self.len
            )));
        }
        Ok(ValueView::at(
            self.buf,
            self.data + index * self.element.size,
            self.element,
        ))
    }

    pub fn iter(&self) -> impl Iterator<Item = ValueView<'a>> + 'a {
        let (buf, data, element) = (self.buf, self.data, self.element);
        (0..self.len).map(move |i| ValueView::at(buf, data + i * element.size, element))
    }

    /// Raw element bytes.
    pub fn bytes(&self) -> &'a [u8] {
        let end = self.data + self.len * self.element.size;
        self.buf.get(self.data..end).unwrap_or_default()
    }

    /// Elements as scalars, read in place. Fails unless the element type is `T`.
    pub fn scalars<T: NativeScalar + 'a>(&self) -> Result<impl Iterator<Item = T> + 'a> {
        let matches = match &self.element.shape {
            NativeShape::Primitive(kind) => *kind == T::KIND,
            NativeShape::Enum => T::KIND == PrimitiveKind::I32,
            _ => false,
        };
        if !matches {
            return Err(CdrError::invalid_state(format!(
                "{} elements are not {}",
                self.element.descriptor.name,
                T::KIND.idl_name()
            )));
        }
        Ok(self.bytes().chunks_exact(T::SIZE).filter_map(T::from_ne_slice))
    }

    pub fn to_owned(&self) -> Result<Vec<DynamicValue>> {
        self.iter().map(|v| v.to_owned()).collect()
    }
}

fn span(element: &NativeLayout, len: usize) -> Result<usize> {
    element
        .size
        .checked_mul(len)
        .ok_or_else(|| CdrError::invalid_state(format!("{} elements overflow", len)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::TypeDescriptor;
    use std::sync::Arc;

    #[test]
    fn test_inline_array_scalars() {
        let layout = NativeLayout::of(&Arc::new(TypeDescriptor::primitive(
            "int16",
            PrimitiveKind::I16,
        )))
        .unwrap();
        let mut buf = Vec::new();
        for v in [3i16, -4, 5] {
            buf.extend_from_slice(&v.to_ne_bytes());
        }
        let view = SequenceView::inline(&buf, 0, &layout, 3).unwrap();
        assert_eq!(view.len(), 3);
        assert_eq!(view.scalars::<i16>().unwrap().collect::<Vec<_>>(), vec![3, -4, 5]);
        assert_eq!(view.get(1).unwrap().scalar::<i16>().unwrap(), -4);
        assert!(view.get(3).is_err());
        assert!(view.scalars::<u16>().is_err());
        assert!(SequenceView::inline(&buf, 2, &layout, 3).is_err());
    }
}
