// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::{c_str, ptr_at, resolve, scalar_at, SequenceView, StructView, UnionView};
use crate::dynamic::{DynamicValue, PrimitiveKind, TypeKind};
use crate::error::{CdrError, Result};
use crate::native::{NativeLayout, NativeScalar, NativeShape};

/// View of a single value of any shape.
#[derive(Debug, Clone, Copy)]
pub struct ValueView<'a> {
    buf: &'a [u8],
    offset: usize,
    layout: &'a NativeLayout,
}

impl<'a> ValueView<'a> {
    pub(crate) fn at(buf: &'a [u8], offset: usize, layout: &'a NativeLayout) -> Self {
        Self {
            buf,
            offset,
            layout,
        }
    }

    pub fn layout(&self) -> &'a NativeLayout {
        self.layout
    }

    /// Offset of the value inside the viewed buffer.
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Primitive (or enum, as `i32`) read in place.
    pub fn scalar<T: NativeScalar>(&self) -> Result<T> {
        let matches = match &self.layout.shape {
            NativeShape::Primitive(kind) => *kind == T::KIND,
            NativeShape::Enum => T::KIND == PrimitiveKind::I32,
            _ => false,
        };
        if !matches {
            return Err(CdrError::invalid_state(format!(
                "{} is not readable as {}",
                self.layout.descriptor.name,
                T::KIND.idl_name()
            )));
        }
        scalar_at(self.buf, self.offset)
    }

    /// String bytes without the terminator. A null `char *` reads as empty.
    pub fn str_bytes(&self) -> Result<&'a [u8]> {
        self.str_span().map(|(_, bytes)| bytes)
    }

    /// String checked as UTF-8, borrowed from the buffer.
    pub fn str(&self) -> Result<&'a str> {
        let (start, bytes) = self.str_span()?;
        std::str::from_utf8(bytes).map_err(|e| CdrError::InvalidUtf8 {
            offset: start + e.valid_up_to(),
        })
    }

    pub fn string(&self) -> Result<String> {
        self.str().map(str::to_owned)
    }

    fn str_span(&self) -> Result<(usize, &'a [u8])> {
        match &self.layout.shape {
            NativeShape::String => {
                let ptr = ptr_at(self.buf, self.offset)?;
                if ptr.is_null() {
                    return Ok((self.offset, &[][..]));
                }
                let start = resolve(self.buf, ptr, 1)?;
                Ok((start, c_str(self.buf, start, None)?))
            }
            NativeShape::BoundedString { bound } => Ok((
                self.offset,
                c_str(self.buf, self.offset, Some(bound + 1))?,
            )),
            _ => Err(self.wrong_shape("a string")),
        }
    }

    pub fn as_struct(&self) -> Result<StructView<'a>> {
        match &self.layout.shape {
            NativeShape::Struct(_) => Ok(StructView::at(self.buf, self.offset, self.layout)),
            _ => Err(self.wrong_shape("a struct")),
        }
    }

    pub fn as_union(&self) -> Result<UnionView<'a>> {
        match &self.layout.shape {
            NativeShape::Union(u) => Ok(UnionView::at(self.buf, self.offset, self.layout, u)),
            _ => Err(self.wrong_shape("a union")),
        }
    }

    /// Span over a sequence buffer or an inline array.
    pub fn as_sequence(&self) -> Result<SequenceView<'a>> {
        match &self.layout.shape {
            NativeShape::Sequence { element, .. } => {
                SequenceView::from_header(self.buf, self.offset, element)
            }
            NativeShape::Array { element, length } => {
                SequenceView::inline(self.buf, self.offset, element, *length)
            }
            _ => Err(self.wrong_shape("a sequence or array")),
        }
    }

    /// Deep copy into an owned value.
    pub fn to_owned(&self) -> Result<DynamicValue> {
        match &self.layout.shape {
            NativeShape::Primitive(kind) => self.primitive(*kind),
            NativeShape::Enum => {
                let value = i64::from(scalar_at::<i32>(self.buf, self.offset)?);
                let name = match &self.layout.descriptor.kind {
                    TypeKind::Enum(e) => e.variant_by_value(value).map(|v| v.name.clone()),
                    _ => None,
                };
                Ok(DynamicValue::Enum(value, name.unwrap_or_default()))
            }
            NativeShape::String | NativeShape::BoundedString { .. } => {
                self.string().map(DynamicValue::String)
            }
            NativeShape::Struct(_) => self.as_struct()?.to_value(),
            NativeShape::Union(_) => self.as_union()?.to_value(),
            NativeShape::Sequence { .. } => {
                self.as_sequence()?.to_owned().map(DynamicValue::Sequence)
            }
            NativeShape::Array { .. } => self.as_sequence()?.to_owned().map(DynamicValue::Array),
        }
    }

    fn primitive(&self, kind: PrimitiveKind) -> Result<DynamicValue> {
        let (buf, at) = (self.buf, self.offset);
        Ok(match kind {
            PrimitiveKind::Bool => DynamicValue::Bool(scalar_at(buf, at)?),
            PrimitiveKind::U8 => DynamicValue::U8(scalar_at(buf, at)?),
            PrimitiveKind::I8 => DynamicValue::I8(scalar_at(buf, at)?),
            PrimitiveKind::U16 => DynamicValue::U16(scalar_at(buf, at)?),
            PrimitiveKind::I16 => DynamicValue::I16(scalar_at(buf, at)?),
            PrimitiveKind::U32 => DynamicValue::U32(scalar_at(buf, at)?),
            PrimitiveKind::I32 => DynamicValue::I32(scalar_at(buf, at)?),
            PrimitiveKind::U64 => DynamicValue::U64(scalar_at(buf, at)?),
            PrimitiveKind::I64 => DynamicValue::I64(scalar_at(buf, at)?),
            PrimitiveKind::F32 => DynamicValue::F32(scalar_at(buf, at)?),
            PrimitiveKind::F64 => DynamicValue::F64(scalar_at(buf, at)?),
        })
    }

    fn wrong_shape(&self, expected: &str) -> CdrError {
        CdrError::invalid_state(format!(
            "{} is not {}",
            self.layout.descriptor.name, expected
        ))
    }
}
