// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Marshal descriptor-shaped values into native memory.
//!
//! `native_size` and `marshal_native` run the same `write_native` pass, once
//! against an [`ArenaSizer`] and once against a [`NativeArena`] of exactly the
//! predicted size.

use super::arena::{array_size, ArenaSizer, NativeArena, NativePtr, NativeSequence, NativeSink};
use super::layout::{NativeField, NativeLayout, NativeShape, NativeUnion};
use super::pinned::PinnedBuffer;
use super::typed::NativeType;
use crate::dynamic::{DynamicValue, PrimitiveKind};
use crate::error::{CdrError, Result};
use std::collections::HashMap;

/// Bytes `marshal_native` will need for `value`, head included.
pub fn native_size<T: NativeType>(value: &T, layout: &NativeLayout) -> Result<usize> {
    let mut sizer = ArenaSizer::new(layout.size);
    value.write_native(&mut sizer, 0, layout)?;
    Ok(sizer.used())
}

/// Marshal `value` into a freshly sized pinned buffer.
///
/// Works for descriptor-driven [`DynamicValue`]s and for any derived type.
pub fn marshal_native<T: NativeType>(value: &T, layout: &NativeLayout) -> Result<PinnedBuffer> {
    let predicted = native_size(value, layout)?;
    let mut pinned = PinnedBuffer::new(predicted);
    let mut arena = NativeArena::new(pinned.as_mut_slice(), layout.size)?;
    value.write_native(&mut arena, 0, layout)?;
    let written = arena.used();
    if written != predicted {
        log::error!(
            "[cdr] native marshal of {}: predicted {} bytes, used {}",
            layout.descriptor.name,
            predicted,
            written
        );
        return Err(CdrError::SizeMismatch { predicted, written });
    }
    log::trace!(
        "[cdr] marshalled {} into {} native bytes",
        layout.descriptor.name,
        written
    );
    Ok(pinned)
}

fn mismatch(layout: &NativeLayout, value: &DynamicValue) -> CdrError {
    CdrError::invalid_value(format!(
        "{} cannot hold a {} value",
        layout.descriptor.name,
        value.kind_name()
    ))
}

/// Write `value` at offset `at` (already allocated) of `sink`.
pub fn write_native<N: NativeSink>(
    sink: &mut N,
    at: usize,
    value: &DynamicValue,
    layout: &NativeLayout,
) -> Result<()> {
    match (&layout.shape, value) {
        (NativeShape::Primitive(kind), _) => write_primitive(sink, at, *kind, value)
            .ok_or_else(|| mismatch(layout, value))?,
        (NativeShape::Enum, DynamicValue::Enum(v, _)) => sink.write_scalar(at, narrow::<i32>(*v)?),
        (NativeShape::String, DynamicValue::String(s)) => {
            let ptr = sink.create_string(Some(s))?;
            sink.write_ptr(at, ptr)
        }
        (NativeShape::BoundedString { bound }, DynamicValue::String(s)) => {
            write_bounded_str(sink, at, s, *bound)
        }
        (NativeShape::Struct(fields), DynamicValue::Struct(values)) => {
            write_struct(sink, at, fields, values)
        }
        (NativeShape::Union(u), DynamicValue::Union(disc, _, inner)) => {
            write_union(sink, at, u, *disc, inner)
        }
        (NativeShape::Sequence { element, bound }, DynamicValue::Sequence(items)) => {
            write_sequence_with(sink, at, items.len(), element, *bound, |sink, slot, i| {
                write_native(sink, slot, &items[i], element)
            })
        }
        (NativeShape::Array { element, length }, DynamicValue::Array(items)) => {
            check_array_len(items.len(), *length)?;
            write_elements(sink, at, items, element)
        }
        _ => Err(mismatch(layout, value)),
    }
}

/// Copy `s` into an inline `char[bound + 1]`.
pub(super) fn write_bounded_str<N: NativeSink>(
    sink: &mut N,
    at: usize,
    s: &str,
    bound: usize,
) -> Result<()> {
    if s.len() > bound {
        return Err(CdrError::invalid_value(format!(
            "string of {} bytes exceeds bound {}",
            s.len(),
            bound
        )));
    }
    // Terminator and tail are already zero.
    sink.write_at(at, s.as_bytes())
}

pub(super) fn check_array_len(len: usize, length: usize) -> Result<()> {
    if len != length {
        return Err(CdrError::invalid_value(format!(
            "{} elements, expected {}",
            len, length
        )));
    }
    Ok(())
}

/// Allocate the element buffer of a `len`-element sequence, fill it slot by
/// slot with `write_item(sink, slot, index)` and write the header at `at`.
pub(super) fn write_sequence_with<N, F>(
    sink: &mut N,
    at: usize,
    len: usize,
    element: &NativeLayout,
    bound: Option<usize>,
    mut write_item: F,
) -> Result<()>
where
    N: NativeSink,
    F: FnMut(&mut N, usize, usize) -> Result<()>,
{
    if let Some(max) = bound {
        if len > max {
            return Err(CdrError::invalid_value(format!(
                "{} elements exceed bound {}",
                len, max
            )));
        }
    }
    let header = if len == 0 {
        NativeSequence::EMPTY
    } else {
        let length = u32::try_from(len)
            .map_err(|_| CdrError::invalid_value("sequence longer than u32::MAX"))?;
        let region = sink.allocate(array_size(element.size, len)?, element.align)?;
        for i in 0..len {
            write_item(sink, region + i * element.size, i)?;
        }
        NativeSequence {
            maximum: length,
            length,
            buffer: sink.ptr_at(region),
            release: false,
        }
    };
    sink.write_sequence(at, &header)
}

fn write_elements<N: NativeSink>(
    sink: &mut N,
    at: usize,
    items: &[DynamicValue],
    element: &NativeLayout,
) -> Result<()> {
    items
        .iter()
        .enumerate()
        .try_for_each(|(i, item)| write_native(sink, at + i * element.size, item, element))
}

fn write_struct<N: NativeSink>(
    sink: &mut N,
    at: usize,
    fields: &[NativeField],
    values: &HashMap<String, DynamicValue>,
) -> Result<()> {
    for field in fields {
        let value = values.get(&field.name);
        if field.optional {
            let ptr = match value.filter(|v| !v.is_null()) {
                Some(v) => {
                    let region = sink.allocate(field.layout.size, field.layout.align)?;
                    write_native(sink, region, v, &field.layout)?;
                    sink.ptr_at(region)
                }
                None => NativePtr::NULL,
            };
            sink.write_ptr(at + field.offset, ptr)?;
        } else {
            let value = value.ok_or_else(|| {
                CdrError::invalid_value(format!("missing member {}", field.name))
            })?;
            write_native(sink, at + field.offset, value, &field.layout)?;
        }
    }
    Ok(())
}

fn write_union<N: NativeSink>(
    sink: &mut N,
    at: usize,
    union: &NativeUnion,
    disc: i64,
    inner: &DynamicValue,
) -> Result<()> {
    match &union.discriminator.shape {
        NativeShape::Enum => sink.write_scalar(at, narrow::<i32>(disc)?)?,
        NativeShape::Primitive(kind) => write_discriminator(sink, at, *kind, disc)?,
        _ => {
            return Err(CdrError::InvalidDescriptor(format!(
                "{} cannot discriminate a union",
                union.discriminator.descriptor.name
            )))
        }
    }
    match union.case_for(disc) {
        Some(case) => write_native(sink, at + union.payload_offset, inner, &case.layout),
        None if inner.is_null() => Ok(()),
        None => Err(CdrError::UnknownDiscriminant(disc)),
    }
}

fn narrow<T: TryFrom<i64>>(value: i64) -> Result<T> {
    T::try_from(value).map_err(|_| CdrError::invalid_value(format!("{} out of range", value)))
}

fn write_discriminator<N: NativeSink>(
    sink: &mut N,
    at: usize,
    kind: PrimitiveKind,
    disc: i64,
) -> Result<()> {
    match kind {
        PrimitiveKind::Bool => match disc {
            0 | 1 => sink.write_scalar(at, disc == 1),
            _ => Err(CdrError::invalid_value(format!("boolean discriminator {}", disc))),
        },
        PrimitiveKind::U8 => sink.write_scalar(at, narrow::<u8>(disc)?),
        PrimitiveKind::I8 => sink.write_scalar(at, narrow::<i8>(disc)?),
        PrimitiveKind::U16 => sink.write_scalar(at, narrow::<u16>(disc)?),
        PrimitiveKind::I16 => sink.write_scalar(at, narrow::<i16>(disc)?),
        PrimitiveKind::U32 => sink.write_scalar(at, narrow::<u32>(disc)?),
        PrimitiveKind::I32 => sink.write_scalar(at, narrow::<i32>(disc)?),
        PrimitiveKind::U64 => sink.write_scalar(at, narrow::<u64>(disc)?),
        PrimitiveKind::I64 => sink.write_scalar(at, disc),
        PrimitiveKind::F32 | PrimitiveKind::F64 => Err(CdrError::InvalidDescriptor(
            "floating-point union discriminator".into(),
        )),
    }
}

fn write_primitive<N: NativeSink>(
    sink: &mut N,
    at: usize,
    kind: PrimitiveKind,
    value: &DynamicValue,
) -> Option<Result<()>> {
    let result = match (kind, value) {
        (PrimitiveKind::Bool, DynamicValue::Bool(v)) => sink.write_scalar(at, *v),
        (PrimitiveKind::U8, DynamicValue::U8(v)) => sink.write_scalar(at, *v),
        (PrimitiveKind::I8, DynamicValue::I8(v)) => sink.write_scalar(at, *v),
        (PrimitiveKind::U16, DynamicValue::U16(v)) => sink.write_scalar(at, *v),
        (PrimitiveKind::I16, DynamicValue::I16(v)) => sink.write_scalar(at, *v),
        (PrimitiveKind::U32, DynamicValue::U32(v)) => sink.write_scalar(at, *v),
        (PrimitiveKind::I32, DynamicValue::I32(v)) => sink.write_scalar(at, *v),
        (PrimitiveKind::U64, DynamicValue::U64(v)) => sink.write_scalar(at, *v),
        (PrimitiveKind::I64, DynamicValue::I64(v)) => sink.write_scalar(at, *v),
        (PrimitiveKind::F32, DynamicValue::F32(v)) => sink.write_scalar(at, *v),
        (PrimitiveKind::F64, DynamicValue::F64(v)) => sink.write_scalar(at, *v),
        _ => return None,
    };
    Some(result)
}
