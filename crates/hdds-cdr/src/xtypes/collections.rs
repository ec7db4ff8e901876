// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Sequences and arrays.
//!
//! Sequence: `u32` count followed by the elements. Array: elements only.
//! Under XCDR2 a collection whose elements are not primitives (or enums) is
//! prefixed by a DHEADER holding the byte length of everything after it.

use super::traits::{CdrDecode, CdrEncode};
use crate::cdr::{CdrReader, CdrSink};
use crate::encoding::EncodingMode;
use crate::error::{CdrError, Result};

/// Write a collection: optional DHEADER, optional count, then `body`.
///
/// `count` is `Some` for sequences and `None` for arrays.
pub fn encode_collection<S, F>(
    sink: &mut S,
    primitive_elements: bool,
    count: Option<usize>,
    body: F,
) -> Result<()>
where
    S: CdrSink,
    F: FnOnce(&mut S) -> Result<()>,
{
    let slot = if sink.mode() == EncodingMode::Xcdr2 && !primitive_elements {
        Some(sink.reserve_u32()?)
    } else {
        None
    };
    let body_start = sink.position();
    if let Some(count) = count {
        let count = u32::try_from(count)
            .map_err(|_| CdrError::invalid_value("sequence longer than u32::MAX"))?;
        sink.write_u32(count)?;
    }
    body(sink)?;
    if let Some(slot) = slot {
        let len = u32::try_from(sink.position() - body_start)
            .map_err(|_| CdrError::invalid_value("collection body longer than u32::MAX"))?;
        sink.patch_u32(slot, len)?;
    }
    Ok(())
}

/// Shape of a collection being decoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionShape {
    /// Count read from the wire, optionally bounded.
    Sequence { bound: Option<usize> },
    /// Fixed number of elements.
    Array { length: usize },
}

/// Read a collection header and hand the element count to `body`.
///
/// `primitive_width` is the element wire width when elements are primitive;
/// it both disables the XCDR2 DHEADER and lets the count be checked against
/// the remaining bytes.
pub fn decode_collection<'a, R, F>(
    reader: &mut CdrReader<'a>,
    primitive_width: Option<usize>,
    shape: CollectionShape,
    body: F,
) -> Result<R>
where
    F: FnOnce(&mut CdrReader<'a>, usize) -> Result<R>,
{
    let delimited = reader.mode() == EncodingMode::Xcdr2 && primitive_width.is_none();
    let frame = if delimited {
        let len = reader.read_u32()? as usize;
        let end = reader.position().saturating_add(len);
        Some((end, reader.push_limit(end)?))
    } else {
        None
    };

    let count = match shape {
        CollectionShape::Sequence { bound } => {
            let count = reader.read_u32()? as usize;
            if let Some(bound) = bound {
                if count > bound {
                    return Err(CdrError::MalformedLength {
                        what: "bounded sequence",
                        offset: reader.position(),
                        declared: count,
                        remaining: bound,
                    });
                }
            }
            reader.check_count("sequence", count, primitive_width.unwrap_or(0))?
        }
        CollectionShape::Array { length } => length,
    };

    let result = body(reader, count)?;

    if let Some((end, previous)) = frame {
        reader.seek(end)?;
        reader.pop_limit(previous);
    }
    Ok(result)
}

pub fn encode_sequence<S: CdrSink, T: CdrEncode>(sink: &mut S, items: &[T]) -> Result<()> {
    encode_collection(sink, T::PRIMITIVE_WIDTH.is_some(), Some(items.len()), |sink| {
        items.iter().try_for_each(|item| item.encode(sink))
    })
}

pub fn encode_array<S: CdrSink, T: CdrEncode>(sink: &mut S, items: &[T]) -> Result<()> {
    encode_collection(sink, T::PRIMITIVE_WIDTH.is_some(), None, |sink| {
        items.iter().try_for_each(|item| item.encode(sink))
    })
}

pub fn decode_sequence<T: CdrDecode + CdrEncode>(reader: &mut CdrReader<'_>) -> Result<Vec<T>> {
    decode_items(reader, CollectionShape::Sequence { bound: None })
}

pub fn decode_array<T: CdrDecode + CdrEncode>(
    reader: &mut CdrReader<'_>,
    length: usize,
) -> Result<Vec<T>> {
    decode_items(reader, CollectionShape::Array { length })
}

fn decode_items<T: CdrDecode + CdrEncode>(
    reader: &mut CdrReader<'_>,
    shape: CollectionShape,
) -> Result<Vec<T>> {
    decode_collection(reader, T::PRIMITIVE_WIDTH, shape, |reader, count| {
        let mut items = Vec::with_capacity(count.min(reader.remaining()));
        for _ in 0..count {
            items.push(T::decode(reader)?);
        }
        Ok(items)
    })
}
