// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! CDR encoding/decoding for DynamicData.
//!
//! Descriptor-driven values go through the same [`StructEncoder`] /
//! [`StructDecoder`] and collection helpers as derived types, so both produce
//! identical bytes for identical layouts.

use crate::cdr::{CdrReader, CdrSink};
use crate::config::{CodecConfig, DiscriminantPolicy};
use crate::dynamic::{
    DynamicData, DynamicValue, PrimitiveKind, StructDescriptor, TypeDescriptor, TypeKind,
    UnionDescriptor,
};
use crate::encoding::{EncodingMode, Extensibility};
use crate::error::{CdrError, Result};
use crate::xtypes::{
    decode_collection, encode_collection, CdrEncode, CollectionShape, DescribeType,
    LengthCode, StructDecoder, StructEncoder,
};
use std::collections::HashMap;
use std::sync::Arc;

/// A value paired with its descriptor, encodable like any typed value.
#[derive(Debug, Clone, Copy)]
pub struct DynamicEncodable<'v> {
    desc: &'v TypeDescriptor,
    value: &'v DynamicValue,
}

impl<'v> DynamicEncodable<'v> {
    pub fn new(desc: &'v TypeDescriptor, value: &'v DynamicValue) -> Self {
        Self { desc, value }
    }
}

impl CdrEncode for DynamicEncodable<'_> {
    fn encode<S: CdrSink>(&self, sink: &mut S) -> Result<()> {
        encode_value(sink, self.desc, self.value)
    }

    fn primitive_width(&self) -> Option<usize> {
        self.desc.primitive_width()
    }

    fn length_code(&self) -> LengthCode {
        self.desc.length_code()
    }

    fn extensibility(&self) -> Extensibility {
        self.desc.extensibility().unwrap_or(Extensibility::Final)
    }
}

impl DynamicData {
    pub fn encodable(&self) -> DynamicEncodable<'_> {
        DynamicEncodable::new(self.descriptor(), self.value())
    }

    /// Re-read a typed value through its descriptor.
    pub fn from_typed<T: CdrEncode + DescribeType>(value: &T, mode: EncodingMode) -> Result<Self> {
        let bytes = crate::serialize(value, mode)?;
        decode_dynamic(&bytes, &T::type_descriptor(), &CodecConfig::default().mode(mode))
    }
}

/// Encode DynamicData to a CDR body (no encapsulation header).
pub fn encode_dynamic(data: &DynamicData, mode: EncodingMode) -> Result<Vec<u8>> {
    data.validate()?;
    crate::serialize(&data.encodable(), mode)
}

/// Body size `encode_dynamic` would produce.
pub fn encoded_size(data: &DynamicData, mode: EncodingMode) -> Result<usize> {
    crate::serialized_size(&data.encodable(), mode)
}

/// Decode a CDR body to DynamicData.
pub fn decode_dynamic(
    bytes: &[u8],
    descriptor: &Arc<TypeDescriptor>,
    config: &CodecConfig,
) -> Result<DynamicData> {
    let mut reader = CdrReader::with_config(bytes, config);
    let value = decode_value(&mut reader, descriptor)?;
    Ok(DynamicData::from_value(descriptor, value)?)
}

fn mismatch(desc: &TypeDescriptor, value: &DynamicValue) -> CdrError {
    CdrError::invalid_value(format!(
        "{} cannot hold a {} value",
        desc.name,
        value.kind_name()
    ))
}

/// Write `value` as described by `desc`.
pub fn encode_value<S: CdrSink>(
    sink: &mut S,
    desc: &TypeDescriptor,
    value: &DynamicValue,
) -> Result<()> {
    match (&desc.kind, value) {
        (TypeKind::Primitive(kind), _) => encode_primitive(sink, *kind, value)
            .ok_or_else(|| mismatch(desc, value))?,
        (TypeKind::String { bound }, DynamicValue::String(s)) => {
            sink.write_bounded_string(s, *bound)
        }
        (TypeKind::Enum(_), DynamicValue::Enum(v, _)) => sink.write_i32(narrow(*v, "enumerator")?),
        (TypeKind::Struct(s), DynamicValue::Struct(fields)) => encode_struct(sink, s, fields),
        (TypeKind::Union(u), DynamicValue::Union(disc, _, inner)) => {
            encode_union(sink, u, *disc, inner)
        }
        (TypeKind::Sequence(seq), DynamicValue::Sequence(items)) => {
            if let Some(max) = seq.max_length {
                if items.len() > max {
                    return Err(CdrError::invalid_value(format!(
                        "{}: {} elements exceed bound {}",
                        desc.name,
                        items.len(),
                        max
                    )));
                }
            }
            let element = &seq.element_type;
            encode_collection(
                sink,
                element.primitive_width().is_some(),
                Some(items.len()),
                |sink| {
                    items
                        .iter()
                        .try_for_each(|item| encode_value(sink, element, item))
                },
            )
        }
        (TypeKind::Array(arr), DynamicValue::Array(items)) => {
            if items.len() != arr.length {
                return Err(CdrError::invalid_value(format!(
                    "{}: {} elements, expected {}",
                    desc.name,
                    items.len(),
                    arr.length
                )));
            }
            let element = &arr.element_type;
            encode_collection(sink, element.primitive_width().is_some(), None, |sink| {
                items
                    .iter()
                    .try_for_each(|item| encode_value(sink, element, item))
            })
        }
        _ => Err(mismatch(desc, value)),
    }
}

/// `None` when the value does not match the kind.
fn encode_primitive<S: CdrSink>(
    sink: &mut S,
    kind: PrimitiveKind,
    value: &DynamicValue,
) -> Option<Result<()>> {
    let result = match (kind, value) {
        (PrimitiveKind::Bool, DynamicValue::Bool(v)) => sink.write_bool(*v),
        (PrimitiveKind::U8, DynamicValue::U8(v)) => sink.write_u8(*v),
        (PrimitiveKind::I8, DynamicValue::I8(v)) => sink.write_i8(*v),
        (PrimitiveKind::U16, DynamicValue::U16(v)) => sink.write_u16(*v),
        (PrimitiveKind::I16, DynamicValue::I16(v)) => sink.write_i16(*v),
        (PrimitiveKind::U32, DynamicValue::U32(v)) => sink.write_u32(*v),
        (PrimitiveKind::I32, DynamicValue::I32(v)) => sink.write_i32(*v),
        (PrimitiveKind::U64, DynamicValue::U64(v)) => sink.write_u64(*v),
        (PrimitiveKind::I64, DynamicValue::I64(v)) => sink.write_i64(*v),
        (PrimitiveKind::F32, DynamicValue::F32(v)) => sink.write_f32(*v),
        (PrimitiveKind::F64, DynamicValue::F64(v)) => sink.write_f64(*v),
        _ => return None,
    };
    Some(result)
}

fn encode_struct<S: CdrSink>(
    sink: &mut S,
    desc: &StructDescriptor,
    fields: &HashMap<String, DynamicValue>,
) -> Result<()> {
    let mut enc = StructEncoder::begin(sink, desc.extensibility)?;
    for field in desc.fields() {
        let value = fields.get(&field.name);
        if field.optional {
            let present = value
                .filter(|v| !v.is_null())
                .map(|v| DynamicEncodable::new(&field.type_desc, v));
            enc.optional(field.member_id(), field.key, present.as_ref())?;
        } else {
            let value = value.ok_or_else(|| {
                CdrError::invalid_value(format!("missing member {}", field.name))
            })?;
            let member = DynamicEncodable::new(&field.type_desc, value);
            enc.member(field.member_id(), field.key, &member)?;
        }
    }
    enc.finish()
}

fn encode_union<S: CdrSink>(
    sink: &mut S,
    desc: &UnionDescriptor,
    disc: i64,
    inner: &DynamicValue,
) -> Result<()> {
    let mut enc = StructEncoder::begin(sink, desc.extensibility)?;
    encode_discriminator(enc.sink(), &desc.discriminator, disc)?;
    match desc.case_by_discriminator(disc) {
        Some(case) => encode_value(enc.sink(), &case.type_desc, inner)?,
        None if inner.is_null() => {}
        None => return Err(CdrError::UnknownDiscriminant(disc)),
    }
    enc.finish()
}

fn narrow<T: TryFrom<i64>>(value: i64, what: &str) -> Result<T> {
    T::try_from(value)
        .map_err(|_| CdrError::invalid_value(format!("{} {} out of range", what, value)))
}

fn encode_discriminator<S: CdrSink>(sink: &mut S, desc: &TypeDescriptor, disc: i64) -> Result<()> {
    const WHAT: &str = "discriminator";
    match &desc.kind {
        TypeKind::Enum(_) => sink.write_i32(narrow(disc, WHAT)?),
        TypeKind::Primitive(kind) => match kind {
            PrimitiveKind::Bool => match disc {
                0 | 1 => sink.write_bool(disc == 1),
                _ => Err(CdrError::invalid_value(format!("boolean {} {}", WHAT, disc))),
            },
            PrimitiveKind::U8 => sink.write_u8(narrow(disc, WHAT)?),
            PrimitiveKind::I8 => sink.write_i8(narrow(disc, WHAT)?),
            PrimitiveKind::U16 => sink.write_u16(narrow(disc, WHAT)?),
            PrimitiveKind::I16 => sink.write_i16(narrow(disc, WHAT)?),
            PrimitiveKind::U32 => sink.write_u32(narrow(disc, WHAT)?),
            PrimitiveKind::I32 => sink.write_i32(narrow(disc, WHAT)?),
            PrimitiveKind::U64 => sink.write_u64(narrow(disc, WHAT)?),
            PrimitiveKind::I64 => sink.write_i64(disc),
            PrimitiveKind::F32 | PrimitiveKind::F64 => Err(non_integral(desc)),
        },
        _ => Err(non_integral(desc)),
    }
}

fn non_integral(desc: &TypeDescriptor) -> CdrError {
    CdrError::InvalidDescriptor(format!("{} cannot discriminate a union", desc.name))
}

fn decode_discriminator(reader: &mut CdrReader<'_>, desc: &TypeDescriptor) -> Result<i64> {
    match &desc.kind {
        TypeKind::Enum(_) => reader.read_i32().map(i64::from),
        TypeKind::Primitive(kind) => match kind {
            PrimitiveKind::Bool => reader.read_bool().map(i64::from),
            PrimitiveKind::U8 => reader.read_u8().map(i64::from),
            PrimitiveKind::I8 => reader.read_i8().map(i64::from),
            PrimitiveKind::U16 => reader.read_u16().map(i64::from),
            PrimitiveKind::I16 => reader.read_i16().map(i64::from),
            PrimitiveKind::U32 => reader.read_u32().map(i64::from),
            PrimitiveKind::I32 => reader.read_i32().map(i64::from),
            PrimitiveKind::U64 => {
                let raw = reader.read_u64()?;
                i64::try_from(raw).map_err(|_| {
                    CdrError::invalid_value(format!("discriminator {} out of range", raw))
                })
            }
            PrimitiveKind::I64 => reader.read_i64(),
            PrimitiveKind::F32 | PrimitiveKind::F64 => Err(non_integral(desc)),
        },
        _ => Err(non_integral(desc)),
    }
}

/// Read a value described by `desc`.
pub fn decode_value(reader: &mut CdrReader<'_>, desc: &TypeDescriptor) -> Result<DynamicValue> {
    match &desc.kind {
        TypeKind::Primitive(kind) => decode_primitive(reader, *kind),
        TypeKind::String { bound } => reader.read_bounded_string(*bound).map(DynamicValue::String),
        TypeKind::Enum(e) => {
            let value = i64::from(reader.read_i32()?);
            let name = e
                .variant_by_value(value)
                .map(|v| v.name.clone())
                .unwrap_or_default();
            Ok(DynamicValue::Enum(value, name))
        }
        TypeKind::Struct(s) => decode_struct(reader, s),
        TypeKind::Union(u) => decode_union(reader, u),
        TypeKind::Sequence(seq) => {
            let shape = CollectionShape::Sequence {
                bound: seq.max_length,
            };
            decode_elements(reader, &seq.element_type, shape).map(DynamicValue::Sequence)
        }
        TypeKind::Array(arr) => {
            let shape = CollectionShape::Array { length: arr.length };
            decode_elements(reader, &arr.element_type, shape).map(DynamicValue::Array)
        }
    }
}

fn decode_primitive(reader: &mut CdrReader<'_>, kind: PrimitiveKind) -> Result<DynamicValue> {
    Ok(match kind {
        PrimitiveKind::Bool => DynamicValue::Bool(reader.read_bool()?),
        PrimitiveKind::U8 => DynamicValue::U8(reader.read_u8()?),
        PrimitiveKind::I8 => DynamicValue::I8(reader.read_i8()?),
        PrimitiveKind::U16 => DynamicValue::U16(reader.read_u16()?),
        PrimitiveKind::I16 => DynamicValue::I16(reader.read_i16()?),
        PrimitiveKind::U32 => DynamicValue::U32(reader.read_u32()?),
        PrimitiveKind::I32 => DynamicValue::I32(reader.read_i32()?),
        PrimitiveKind::U64 => DynamicValue::U64(reader.read_u64()?),
        PrimitiveKind::I64 => DynamicValue::I64(reader.read_i64()?),
        PrimitiveKind::F32 => DynamicValue::F32(reader.read_f32()?),
        PrimitiveKind::F64 => DynamicValue::F64(reader.read_f64()?),
    })
}

fn decode_elements(
    reader: &mut CdrReader<'_>,
    element: &TypeDescriptor,
    shape: CollectionShape,
) -> Result<Vec<DynamicValue>> {
    decode_collection(reader, element.primitive_width(), shape, |reader, count| {
        let mut items = Vec::with_capacity(count.min(reader.remaining()));
        for _ in 0..count {
            items.push(decode_value(reader, element)?);
        }
        Ok(items)
    })
}

fn absent_value(optional: bool, desc: &TypeDescriptor) -> DynamicValue {
    if optional {
        DynamicValue::Null
    } else {
        DynamicValue::default_for(desc)
    }
}

fn decode_struct(reader: &mut CdrReader<'_>, desc: &StructDescriptor) -> Result<DynamicValue> {
    let mut dec = StructDecoder::begin(reader, desc.extensibility)?;
    let mut fields = HashMap::with_capacity(desc.fields().len());

    if dec.extensibility() == Extensibility::Mutable {
        while let Some(header) = dec.next_member()? {
            match desc.field_by_id(header.member_id) {
                Some(field) => {
                    let value = dec.value_with(&header, |r| decode_value(r, &field.type_desc))?;
                    fields.insert(field.name.clone(), value);
                }
                None => dec.skip(&header)?,
            }
        }
        for field in desc.fields() {
            if !fields.contains_key(&field.name) {
                fields.insert(
                    field.name.clone(),
                    absent_value(field.optional, &field.type_desc),
                );
            }
        }
    } else {
        for field in desc.fields() {
            let value = if dec.exhausted() {
                absent_value(field.optional, &field.type_desc)
            } else if field.optional {
                if dec.reader().read_bool()? {
                    decode_value(dec.reader(), &field.type_desc)?
                } else {
                    DynamicValue::Null
                }
            } else {
                decode_value(dec.reader(), &field.type_desc)?
            };
            fields.insert(field.name.clone(), value);
        }
    }

    dec.finish()?;
    Ok(DynamicValue::Struct(fields))
}

fn decode_union(reader: &mut CdrReader<'_>, desc: &UnionDescriptor) -> Result<DynamicValue> {
    let mut dec = StructDecoder::begin(reader, desc.extensibility)?;
    let disc = decode_discriminator(dec.reader(), &desc.discriminator)?;
    let value = match desc.case_by_discriminator(disc) {
        Some(case) => {
            let inner = decode_value(dec.reader(), &case.type_desc)?;
            DynamicValue::Union(disc, case.name.clone(), Box::new(inner))
        }
        None => match dec.reader().discriminant_policy() {
            DiscriminantPolicy::Reject => return Err(CdrError::UnknownDiscriminant(disc)),
            DiscriminantPolicy::Empty => {
                log::debug!("[cdr] union discriminant {} selects no case", disc);
                DynamicValue::Union(disc, String::new(), Box::new(DynamicValue::Null))
            }
        },
    };
    dec.finish()?;
    Ok(value)
}
