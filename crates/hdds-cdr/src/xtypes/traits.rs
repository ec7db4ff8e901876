// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Codec traits and their implementations for Rust primitives and std types.
//!
//! `CdrEncode::encode` is generic over [`CdrSink`], so the same code path
//! drives both the writer and the sizer.

use super::collections::{decode_array, decode_sequence, encode_array, encode_sequence};
use super::emheader::LengthCode;
use crate::cdr::{CdrReader, CdrSink};
use crate::dynamic::{PrimitiveKind, TypeDescriptor};
use crate::encoding::Extensibility;
use crate::error::{CdrError, Result};
use std::sync::Arc;

/// Types that can be written to a CDR sink.
pub trait CdrEncode {
    /// Wire width when the whole value is a single 1/2/4/8-byte primitive
    /// (or a 32-bit enum). Drives EMHEADER length codes and the DHEADER
    /// rule for collections.
    const PRIMITIVE_WIDTH: Option<usize> = None;

    /// Extensibility of the top-level type; selects the encapsulation id.
    const EXTENSIBILITY: Extensibility = Extensibility::Final;

    /// EMHEADER length code when the type is a member of a mutable
    /// aggregate under XCDR2.
    const LENGTH_CODE: LengthCode = LengthCode::for_member(Self::PRIMITIVE_WIDTH);

    fn encode<S: CdrSink>(&self, sink: &mut S) -> Result<()>;

    /// Per-value primitive width; descriptor-driven values override this.
    fn primitive_width(&self) -> Option<usize> {
        Self::PRIMITIVE_WIDTH
    }

    fn length_code(&self) -> LengthCode {
        Self::LENGTH_CODE
    }

    fn extensibility(&self) -> Extensibility {
        Self::EXTENSIBILITY
    }
}

/// Types that can be read from a CDR reader.
pub trait CdrDecode: Sized {
    fn decode(reader: &mut CdrReader<'_>) -> Result<Self>;

    /// Value of a member the writer did not send: zero, empty, the first
    /// enumerator. `None` when the type has no such value.
    fn absent() -> Option<Self> {
        None
    }
}

/// Types that can describe their own layout.
pub trait DescribeType {
    fn type_descriptor() -> Arc<TypeDescriptor>;
}

macro_rules! impl_primitive {
    ($ty:ty, $kind:ident, $width:expr, $write:ident, $read:ident) => {
        impl CdrEncode for $ty {
            const PRIMITIVE_WIDTH: Option<usize> = Some($width);

            #[inline]
            fn encode<S: CdrSink>(&self, sink: &mut S) -> Result<()> {
                sink.$write(*self)
            }
        }

        impl CdrDecode for $ty {
            #[inline]
            fn decode(reader: &mut CdrReader<'_>) -> Result<Self> {
                reader.$read()
            }

            fn absent() -> Option<Self> {
                Some(<$ty>::default())
            }
        }

        impl DescribeType for $ty {
            fn type_descriptor() -> Arc<TypeDescriptor> {
                let kind = PrimitiveKind::$kind;
                Arc::new(TypeDescriptor::primitive(kind.idl_name(), kind))
            }
        }
    };
}

impl_primitive!(bool, Bool, 1, write_bool, read_bool);
impl_primitive!(u8, U8, 1, write_u8, read_u8);
impl_primitive!(i8, I8, 1, write_i8, read_i8);
impl_primitive!(u16, U16, 2, write_u16, read_u16);
impl_primitive!(i16, I16, 2, write_i16, read_i16);
impl_primitive!(u32, U32, 4, write_u32, read_u32);
impl_primitive!(i32, I32, 4, write_i32, read_i32);
impl_primitive!(u64, U64, 8, write_u64, read_u64);
impl_primitive!(i64, I64, 8, write_i64, read_i64);
impl_primitive!(f32, F32, 4, write_f32, read_f32);
impl_primitive!(f64, F64, 8, write_f64, read_f64);

impl CdrEncode for str {
    const LENGTH_CODE: LengthCode = LengthCode::NextIntBytes;

    fn encode<S: CdrSink>(&self, sink: &mut S) -> Result<()> {
        sink.write_string(self)
    }
}

impl CdrEncode for String {
    const LENGTH_CODE: LengthCode = LengthCode::NextIntBytes;

    fn encode<S: CdrSink>(&self, sink: &mut S) -> Result<()> {
        sink.write_string(self)
    }
}

impl CdrDecode for String {
    fn decode(reader: &mut CdrReader<'_>) -> Result<Self> {
        reader.read_string()
    }

    fn absent() -> Option<Self> {
        Some(String::new())
    }
}

impl DescribeType for String {
    fn type_descriptor() -> Arc<TypeDescriptor> {
        Arc::new(TypeDescriptor::string(None))
    }
}

impl<T: CdrEncode + ?Sized> CdrEncode for &T {
    const PRIMITIVE_WIDTH: Option<usize> = T::PRIMITIVE_WIDTH;
    const EXTENSIBILITY: Extensibility = T::EXTENSIBILITY;
    const LENGTH_CODE: LengthCode = T::LENGTH_CODE;

    fn encode<S: CdrSink>(&self, sink: &mut S) -> Result<()> {
        (**self).encode(sink)
    }

    fn primitive_width(&self) -> Option<usize> {
        (**self).primitive_width()
    }

    fn length_code(&self) -> LengthCode {
        (**self).length_code()
    }

    fn extensibility(&self) -> Extensibility {
        (**self).extensibility()
    }
}

impl<T: CdrEncode + ?Sized> CdrEncode for Box<T> {
    const PRIMITIVE_WIDTH: Option<usize> = T::PRIMITIVE_WIDTH;
    const EXTENSIBILITY: Extensibility = T::EXTENSIBILITY;
    const LENGTH_CODE: LengthCode = T::LENGTH_CODE;

    fn encode<S: CdrSink>(&self, sink: &mut S) -> Result<()> {
        (**self).encode(sink)
    }

    fn primitive_width(&self) -> Option<usize> {
        (**self).primitive_width()
    }

    fn length_code(&self) -> LengthCode {
        (**self).length_code()
    }

    fn extensibility(&self) -> Extensibility {
        (**self).extensibility()
    }
}

impl<T: CdrDecode> CdrDecode for Box<T> {
    fn decode(reader: &mut CdrReader<'_>) -> Result<Self> {
        T::decode(reader).map(Box::new)
    }

    fn absent() -> Option<Self> {
        T::absent().map(Box::new)
    }
}

impl<T: CdrEncode> CdrEncode for [T] {
    const LENGTH_CODE: LengthCode = LengthCode::for_sequence(T::PRIMITIVE_WIDTH);

    fn encode<S: CdrSink>(&self, sink: &mut S) -> Result<()> {
        encode_sequence(sink, self)
    }
}

impl<T: CdrEncode> CdrEncode for Vec<T> {
    const LENGTH_CODE: LengthCode = LengthCode::for_sequence(T::PRIMITIVE_WIDTH);

    fn encode<S: CdrSink>(&self, sink: &mut S) -> Result<()> {
        encode_sequence(sink, self.as_slice())
    }
}

impl<T: CdrDecode + CdrEncode> CdrDecode for Vec<T> {
    fn decode(reader: &mut CdrReader<'_>) -> Result<Self> {
        decode_sequence(reader)
    }

    fn absent() -> Option<Self> {
        Some(Vec::new())
    }
}

impl<T: DescribeType> DescribeType for Vec<T> {
    fn type_descriptor() -> Arc<TypeDescriptor> {
        Arc::new(TypeDescriptor::sequence(T::type_descriptor(), None))
    }
}

impl<T: CdrEncode, const N: usize> CdrEncode for [T; N] {
    const LENGTH_CODE: LengthCode = LengthCode::for_array(T::PRIMITIVE_WIDTH, N);

    fn encode<S: CdrSink>(&self, sink: &mut S) -> Result<()> {
        encode_array(sink, self.as_slice())
    }
}

impl<T: CdrDecode + CdrEncode, const N: usize> CdrDecode for [T; N] {
    fn decode(reader: &mut CdrReader<'_>) -> Result<Self> {
        let items: Vec<T> = decode_array(reader, N)?;
        <[T; N]>::try_from(items).map_err(|items| {
            CdrError::invalid_value(format!(
                "array of {} elements, expected {}",
                items.len(),
                N
            ))
        })
    }

    fn absent() -> Option<Self> {
        let items = (0..N).map(|_| T::absent()).collect::<Option<Vec<T>>>()?;
        <[T; N]>::try_from(items).ok()
    }
}

impl<T: DescribeType, const N: usize> DescribeType for [T; N] {
    fn type_descriptor() -> Arc<TypeDescriptor> {
        Arc::new(TypeDescriptor::array(T::type_descriptor(), N))
    }
}

/// Presence flag followed by the value. Aggregates encode optional members
/// through `StructEncoder::optional`, which omits absent members of mutable
/// types instead.
impl<T: CdrEncode> CdrEncode for Option<T> {
    fn encode<S: CdrSink>(&self, sink: &mut S) -> Result<()> {
        match self {
            Some(value) => {
                sink.write_bool(true)?;
                value.encode(sink)
            }
            None => sink.write_bool(false),
        }
    }
}

impl<T: CdrDecode> CdrDecode for Option<T> {
    fn decode(reader: &mut CdrReader<'_>) -> Result<Self> {
        if reader.read_bool()? {
            T::decode(reader).map(Some)
        } else {
            Ok(None)
        }
    }

    fn absent() -> Option<Self> {
        Some(None)
    }
}

impl<T: DescribeType> DescribeType for Option<T> {
    fn type_descriptor() -> Arc<TypeDescriptor> {
        T::type_descriptor()
    }
}
