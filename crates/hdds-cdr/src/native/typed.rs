// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Rust types written straight into native memory.
//!
//! [`NativeType`] is the typed side of the marshaller: primitives, `String`,
//! `Vec<T>`, `[T; N]` and `#[derive(Cdr)]` structs and enums fill a
//! [`NativeSink`] from their own fields, with the [`NativeLayout`] only
//! supplying offsets. Reading goes the other way through a [`ValueView`],
//! either in place (`view`) or as an owned copy (`read_native`).

use super::arena::{NativePtr, NativeScalar, NativeSink};
use super::layout::{NativeField, NativeLayout, NativeShape};
use super::marshal::{check_array_len, write_bounded_str, write_native, write_sequence_with};
use crate::dynamic::DynamicValue;
use crate::error::{CdrError, Result};
use crate::view::{SequenceView, ValueView};

/// A Rust type with a native (C-layout) representation.
pub trait NativeType: Sized {
    /// What typed view accessors hand out for this type.
    type View<'a>;

    /// Write `self` at `at`, already allocated with `layout.size` bytes.
    fn write_native<N: NativeSink>(
        &self,
        sink: &mut N,
        at: usize,
        layout: &NativeLayout,
    ) -> Result<()>;

    /// Borrow the value out of the buffer where possible.
    fn view<'a>(value: ValueView<'a>) -> Result<Self::View<'a>>;

    /// Deep copy out of the buffer.
    fn read_native(value: ValueView<'_>) -> Result<Self>;
}

fn mismatch(layout: &NativeLayout, what: &str) -> CdrError {
    CdrError::invalid_value(format!(
        "{} cannot hold {}",
        layout.descriptor.name, what
    ))
}

macro_rules! impl_native_primitive {
    ($($ty:ty),*) => {$(
        impl NativeType for $ty {
            type View<'a> = $ty;

            fn write_native<N: NativeSink>(
                &self,
                sink: &mut N,
                at: usize,
                layout: &NativeLayout,
            ) -> Result<()> {
                match &layout.shape {
                    NativeShape::Primitive(kind) if *kind == <$ty as NativeScalar>::KIND => {
                        sink.write_scalar(at, *self)
                    }
                    _ => Err(mismatch(layout, stringify!($ty))),
                }
            }

            fn view<'a>(value: ValueView<'a>) -> Result<$ty> {
                value.scalar()
            }

            fn read_native(value: ValueView<'_>) -> Result<$ty> {
                value.scalar()
            }
        }
    )*};
}

impl_native_primitive!(bool, u8, i8, u16, i16, u32, i32, u64, i64, f32, f64);

impl NativeType for String {
    type View<'a> = &'a str;

    fn write_native<N: NativeSink>(
        &self,
        sink: &mut N,
        at: usize,
        layout: &NativeLayout,
    ) -> Result<()> {
        match &layout.shape {
            NativeShape::String => {
                let ptr = sink.create_string(Some(self.as_str()))?;
                sink.write_ptr(at, ptr)
            }
            NativeShape::BoundedString { bound } => write_bounded_str(sink, at, self, *bound),
            _ => Err(mismatch(layout, "a string")),
        }
    }

    fn view<'a>(value: ValueView<'a>) -> Result<&'a str> {
        value.str()
    }

    fn read_native(value: ValueView<'_>) -> Result<String> {
        value.string()
    }
}

impl<T: NativeType> NativeType for Vec<T> {
    type View<'a> = SequenceView<'a>;

    fn write_native<N: NativeSink>(
        &self,
        sink: &mut N,
        at: usize,
        layout: &NativeLayout,
    ) -> Result<()> {
        let NativeShape::Sequence { element, bound } = &layout.shape else {
            return Err(mismatch(layout, "a sequence"));
        };
        write_sequence_with(sink, at, self.len(), element, *bound, |sink, slot, i| {
            self[i].write_native(sink, slot, element)
        })
    }

    fn view<'a>(value: ValueView<'a>) -> Result<SequenceView<'a>> {
        value.as_sequence()
    }

    fn read_native(value: ValueView<'_>) -> Result<Vec<T>> {
        value.as_sequence()?.iter().map(T::read_native).collect()
    }
}

impl<T: NativeType, const N: usize> NativeType for [T; N] {
    type View<'a> = SequenceView<'a>;

    fn write_native<S: NativeSink>(
        &self,
        sink: &mut S,
        at: usize,
        layout: &NativeLayout,
    ) -> Result<()> {
        let NativeShape::Array { element, length } = &layout.shape else {
            return Err(mismatch(layout, "an array"));
        };
        check_array_len(N, *length)?;
        self.iter()
            .enumerate()
            .try_for_each(|(i, item)| item.write_native(sink, at + i * element.size, element))
    }

    fn view<'a>(value: ValueView<'a>) -> Result<SequenceView<'a>> {
        value.as_sequence()
    }

    fn read_native(value: ValueView<'_>) -> Result<[T; N]> {
        let items: Vec<T> = value
            .as_sequence()?
            .iter()
            .map(T::read_native)
            .collect::<Result<_>>()?;
        <[T; N]>::try_from(items).map_err(|items| {
            CdrError::invalid_value(format!("{} elements, expected {}", items.len(), N))
        })
    }
}

impl<T: NativeType> NativeType for Box<T> {
    type View<'a> = T::View<'a>;

    fn write_native<N: NativeSink>(
        &self,
        sink: &mut N,
        at: usize,
        layout: &NativeLayout,
    ) -> Result<()> {
        (**self).write_native(sink, at, layout)
    }

    fn view<'a>(value: ValueView<'a>) -> Result<T::View<'a>> {
        T::view(value)
    }

    fn read_native(value: ValueView<'_>) -> Result<Box<T>> {
        T::read_native(value).map(Box::new)
    }
}

impl NativeType for DynamicValue {
    type View<'a> = ValueView<'a>;

    fn write_native<N: NativeSink>(
        &self,
        sink: &mut N,
        at: usize,
        layout: &NativeLayout,
    ) -> Result<()> {
        write_native(sink, at, self, layout)
    }

    fn view<'a>(value: ValueView<'a>) -> Result<ValueView<'a>> {
        Ok(value)
    }

    fn read_native(value: ValueView<'_>) -> Result<DynamicValue> {
        value.to_owned()
    }
}

fn struct_field<'l>(layout: &'l NativeLayout, name: &str) -> Result<&'l NativeField> {
    layout.field(name).ok_or_else(|| {
        CdrError::invalid_value(format!(
            "{} has no member {}",
            layout.descriptor.name, name
        ))
    })
}

/// Write member `name` of the struct at `at`.
pub fn write_member<N: NativeSink, T: NativeType>(
    sink: &mut N,
    at: usize,
    layout: &NativeLayout,
    name: &str,
    value: &T,
) -> Result<()> {
    let field = struct_field(layout, name)?;
    if field.optional {
        return Err(mismatch(layout, &format!("a plain value in optional {}", name)));
    }
    value.write_native(sink, at + field.offset, &field.layout)
}

/// Write optional member `name`: out-of-line when present, a null pointer
/// otherwise.
pub fn write_optional_member<N: NativeSink, T: NativeType>(
    sink: &mut N,
    at: usize,
    layout: &NativeLayout,
    name: &str,
    value: Option<&T>,
) -> Result<()> {
    let field = struct_field(layout, name)?;
    if !field.optional {
        return Err(mismatch(layout, &format!("an optional value in {}", name)));
    }
    let ptr = match value {
        Some(v) => {
            let region = sink.allocate(field.layout.size, field.layout.align)?;
            v.write_native(sink, region, &field.layout)?;
            sink.ptr_at(region)
        }
        None => NativePtr::NULL,
    };
    sink.write_ptr(at + field.offset, ptr)
}

/// Write an enumerator value into an enum slot.
pub fn write_enum<N: NativeSink>(
    sink: &mut N,
    at: usize,
    layout: &NativeLayout,
    value: i32,
) -> Result<()> {
    match &layout.shape {
        NativeShape::Enum => sink.write_scalar(at, value),
        _ => Err(mismatch(layout, "an enumerator")),
    }
}
