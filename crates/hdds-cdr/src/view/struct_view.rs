// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::{ptr_at, resolve, SequenceView, UnionView, ValueView};
use crate::dynamic::{DynamicData, DynamicValue};
use crate::error::{CdrError, Result};
use crate::native::{NativeField, NativeLayout, NativeScalar, NativeShape, NativeType};
use std::collections::HashMap;

/// Read-only overlay of a native struct.
///
/// Borrows both the buffer and the layout; the buffer must be the one the
/// embedded pointers were written for (as produced by `marshal_native`).
#[derive(Debug, Clone, Copy)]
pub struct StructView<'a> {
    buf: &'a [u8],
    offset: usize,
    layout: &'a NativeLayout,
}

impl<'a> StructView<'a> {
    /// View the struct at the start of `buf`.
    pub fn new(buf: &'a [u8], layout: &'a NativeLayout) -> Result<Self> {
        if !matches!(layout.shape, NativeShape::Struct(_)) {
            return Err(CdrError::invalid_state(format!(
                "{} is not a struct",
                layout.descriptor.name
            )));
        }
        if buf.len() < layout.size {
            return Err(CdrError::BufferUnderrun {
                offset: 0,
                needed: layout.size,
                available: buf.len(),
            });
        }
        Ok(Self::at(buf, 0, layout))
    }

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

    pub fn type_name(&self) -> &'a str {
        &self.layout.descriptor.name
    }

    fn field(&self, name: &str) -> Result<&'a NativeField> {
        self.layout.field(name).ok_or_else(|| {
            CdrError::invalid_state(format!("{} has no member {}", self.type_name(), name))
        })
    }

    /// Member `name`; `None` for an absent optional member.
    pub fn member(&self, name: &str) -> Result<Option<ValueView<'a>>> {
        let field = self.field(name)?;
        self.member_at(field)
    }

    fn member_at(&self, field: &'a NativeField) -> Result<Option<ValueView<'a>>> {
        let at = self.offset + field.offset;
        if !field.optional {
            return Ok(Some(ValueView::at(self.buf, at, &field.layout)));
        }
        let ptr = ptr_at(self.buf, at)?;
        if ptr.is_null() {
            return Ok(None);
        }
        let target = resolve(self.buf, ptr, field.layout.size)?;
        Ok(Some(ValueView::at(self.buf, target, &field.layout)))
    }

    fn required(&self, name: &str) -> Result<ValueView<'a>> {
        self.member(name)?.ok_or_else(|| {
            CdrError::invalid_state(format!(
                "optional member {} of {} is absent",
                name,
                self.type_name()
            ))
        })
    }

    pub fn get<T: NativeScalar>(&self, name: &str) -> Result<T> {
        self.required(name)?.scalar()
    }

    pub fn optional<T: NativeScalar>(&self, name: &str) -> Result<Option<T>> {
        self.member(name)?.map(|v| v.scalar()).transpose()
    }

    /// String member as bytes, no allocation.
    pub fn str_bytes(&self, name: &str) -> Result<&'a [u8]> {
        self.required(name)?.str_bytes()
    }

    pub fn string(&self, name: &str) -> Result<String> {
        self.required(name)?.string()
    }

    pub fn sequence(&self, name: &str) -> Result<SequenceView<'a>> {
        let view = self.required(name)?;
        match view.layout().shape {
            NativeShape::Sequence { .. } => view.as_sequence(),
            _ => Err(self.not_a(name, "sequence")),
        }
    }

    pub fn array(&self, name: &str) -> Result<SequenceView<'a>> {
        let view = self.required(name)?;
        match view.layout().shape {
            NativeShape::Array { .. } => view.as_sequence(),
            _ => Err(self.not_a(name, "array")),
        }
    }

    pub fn nested(&self, name: &str) -> Result<StructView<'a>> {
        self.required(name)?.as_struct()
    }

    pub fn union(&self, name: &str) -> Result<UnionView<'a>> {
        self.required(name)?.as_union()
    }

    /// Member `name` through its Rust type's in-place view.
    pub fn view<T: NativeType>(&self, name: &str) -> Result<T::View<'a>> {
        T::view(self.required(name)?)
    }

    pub fn view_optional<T: NativeType>(&self, name: &str) -> Result<Option<T::View<'a>>> {
        self.member(name)?.map(T::view).transpose()
    }

    /// Member `name` copied out as its Rust type.
    pub fn read<T: NativeType>(&self, name: &str) -> Result<T> {
        T::read_native(self.required(name)?)
    }

    pub fn read_optional<T: NativeType>(&self, name: &str) -> Result<Option<T>> {
        self.member(name)?.map(T::read_native).transpose()
    }

    fn not_a(&self, name: &str, what: &str) -> CdrError {
        CdrError::invalid_state(format!(
            "member {} of {} is not {}",
            name,
            self.type_name(),
            what
        ))
    }

    pub(crate) fn to_value(&self) -> Result<DynamicValue> {
        let fields = self.layout.fields().unwrap_or_default();
        let mut values = HashMap::with_capacity(fields.len());
        for field in fields {
            let value = match self.member_at(field)? {
                Some(view) => view.to_owned()?,
                None => DynamicValue::Null,
            };
            values.insert(field.name.clone(), value);
        }
        Ok(DynamicValue::Struct(values))
    }

    /// Deep copy, independent of the viewed buffer.
    pub fn to_owned(&self) -> Result<DynamicData> {
        Ok(DynamicData::from_value(
            &self.layout.descriptor,
            self.to_value()?,
        )?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::{PrimitiveKind, TypeDescriptor, TypeDescriptorBuilder, UnionBuilder};
    use crate::native::marshal_native;
    use std::sync::Arc;

    fn nested_desc() -> Arc<TypeDescriptor> {
        let point = Arc::new(
            TypeDescriptorBuilder::new("Point")
                .field("x", PrimitiveKind::F64)
                .field("y", PrimitiveKind::F64)
                .build(),
        );
        let shape = Arc::new(
            UnionBuilder::with_i32_discriminator("Shape")
                .primitive_case("radius", 1, PrimitiveKind::F32)
                .case("label", 2, Arc::new(TypeDescriptor::string(None)))
                .build(),
        );
        Arc::new(
            TypeDescriptorBuilder::new("Track")
                .field("id", PrimitiveKind::U32)
                .nested_field("origin", point)
                .sequence_field("samples", PrimitiveKind::I32)
                .field_with_type("shape", shape)
                .optional_field("score", PrimitiveKind::U16)
                .string_field("name")
                .build(),
        )
    }

    fn sample(desc: &Arc<TypeDescriptor>) -> DynamicValue {
        let mut origin = DynamicValue::default_for(&desc.field("origin").unwrap().type_desc);
        origin.set_field("x", DynamicValue::F64(1.0));
        origin.set_field("y", DynamicValue::F64(-2.5));

        let mut value = DynamicValue::default_for(desc);
        value.set_field("id", DynamicValue::U32(42));
        value.set_field("origin", origin);
        value.set_field("samples", DynamicValue::from(vec![10i32, 20, 30]));
        value.set_field(
            "shape",
            DynamicValue::Union(2, "label".into(), Box::new("ring".into())),
        );
        value.set_field("name", "track-1".into());
        value
    }

    #[test]
    fn test_accessors_read_in_place() {
        let desc = nested_desc();
        let layout = NativeLayout::of(&desc).unwrap();
        let native = marshal_native(&sample(&desc), &layout).unwrap();
        let view = StructView::new(native.as_slice(), &layout).unwrap();

        assert_eq!(view.get::<u32>("id").unwrap(), 42);
        assert_eq!(view.nested("origin").unwrap().get::<f64>("y").unwrap(), -2.5);
        let samples = view.sequence("samples").unwrap();
        assert_eq!(samples.scalars::<i32>().unwrap().sum::<i32>(), 60);
        assert_eq!(view.optional::<u16>("score").unwrap(), None);
        assert_eq!(view.str_bytes("name").unwrap(), b"track-1");

        let shape = view.union("shape").unwrap();
        assert_eq!(shape.discriminator().unwrap(), 2);
        assert_eq!(shape.active_case().unwrap(), Some("label"));
        assert_eq!(shape.case("label").unwrap().string().unwrap(), "ring");
        assert!(matches!(
            shape.case("radius"),
            Err(CdrError::InvalidState(_))
        ));
    }

    #[test]
    fn test_misuse_is_invalid_state() {
        let desc = nested_desc();
        let layout = NativeLayout::of(&desc).unwrap();
        let native = marshal_native(&sample(&desc), &layout).unwrap();
        let view = StructView::new(native.as_slice(), &layout).unwrap();

        assert!(matches!(view.get::<u32>("missing"), Err(CdrError::InvalidState(_))));
        assert!(matches!(view.get::<u16>("score"), Err(CdrError::InvalidState(_))));
        assert!(matches!(view.get::<i32>("id"), Err(CdrError::InvalidState(_))));
        assert!(matches!(view.array("samples"), Err(CdrError::InvalidState(_))));
    }

    #[test]
    fn test_to_owned_round_trip() {
        let desc = nested_desc();
        let layout = NativeLayout::of(&desc).unwrap();
        let value = sample(&desc);
        let native = marshal_native(&value, &layout).unwrap();
        let owned = StructView::new(native.as_slice(), &layout)
            .unwrap()
            .to_owned()
            .unwrap();
        drop(native);
        assert_eq!(owned.value(), &value);
    }

    #[test]
    fn test_foreign_pointer_rejected() {
        let desc = nested_desc();
        let layout = NativeLayout::of(&desc).unwrap();
        let native = marshal_native(&sample(&desc), &layout).unwrap();
        // Same bytes at another address: every pointer now lands outside.
        let copy = native.as_slice().to_vec();
        let view = StructView::new(&copy, &layout).unwrap();
        assert_eq!(view.get::<u32>("id").unwrap(), 42);
        assert!(matches!(view.str_bytes("name"), Err(CdrError::InvalidState(_))));
    }

    #[test]
    fn test_short_buffer() {
        let desc = nested_desc();
        let layout = NativeLayout::of(&desc).unwrap();
        let buf = vec![0u8; layout.size - 1];
        assert!(matches!(
            StructView::new(&buf, &layout),
            Err(CdrError::BufferUnderrun { .. })
        ));
    }
}
