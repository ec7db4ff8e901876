// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Fluent builder API for TypeDescriptor.

use crate::dynamic::{
    EnumDescriptor, EnumVariant, FieldDescriptor, PrimitiveKind, TypeDescriptor, TypeKind,
    UnionCase, UnionDescriptor,
};
use crate::encoding::Extensibility;
use std::sync::Arc;

fn primitive(kind: PrimitiveKind) -> Arc<TypeDescriptor> {
    Arc::new(TypeDescriptor::primitive(kind.idl_name(), kind))
}

/// Builder for struct descriptors. Extensibility defaults to Appendable.
#[derive(Debug)]
pub struct TypeDescriptorBuilder {
    name: String,
    extensibility: Extensibility,
    fields: Vec<FieldDescriptor>,
}

impl TypeDescriptorBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            extensibility: Extensibility::default(),
            fields: Vec::new(),
        }
    }

    pub fn extensibility(mut self, extensibility: Extensibility) -> Self {
        self.extensibility = extensibility;
        self
    }

    /// Add a fully specified member.
    pub fn member(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    /// Add a primitive field.
    pub fn field(self, name: impl Into<String>, kind: PrimitiveKind) -> Self {
        self.field_with_type(name, primitive(kind))
    }

    /// Add a field with a type descriptor.
    pub fn field_with_type(self, name: impl Into<String>, type_desc: Arc<TypeDescriptor>) -> Self {
        self.member(FieldDescriptor::new(name, type_desc))
    }

    pub fn optional_field(self, name: impl Into<String>, kind: PrimitiveKind) -> Self {
        self.member(FieldDescriptor::new(name, primitive(kind)).optional())
    }

    pub fn optional_field_with_type(
        self,
        name: impl Into<String>,
        type_desc: Arc<TypeDescriptor>,
    ) -> Self {
        self.member(FieldDescriptor::new(name, type_desc).optional())
    }

    /// Add a field with an explicit member id. Later fields continue from it.
    pub fn field_with_id(self, name: impl Into<String>, kind: PrimitiveKind, id: u32) -> Self {
        self.member(FieldDescriptor::new(name, primitive(kind)).with_id(id))
    }

    pub fn key_field(self, name: impl Into<String>, kind: PrimitiveKind) -> Self {
        self.member(FieldDescriptor::new(name, primitive(kind)).key())
    }

    pub fn string_field(self, name: impl Into<String>) -> Self {
        self.field_with_type(name, Arc::new(TypeDescriptor::string(None)))
    }

    pub fn bounded_string_field(self, name: impl Into<String>, max_length: usize) -> Self {
        self.field_with_type(name, Arc::new(TypeDescriptor::string(Some(max_length))))
    }

    pub fn sequence_field(self, name: impl Into<String>, element_kind: PrimitiveKind) -> Self {
        let seq = TypeDescriptor::sequence(primitive(element_kind), None);
        self.field_with_type(name, Arc::new(seq))
    }

    pub fn bounded_sequence_field(
        self,
        name: impl Into<String>,
        element_kind: PrimitiveKind,
        max_length: usize,
    ) -> Self {
        let seq = TypeDescriptor::sequence(primitive(element_kind), Some(max_length));
        self.field_with_type(name, Arc::new(seq))
    }

    pub fn array_field(
        self,
        name: impl Into<String>,
        element_kind: PrimitiveKind,
        length: usize,
    ) -> Self {
        let arr = TypeDescriptor::array(primitive(element_kind), length);
        self.field_with_type(name, Arc::new(arr))
    }

    /// Add a nested aggregate (struct, union or enum) field.
    pub fn nested_field(self, name: impl Into<String>, nested: Arc<TypeDescriptor>) -> Self {
        self.field_with_type(name, nested)
    }

    /// Build the TypeDescriptor.
    pub fn build(self) -> TypeDescriptor {
        TypeDescriptor::struct_type(self.name, self.extensibility, self.fields)
    }
}

/// Builder for enum types.
#[derive(Debug)]
pub struct EnumBuilder {
    name: String,
    variants: Vec<EnumVariant>,
    next_value: i64,
}

impl EnumBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            variants: Vec::new(),
            next_value: 0,
        }
    }

    /// Add a variant with auto-incrementing value.
    pub fn variant(mut self, name: impl Into<String>) -> Self {
        self.variants.push(EnumVariant::new(name, self.next_value));
        self.next_value += 1;
        self
    }

    /// Add a variant with explicit value.
    pub fn variant_value(mut self, name: impl Into<String>, value: i64) -> Self {
        self.variants.push(EnumVariant::new(name, value));
        self.next_value = value + 1;
        self
    }

    pub fn build(self) -> TypeDescriptor {
        TypeDescriptor::new(self.name, TypeKind::Enum(EnumDescriptor::new(self.variants)))
    }
}

/// Builder for union types. Extensibility defaults to Final.
#[derive(Debug)]
pub struct UnionBuilder {
    name: String,
    extensibility: Extensibility,
    discriminator: Arc<TypeDescriptor>,
    cases: Vec<UnionCase>,
    default_case: Option<UnionCase>,
}

impl UnionBuilder {
    pub fn new(name: impl Into<String>, discriminator: Arc<TypeDescriptor>) -> Self {
        Self {
            name: name.into(),
            extensibility: Extensibility::Final,
            discriminator,
            cases: Vec::new(),
            default_case: None,
        }
    }

    /// Union discriminated by an `int32`.
    pub fn with_i32_discriminator(name: impl Into<String>) -> Self {
        Self::new(name, primitive(PrimitiveKind::I32))
    }

    pub fn extensibility(mut self, extensibility: Extensibility) -> Self {
        self.extensibility = extensibility;
        self
    }

    pub fn case(
        mut self,
        name: impl Into<String>,
        label: i64,
        type_desc: Arc<TypeDescriptor>,
    ) -> Self {
        self.cases.push(UnionCase::single(name, label, type_desc));
        self
    }

    pub fn case_labels(
        mut self,
        name: impl Into<String>,
        labels: Vec<i64>,
        type_desc: Arc<TypeDescriptor>,
    ) -> Self {
        self.cases.push(UnionCase::new(name, labels, type_desc));
        self
    }

    pub fn primitive_case(self, name: impl Into<String>, label: i64, kind: PrimitiveKind) -> Self {
        self.case(name, label, primitive(kind))
    }

    pub fn default_case(mut self, name: impl Into<String>, type_desc: Arc<TypeDescriptor>) -> Self {
        self.default_case = Some(UnionCase::new(name, vec![], type_desc));
        self
    }

    pub fn build(self) -> TypeDescriptor {
        let mut union_desc = UnionDescriptor::new(self.discriminator, self.cases)
            .with_extensibility(self.extensibility);
        if let Some(default) = self.default_case {
            union_desc = union_desc.with_default(default);
        }
        TypeDescriptor::new(self.name, TypeKind::Union(union_desc))
    }
}
