// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field layout descriptors.
//!
//! A [`TypeDescriptor`] is immutable once built and shared through `Arc`.
//! Both the CDR codec and the native layout engine read it; neither mutates it.

use crate::encoding::Extensibility;
use crate::error::{CdrError, Result};
use crate::xtypes::LengthCode;
use std::collections::HashSet;
use std::sync::Arc;

/// Primitive type kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    U8,
    I8,
    U16,
    I16,
    U32,
    I32,
    U64,
    I64,
    F32,
    F64,
}

impl PrimitiveKind {
    /// Size in bytes, on the wire and in native memory.
    pub const fn size(self) -> usize {
        match self {
            Self::Bool | Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
            Self::U64 | Self::I64 | Self::F64 => 8,
        }
    }

    /// Integral kinds (and bool) can discriminate unions.
    pub const fn is_integral(self) -> bool {
        !matches!(self, Self::F32 | Self::F64)
    }

    pub const fn idl_name(self) -> &'static str {
        match self {
            Self::Bool => "boolean",
            Self::U8 => "uint8",
            Self::I8 => "int8",
            Self::U16 => "uint16",
            Self::I16 => "int16",
            Self::U32 => "uint32",
            Self::I32 => "int32",
            Self::U64 => "uint64",
            Self::I64 => "int64",
            Self::F32 => "float32",
            Self::F64 => "float64",
        }
    }
}

/// Type kind enumeration.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    Primitive(PrimitiveKind),
    /// 32-bit enumeration.
    Enum(EnumDescriptor),
    /// UTF-8 string, optionally bounded (bytes, terminator excluded).
    String { bound: Option<usize> },
    Struct(StructDescriptor),
    Union(UnionDescriptor),
    Sequence(SequenceDescriptor),
    Array(ArrayDescriptor),
}

/// A complete type descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    pub name: String,
    pub kind: TypeKind,
}

impl TypeDescriptor {
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    pub fn primitive(name: impl Into<String>, kind: PrimitiveKind) -> Self {
        Self::new(name, TypeKind::Primitive(kind))
    }

    pub fn string(bound: Option<usize>) -> Self {
        let name = match bound {
            Some(bound) => format!("string<{}>", bound),
            None => String::from("string"),
        };
        Self::new(name, TypeKind::String { bound })
    }

    pub fn sequence(element_type: Arc<TypeDescriptor>, bound: Option<usize>) -> Self {
        let name = match bound {
            Some(bound) => format!("sequence<{}, {}>", element_type.name, bound),
            None => format!("sequence<{}>", element_type.name),
        };
        Self::new(
            name,
            TypeKind::Sequence(SequenceDescriptor {
                element_type,
                max_length: bound,
            }),
        )
    }

    pub fn array(element_type: Arc<TypeDescriptor>, length: usize) -> Self {
        let name = format!("{}[{}]", element_type.name, length);
        Self::new(name, TypeKind::Array(ArrayDescriptor::new(element_type, length)))
    }

    pub fn struct_type(
        name: impl Into<String>,
        extensibility: Extensibility,
        fields: Vec<FieldDescriptor>,
    ) -> Self {
        Self::new(
            name,
            TypeKind::Struct(StructDescriptor::new(extensibility, fields)),
        )
    }

    pub fn is_primitive(&self) -> bool {
        matches!(self.kind, TypeKind::Primitive(_))
    }

    pub fn is_struct(&self) -> bool {
        matches!(self.kind, TypeKind::Struct(_))
    }

    pub fn as_struct(&self) -> Option<&StructDescriptor> {
        match &self.kind {
            TypeKind::Struct(desc) => Some(desc),
            _ => None,
        }
    }

    pub fn as_union(&self) -> Option<&UnionDescriptor> {
        match &self.kind {
            TypeKind::Union(desc) => Some(desc),
            _ => None,
        }
    }

    /// Get fields if this is a struct.
    pub fn fields(&self) -> Option<&[FieldDescriptor]> {
        self.as_struct().map(StructDescriptor::fields)
    }

    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields()?.iter().find(|f| f.name == name)
    }

    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields()?.iter().position(|f| f.name == name)
    }

    /// Extensibility of aggregates; `None` for everything else.
    pub fn extensibility(&self) -> Option<Extensibility> {
        match &self.kind {
            TypeKind::Struct(desc) => Some(desc.extensibility),
            TypeKind::Union(desc) => Some(desc.extensibility),
            _ => None,
        }
    }

    /// Wire width when the type is a single primitive or an enum.
    pub fn primitive_width(&self) -> Option<usize> {
        match &self.kind {
            TypeKind::Primitive(kind) => Some(kind.size()),
            TypeKind::Enum(_) => Some(4),
            _ => None,
        }
    }

    /// EMHEADER length code of a mutable member of this type, matching what
    /// derived types pick for the same wire shape.
    pub fn length_code(&self) -> LengthCode {
        match &self.kind {
            TypeKind::Primitive(_) | TypeKind::Enum(_) => {
                LengthCode::for_member(self.primitive_width())
            }
            TypeKind::String { .. } => LengthCode::NextIntBytes,
            TypeKind::Sequence(desc) => {
                LengthCode::for_sequence(desc.element_type.primitive_width())
            }
            TypeKind::Array(desc) => {
                LengthCode::for_array(desc.element_type.primitive_width(), desc.length)
            }
            TypeKind::Struct(_) | TypeKind::Union(_) => LengthCode::NextInt,
        }
    }

    /// Check the descriptor for inconsistencies, recursively.
    pub fn validate(&self) -> Result<()> {
        match &self.kind {
            TypeKind::Primitive(_) | TypeKind::String { .. } => Ok(()),
            TypeKind::Enum(desc) => {
                let mut seen = HashSet::new();
                for variant in &desc.variants {
                    if i32::try_from(variant.value).is_err() {
                        return Err(self.invalid(format!(
                            "enumerator {} = {} does not fit 32 bits",
                            variant.name, variant.value
                        )));
                    }
                    if !seen.insert(variant.value) {
                        return Err(self.invalid(format!(
                            "duplicate enumerator value {}",
                            variant.value
                        )));
                    }
                }
                Ok(())
            }
            TypeKind::Struct(desc) => {
                let mut ids = HashSet::new();
                let mut names = HashSet::new();
                for field in desc.fields() {
                    if !ids.insert(field.member_id()) {
                        return Err(self.invalid(format!(
                            "duplicate member id {} ({})",
                            field.member_id(),
                            field.name
                        )));
                    }
                    if !names.insert(field.name.as_str()) {
                        return Err(self.invalid(format!("duplicate member name {}", field.name)));
                    }
                    field.type_desc.validate()?;
                }
                Ok(())
            }
            TypeKind::Union(desc) => {
                if desc.extensibility == Extensibility::Mutable {
                    return Err(self.invalid("mutable unions are not supported"));
                }
                let integral = match &desc.discriminator.kind {
                    TypeKind::Primitive(kind) => kind.is_integral(),
                    TypeKind::Enum(_) => true,
                    _ => false,
                };
                if !integral {
                    return Err(self.invalid(format!(
                        "discriminator {} is not integral",
                        desc.discriminator.name
                    )));
                }
                let mut labels = HashSet::new();
                for case in desc.cases.iter().chain(desc.default_case.as_deref()) {
                    for label in &case.labels {
                        if !labels.insert(*label) {
                            return Err(self.invalid(format!("duplicate case label {}", label)));
                        }
                    }
                    case.type_desc.validate()?;
                }
                Ok(())
            }
            TypeKind::Sequence(desc) => desc.element_type.validate(),
            TypeKind::Array(desc) => {
                if desc.length == 0 {
                    return Err(self.invalid("zero-length array"));
                }
                desc.element_type.validate()
            }
        }
    }

    fn invalid(&self, reason: impl std::fmt::Display) -> CdrError {
        CdrError::InvalidDescriptor(format!("{}: {}", self.name, reason))
    }
}

/// Struct layout: extensibility plus ordered members.
#[derive(Debug, Clone, PartialEq)]
pub struct StructDescriptor {
    pub extensibility: Extensibility,
    fields: Vec<FieldDescriptor>,
}

impl StructDescriptor {
    /// Members without an explicit id get the previous member's id plus one
    /// (the first one gets 0).
    pub fn new(extensibility: Extensibility, mut fields: Vec<FieldDescriptor>) -> Self {
        let mut next_id = 0u32;
        for field in &mut fields {
            let id = *field.id.get_or_insert(next_id);
            next_id = id.wrapping_add(1);
        }
        Self {
            extensibility,
            fields,
        }
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn field_by_id(&self, member_id: u32) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.member_id() == member_id)
    }
}

/// Field descriptor for struct members.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub type_desc: Arc<TypeDescriptor>,
    /// Member id; assigned sequentially by [`StructDescriptor::new`] when unset.
    pub id: Option<u32>,
    /// `@optional`
    pub optional: bool,
    /// `@key`; sets the must-understand flag in mutable encodings.
    pub key: bool,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, type_desc: Arc<TypeDescriptor>) -> Self {
        Self {
            name: name.into(),
            type_desc,
            id: None,
            optional: false,
            key: false,
        }
    }

    pub fn with_id(mut self, id: u32) -> Self {
        self.id = Some(id);
        self
    }

    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    pub fn key(mut self) -> Self {
        self.key = true;
        self
    }

    pub fn member_id(&self) -> u32 {
        self.id.unwrap_or_default()
    }
}

/// Sequence type descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceDescriptor {
    pub element_type: Arc<TypeDescriptor>,
    /// Maximum length (None = unbounded).
    pub max_length: Option<usize>,
}

impl SequenceDescriptor {
    pub fn unbounded(element_type: Arc<TypeDescriptor>) -> Self {
        Self {
            element_type,
            max_length: None,
        }
    }

    pub fn bounded(element_type: Arc<TypeDescriptor>, max_length: usize) -> Self {
        Self {
            element_type,
            max_length: Some(max_length),
        }
    }
}

/// Array type descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct ArrayDescriptor {
    pub element_type: Arc<TypeDescriptor>,
    pub length: usize,
}

impl ArrayDescriptor {
    pub fn new(element_type: Arc<TypeDescriptor>, length: usize) -> Self {
        Self {
            element_type,
            length,
        }
    }
}

/// Enumeration type descriptor (always 32 bits on the wire and in memory).
#[derive(Debug, Clone, PartialEq)]
pub struct EnumDescriptor {
    pub variants: Vec<EnumVariant>,
}

impl EnumDescriptor {
    pub fn new(variants: Vec<EnumVariant>) -> Self {
        Self { variants }
    }

    pub fn variant(&self, name: &str) -> Option<&EnumVariant> {
        self.variants.iter().find(|v| v.name == name)
    }

    pub fn variant_by_value(&self, value: i64) -> Option<&EnumVariant> {
        self.variants.iter().find(|v| v.value == value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EnumVariant {
    pub name: String,
    pub value: i64,
}

impl EnumVariant {
    pub fn new(name: impl Into<String>, value: i64) -> Self {
        Self {
            name: name.into(),
            value,
        }
    }
}

/// Union type descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionDescriptor {
    /// Final or Appendable.
    pub extensibility: Extensibility,
    pub discriminator: Arc<TypeDescriptor>,
    pub cases: Vec<UnionCase>,
    pub default_case: Option<Box<UnionCase>>,
}

impl UnionDescriptor {
    pub fn new(discriminator: Arc<TypeDescriptor>, cases: Vec<UnionCase>) -> Self {
        Self {
            extensibility: Extensibility::Final,
            discriminator,
            cases,
            default_case: None,
        }
    }

    pub fn with_default(mut self, case: UnionCase) -> Self {
        self.default_case = Some(Box::new(case));
        self
    }

    pub fn with_extensibility(mut self, extensibility: Extensibility) -> Self {
        self.extensibility = extensibility;
        self
    }

    /// Case selected by a discriminator value, falling back to the default arm.
    pub fn case_by_discriminator(&self, value: i64) -> Option<&UnionCase> {
        self.cases
            .iter()
            .find(|c| c.labels.contains(&value))
            .or(self.default_case.as_deref())
    }

    pub fn case_by_name(&self, name: &str) -> Option<&UnionCase> {
        self.cases
            .iter()
            .chain(self.default_case.as_deref())
            .find(|c| c.name == name)
    }

    /// All arms, default last.
    pub fn all_cases(&self) -> impl Iterator<Item = &UnionCase> {
        self.cases.iter().chain(self.default_case.as_deref())
    }
}

/// Union case.
#[derive(Debug, Clone, PartialEq)]
pub struct UnionCase {
    pub name: String,
    /// Discriminator labels for this case (empty for the default arm).
    pub labels: Vec<i64>,
    pub type_desc: Arc<TypeDescriptor>,
}

impl UnionCase {
    pub fn new(name: impl Into<String>, labels: Vec<i64>, type_desc: Arc<TypeDescriptor>) -> Self {
        Self {
            name: name.into(),
            labels,
            type_desc,
        }
    }

    pub fn single(name: impl Into<String>, label: i64, type_desc: Arc<TypeDescriptor>) -> Self {
        Self::new(name, vec![label], type_desc)
    }
}
