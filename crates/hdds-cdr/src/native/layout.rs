// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! C ABI layout of the middleware's generated types.
//!
//! | Descriptor kind     | Native form                                          |
//! |---------------------|------------------------------------------------------|
//! | primitive           | natural size and alignment                           |
//! | enum                | `int32_t`                                            |
//! | string              | `char *`                                             |
//! | string<N>           | `char[N + 1]` inline                                 |
//! | struct              | C struct, members in declaration order               |
//! | optional member     | pointer to the member type                           |
//! | sequence            | `dds_sequence_t { u32 max; u32 len; T *buf; bool }`  |
//! | array               | elements inline                                      |
//! | union               | `{ disc_t _d; union { ... } _u; }`                   |

use crate::dynamic::{PrimitiveKind, TypeDescriptor, TypeKind};
use crate::error::{CdrError, Result};
use std::sync::Arc;

pub const PTR_SIZE: usize = std::mem::size_of::<usize>();
pub const PTR_ALIGN: usize = std::mem::align_of::<usize>();

const fn max(a: usize, b: usize) -> usize {
    if a > b {
        a
    } else {
        b
    }
}

/// Largest alignment any native layout requires.
pub const MAX_NATIVE_ALIGN: usize = max(
    max(std::mem::align_of::<u64>(), std::mem::align_of::<f64>()),
    PTR_ALIGN,
);

pub const SEQ_MAXIMUM_OFFSET: usize = 0;
pub const SEQ_LENGTH_OFFSET: usize = 4;
pub const SEQ_BUFFER_OFFSET: usize = align_up(8, PTR_ALIGN);
pub const SEQ_RELEASE_OFFSET: usize = SEQ_BUFFER_OFFSET + PTR_SIZE;
pub const SEQ_ALIGN: usize = max(4, PTR_ALIGN);
pub const SEQ_SIZE: usize = align_up(SEQ_RELEASE_OFFSET + 1, SEQ_ALIGN);

#[inline]
pub const fn align_up(offset: usize, align: usize) -> usize {
    (offset + align - 1) / align * align
}

const fn primitive_align(kind: PrimitiveKind) -> usize {
    match kind {
        PrimitiveKind::Bool | PrimitiveKind::U8 | PrimitiveKind::I8 => 1,
        PrimitiveKind::U16 | PrimitiveKind::I16 => std::mem::align_of::<u16>(),
        PrimitiveKind::U32 | PrimitiveKind::I32 => std::mem::align_of::<u32>(),
        PrimitiveKind::F32 => std::mem::align_of::<f32>(),
        PrimitiveKind::U64 | PrimitiveKind::I64 => std::mem::align_of::<u64>(),
        PrimitiveKind::F64 => std::mem::align_of::<f64>(),
    }
}

/// Size, alignment and shape of one native value.
#[derive(Debug, Clone, PartialEq)]
pub struct NativeLayout {
    pub descriptor: Arc<TypeDescriptor>,
    pub size: usize,
    pub align: usize,
    pub shape: NativeShape,
}

#[derive(Debug, Clone, PartialEq)]
pub enum NativeShape {
    Primitive(PrimitiveKind),
    Enum,
    /// `char *`
    String,
    /// `char[bound + 1]`
    BoundedString { bound: usize },
    Struct(Vec<NativeField>),
    Union(NativeUnion),
    Sequence {
        element: Box<NativeLayout>,
        bound: Option<usize>,
    },
    Array {
        element: Box<NativeLayout>,
        length: usize,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub struct NativeField {
    pub name: String,
    pub offset: usize,
    /// Stored behind a pointer; `layout` describes the pointee.
    pub optional: bool,
    pub layout: NativeLayout,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NativeUnion {
    pub discriminator: Box<NativeLayout>,
    /// Offset of the case storage (`_u`).
    pub payload_offset: usize,
    pub cases: Vec<NativeCase>,
    /// Index into `cases` of the default arm.
    pub default_case: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NativeCase {
    pub name: String,
    pub labels: Vec<i64>,
    pub layout: NativeLayout,
}

impl NativeUnion {
    /// Case selected by `disc`, falling back to the default arm.
    pub fn case_for(&self, disc: i64) -> Option<&NativeCase> {
        self.cases
            .iter()
            .enumerate()
            .find(|(i, c)| Some(*i) != self.default_case && c.labels.contains(&disc))
            .map(|(_, c)| c)
            .or_else(|| self.default_case.and_then(|i| self.cases.get(i)))
    }

    pub fn case_by_name(&self, name: &str) -> Option<&NativeCase> {
        self.cases.iter().find(|c| c.name == name)
    }
}

impl NativeLayout {
    /// Compute the layout of a validated descriptor.
    pub fn of(desc: &Arc<TypeDescriptor>) -> Result<Self> {
        desc.validate()?;
        Self::build(desc)
    }

    fn leaf(desc: &Arc<TypeDescriptor>, size: usize, align: usize, shape: NativeShape) -> Self {
        Self {
            descriptor: desc.clone(),
            size,
            align,
            shape,
        }
    }

    fn build(desc: &Arc<TypeDescriptor>) -> Result<Self> {
        let layout = match &desc.kind {
            TypeKind::Primitive(kind) => Self::leaf(
                desc,
                kind.size(),
                primitive_align(*kind),
                NativeShape::Primitive(*kind),
            ),
            TypeKind::Enum(_) => {
                let align = primitive_align(PrimitiveKind::I32);
                Self::leaf(desc, 4, align, NativeShape::Enum)
            }
            TypeKind::String { bound: None } => {
                Self::leaf(desc, PTR_SIZE, PTR_ALIGN, NativeShape::String)
            }
            TypeKind::String { bound: Some(bound) } => Self::leaf(
                desc,
                bound + 1,
                1,
                NativeShape::BoundedString { bound: *bound },
            ),
            TypeKind::Struct(s) => {
                let mut offset = 0;
                let mut align = 1;
                let mut fields = Vec::with_capacity(s.fields().len());
                for field in s.fields() {
                    let layout = Self::build(&field.type_desc)?;
                    let (size, field_align) = if field.optional {
                        (PTR_SIZE, PTR_ALIGN)
                    } else {
                        (layout.size, layout.align)
                    };
                    offset = align_up(offset, field_align);
                    fields.push(NativeField {
                        name: field.name.clone(),
                        offset,
                        optional: field.optional,
                        layout,
                    });
                    offset += size;
                    align = align.max(field_align);
                }
                Self::leaf(
                    desc,
                    align_up(offset, align),
                    align,
                    NativeShape::Struct(fields),
                )
            }
            TypeKind::Union(u) => {
                let discriminator = Self::build(&u.discriminator)?;
                let mut cases = Vec::with_capacity(u.cases.len() + 1);
                for case in u.all_cases() {
                    cases.push(NativeCase {
                        name: case.name.clone(),
                        labels: case.labels.clone(),
                        layout: Self::build(&case.type_desc)?,
                    });
                }
                let payload_align = cases.iter().map(|c| c.layout.align).max().unwrap_or(1);
                let payload_size = cases.iter().map(|c| c.layout.size).max().unwrap_or(0);
                let payload_offset = align_up(discriminator.size, payload_align);
                let align = discriminator.align.max(payload_align);
                let default_case = u.default_case.as_ref().map(|_| cases.len() - 1);
                Self::leaf(
                    desc,
                    align_up(payload_offset + payload_size, align),
                    align,
                    NativeShape::Union(NativeUnion {
                        discriminator: Box::new(discriminator),
                        payload_offset,
                        cases,
                        default_case,
                    }),
                )
            }
            TypeKind::Sequence(seq) => Self::leaf(
                desc,
                SEQ_SIZE,
                SEQ_ALIGN,
                NativeShape::Sequence {
                    element: Box::new(Self::build(&seq.element_type)?),
                    bound: seq.max_length,
                },
            ),
            TypeKind::Array(arr) => {
                let element = Self::build(&arr.element_type)?;
                let size = element.size.checked_mul(arr.length).ok_or_else(|| {
                    CdrError::InvalidDescriptor(format!("{}: array too large", desc.name))
                })?;
                let align = element.align;
                Self::leaf(
                    desc,
                    size,
                    align,
                    NativeShape::Array {
                        element: Box::new(element),
                        length: arr.length,
                    },
                )
            }
        };
        Ok(layout)
    }

    pub fn fields(&self) -> Option<&[NativeField]> {
        match &self.shape {
            NativeShape::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn field(&self, name: &str) -> Option<&NativeField> {
        self.fields()?.iter().find(|f| f.name == name)
    }
}
