// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! DynamicData container for runtime data manipulation.

use crate::dynamic::{DynamicValue, PrimitiveKind, TypeDescriptor, TypeKind};
use crate::error::CdrError;
use std::sync::Arc;

/// Errors for DynamicData operations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DynamicDataError {
    #[error("Field not found: {0}")]
    FieldNotFound(String),
    #[error("Type mismatch at {path}: expected {expected}, got {got}")]
    TypeMismatch {
        path: String,
        expected: String,
        got: String,
    },
    #[error("Invalid operation for type: {0}")]
    InvalidOperation(String),
    #[error("Index out of bounds: {index} >= {length}")]
    IndexOutOfBounds { index: usize, length: usize },
    #[error("Length of {path} exceeds maximum: {length} > {max}")]
    TooLong {
        path: String,
        length: usize,
        max: usize,
    },
}

impl From<DynamicDataError> for CdrError {
    fn from(err: DynamicDataError) -> Self {
        CdrError::InvalidValue(err.to_string())
    }
}

/// A value paired with the descriptor it conforms to.
#[derive(Debug, Clone)]
pub struct DynamicData {
    descriptor: Arc<TypeDescriptor>,
    value: DynamicValue,
}

impl DynamicData {
    /// Create new DynamicData with default values.
    pub fn new(descriptor: &Arc<TypeDescriptor>) -> Self {
        Self {
            descriptor: descriptor.clone(),
            value: DynamicValue::default_for(descriptor),
        }
    }

    /// Wrap an existing value after checking it against the descriptor.
    pub fn from_value(
        descriptor: &Arc<TypeDescriptor>,
        value: DynamicValue,
    ) -> Result<Self, DynamicDataError> {
        check_value(descriptor, &value, &descriptor.name)?;
        Ok(Self {
            descriptor: descriptor.clone(),
            value,
        })
    }

    pub fn descriptor(&self) -> &Arc<TypeDescriptor> {
        &self.descriptor
    }

    pub fn type_name(&self) -> &str {
        &self.descriptor.name
    }

    pub fn value(&self) -> &DynamicValue {
        &self.value
    }

    /// Mutable access to the value. Nothing is re-checked until encoding.
    pub fn value_mut(&mut self) -> &mut DynamicValue {
        &mut self.value
    }

    pub fn into_value(self) -> DynamicValue {
        self.value
    }

    /// Check the current value against the descriptor.
    pub fn validate(&self) -> Result<(), DynamicDataError> {
        check_value(&self.descriptor, &self.value, &self.descriptor.name)
    }

    /// Get a field value by name.
    pub fn get<T: FromDynamicValue>(&self, name: &str) -> Result<T, DynamicDataError> {
        T::from_dynamic(self.get_field(name)?)
    }

    /// Set a field value by name; the value must match the field's type.
    pub fn set<T: IntoDynamicValue>(
        &mut self,
        name: &str,
        value: T,
    ) -> Result<(), DynamicDataError> {
        let field = self
            .descriptor
            .field(name)
            .ok_or_else(|| DynamicDataError::FieldNotFound(name.to_string()))?;

        let dyn_value = value.into_dynamic();
        if !(field.optional && dyn_value.is_null()) {
            check_value(&field.type_desc, &dyn_value, name)?;
        }

        match &mut self.value {
            DynamicValue::Struct(fields) => {
                fields.insert(name.to_string(), dyn_value);
                Ok(())
            }
            _ => Err(DynamicDataError::InvalidOperation(
                "set requires struct type".into(),
            )),
        }
    }

    pub fn get_field(&self, name: &str) -> Result<&DynamicValue, DynamicDataError> {
        if self.descriptor.field(name).is_none() {
            return Err(DynamicDataError::FieldNotFound(name.to_string()));
        }

        match &self.value {
            DynamicValue::Struct(fields) => fields
                .get(name)
                .ok_or_else(|| DynamicDataError::FieldNotFound(name.to_string())),
            _ => Err(DynamicDataError::InvalidOperation(
                "get_field requires struct type".into(),
            )),
        }
    }

    pub fn get_field_mut(&mut self, name: &str) -> Result<&mut DynamicValue, DynamicDataError> {
        if self.descriptor.field(name).is_none() {
            return Err(DynamicDataError::FieldNotFound(name.to_string()));
        }

        match &mut self.value {
            DynamicValue::Struct(fields) => fields
                .get_mut(name)
                .ok_or_else(|| DynamicDataError::FieldNotFound(name.to_string())),
            _ => Err(DynamicDataError::InvalidOperation(
                "get_field_mut requires struct type".into(),
            )),
        }
    }

    pub fn get_element(&self, index: usize) -> Result<&DynamicValue, DynamicDataError> {
        match &self.value {
            DynamicValue::Sequence(seq) | DynamicValue::Array(seq) => {
                seq.get(index).ok_or(DynamicDataError::IndexOutOfBounds {
                    index,
                    length: seq.len(),
                })
            }
            _ => Err(DynamicDataError::InvalidOperation(
                "get_element requires sequence/array type".into(),
            )),
        }
    }

    pub fn set_element(
        &mut self,
        index: usize,
        value: DynamicValue,
    ) -> Result<(), DynamicDataError> {
        match &mut self.value {
            DynamicValue::Sequence(seq) | DynamicValue::Array(seq) => {
                let length = seq.len();
                let slot = seq
                    .get_mut(index)
                    .ok_or(DynamicDataError::IndexOutOfBounds { index, length })?;
                *slot = value;
                Ok(())
            }
            _ => Err(DynamicDataError::InvalidOperation(
                "set_element requires sequence/array type".into(),
            )),
        }
    }

    /// Push element to a sequence, honoring its bound.
    pub fn push_element(&mut self, value: DynamicValue) -> Result<(), DynamicDataError> {
        match &mut self.value {
            DynamicValue::Sequence(seq) => {
                if let TypeKind::Sequence(desc) = &self.descriptor.kind {
                    if let Some(max) = desc.max_length {
                        if seq.len() >= max {
                            return Err(DynamicDataError::TooLong {
                                path: self.descriptor.name.clone(),
                                length: seq.len() + 1,
                                max,
                            });
                        }
                    }
                }
                seq.push(value);
                Ok(())
            }
            _ => Err(DynamicDataError::InvalidOperation(
                "push_element requires sequence type".into(),
            )),
        }
    }

    pub fn len(&self) -> Result<usize, DynamicDataError> {
        match &self.value {
            DynamicValue::Sequence(seq) | DynamicValue::Array(seq) => Ok(seq.len()),
            _ => Err(DynamicDataError::InvalidOperation(
                "len requires sequence/array type".into(),
            )),
        }
    }

    pub fn is_empty(&self) -> Result<bool, DynamicDataError> {
        self.len().map(|l| l == 0)
    }

    /// Iterate over fields (for structs).
    pub fn fields(&self) -> impl Iterator<Item = (&str, &DynamicValue)> {
        match &self.value {
            DynamicValue::Struct(fields) => {
                Box::new(fields.iter().map(|(k, v)| (k.as_str(), v))) as Box<dyn Iterator<Item = _>>
            }
            _ => Box::new(std::iter::empty()),
        }
    }

    /// Iterate over elements (for sequences/arrays).
    pub fn elements(&self) -> impl Iterator<Item = &DynamicValue> {
        match &self.value {
            DynamicValue::Sequence(seq) | DynamicValue::Array(seq) => {
                Box::new(seq.iter()) as Box<dyn Iterator<Item = _>>
            }
            _ => Box::new(std::iter::empty()),
        }
    }
}

impl PartialEq for DynamicData {
    fn eq(&self, other: &Self) -> bool {
        self.descriptor.name == other.descriptor.name && self.value == other.value
    }
}

fn mismatch(path: &str, expected: impl Into<String>, got: &DynamicValue) -> DynamicDataError {
    DynamicDataError::TypeMismatch {
        path: path.to_string(),
        expected: expected.into(),
        got: got.kind_name().to_string(),
    }
}

fn primitive_matches(kind: PrimitiveKind, value: &DynamicValue) -> bool {
    matches!(
        (kind, value),
        (PrimitiveKind::Bool, DynamicValue::Bool(_))
            | (PrimitiveKind::U8, DynamicValue::U8(_))
            | (PrimitiveKind::I8, DynamicValue::I8(_))
            | (PrimitiveKind::U16, DynamicValue::U16(_))
            | (PrimitiveKind::I16, DynamicValue::I16(_))
            | (PrimitiveKind::U32, DynamicValue::U32(_))
            | (PrimitiveKind::I32, DynamicValue::I32(_))
            | (PrimitiveKind::U64, DynamicValue::U64(_))
            | (PrimitiveKind::I64, DynamicValue::I64(_))
            | (PrimitiveKind::F32, DynamicValue::F32(_))
            | (PrimitiveKind::F64, DynamicValue::F64(_))
    )
}

fn check_bound(path: &str, length: usize, bound: Option<usize>) -> Result<(), DynamicDataError> {
    match bound {
        Some(max) if length > max => Err(DynamicDataError::TooLong {
            path: path.to_string(),
            length,
            max,
        }),
        _ => Ok(()),
    }
}

/// Check that `value` has the shape `desc` describes.
pub(crate) fn check_value(
    desc: &TypeDescriptor,
    value: &DynamicValue,
    path: &str,
) -> Result<(), DynamicDataError> {
    match (&desc.kind, value) {
        (TypeKind::Primitive(kind), _) => {
            if primitive_matches(*kind, value) {
                Ok(())
            } else {
                Err(mismatch(path, kind.idl_name(), value))
            }
        }
        (TypeKind::String { bound }, DynamicValue::String(s)) => check_bound(path, s.len(), *bound),
        (TypeKind::Enum(_), DynamicValue::Enum(v, _)) => {
            if i32::try_from(*v).is_ok() {
                Ok(())
            } else {
                Err(DynamicDataError::InvalidOperation(format!(
                    "{}: enumerator {} does not fit 32 bits",
                    path, v
                )))
            }
        }
        (TypeKind::Struct(s), DynamicValue::Struct(fields)) => {
            for field in s.fields() {
                let field_path = format!("{}.{}", path, field.name);
                match fields.get(&field.name) {
                    None | Some(DynamicValue::Null) if field.optional => {}
                    None => return Err(DynamicDataError::FieldNotFound(field_path)),
                    Some(v) => check_value(&field.type_desc, v, &field_path)?,
                }
            }
            match fields.keys().find(|name| desc.field(name).is_none()) {
                Some(unknown) => Err(DynamicDataError::FieldNotFound(format!(
                    "{}.{}",
                    path, unknown
                ))),
                None => Ok(()),
            }
        }
        (TypeKind::Sequence(seq), DynamicValue::Sequence(items)) => {
            check_bound(path, items.len(), seq.max_length)?;
            check_elements(&seq.element_type, items, path)
        }
        (TypeKind::Array(arr), DynamicValue::Array(items)) => {
            if items.len() != arr.length {
                return Err(mismatch(
                    path,
                    format!("array of {} elements", arr.length),
                    value,
                ));
            }
            check_elements(&arr.element_type, items, path)
        }
        (TypeKind::Union(u), DynamicValue::Union(disc, _, inner)) => {
            match u.case_by_discriminator(*disc) {
                Some(case) => check_value(&case.type_desc, inner, &format!("{}.{}", path, case.name)),
                None if inner.is_null() => Ok(()),
                None => Err(mismatch(path, "no active member", inner)),
            }
        }
        (TypeKind::String { .. }, _) => Err(mismatch(path, "string", value)),
        (TypeKind::Enum(_), _) => Err(mismatch(path, "enum", value)),
        (TypeKind::Struct(_), _) => Err(mismatch(path, "struct", value)),
        (TypeKind::Sequence(_), _) => Err(mismatch(path, "sequence", value)),
        (TypeKind::Array(_), _) => Err(mismatch(path, "array", value)),
        (TypeKind::Union(_), _) => Err(mismatch(path, "union", value)),
    }
}

fn check_elements(
    element_type: &TypeDescriptor,
    items: &[DynamicValue],
    path: &str,
) -> Result<(), DynamicDataError> {
    items
        .iter()
        .enumerate()
        .try_for_each(|(i, item)| check_value(element_type, item, &format!("{}[{}]", path, i)))
}

/// Trait for converting from DynamicValue.
pub trait FromDynamicValue: Sized {
    fn from_dynamic(value: &DynamicValue) -> Result<Self, DynamicDataError>;
}

/// Trait for converting to DynamicValue.
pub trait IntoDynamicValue {
    fn into_dynamic(self) -> DynamicValue;
}

macro_rules! impl_from_dynamic {
    ($ty:ty, $variant:ident, $name:expr) => {
        impl FromDynamicValue for $ty {
            fn from_dynamic(value: &DynamicValue) -> Result<Self, DynamicDataError> {
                match value {
                    DynamicValue::$variant(v) => Ok(*v),
                    other => Err(mismatch("value", $name, other)),
                }
            }
        }
    };
}

impl_from_dynamic!(bool, Bool, "boolean");
impl_from_dynamic!(u8, U8, "uint8");
impl_from_dynamic!(u16, U16, "uint16");
impl_from_dynamic!(u32, U32, "uint32");
impl_from_dynamic!(u64, U64, "uint64");
impl_from_dynamic!(i8, I8, "int8");
impl_from_dynamic!(i16, I16, "int16");
impl_from_dynamic!(i32, I32, "int32");
impl_from_dynamic!(i64, I64, "int64");
impl_from_dynamic!(f32, F32, "float32");
impl_from_dynamic!(f64, F64, "float64");

impl FromDynamicValue for String {
    fn from_dynamic(value: &DynamicValue) -> Result<Self, DynamicDataError> {
        match value {
            DynamicValue::String(s) => Ok(s.clone()),
            other => Err(mismatch("value", "string", other)),
        }
    }
}

impl<T: FromDynamicValue> FromDynamicValue for Option<T> {
    fn from_dynamic(value: &DynamicValue) -> Result<Self, DynamicDataError> {
        match value {
            DynamicValue::Null => Ok(None),
            other => T::from_dynamic(other).map(Some),
        }
    }
}

impl FromDynamicValue for DynamicValue {
    fn from_dynamic(value: &DynamicValue) -> Result<Self, DynamicDataError> {
        Ok(value.clone())
    }
}

macro_rules! impl_into_dynamic {
    ($ty:ty, $variant:ident) => {
        impl IntoDynamicValue for $ty {
            fn into_dynamic(self) -> DynamicValue {
                DynamicValue::$variant(self)
            }
        }
    };
}

impl_into_dynamic!(bool, Bool);
impl_into_dynamic!(u8, U8);
impl_into_dynamic!(u16, U16);
impl_into_dynamic!(u32, U32);
impl_into_dynamic!(u64, U64);
impl_into_dynamic!(i8, I8);
impl_into_dynamic!(i16, I16);
impl_into_dynamic!(i32, I32);
impl_into_dynamic!(i64, I64);
impl_into_dynamic!(f32, F32);
impl_into_dynamic!(f64, F64);
impl_into_dynamic!(String, String);

impl IntoDynamicValue for &str {
    fn into_dynamic(self) -> DynamicValue {
        DynamicValue::String(self.to_string())
    }
}

impl IntoDynamicValue for DynamicValue {
    fn into_dynamic(self) -> DynamicValue {
        self
    }
}

impl<T: IntoDynamicValue> IntoDynamicValue for Option<T> {
    fn into_dynamic(self) -> DynamicValue {
        self.map_or(DynamicValue::Null, IntoDynamicValue::into_dynamic)
    }
}
