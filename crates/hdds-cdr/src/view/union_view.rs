// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

use super::{scalar_at, ValueView};
use crate::dynamic::{DynamicData, DynamicValue, PrimitiveKind};
use crate::error::{CdrError, Result};
use crate::native::{NativeCase, NativeLayout, NativeShape, NativeUnion};

/// View of a native `{ _d; _u }` union.
///
/// Case accessors check the discriminator first; reading a case that is not
/// selected fails with `InvalidState`.
#[derive(Debug, Clone, Copy)]
pub struct UnionView<'a> {
    buf: &'a [u8],
    offset: usize,
    layout: &'a NativeLayout,
    union: &'a NativeUnion,
}

impl<'a> UnionView<'a> {
    pub(crate) fn at(
        buf: &'a [u8],
        offset: usize,
        layout: &'a NativeLayout,
        union: &'a NativeUnion,
    ) -> Self {
        Self {
            buf,
            offset,
            layout,
            union,
        }
    }

    pub fn discriminator(&self) -> Result<i64> {
        let (buf, at) = (self.buf, self.offset);
        let kind = match &self.union.discriminator.shape {
            NativeShape::Enum => PrimitiveKind::I32,
            NativeShape::Primitive(kind) => *kind,
            _ => {
                return Err(CdrError::InvalidDescriptor(format!(
                    "{} has a non-scalar discriminator",
                    self.layout.descriptor.name
                )))
            }
        };
        Ok(match kind {
            PrimitiveKind::Bool => i64::from(scalar_at::<bool>(buf, at)?),
            PrimitiveKind::U8 => i64::from(scalar_at::<u8>(buf, at)?),
            PrimitiveKind::I8 => i64::from(scalar_at::<i8>(buf, at)?),
            PrimitiveKind::U16 => i64::from(scalar_at::<u16>(buf, at)?),
            PrimitiveKind::I16 => i64::from(scalar_at::<i16>(buf, at)?),
            PrimitiveKind::U32 => i64::from(scalar_at::<u32>(buf, at)?),
            PrimitiveKind::I32 => i64::from(scalar_at::<i32>(buf, at)?),
            PrimitiveKind::U64 => {
                let raw = scalar_at::<u64>(buf, at)?;
                i64::try_from(raw).map_err(|_| {
                    CdrError::invalid_value(format!("discriminator {} out of range", raw))
                })?
            }
            PrimitiveKind::I64 => scalar_at::<i64>(buf, at)?,
            PrimitiveKind::F32 | PrimitiveKind::F64 => {
                return Err(CdrError::InvalidDescriptor(
                    "floating-point union discriminator".into(),
                ))
            }
        })
    }

    fn active(&self) -> Result<(i64, Option<&'a NativeCase>)> {
        let disc = self.discriminator()?;
        Ok((disc, self.union.case_for(disc)))
    }

    /// Name of the selected case; `None` when no case (and no default) matches.
    pub fn active_case(&self) -> Result<Option<&'a str>> {
        Ok(self.active()?.1.map(|c| c.name.as_str()))
    }

    /// Payload of the selected case.
    pub fn value(&self) -> Result<Option<ValueView<'a>>> {
        Ok(self.active()?.1.map(|c| self.payload(c)))
    }

    /// Payload of case `name`, which must be the selected one.
    pub fn case(&self, name: &str) -> Result<ValueView<'a>> {
        let case = self.union.case_by_name(name).ok_or_else(|| {
            CdrError::invalid_state(format!(
                "{} has no case {}",
                self.layout.descriptor.name, name
            ))
        })?;
        let (disc, active) = self.active()?;
        match active {
            Some(active) if active.name == name => Ok(self.payload(case)),
            _ => Err(CdrError::invalid_state(format!(
                "case {} of {} is not selected by discriminator {}",
                name, self.layout.descriptor.name, disc
            ))),
        }
    }

    fn payload(&self, case: &'a NativeCase) -> ValueView<'a> {
        ValueView::at(
            self.buf,
            self.offset + self.union.payload_offset,
            &case.layout,
        )
    }

    pub(crate) fn to_value(&self) -> Result<DynamicValue> {
        let (disc, active) = self.active()?;
        Ok(match active {
            Some(case) => DynamicValue::Union(
                disc,
                case.name.clone(),
                Box::new(self.payload(case).to_owned()?),
            ),
            None => DynamicValue::Union(disc, String::new(), Box::new(DynamicValue::Null)),
        })
    }

    /// Deep copy, independent of the viewed buffer.
    pub fn to_owned(&self) -> Result<DynamicData> {
        Ok(DynamicData::from_value(
            &self.layout.descriptor,
            self.to_value()?,
        )?)
    }
}
