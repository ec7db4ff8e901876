// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Encoding modes, extensibility kinds and the encapsulation header.
//!
//! Every top-level sample is preceded by a 4-byte encapsulation header:
//!
//! ```text
//! byte 0      byte 1        byte 2..3
//! [ 0x00 ] [ identifier ] [ options (BE u16) ]
//! ```
//!
//! The identifier selects the XCDR1 or XCDR2 family and the endianness. For
//! XCDR2 the two low option bits carry the number of padding bytes appended to
//! round the payload up to a multiple of 4.

use crate::error::{CdrError, Result};

/// Size of the encapsulation header in bytes.
pub const ENCAPSULATION_HEADER_SIZE: usize = 4;

/// CDR revision. Fixed for the lifetime of one codec instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config-loaders", derive(serde::Deserialize))]
#[cfg_attr(feature = "config-loaders", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
pub enum EncodingMode {
    /// Classic CDR: primitives align to their natural width (up to 8).
    Xcdr1,
    /// Extended CDR (XTypes 1.3): primitives align to at most 4.
    #[default]
    Xcdr2,
}

impl EncodingMode {
    /// Largest alignment any primitive gets under this mode.
    #[inline]
    pub const fn max_alignment(self) -> usize {
        match self {
            Self::Xcdr1 => 8,
            Self::Xcdr2 => 4,
        }
    }

    /// Alignment applied before a primitive of `width` bytes.
    #[inline]
    pub const fn alignment_for(self, width: usize) -> usize {
        let max = self.max_alignment();
        if width == 0 {
            1
        } else if width < max {
            width
        } else {
            max
        }
    }

    /// Whether aggregates of this extensibility carry a DHEADER in this mode.
    #[inline]
    pub const fn uses_dheader(self, ext: Extensibility) -> bool {
        match self {
            Self::Xcdr1 => false,
            Self::Xcdr2 => !matches!(ext, Extensibility::Final),
        }
    }
}

/// Schema-evolution compatibility class of an aggregate type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Extensibility {
    /// Positional members, no header. Any layout change breaks the wire format.
    Final,
    /// DHEADER-delimited; members may be appended.
    #[default]
    Appendable,
    /// Every member tagged with its id; members may be added, removed, reordered.
    Mutable,
}

/// Encapsulation identifiers (byte 1 of the header).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u16)]
pub enum EncapsulationKind {
    CdrBe = 0x0000,
    CdrLe = 0x0001,
    PlCdrBe = 0x0002,
    PlCdrLe = 0x0003,
    Cdr2Be = 0x0006,
    Cdr2Le = 0x0007,
    DCdr2Be = 0x0008,
    DCdr2Le = 0x0009,
    PlCdr2Be = 0x000a,
    PlCdr2Le = 0x000b,
}

impl EncapsulationKind {
    /// Little-endian identifier for a top-level type of the given extensibility.
    pub const fn for_type(mode: EncodingMode, ext: Extensibility) -> Self {
        match (mode, ext) {
            (EncodingMode::Xcdr1, Extensibility::Mutable) => Self::PlCdrLe,
            (EncodingMode::Xcdr1, _) => Self::CdrLe,
            (EncodingMode::Xcdr2, Extensibility::Final) => Self::Cdr2Le,
            (EncodingMode::Xcdr2, Extensibility::Appendable) => Self::DCdr2Le,
            (EncodingMode::Xcdr2, Extensibility::Mutable) => Self::PlCdr2Le,
        }
    }

    pub fn from_u16(value: u16) -> Result<Self> {
        Ok(match value {
            0x0000 => Self::CdrBe,
            0x0001 => Self::CdrLe,
            0x0002 => Self::PlCdrBe,
            0x0003 => Self::PlCdrLe,
            0x0006 => Self::Cdr2Be,
            0x0007 => Self::Cdr2Le,
            0x0008 => Self::DCdr2Be,
            0x0009 => Self::DCdr2Le,
            0x000a => Self::PlCdr2Be,
            0x000b => Self::PlCdr2Le,
            other => return Err(CdrError::UnsupportedEncapsulation(other)),
        })
    }

    pub const fn mode(self) -> EncodingMode {
        match self {
            Self::CdrBe | Self::CdrLe | Self::PlCdrBe | Self::PlCdrLe => EncodingMode::Xcdr1,
            _ => EncodingMode::Xcdr2,
        }
    }

    pub const fn is_little_endian(self) -> bool {
        (self as u16) & 1 == 1
    }
}

/// Parsed encapsulation header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncapsulationHeader {
    pub kind: EncapsulationKind,
    pub options: u16,
}

impl EncapsulationHeader {
    pub const fn new(kind: EncapsulationKind) -> Self {
        Self { kind, options: 0 }
    }

    /// Number of padding bytes at the end of the payload (XCDR2 option bits).
    pub const fn padding(&self) -> usize {
        (self.options & 0x3) as usize
    }

    pub fn to_bytes(&self) -> [u8; ENCAPSULATION_HEADER_SIZE] {
        let id = (self.kind as u16).to_be_bytes();
        let opts = self.options.to_be_bytes();
        [id[0], id[1], opts[0], opts[1]]
    }

    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < ENCAPSULATION_HEADER_SIZE {
            return Err(CdrError::BufferUnderrun {
                offset: 0,
                needed: ENCAPSULATION_HEADER_SIZE,
                available: bytes.len(),
            });
        }
        let kind = EncapsulationKind::from_u16(u16::from_be_bytes([bytes[0], bytes[1]]))?;
        let options = u16::from_be_bytes([bytes[2], bytes[3]]);
        Ok(Self { kind, options })
    }
}

/// Split a sample into its header and body, stripping trailing padding.
///
/// Big-endian payloads are rejected: the codec only speaks little-endian.
pub fn split_header(sample: &[u8]) -> Result<(EncapsulationHeader, &[u8])> {
    let header = EncapsulationHeader::parse(sample)?;
    if !header.kind.is_little_endian() {
        return Err(CdrError::UnsupportedEncapsulation(header.kind as u16));
    }
    let body = &sample[ENCAPSULATION_HEADER_SIZE..];
    let pad = if header.kind.mode() == EncodingMode::Xcdr2 {
        header.padding()
    } else {
        0
    };
    if pad > body.len() {
        return Err(CdrError::MalformedLength {
            what: "encapsulation padding",
            offset: ENCAPSULATION_HEADER_SIZE,
            declared: pad,
            remaining: body.len(),
        });
    }
    Ok((header, &body[..body.len() - pad]))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_alignment_law() {
        assert_eq!(EncodingMode::Xcdr1.alignment_for(8), 8);
        assert_eq!(EncodingMode::Xcdr2.alignment_for(8), 4);
        assert_eq!(EncodingMode::Xcdr2.alignment_for(2), 2);
        assert_eq!(EncodingMode::Xcdr1.alignment_for(1), 1);
        assert_eq!(EncodingMode::Xcdr1.alignment_for(0), 1);
    }

    #[test]
    fn test_dheader_usage() {
        assert!(!EncodingMode::Xcdr1.uses_dheader(Extensibility::Appendable));
        assert!(!EncodingMode::Xcdr1.uses_dheader(Extensibility::Mutable));
        assert!(!EncodingMode::Xcdr2.uses_dheader(Extensibility::Final));
        assert!(EncodingMode::Xcdr2.uses_dheader(Extensibility::Appendable));
        assert!(EncodingMode::Xcdr2.uses_dheader(Extensibility::Mutable));
    }

    #[test]
    fn test_encapsulation_table() {
        assert_eq!(
            EncapsulationKind::for_type(EncodingMode::Xcdr2, Extensibility::Appendable),
            EncapsulationKind::DCdr2Le
        );
        assert_eq!(
            EncapsulationKind::for_type(EncodingMode::Xcdr1, Extensibility::Mutable),
            EncapsulationKind::PlCdrLe
        );
        assert_eq!(EncapsulationKind::PlCdr2Le.mode(), EncodingMode::Xcdr2);
        assert_eq!(EncapsulationKind::CdrLe.mode(), EncodingMode::Xcdr1);
        assert!(EncapsulationKind::DCdr2Le.is_little_endian());
        assert!(!EncapsulationKind::DCdr2Be.is_little_endian());
    }

    #[test]
    fn test_header_bytes() {
        let mut header = EncapsulationHeader::new(EncapsulationKind::DCdr2Le);
        header.options = 2;
        assert_eq!(header.to_bytes(), [0x00, 0x09, 0x00, 0x02]);
        let parsed = EncapsulationHeader::parse(&header.to_bytes()).unwrap();
        assert_eq!(parsed, header);
        assert_eq!(parsed.padding(), 2);
    }

    #[test]
    fn test_split_header_strips_padding() {
        let sample = [0x00, 0x09, 0x00, 0x02, 1, 2, 0, 0];
        let (header, body) = split_header(&sample).unwrap();
        assert_eq!(header.kind, EncapsulationKind::DCdr2Le);
        assert_eq!(body, &[1, 2]);
    }

    #[test]
    fn test_split_header_rejects_unknown_and_big_endian() {
        assert_eq!(
            split_header(&[0x00, 0x04, 0, 0]).unwrap_err(),
            CdrError::UnsupportedEncapsulation(0x0004)
        );
        assert_eq!(
            split_header(&[0x00, 0x08, 0, 0]).unwrap_err(),
            CdrError::UnsupportedEncapsulation(0x0008)
        );
        assert!(matches!(
            split_header(&[0x00]).unwrap_err(),
            CdrError::BufferUnderrun { .. }
        ));
    }
}
