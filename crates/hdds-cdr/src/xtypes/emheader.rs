// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Member headers of mutable aggregates.
//!
//! XCDR2 (PL_CDR2) prefixes every member with an EMHEADER:
//!
//! ```text
//!  31  30..28   27..0
//! [ M | LC  | member id ]   [ NEXTINT (LC >= 4) ]
//! ```
//!
//! XCDR1 (PL_CDR) uses RTPS-style parameter headers: a short form
//! `u16 pid | u16 length` and an extended form for large ids or lengths.

/// Must-understand flag of an EMHEADER.
pub const EMHEADER_M_FLAG: u32 = 0x8000_0000;
/// Member id mask of an EMHEADER (28 bits).
pub const EMHEADER_ID_MASK: u32 = 0x0fff_ffff;

/// Must-understand flag of a short PL_CDR parameter id.
pub const PID_MUST_UNDERSTAND: u16 = 0x4000;
/// Implementation-specific flag of a short PL_CDR parameter id.
pub const PID_IMPL_EXTENSION: u16 = 0x8000;
/// Parameter id bits of a short PL_CDR header.
pub const PID_ID_MASK: u16 = 0x3fff;
/// Extended parameter header follows.
pub const PID_EXTENDED: u16 = 0x3f01;
/// End of the parameter list.
pub const PID_LIST_END: u16 = 0x3f02;
/// Parameter to be skipped.
pub const PID_IGNORE: u16 = 0x3f03;
/// Member ids at or above this value need the extended header.
pub const PID_SHORT_LIMIT: u32 = 0x3f00;
/// Must-understand flag inside an extended header's member id word.
pub const PL_EXTENDED_M_FLAG: u32 = 0x4000_0000;

/// Length code of an EMHEADER (XTypes 1.3, 7.4.3.4.3).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthCode {
    Lc1 = 0,
    Lc2 = 1,
    Lc4 = 2,
    Lc8 = 3,
    /// NEXTINT holds the member length.
    NextInt = 4,
    /// Member length is `4 + NEXTINT`; NEXTINT is part of the value.
    NextIntBytes = 5,
    /// Member length is `4 + 4 * NEXTINT`.
    NextIntWords = 6,
    /// Member length is `4 + 8 * NEXTINT`.
    NextIntDwords = 7,
}

impl LengthCode {
    /// Code for a member whose wire form is a single primitive of `width` bytes.
    pub const fn for_width(width: usize) -> Option<Self> {
        match width {
            1 => Some(Self::Lc1),
            2 => Some(Self::Lc2),
            4 => Some(Self::Lc4),
            8 => Some(Self::Lc8),
            _ => None,
        }
    }

    /// Code for a single value: LC 0..3 for primitives, NEXTINT otherwise.
    pub const fn for_member(width: Option<usize>) -> Self {
        match width {
            Some(width) => match Self::for_width(width) {
                Some(lc) => lc,
                None => Self::NextInt,
            },
            None => Self::NextInt,
        }
    }

    /// Code for a sequence member.
    ///
    /// The count doubles as NEXTINT for 1/4/8-byte elements; non-primitive
    /// elements carry a DHEADER that does the same. 2-byte elements have no
    /// matching code and fall back to NEXTINT.
    pub const fn for_sequence(element_width: Option<usize>) -> Self {
        match element_width {
            Some(1) | None => Self::NextIntBytes,
            Some(4) => Self::NextIntWords,
            Some(8) => Self::NextIntDwords,
            Some(_) => Self::NextInt,
        }
    }

    /// Code for an array member: a primitive array of 1, 2, 4 or 8 bytes in
    /// total is sized like a primitive; non-primitive arrays reuse their DHEADER.
    pub const fn for_array(element_width: Option<usize>, length: usize) -> Self {
        match element_width {
            Some(width) => match Self::for_width(width.saturating_mul(length)) {
                Some(lc) => lc,
                None => Self::NextInt,
            },
            None => Self::NextIntBytes,
        }
    }

    /// Whether the member value starts with the NEXTINT word itself.
    pub const fn nextint_in_value(self) -> bool {
        self.nextint_scale().is_some()
    }

    pub const fn from_bits(bits: u32) -> Self {
        match bits & 0x7 {
            0 => Self::Lc1,
            1 => Self::Lc2,
            2 => Self::Lc4,
            3 => Self::Lc8,
            4 => Self::NextInt,
            5 => Self::NextIntBytes,
            6 => Self::NextIntWords,
            _ => Self::NextIntDwords,
        }
    }

    pub const fn as_u32(self) -> u32 {
        self as u32
    }

    /// Fixed member length for LC 0..3.
    pub const fn fixed_len(self) -> Option<usize> {
        match self {
            Self::Lc1 => Some(1),
            Self::Lc2 => Some(2),
            Self::Lc4 => Some(4),
            Self::Lc8 => Some(8),
            _ => None,
        }
    }

    /// Multiplier applied to NEXTINT when it doubles as part of the value.
    pub const fn nextint_scale(self) -> Option<usize> {
        match self {
            Self::NextIntBytes => Some(1),
            Self::NextIntWords => Some(4),
            Self::NextIntDwords => Some(8),
            _ => None,
        }
    }
}

/// Decoded EMHEADER word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmHeader {
    pub must_understand: bool,
    pub length_code: LengthCode,
    pub member_id: u32,
}

impl EmHeader {
    pub const fn new(member_id: u32, length_code: LengthCode, must_understand: bool) -> Self {
        Self {
            must_understand,
            length_code,
            member_id: member_id & EMHEADER_ID_MASK,
        }
    }

    pub const fn to_u32(self) -> u32 {
        let m = if self.must_understand {
            EMHEADER_M_FLAG
        } else {
            0
        };
        m | (self.length_code.as_u32() << 28) | (self.member_id & EMHEADER_ID_MASK)
    }

    pub const fn from_u32(word: u32) -> Self {
        Self {
            must_understand: word & EMHEADER_M_FLAG != 0,
            length_code: LengthCode::from_bits(word >> 28),
            member_id: word & EMHEADER_ID_MASK,
        }
    }
}

/// Whether a PL_CDR member needs the extended parameter header.
#[inline]
pub const fn needs_extended_pid(member_id: u32, len: usize) -> bool {
    member_id >= PID_SHORT_LIMIT || len > u16::MAX as usize
}
