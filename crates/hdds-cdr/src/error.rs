// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Error taxonomy shared by every codec component.
//!
//! All failures are local and synchronous. Reader and view operations never
//! mutate caller state on failure; writer and arena failures abort the write and
//! the caller discards the destination buffer.

use thiserror::Error;

/// Codec error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CdrError {
    /// A read or alignment step went past the available bytes.
    #[error("buffer underrun at offset {offset}: need {needed} bytes, {available} available")]
    BufferUnderrun {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// A write exceeded the capacity of a fixed destination buffer.
    #[error("buffer overrun at offset {offset}: need {needed} bytes, capacity {capacity}")]
    BufferOverrun {
        offset: usize,
        needed: usize,
        capacity: usize,
    },

    /// A declared length (string, sequence, DHEADER, member) does not fit the data.
    #[error("malformed {what} length at offset {offset}: declared {declared}, {remaining} bytes remaining")]
    MalformedLength {
        what: &'static str,
        offset: usize,
        declared: usize,
        remaining: usize,
    },

    /// Union discriminator selects no case and the union has no default arm.
    #[error("unknown union discriminant {0}")]
    UnknownDiscriminant(i64),

    /// The sizer and the writer disagreed. Always a codec defect.
    #[error("size mismatch: sizer predicted {predicted} bytes, writer produced {written}")]
    SizeMismatch { predicted: usize, written: usize },

    /// Arena allocation exceeded the remaining capacity.
    #[error("arena overflow: requested {requested} bytes, {remaining} remaining")]
    ArenaOverflow { requested: usize, remaining: usize },

    /// Operation not valid in the current state (e.g. inactive union case).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// String payload is not valid UTF-8.
    #[error("invalid UTF-8 string at offset {offset}")]
    InvalidUtf8 { offset: usize },

    /// Value does not match its descriptor or violates a bound.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// Type descriptor is inconsistent.
    #[error("invalid descriptor: {0}")]
    InvalidDescriptor(String),

    /// A mutable member the decoder does not know carried the must-understand flag.
    #[error("unknown must-understand member id {member_id:#x}")]
    UnknownMustUnderstand { member_id: u32 },

    /// Encapsulation identifier outside the supported table.
    #[error("unsupported encapsulation {0:#06x}")]
    UnsupportedEncapsulation(u16),
}

impl CdrError {
    pub(crate) fn invalid_value(reason: impl Into<String>) -> Self {
        Self::InvalidValue(reason.into())
    }

    pub(crate) fn invalid_state(reason: impl Into<String>) -> Self {
        Self::InvalidState(reason.into())
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, CdrError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_variants() {
        let err = CdrError::BufferUnderrun {
            offset: 4,
            needed: 4,
            available: 2,
        };
        assert_eq!(
            err.to_string(),
            "buffer underrun at offset 4: need 4 bytes, 2 available"
        );

        let err = CdrError::MalformedLength {
            what: "string",
            offset: 0,
            declared: 100,
            remaining: 3,
        };
        assert_eq!(
            err.to_string(),
            "malformed string length at offset 0: declared 100, 3 bytes remaining"
        );

        let err = CdrError::UnknownMustUnderstand { member_id: 0x2a };
        assert_eq!(err.to_string(), "unknown must-understand member id 0x2a");

        let err = CdrError::UnsupportedEncapsulation(0x0004);
        assert_eq!(err.to_string(), "unsupported encapsulation 0x0004");
    }
}
