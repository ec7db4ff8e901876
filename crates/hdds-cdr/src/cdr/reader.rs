// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Bounds-checked CDR reader.
//!
//! The reader borrows its input and never allocates on the decode path except
//! for owned conversions (`read_string`). A nested limit stack (`push_limit` /
//! `pop_limit`) keeps members from reading past the body of the enclosing
//! DHEADER-delimited aggregate.

use super::cursor::{impl_read_le, padding_for};
use crate::config::{CodecConfig, DiscriminantPolicy, DEFAULT_MAX_COLLECTION_LENGTH};
use crate::encoding::EncodingMode;
use crate::error::{CdrError, Result};

/// Cursor over a borrowed CDR buffer.
#[derive(Debug, Clone)]
pub struct CdrReader<'a> {
    buf: &'a [u8],
    pos: usize,
    origin: usize,
    limit: usize,
    mode: EncodingMode,
    max_collection_length: usize,
    discriminant_policy: DiscriminantPolicy,
}

impl<'a> CdrReader<'a> {
    pub fn new(buf: &'a [u8], mode: EncodingMode) -> Self {
        Self {
            buf,
            pos: 0,
            origin: 0,
            limit: buf.len(),
            mode,
            max_collection_length: DEFAULT_MAX_COLLECTION_LENGTH,
            discriminant_policy: DiscriminantPolicy::default(),
        }
    }

    pub fn with_config(buf: &'a [u8], config: &CodecConfig) -> Self {
        let mut reader = Self::new(buf, config.mode);
        reader.max_collection_length = config.max_collection_length;
        reader.discriminant_policy = config.discriminant_policy;
        reader
    }

    pub fn mode(&self) -> EncodingMode {
        self.mode
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn origin(&self) -> usize {
        self.origin
    }

    pub fn set_origin(&mut self, origin: usize) {
        self.origin = origin;
    }

    /// Bytes left before the current limit.
    pub fn remaining(&self) -> usize {
        self.limit.saturating_sub(self.pos)
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn max_collection_length(&self) -> usize {
        self.max_collection_length
    }

    /// What descriptor-driven decoding does with an unmatched union discriminator.
    pub fn discriminant_policy(&self) -> DiscriminantPolicy {
        self.discriminant_policy
    }

    pub fn is_eof(&self) -> bool {
        self.pos >= self.limit
    }

    /// The full underlying buffer.
    pub fn buffer(&self) -> &'a [u8] {
        self.buf
    }

    /// Skip padding up to `min(width, mode.max_alignment())`.
    pub fn align(&mut self, width: usize) -> Result<()> {
        let pad = padding_for(self.pos, self.origin, self.mode.alignment_for(width));
        if pad > self.remaining() {
            return Err(self.underrun(pad));
        }
        self.pos += pad;
        Ok(())
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        if len > self.remaining() {
            return Err(self.underrun(len));
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    /// Read a `u32` at the current position without consuming it.
    pub fn peek_u32(&self) -> Result<u32> {
        if self.remaining() < 4 {
            return Err(self.underrun(4));
        }
        let mut bytes = [0u8; 4];
        bytes.copy_from_slice(&self.buf[self.pos..self.pos + 4]);
        Ok(u32::from_le_bytes(bytes))
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.read_u8()? as i8)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        let offset = self.pos;
        match self.read_u8()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CdrError::invalid_value(format!(
                "boolean byte {:#04x} at offset {}",
                other, offset
            ))),
        }
    }

    impl_read_le!(read_u16, u16, 2);
    impl_read_le!(read_i16, i16, 2);
    impl_read_le!(read_u32, u32, 4);
    impl_read_le!(read_i32, i32, 4);
    impl_read_le!(read_u64, u64, 8);
    impl_read_le!(read_i64, i64, 8);
    impl_read_le!(read_f32, f32, 4);
    impl_read_le!(read_f64, f64, 8);

    /// Read a CDR string and return its bytes without the terminator.
    ///
    /// A count of zero is tolerated and decodes as empty.
    pub fn read_str_bytes(&mut self) -> Result<&'a [u8]> {
        let count = self.read_u32()? as usize;
        if count == 0 {
            return Ok(&[]);
        }
        if count > self.remaining() {
            return Err(CdrError::MalformedLength {
                what: "string",
                offset: self.pos,
                declared: count,
                remaining: self.remaining(),
            });
        }
        let offset = self.pos;
        let raw = self.read_bytes(count)?;
        match raw.split_last() {
            Some((&0, body)) => Ok(body),
            _ => Err(CdrError::MalformedLength {
                what: "string terminator",
                offset,
                declared: count,
                remaining: count,
            }),
        }
    }

    /// Borrowed string; no allocation.
    pub fn read_str(&mut self) -> Result<&'a str> {
        let offset = self.pos;
        let bytes = self.read_str_bytes()?;
        std::str::from_utf8(bytes).map_err(|_| CdrError::InvalidUtf8 { offset })
    }

    pub fn read_string(&mut self) -> Result<String> {
        self.read_str().map(str::to_owned)
    }

    pub fn read_bounded_string(&mut self, bound: Option<usize>) -> Result<String> {
        let offset = self.pos;
        let value = self.read_str()?;
        match bound {
            Some(bound) if value.len() > bound => Err(CdrError::MalformedLength {
                what: "bounded string",
                offset,
                declared: value.len(),
                remaining: bound,
            }),
            _ => Ok(value.to_owned()),
        }
    }

    /// Move forward to `pos`. Moving backwards is refused.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos < self.pos {
            return Err(CdrError::invalid_state(format!(
                "seek backwards from {} to {}",
                self.pos, pos
            )));
        }
        if pos > self.limit {
            return Err(self.underrun(pos - self.pos));
        }
        self.pos = pos;
        Ok(())
    }

    /// Restrict reads to `[position, end)`; returns the previous limit.
    pub fn push_limit(&mut self, end: usize) -> Result<usize> {
        if end > self.limit || end < self.pos {
            return Err(CdrError::MalformedLength {
                what: "delimited body",
                offset: self.pos,
                declared: end.saturating_sub(self.pos),
                remaining: self.remaining(),
            });
        }
        let previous = self.limit;
        self.limit = end;
        Ok(previous)
    }

    pub fn pop_limit(&mut self, previous: usize) {
        self.limit = previous;
    }

    /// Validate a collection count against the configured maximum and, when
    /// every element occupies at least `min_element_size` bytes, against the
    /// bytes still available.
    pub fn check_count(
        &self,
        what: &'static str,
        count: usize,
        min_element_size: usize,
    ) -> Result<usize> {
        let needed = count.saturating_mul(min_element_size);
        if count > self.max_collection_length || needed > self.remaining() {
            return Err(CdrError::MalformedLength {
                what,
                offset: self.pos,
                declared: count,
                remaining: self.remaining(),
            });
        }
        Ok(count)
    }

    fn underrun(&self, needed: usize) -> CdrError {
        CdrError::BufferUnderrun {
            offset: self.pos,
            needed,
            available: self.remaining(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_overflow_reports_offset() {
        let buffer = [0u8; 1];
        let mut reader = CdrReader::new(&buffer, EncodingMode::Xcdr2);
        assert_eq!(reader.read_u8().unwrap(), 0);
        assert_eq!(
            reader.read_u8().unwrap_err(),
            CdrError::BufferUnderrun {
                offset: 1,
                needed: 1,
                available: 0
            }
        );
    }

    #[test]
    fn test_align_past_end_fails() {
        let buffer = [0u8; 2];
        let mut reader = CdrReader::new(&buffer, EncodingMode::Xcdr1);
        reader.read_u8().unwrap();
        assert!(matches!(
            reader.read_u32(),
            Err(CdrError::BufferUnderrun { .. })
        ));
        // Failed reads leave the cursor where it was.
        assert_eq!(reader.position(), 1);
    }

    #[test]
    fn test_read_primitives() {
        let buffer = [
            0x11, 0x00, 0x33, 0x22, 0x77, 0x66, 0x55, 0x44, //
            0x08, 0x07, 0x06, 0x05, 0x04, 0x03, 0x02, 0x01,
        ];
        let mut reader = CdrReader::new(&buffer, EncodingMode::Xcdr2);
        assert_eq!(reader.read_u8().unwrap(), 0x11);
        assert_eq!(reader.read_u16().unwrap(), 0x2233);
        assert_eq!(reader.read_u32().unwrap(), 0x4455_6677);
        assert_eq!(reader.read_u64().unwrap(), 0x0102_0304_0506_0708);
        assert!(reader.is_eof());
    }

    #[test]
    fn test_read_string_cases() {
        let buffer = [0x03, 0x00, 0x00, 0x00, 0x48, 0x69, 0x00];
        let mut reader = CdrReader::new(&buffer, EncodingMode::Xcdr2);
        assert_eq!(reader.read_str().unwrap(), "Hi");

        let zero = [0u8; 4];
        let mut reader = CdrReader::new(&zero, EncodingMode::Xcdr2);
        assert_eq!(reader.read_str().unwrap(), "");

        let too_long = [100, 0, 0, 0, b'a', b'b', 0];
        let mut reader = CdrReader::new(&too_long, EncodingMode::Xcdr2);
        assert!(matches!(
            reader.read_str(),
            Err(CdrError::MalformedLength { what: "string", declared: 100, .. })
        ));

        let no_nul = [2, 0, 0, 0, b'a', b'b'];
        let mut reader = CdrReader::new(&no_nul, EncodingMode::Xcdr2);
        assert!(matches!(
            reader.read_str(),
            Err(CdrError::MalformedLength { what: "string terminator", .. })
        ));

        let bad_utf8 = [3, 0, 0, 0, 0xC3, 0x28, 0];
        let mut reader = CdrReader::new(&bad_utf8, EncodingMode::Xcdr2);
        assert_eq!(
            reader.read_str().unwrap_err(),
            CdrError::InvalidUtf8 { offset: 0 }
        );
    }

    #[test]
    fn test_invalid_bool() {
        let buffer = [2u8];
        let mut reader = CdrReader::new(&buffer, EncodingMode::Xcdr2);
        assert!(matches!(reader.read_bool(), Err(CdrError::InvalidValue(_))));
    }

    #[test]
    fn test_limits_and_seek() {
        let buffer = [1u8, 2, 3, 4, 5, 6, 7, 8];
        let mut reader = CdrReader::new(&buffer, EncodingMode::Xcdr2);
        let previous = reader.push_limit(4).unwrap();
        assert_eq!(reader.remaining(), 4);
        reader.read_u16().unwrap();
        assert!(reader.read_u32().is_err());
        assert!(reader.seek(5).is_err());
        reader.seek(4).unwrap();
        reader.pop_limit(previous);
        assert_eq!(reader.read_u32().unwrap(), u32::from_le_bytes([5, 6, 7, 8]));
        assert!(matches!(reader.seek(2), Err(CdrError::InvalidState(_))));
        assert!(matches!(
            reader.push_limit(9),
            Err(CdrError::MalformedLength { .. })
        ));
    }

    #[test]
    fn test_check_count() {
        let buffer = [0u8; 8];
        let reader = CdrReader::new(&buffer, EncodingMode::Xcdr2);
        assert_eq!(reader.check_count("sequence", 2, 4).unwrap(), 2);
        assert!(reader.check_count("sequence", 3, 4).is_err());
        assert!(reader
            .check_count("sequence", DEFAULT_MAX_COLLECTION_LENGTH + 1, 0)
            .is_err());
    }
}
