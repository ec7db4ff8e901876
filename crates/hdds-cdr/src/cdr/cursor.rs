// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Alignment math shared by the writer, the sizer and the reader.
//!
//! CDR aligns relative to an origin (the first byte of the encapsulated body),
//! not to absolute memory addresses. All helpers here take the logical
//! position `position - origin`.

/// Align an offset to the given power-of-two boundary.
#[inline]
pub const fn align_offset(offset: usize, alignment: usize) -> usize {
    if alignment <= 1 {
        offset
    } else {
        (offset + alignment - 1) & !(alignment - 1)
    }
}

/// Padding needed at `position` to reach `alignment` relative to `origin`.
#[inline]
pub const fn padding_for(position: usize, origin: usize, alignment: usize) -> usize {
    let logical = position.saturating_sub(origin);
    align_offset(logical, alignment) - logical
}

/// Generate aligned little-endian write methods for a sink.
///
/// Each generated method aligns to the primitive width (capped by the mode)
/// and appends `to_le_bytes()`.
macro_rules! impl_sink_write_le {
    ($name:ident, $type:ty, $size:expr) => {
        fn $name(&mut self, value: $type) -> $crate::error::Result<()> {
            self.align($size)?;
            self.write_bytes(&value.to_le_bytes())
        }
    };
}

/// Generate aligned little-endian read methods for the reader.
///
/// A failed read restores the cursor to where it started.
macro_rules! impl_read_le {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self) -> $crate::error::Result<$type> {
            let start = self.pos;
            self.align($size)?;
            let mut bytes = [0u8; $size];
            match self.read_bytes($size) {
                Ok(raw) => bytes.copy_from_slice(raw),
                Err(err) => {
                    self.pos = start;
                    return Err(err);
                }
            }
            Ok(<$type>::from_le_bytes(bytes))
        }
    };
}

pub(crate) use impl_read_le;
pub(crate) use impl_sink_write_le;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_align_offset_powers_of_two() {
        assert_eq!(align_offset(0, 4), 0);
        assert_eq!(align_offset(1, 4), 4);
        assert_eq!(align_offset(5, 8), 8);
        assert_eq!(align_offset(8, 8), 8);
        assert_eq!(align_offset(3, 1), 3);
        assert_eq!(align_offset(3, 0), 3);
    }

    #[test]
    fn test_padding_is_origin_relative() {
        // Position 6 with origin 2 is logical offset 4: already aligned.
        assert_eq!(padding_for(6, 2, 4), 0);
        assert_eq!(padding_for(6, 0, 4), 2);
        assert_eq!(padding_for(13, 4, 8), 7);
    }
}
