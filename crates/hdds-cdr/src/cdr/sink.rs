// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! The `CdrSink` trait: one encoding surface for writers and sizers.
//!
//! Every encoder in the crate is generic over `CdrSink`. Running an encoder
//! against a [`CdrSizer`](super::CdrSizer) walks exactly the same control flow
//! as running it against a [`CdrWriter`](super::CdrWriter), so the predicted
//! size and the written size cannot drift apart.

use super::cursor::{impl_sink_write_le, padding_for};
use crate::encoding::EncodingMode;
use crate::error::{CdrError, Result};

const ZEROS: [u8; 8] = [0u8; 8];

/// Destination of CDR encoding.
pub trait CdrSink {
    /// Encoding mode of this pass.
    fn mode(&self) -> EncodingMode;

    /// Position alignment is computed from.
    fn origin(&self) -> usize;

    fn set_origin(&mut self, origin: usize);

    /// Current absolute position.
    fn position(&self) -> usize;

    /// Append raw bytes without alignment.
    fn write_bytes(&mut self, data: &[u8]) -> Result<()>;

    /// Overwrite a previously reserved 32-bit slot.
    fn patch_u32(&mut self, at: usize, value: u32) -> Result<()>;

    /// Pad with zero bytes up to `min(width, mode.max_alignment())`.
    fn align(&mut self, width: usize) -> Result<()> {
        let alignment = self.mode().alignment_for(width);
        let pad = padding_for(self.position(), self.origin(), alignment);
        if pad > 0 {
            self.write_bytes(&ZEROS[..pad])?;
        }
        Ok(())
    }

    /// Align to 4 and write a zero placeholder; returns the slot position.
    fn reserve_u32(&mut self) -> Result<usize> {
        self.align(4)?;
        let at = self.position();
        self.write_bytes(&ZEROS[..4])?;
        Ok(at)
    }

    fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_bytes(&[value])
    }

    fn write_i8(&mut self, value: i8) -> Result<()> {
        self.write_bytes(&value.to_le_bytes())
    }

    fn write_bool(&mut self, value: bool) -> Result<()> {
        self.write_u8(u8::from(value))
    }

    impl_sink_write_le!(write_u16, u16, 2);
    impl_sink_write_le!(write_i16, i16, 2);
    impl_sink_write_le!(write_u32, u32, 4);
    impl_sink_write_le!(write_i32, i32, 4);
    impl_sink_write_le!(write_u64, u64, 8);
    impl_sink_write_le!(write_i64, i64, 8);
    impl_sink_write_le!(write_f32, f32, 4);
    impl_sink_write_le!(write_f64, f64, 8);

    /// Align 4, `u32` byte count including the terminator, UTF-8 bytes, NUL.
    fn write_string(&mut self, value: &str) -> Result<()> {
        let count = u32::try_from(value.len() + 1)
            .map_err(|_| CdrError::invalid_value("string longer than u32::MAX"))?;
        self.write_u32(count)?;
        self.write_bytes(value.as_bytes())?;
        self.write_u8(0)
    }

    /// Like [`write_string`](Self::write_string) but rejects strings longer
    /// than `bound` bytes.
    fn write_bounded_string(&mut self, value: &str, bound: Option<usize>) -> Result<()> {
        if let Some(bound) = bound {
            if value.len() > bound {
                return Err(CdrError::invalid_value(format!(
                    "string of {} bytes exceeds bound {}",
                    value.len(),
                    bound
                )));
            }
        }
        self.write_string(value)
    }

    /// Bytes produced since `origin`.
    fn size_delta(&self, origin: usize) -> usize {
        self.position().saturating_sub(origin)
    }
}
