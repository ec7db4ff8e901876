// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! CDR writer over a growable `Vec<u8>` or a caller-supplied fixed buffer.

use super::sink::CdrSink;
use crate::encoding::EncodingMode;
use crate::error::{CdrError, Result};

enum Storage<'a> {
    Growable(Vec<u8>),
    Fixed(&'a mut [u8]),
}

/// Bounds-checked CDR writer.
///
/// Positions are absolute within the logical stream. A growable writer
/// created with a start position behaves as if `start` bytes precede its
/// buffer; a fixed writer created at `start` writes from `buf[start]` on.
pub struct CdrWriter<'a> {
    storage: Storage<'a>,
    /// Logical position of `storage[0]`.
    base: usize,
    /// Bytes of `storage` in use.
    len: usize,
    origin: usize,
    mode: EncodingMode,
}

impl CdrWriter<'static> {
    pub fn growable(mode: EncodingMode) -> Self {
        Self::growable_at(mode, 0)
    }

    pub fn growable_at(mode: EncodingMode, start: usize) -> Self {
        Self::with_capacity_at(mode, start, 0)
    }

    pub fn with_capacity_at(mode: EncodingMode, start: usize, capacity: usize) -> Self {
        Self {
            storage: Storage::Growable(Vec::with_capacity(capacity)),
            base: start,
            len: 0,
            origin: start,
            mode,
        }
    }
}

impl<'a> CdrWriter<'a> {
    pub fn fixed(buf: &'a mut [u8], mode: EncodingMode) -> Self {
        Self {
            storage: Storage::Fixed(buf),
            base: 0,
            len: 0,
            origin: 0,
            mode,
        }
    }

    /// Fixed writer starting at `buf[start]`; the origin is `start`.
    pub fn fixed_at(buf: &'a mut [u8], start: usize, mode: EncodingMode) -> Result<Self> {
        if start > buf.len() {
            return Err(CdrError::BufferOverrun {
                offset: 0,
                needed: start,
                capacity: buf.len(),
            });
        }
        Ok(Self {
            storage: Storage::Fixed(buf),
            base: 0,
            len: start,
            origin: start,
            mode,
        })
    }

    /// Capacity of a fixed writer, `None` when growable.
    pub fn capacity(&self) -> Option<usize> {
        match &self.storage {
            Storage::Growable(_) => None,
            Storage::Fixed(buf) => Some(buf.len()),
        }
    }

    /// Bytes written so far (for fixed writers this includes any prefix
    /// before the start position).
    pub fn bytes(&self) -> &[u8] {
        match &self.storage {
            Storage::Growable(vec) => vec.as_slice(),
            Storage::Fixed(buf) => &buf[..self.len],
        }
    }

    pub fn into_vec(self) -> Vec<u8> {
        match self.storage {
            Storage::Growable(vec) => vec,
            Storage::Fixed(buf) => buf[..self.len].to_vec(),
        }
    }
}

impl CdrSink for CdrWriter<'_> {
    fn mode(&self) -> EncodingMode {
        self.mode
    }

    fn origin(&self) -> usize {
        self.origin
    }

    fn set_origin(&mut self, origin: usize) {
        self.origin = origin;
    }

    fn position(&self) -> usize {
        self.base + self.len
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        match &mut self.storage {
            Storage::Growable(vec) => vec.extend_from_slice(data),
            Storage::Fixed(buf) => {
                let end = self.len + data.len();
                if end > buf.len() {
                    return Err(CdrError::BufferOverrun {
                        offset: self.base + self.len,
                        needed: data.len(),
                        capacity: buf.len(),
                    });
                }
                buf[self.len..end].copy_from_slice(data);
            }
        }
        self.len += data.len();
        Ok(())
    }

    fn patch_u32(&mut self, at: usize, value: u32) -> Result<()> {
        let index = at
            .checked_sub(self.base)
            .filter(|index| index + 4 <= self.len)
            .ok_or_else(|| CdrError::invalid_state(format!("patch at {} outside written range", at)))?;
        let bytes = value.to_le_bytes();
        match &mut self.storage {
            Storage::Growable(vec) => vec[index..index + 4].copy_from_slice(&bytes),
            Storage::Fixed(buf) => buf[index..index + 4].copy_from_slice(&bytes),
        }
        Ok(())
    }
}
