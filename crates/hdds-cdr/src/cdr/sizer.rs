// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Size-prediction pass: a sink that only counts.

use super::sink::CdrSink;
use crate::encoding::EncodingMode;
use crate::error::{CdrError, Result};

/// Counting sink. Its position follows exactly what a [`CdrWriter`](super::CdrWriter)
/// would produce for the same encoder and start position.
#[derive(Debug, Clone)]
pub struct CdrSizer {
    mode: EncodingMode,
    position: usize,
    origin: usize,
}

impl CdrSizer {
    pub fn new(mode: EncodingMode) -> Self {
        Self::with_start(mode, 0)
    }

    pub fn with_start(mode: EncodingMode, start: usize) -> Self {
        Self {
            mode,
            position: start,
            origin: start,
        }
    }
}

impl CdrSink for CdrSizer {
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
        self.position
    }

    fn write_bytes(&mut self, data: &[u8]) -> Result<()> {
        self.position += data.len();
        Ok(())
    }

    fn patch_u32(&mut self, at: usize, _value: u32) -> Result<()> {
        if at + 4 > self.position {
            return Err(CdrError::invalid_state(format!(
                "patch at {} outside counted range",
                at
            )));
        }
        Ok(())
    }
}
