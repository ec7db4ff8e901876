// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Address-stable, aligned heap buffer.

use super::layout::MAX_NATIVE_ALIGN;

/// Owned native buffer whose address never changes and whose first byte sits
/// on a `MAX_NATIVE_ALIGN` boundary. Released when dropped.
///
/// Marshalled samples hold absolute pointers into themselves, so they live in
/// one of these rather than in a `Vec` that may reallocate.
pub struct PinnedBuffer {
    storage: Box<[u8]>,
    start: usize,
    len: usize,
}

impl PinnedBuffer {
    /// Zero-filled buffer of `len` bytes.
    pub fn new(len: usize) -> Self {
        let storage = vec![0u8; len + MAX_NATIVE_ALIGN - 1].into_boxed_slice();
        let addr = storage.as_ptr() as usize;
        let start = (MAX_NATIVE_ALIGN - addr % MAX_NATIVE_ALIGN) % MAX_NATIVE_ALIGN;
        Self {
            storage,
            start,
            len,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Address of the first byte.
    pub fn address(&self) -> usize {
        self.as_slice().as_ptr() as usize
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.storage[self.start..self.start + self.len]
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.storage[self.start..self.start + self.len]
    }
}

impl std::fmt::Debug for PinnedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PinnedBuffer")
            .field("address", &format_args!("{:#x}", self.address()))
            .field("len", &self.len)
            .finish()
    }
}
