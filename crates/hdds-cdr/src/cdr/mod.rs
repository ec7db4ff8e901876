// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Alignment cursor and primitive codec.
//!
//! - [`CdrSink`]: encoding surface shared by [`CdrWriter`] and [`CdrSizer`]
//! - [`CdrReader`]: borrowed, bounds-checked decoding cursor
//!
//! All multi-byte values are little-endian.

pub mod cursor;
mod reader;
mod sink;
mod sizer;
mod writer;

pub use cursor::{align_offset, padding_for};
pub use reader::CdrReader;
pub use sink::CdrSink;
pub use sizer::CdrSizer;
pub use writer::CdrWriter;
