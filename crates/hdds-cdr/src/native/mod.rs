// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Native (C-layout) representation of descriptor-shaped values.
//!
//! A [`NativeLayout`] maps a type descriptor onto C struct rules for the
//! host: `char *` for unbounded strings, inline `char[N + 1]` for bounded ones,
//! `{maximum, length, buffer, release}` headers for sequences and pointer slots
//! for optional members. Out-of-line data is bump-allocated after the head by a
//! [`NativeArena`]; [`ArenaSizer`] predicts the exact footprint beforehand.
//! Derived types implement [`NativeType`] and marshal from their own fields.

mod arena;
pub mod layout;
mod marshal;
mod pinned;
mod typed;

pub use arena::{ArenaSizer, NativeArena, NativePtr, NativeScalar, NativeSequence, NativeSink};
pub use layout::{NativeCase, NativeField, NativeLayout, NativeShape, NativeUnion};
pub use marshal::{marshal_native, native_size, write_native};
pub use pinned::PinnedBuffer;
pub use typed::{write_enum, write_member, write_optional_member, NativeType};
