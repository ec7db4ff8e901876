// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Extensibility policy (XTypes 1.3).
//!
//! Maps Final / Appendable / Mutable aggregates onto XCDR1 and XCDR2 wire
//! forms: DHEADER, EMHEADER, PL_CDR parameter headers, optional members and
//! collections.
//!
//! # References
//! - DDS-XTYPES formal/2020-06-01, Section 7.4.3

pub mod aggregate;
pub mod collections;
pub mod emheader;
mod traits;

pub use aggregate::{wire_extensibility, MemberHeader, StructDecoder, StructEncoder};
pub use collections::{
    decode_array, decode_collection, decode_sequence, encode_array, encode_collection,
    encode_sequence, CollectionShape,
};
pub use emheader::{EmHeader, LengthCode};
pub use traits::{CdrDecode, CdrEncode, DescribeType};
