// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # hdds-cdr - XCDR codec and native marshalling
//!
//! Bit-exact XCDR1/XCDR2 (OMG CDR and XTypes 1.3) encoding for DDS language
//! bindings, plus the native side of the binding: a bump arena that lays
//! values out with C struct rules and zero-copy views that read them back.
//!
//! ## Quick Start
//!
//! ```rust
//! use hdds_cdr::{deserialize, serialize, Cdr, CodecConfig, EncodingMode};
//!
//! #[derive(Cdr, Debug, PartialEq)]
//! #[cdr(mutable)]
//! struct Temperature {
//!     #[cdr(key)]
//!     sensor_id: u32,
//!     celsius: f64,
//!     label: Option<String>,
//! }
//!
//! let sample = Temperature { sensor_id: 7, celsius: 21.5, label: None };
//! let bytes = serialize(&sample, EncodingMode::Xcdr2).unwrap();
//! let back: Temperature = deserialize(&bytes, &CodecConfig::xcdr2()).unwrap();
//! assert_eq!(back, sample);
//! ```
//!
//! ## Layers
//!
//! ```text
//! +---------------------------------------------------------------+
//! |  #[derive(Cdr)] / TypeDescriptorBuilder   (schema front end)  |
//! +-------------------------------+-------------------------------+
//! |  xtypes: Final / Appendable / |  native: NativeLayout,        |
//! |  Mutable, DHEADER, EMHEADER,  |  NativeArena, PinnedBuffer    |
//! |  PL_CDR, collections, unions  |  view: StructView, UnionView  |
//! +-------------------------------+-------------------------------+
//! |  cdr: CdrSink (CdrWriter | CdrSizer), CdrReader, alignment    |
//! +---------------------------------------------------------------+
//! ```
//!
//! ## Modules Overview
//!
//! - [`cdr`] - alignment cursor, writer, sizer, reader
//! - [`xtypes`] - extensibility headers and the codec traits
//! - [`dynamic`] - type descriptors and descriptor-driven values
//! - [`native`] - C layout, arena and marshalling
//! - [`view`] - zero-copy overlays over native buffers
//! - [`encoding`] - encoding modes and encapsulation header
//! - [`config`] - codec configuration

#![deny(unsafe_code)]

// Lets the derive macro refer to `::hdds_cdr` from inside this crate.
extern crate self as hdds_cdr;

pub mod cdr;
pub mod config;
pub mod dynamic;
pub mod encoding;
pub mod error;
pub mod native;
pub mod view;
pub mod xtypes;

pub use cdr::{CdrReader, CdrSink, CdrSizer, CdrWriter};
pub use config::{CodecConfig, DiscriminantPolicy};
pub use encoding::{
    split_header, EncapsulationHeader, EncapsulationKind, EncodingMode, Extensibility,
    ENCAPSULATION_HEADER_SIZE,
};
pub use error::{CdrError, Result};
pub use xtypes::{CdrDecode, CdrEncode, DescribeType};

#[cfg(feature = "derive")]
pub use hdds_cdr_codegen::Cdr;

/// Exact number of body bytes `serialize` produces for `value`.
pub fn serialized_size<T: CdrEncode + ?Sized>(value: &T, mode: EncodingMode) -> Result<usize> {
    let mut sizer = CdrSizer::new(mode);
    value.encode(&mut sizer)?;
    Ok(sizer.position())
}

fn check_size(predicted: usize, written: usize) -> Result<()> {
    if predicted != written {
        log::error!(
            "[cdr] sizer predicted {} bytes but writer produced {}",
            predicted,
            written
        );
        return Err(CdrError::SizeMismatch { predicted, written });
    }
    Ok(())
}

/// Encode `value` (no encapsulation header) into an exactly sized buffer.
pub fn serialize<T: CdrEncode + ?Sized>(value: &T, mode: EncodingMode) -> Result<Vec<u8>> {
    let predicted = serialized_size(value, mode)?;
    let mut writer = CdrWriter::with_capacity_at(mode, 0, predicted);
    value.encode(&mut writer)?;
    check_size(predicted, writer.position())?;
    Ok(writer.into_vec())
}

/// Encode into a caller buffer; returns the number of bytes written.
pub fn serialize_into<T: CdrEncode + ?Sized>(
    value: &T,
    buf: &mut [u8],
    mode: EncodingMode,
) -> Result<usize> {
    let predicted = serialized_size(value, mode)?;
    if predicted > buf.len() {
        return Err(CdrError::BufferOverrun {
            offset: 0,
            needed: predicted,
            capacity: buf.len(),
        });
    }
    let mut writer = CdrWriter::fixed(buf, mode);
    value.encode(&mut writer)?;
    check_size(predicted, writer.position())?;
    Ok(predicted)
}

/// Decode a header-less body.
pub fn deserialize<T: CdrDecode>(bytes: &[u8], config: &CodecConfig) -> Result<T> {
    let mut reader = CdrReader::with_config(bytes, config);
    T::decode(&mut reader)
}

/// Encode with a leading encapsulation header.
///
/// The identifier follows `value.extensibility()`. Under XCDR2 the body is
/// padded to a multiple of 4 and the pad count stored in the option bits.
pub fn serialize_with_header<T: CdrEncode + ?Sized>(
    value: &T,
    mode: EncodingMode,
) -> Result<Vec<u8>> {
    let body = serialized_size(value, mode)?;
    let pad = match mode {
        EncodingMode::Xcdr1 => 0,
        EncodingMode::Xcdr2 => (4 - body % 4) % 4,
    };
    let mut header = EncapsulationHeader::new(EncapsulationKind::for_type(
        mode,
        value.extensibility(),
    ));
    header.options = pad as u16;

    let mut out = vec![0u8; ENCAPSULATION_HEADER_SIZE + body + pad];
    out[..ENCAPSULATION_HEADER_SIZE].copy_from_slice(&header.to_bytes());
    serialize_into(
        value,
        &mut out[ENCAPSULATION_HEADER_SIZE..ENCAPSULATION_HEADER_SIZE + body],
        mode,
    )?;
    Ok(out)
}

/// Decode a sample produced by [`serialize_with_header`]. The header's
/// encoding family overrides `config.mode`.
pub fn deserialize_with_header<T: CdrDecode>(sample: &[u8], config: &CodecConfig) -> Result<T> {
    let (header, body) = split_header(sample)?;
    let config = config.clone().mode(header.kind.mode());
    deserialize(body, &config)
}
