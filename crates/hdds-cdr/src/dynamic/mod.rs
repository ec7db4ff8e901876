// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Field layout descriptors and descriptor-driven values.
//!
//! - **TypeDescriptor**: runtime description of a type (primitives, strings,
//!   enums, structs, unions, sequences, arrays) with extensibility and member ids
//! - **Builder API**: fluent construction of descriptors
//! - **DynamicData**: descriptor-checked value container with field access
//! - **CDR support**: encode/size/decode any descriptor-shaped value
//!
//! # Example
//!
//! ```rust
//! use hdds_cdr::dynamic::{decode_dynamic, encode_dynamic, DynamicData, PrimitiveKind, TypeDescriptorBuilder};
//! use hdds_cdr::{CodecConfig, EncodingMode, Extensibility};
//! use std::sync::Arc;
//!
//! let descriptor = Arc::new(TypeDescriptorBuilder::new("SensorReading")
//!     .extensibility(Extensibility::Mutable)
//!     .key_field("sensor_id", PrimitiveKind::U32)
//!     .field("temperature", PrimitiveKind::F64)
//!     .optional_field("humidity", PrimitiveKind::F32)
//!     .build());
//!
//! let mut data = DynamicData::new(&descriptor);
//! data.set("sensor_id", 42u32).unwrap();
//! data.set("temperature", 23.5f64).unwrap();
//!
//! let bytes = encode_dynamic(&data, EncodingMode::Xcdr2).unwrap();
//! let back = decode_dynamic(&bytes, &descriptor, &CodecConfig::xcdr2()).unwrap();
//! assert_eq!(back.get::<f64>("temperature").unwrap(), 23.5);
//! assert_eq!(back.get::<Option<f32>>("humidity").unwrap(), None);
//! ```

mod builder;
mod cdr_dynamic;
mod dynamic_data;
mod type_descriptor;
mod value;

pub use builder::{EnumBuilder, TypeDescriptorBuilder, UnionBuilder};
pub use cdr_dynamic::{
    decode_dynamic, decode_value, encode_dynamic, encode_value, encoded_size, DynamicEncodable,
};
pub use dynamic_data::{DynamicData, DynamicDataError, FromDynamicValue, IntoDynamicValue};
pub use type_descriptor::{
    ArrayDescriptor, EnumDescriptor, EnumVariant, FieldDescriptor, PrimitiveKind,
    SequenceDescriptor, StructDescriptor, TypeDescriptor, TypeKind, UnionCase, UnionDescriptor,
};
pub use value::DynamicValue;
