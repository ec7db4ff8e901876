// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use hdds_cdr::dynamic::{PrimitiveKind, TypeDescriptorBuilder, UnionBuilder};
use hdds_cdr::native::NativeLayout;
use hdds_cdr::view::StructView;
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

fuzz_target!(|data: &[u8]| {
    let shape = Arc::new(
        UnionBuilder::with_i32_discriminator("Shape")
            .primitive_case("radius", 1, PrimitiveKind::F32)
            .case("label", 2, Arc::new(hdds_cdr::dynamic::TypeDescriptor::string(None)))
            .build(),
    );
    let desc = Arc::new(
        TypeDescriptorBuilder::new("Sensor")
            .field("id", PrimitiveKind::U32)
            .bounded_string_field("code", 7)
            .string_field("name")
            .sequence_field("samples", PrimitiveKind::I64)
            .optional_field("score", PrimitiveKind::F64)
            .field_with_type("shape", shape)
            .build(),
    );
    let Ok(layout) = NativeLayout::of(&desc) else {
        return;
    };

    // Arbitrary bytes never carry valid in-slice pointers; every access must
    // fail cleanly instead of reading out of bounds.
    if let Ok(view) = StructView::new(data, &layout) {
        let _ = view.get::<u32>("id");
        let _ = view.string("code");
        let _ = view.str_bytes("name");
        let _ = view.sequence("samples").map(|s| s.len());
        let _ = view.optional::<f64>("score");
        let _ = view.union("shape").and_then(|u| u.to_owned());
        let _ = view.to_owned();
    }
});
