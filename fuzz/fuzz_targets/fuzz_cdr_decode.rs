// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![no_main]

use hdds_cdr::dynamic::{decode_dynamic, TypeDescriptor, UnionBuilder};
use hdds_cdr::{deserialize, deserialize_with_header, split_header, Cdr, CodecConfig, DescribeType};
use libfuzzer_sys::fuzz_target;
use std::sync::Arc;

#[derive(Cdr, Debug)]
#[cdr(final)]
struct Point {
    x: f64,
    y: f64,
}

#[derive(Cdr, Debug)]
struct Track {
    id: u32,
    points: Vec<Point>,
    label: Option<String>,
}

#[derive(Cdr, Debug)]
#[cdr(mutable)]
struct Envelope {
    #[cdr(key)]
    id: u64,
    tracks: Vec<Track>,
    names: Vec<String>,
    grid: [i16; 3],
}

fuzz_target!(|data: &[u8]| {
    let config = CodecConfig::default().max_collection_length(4096);

    // Header parsing then header-driven decode
    let _ = split_header(data);
    let _ = deserialize_with_header::<Envelope>(data, &config);

    // Header-less decode under both families
    for config in [config.clone().mode(hdds_cdr::EncodingMode::Xcdr1), config.clone()] {
        let _ = deserialize::<Envelope>(data, &config);
        let _ = deserialize::<Vec<Track>>(data, &config);

        // Descriptor-driven decode of the same type and of a union
        let _ = decode_dynamic(data, &Envelope::type_descriptor(), &config);
        let shape = Arc::new(
            UnionBuilder::with_i32_discriminator("Shape")
                .case("name", 1, Arc::new(TypeDescriptor::string(Some(16))))
                .case("track", 2, Track::type_descriptor())
                .build(),
        );
        let _ = decode_dynamic(data, &shape, &config);
    }
});
