// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com
//
// XCDR golden vectors: byte-exact expectations for every extensibility kind
// under both encoding modes.
//
// Each case encodes a known value, compares against the expected bytes,
// checks the sizer prediction, then decodes and re-encodes:
// encode -> decode -> re-encode == original bytes.

#![allow(clippy::float_cmp)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::doc_markdown)]

use hdds_cdr::dynamic::{
    encode_dynamic, DynamicData, DynamicValue, PrimitiveKind, TypeDescriptor, UnionBuilder,
};
use hdds_cdr::{
    deserialize, serialize, serialize_with_header, serialized_size, Cdr, CdrDecode, CdrEncode,
    CodecConfig, EncodingMode, Extensibility,
};
use std::fmt::Debug;
use std::sync::Arc;

const X1: EncodingMode = EncodingMode::Xcdr1;
const X2: EncodingMode = EncodingMode::Xcdr2;

#[derive(Cdr, Debug, PartialEq)]
#[cdr(final)]
struct FinalId {
    id: i32,
}

#[derive(Cdr, Debug, PartialEq)]
#[cdr(appendable)]
struct AppendableId {
    id: i32,
}

#[derive(Cdr, Debug, PartialEq)]
#[cdr(mutable)]
struct Reading {
    #[cdr(id = 10)]
    id: i32,
    #[cdr(id = 60)]
    label: Option<String>,
}

#[derive(Cdr, Debug, PartialEq)]
#[cdr(mutable)]
struct Series {
    #[cdr(id = 1)]
    counts: Vec<u32>,
    stamps: Vec<u64>,
    flags: Vec<u8>,
    names: Vec<String>,
}

#[derive(Cdr, Debug, PartialEq)]
#[cdr(mutable)]
struct Fixed {
    tiny: [u8; 1],
    pair: [u8; 2],
    quad: [u16; 2],
    wide: [u32; 2],
}

#[derive(Cdr, Debug, PartialEq)]
struct Named {
    id: i32,
    name: String,
}

#[derive(Cdr, Debug, PartialEq)]
#[cdr(final)]
struct Stamp {
    flag: u8,
    value: f64,
}

#[derive(Cdr, Debug, PartialEq)]
struct Outer {
    tag: u8,
    inner: Stamp,
}

#[derive(Cdr, Debug, PartialEq)]
#[cdr(final)]
struct Opt<T> {
    a: Option<T>,
}

#[derive(Cdr, Debug, PartialEq, Clone, Copy)]
enum Color {
    Red,
    Green = 5,
    Blue,
}

fn cat(parts: &[&[u8]]) -> Vec<u8> {
    parts.concat()
}

/// Encode, compare, size, decode, re-encode.
fn golden<T: CdrEncode + CdrDecode + PartialEq + Debug>(
    name: &str,
    value: &T,
    mode: EncodingMode,
    expected: &[u8],
) {
    let encoded = serialize(value, mode).unwrap();
    assert_eq!(encoded, expected, "{name}: encoded bytes differ");
    assert_eq!(
        serialized_size(value, mode).unwrap(),
        expected.len(),
        "{name}: sizer prediction"
    );

    let decoded: T = deserialize(&encoded, &CodecConfig::default().mode(mode)).unwrap();
    assert_eq!(&decoded, value, "{name}: roundtrip value mismatch");
    assert_eq!(
        serialize(&decoded, mode).unwrap(),
        encoded,
        "{name}: re-encoded bytes differ from original"
    );
}

#[test]
fn final_int32() {
    let value = FinalId { id: 5 };
    golden("final_xcdr2", &value, X2, &[0x05, 0x00, 0x00, 0x00]);
    golden("final_xcdr1", &value, X1, &[0x05, 0x00, 0x00, 0x00]);
}

#[test]
fn appendable_int32() {
    let value = AppendableId { id: 5 };
    golden(
        "appendable_xcdr2",
        &value,
        X2,
        &[0x04, 0x00, 0x00, 0x00, 0x05, 0x00, 0x00, 0x00],
    );
    // No appendable form in XCDR1.
    golden("appendable_xcdr1", &value, X1, &[0x05, 0x00, 0x00, 0x00]);
}

#[test]
fn string_hi() {
    let expected = [0x03, 0x00, 0x00, 0x00, b'H', b'i', 0x00];
    golden("string_xcdr2", &String::from("Hi"), X2, &expected);
    golden("string_xcdr1", &String::from("Hi"), X1, &expected);
    golden("empty_string", &String::new(), X2, &[0x01, 0x00, 0x00, 0x00, 0x00]);
}

#[test]
fn mutable_xcdr2() {
    let absent = Reading { id: 5, label: None };
    golden(
        "mutable_xcdr2_absent",
        &absent,
        X2,
        &[
            0x08, 0x00, 0x00, 0x00, // DHEADER
            0x0a, 0x00, 0x00, 0x20, // EMHEADER LC=2 id=10
            0x05, 0x00, 0x00, 0x00,
        ],
    );

    let present = Reading {
        id: 5,
        label: Some("ok".into()),
    };
    golden(
        "mutable_xcdr2_present",
        &present,
        X2,
        &[
            0x13, 0x00, 0x00, 0x00, // DHEADER = 19
            0x0a, 0x00, 0x00, 0x20, 0x05, 0x00, 0x00, 0x00, // id=10
            0x3c, 0x00, 0x00, 0x50, // EMHEADER LC=5 id=60
            0x03, 0x00, 0x00, 0x00, b'o', b'k', 0x00, // count doubles as NEXTINT
        ],
    );
}

#[test]
fn mutable_decode_accepts_nextint_string() {
    // Writers that size every string with LC=4 stay readable.
    let bytes = [
        0x17, 0x00, 0x00, 0x00,
        0x0a, 0x00, 0x00, 0x20, 0x05, 0x00, 0x00, 0x00,
        0x3c, 0x00, 0x00, 0x40, 0x07, 0x00, 0x00, 0x00,
        0x03, 0x00, 0x00, 0x00, b'o', b'k', 0x00,
    ];
    let decoded: Reading = deserialize(&bytes, &CodecConfig::xcdr2()).unwrap();
    assert_eq!(decoded.label.as_deref(), Some("ok"));
}

#[test]
fn mutable_sequence_length_codes() {
    let value = Series {
        counts: vec![7, 9],
        stamps: vec![1],
        flags: vec![1, 0, 1],
        names: vec!["a".into()],
    };
    let expected = cat(&[
        &[0x3e, 0x00, 0x00, 0x00], // DHEADER = 62
        // LC=6: length 4 + 4 * 2
        &[0x01, 0x00, 0x00, 0x60, 0x02, 0x00, 0x00, 0x00, 7, 0, 0, 0, 9, 0, 0, 0],
        // LC=7: length 4 + 8 * 1
        &[0x02, 0x00, 0x00, 0x70, 0x01, 0x00, 0x00, 0x00],
        &1u64.to_le_bytes(),
        // LC=5: length 4 + 3
        &[0x03, 0x00, 0x00, 0x50, 0x03, 0x00, 0x00, 0x00, 1, 0, 1, 0],
        // LC=5 on a string sequence: its DHEADER is the NEXTINT
        &[0x04, 0x00, 0x00, 0x50, 0x0a, 0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00],
        &[0x02, 0x00, 0x00, 0x00, b'a', 0x00],
    ]);
    golden("mutable_sequences", &value, X2, &expected);

    let dynamic = DynamicData::from_typed(&value, X2).unwrap();
    assert_eq!(encode_dynamic(&dynamic, X2).unwrap(), expected);
}

#[test]
fn mutable_primitive_array_length_codes() {
    let value = Fixed {
        tiny: [5],
        pair: [6, 7],
        quad: [8, 9],
        wide: [10, 11],
    };
    let expected = [
        0x24, 0x00, 0x00, 0x00, // DHEADER = 36
        0x00, 0x00, 0x00, 0x00, 5, 0, 0, 0, // LC=0, one byte
        0x01, 0x00, 0x00, 0x10, 6, 7, 0, 0, // LC=1, two bytes
        0x02, 0x00, 0x00, 0x20, 8, 0, 9, 0, // LC=2, four bytes
        0x03, 0x00, 0x00, 0x30, 10, 0, 0, 0, 11, 0, 0, 0, // LC=3, eight bytes
    ];
    golden("mutable_arrays", &value, X2, &expected);

    let dynamic = DynamicData::from_typed(&value, X2).unwrap();
    assert_eq!(encode_dynamic(&dynamic, X2).unwrap(), expected);
}

#[test]
fn mutable_xcdr1_parameter_list() {
    let absent = Reading { id: 5, label: None };
    golden(
        "mutable_xcdr1_absent",
        &absent,
        X1,
        &[
            0x0a, 0x00, 0x04, 0x00, // PID 10, length 4
            0x05, 0x00, 0x00, 0x00,
            0x02, 0x3f, 0x00, 0x00, // LIST_END
        ],
    );

    let present = Reading {
        id: 5,
        label: Some("ok".into()),
    };
    golden(
        "mutable_xcdr1_present",
        &present,
        X1,
        &[
            0x0a, 0x00, 0x04, 0x00, 0x05, 0x00, 0x00, 0x00,
            0x3c, 0x00, 0x08, 0x00, // PID 60, padded length 8
            0x03, 0x00, 0x00, 0x00, b'o', b'k', 0x00, 0x00,
            0x02, 0x3f, 0x00, 0x00,
        ],
    );
}

#[test]
fn mutable_missing_optional_decodes_as_absent() {
    let only_id = [0x08, 0x00, 0x00, 0x00, 0x0a, 0x00, 0x00, 0x20, 0x05, 0x00, 0x00, 0x00];
    let decoded: Reading = deserialize(&only_id, &CodecConfig::xcdr2()).unwrap();
    assert_eq!(decoded, Reading { id: 5, label: None });
}

#[test]
fn sizer_matches_writer_for_id_and_name() {
    let value = Named {
        id: 1,
        name: "Test".into(),
    };
    // DHEADER + int32 + (count + "Test\0")
    assert_eq!(serialized_size(&value, X2).unwrap(), 17);
    assert_eq!(serialize(&value, X2).unwrap().len(), 17);
    assert_eq!(serialized_size(&value, X1).unwrap(), 13);
    assert_eq!(serialize(&value, X1).unwrap().len(), 13);
}

#[test]
fn nested_eight_byte_members() {
    let f = 1.5f64.to_le_bytes();
    let stamp = Stamp {
        flag: 1,
        value: 1.5,
    };
    golden("stamp_xcdr1", &stamp, X1, &cat(&[&[1, 0, 0, 0, 0, 0, 0, 0], &f]));
    golden("stamp_xcdr2", &stamp, X2, &cat(&[&[1, 0, 0, 0], &f]));

    let outer = Outer {
        tag: 9,
        inner: Stamp {
            flag: 1,
            value: 1.5,
        },
    };
    // Alignment stays relative to the stream origin inside nested bodies.
    golden(
        "outer_xcdr2",
        &outer,
        X2,
        &cat(&[&[12, 0, 0, 0, 9, 1, 0, 0], &f]),
    );
    golden(
        "outer_xcdr1",
        &outer,
        X1,
        &cat(&[&[9, 1, 0, 0, 0, 0, 0, 0], &f]),
    );
}

#[test]
fn sequence_of_structs() {
    let f = (-2.0f64).to_le_bytes();
    let items = vec![Stamp {
        flag: 7,
        value: -2.0,
    }];
    golden(
        "seq_struct_xcdr2",
        &items,
        X2,
        &cat(&[&[16, 0, 0, 0, 1, 0, 0, 0, 7, 0, 0, 0], &f]),
    );
    golden(
        "seq_struct_xcdr1",
        &items,
        X1,
        &cat(&[&[1, 0, 0, 0, 7, 0, 0, 0], &f]),
    );
    golden("seq_empty_xcdr2", &Vec::<Stamp>::new(), X2, &[4, 0, 0, 0, 0, 0, 0, 0]);
    golden("seq_u16", &vec![1u16, 2], X2, &[2, 0, 0, 0, 1, 0, 2, 0]);
}

#[test]
fn optional_members_in_final_struct() {
    golden("opt_absent", &Opt::<u32> { a: None }, X2, &[0]);
    golden("opt_u32", &Opt { a: Some(7u32) }, X2, &[1, 0, 0, 0, 7, 0, 0, 0]);
    let f = 0.25f64.to_le_bytes();
    golden(
        "opt_f64_xcdr1",
        &Opt { a: Some(0.25f64) },
        X1,
        &cat(&[&[1, 0, 0, 0, 0, 0, 0, 0], &f]),
    );
    golden(
        "opt_f64_xcdr2",
        &Opt { a: Some(0.25f64) },
        X2,
        &cat(&[&[1, 0, 0, 0], &f]),
    );
}

#[test]
fn enumerations() {
    golden("enum_red", &Color::Red, X2, &[0, 0, 0, 0]);
    golden("enum_blue", &Color::Blue, X1, &[6, 0, 0, 0]);
    assert!(deserialize::<Color>(&[1, 0, 0, 0], &CodecConfig::xcdr2()).is_err());
}

#[test]
fn unions() {
    let text = Arc::new(TypeDescriptor::string(None));
    let final_union = Arc::new(
        UnionBuilder::with_i32_discriminator("Value")
            .case("label", 1, text.clone())
            .primitive_case("count", 2, PrimitiveKind::I32)
            .build(),
    );
    let value = DynamicValue::Union(1, "label".into(), Box::new("hi".into()));
    let data = DynamicData::from_value(&final_union, value.clone()).unwrap();
    assert_eq!(
        encode_dynamic(&data, X2).unwrap(),
        vec![1, 0, 0, 0, 3, 0, 0, 0, b'h', b'i', 0]
    );

    let appendable_union = Arc::new(
        UnionBuilder::with_i32_discriminator("Value")
            .extensibility(Extensibility::Appendable)
            .case("label", 1, text)
            .primitive_case("count", 2, PrimitiveKind::I32)
            .build(),
    );
    let data = DynamicData::from_value(&appendable_union, value).unwrap();
    assert_eq!(
        encode_dynamic(&data, X2).unwrap(),
        vec![11, 0, 0, 0, 1, 0, 0, 0, 3, 0, 0, 0, b'h', b'i', 0]
    );
    assert_eq!(
        encode_dynamic(&data, X1).unwrap(),
        vec![1, 0, 0, 0, 3, 0, 0, 0, b'h', b'i', 0]
    );
}

#[test]
fn encapsulation_headers() {
    assert_eq!(
        serialize_with_header(&AppendableId { id: 5 }, X2).unwrap(),
        vec![0x00, 0x09, 0x00, 0x00, 4, 0, 0, 0, 5, 0, 0, 0]
    );
    assert_eq!(
        serialize_with_header(&FinalId { id: 5 }, X2).unwrap(),
        vec![0x00, 0x07, 0x00, 0x00, 5, 0, 0, 0]
    );
    let sample = serialize_with_header(&Reading { id: 5, label: None }, X1).unwrap();
    assert_eq!(&sample[..4], &[0x00, 0x03, 0x00, 0x00]);

    let padded = serialize_with_header(&Reading {
        id: 5,
        label: Some("ok".into()),
    }, X2)
    .unwrap();
    // 23-byte body plus one pad byte.
    assert_eq!(&padded[..4], &[0x00, 0x0b, 0x00, 0x01]);
    assert_eq!(padded.len(), 28);
}
