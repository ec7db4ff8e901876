// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Randomized check that the sizer predicts exactly what the writer emits,
//! from any start position, and that the bytes do not depend on where the
//! stream starts (alignment is relative to the origin).

use hdds_cdr::{
    deserialize, serialize, Cdr, CdrDecode, CdrEncode, CdrSink, CdrSizer, CdrWriter, CodecConfig,
    EncodingMode,
};
use std::fmt::Debug;

const ITERATIONS: usize = 200;

#[derive(Cdr, Debug, PartialEq, Clone)]
#[cdr(final)]
struct Leaf {
    a: u8,
    b: f64,
    c: u16,
}

#[derive(Cdr, Debug, PartialEq, Clone)]
struct Branch {
    flag: bool,
    name: String,
    leaves: Vec<Leaf>,
    extra: Option<i64>,
    grid: [u32; 2],
}

#[derive(Cdr, Debug, PartialEq, Clone)]
#[cdr(mutable)]
struct Root {
    id: u32,
    branch: Branch,
    labels: Vec<String>,
    weights: Vec<f32>,
    note: Option<String>,
    tail: u8,
}

fn random_string(rng: &mut fastrand::Rng) -> String {
    let len = rng.usize(0..12);
    (0..len).map(|_| rng.alphanumeric()).collect()
}

fn random_leaf(rng: &mut fastrand::Rng) -> Leaf {
    Leaf {
        a: rng.u8(..),
        b: rng.f64(),
        c: rng.u16(..),
    }
}

fn random_root(rng: &mut fastrand::Rng) -> Root {
    let branch = Branch {
        flag: rng.bool(),
        name: random_string(rng),
        leaves: (0..rng.usize(0..4)).map(|_| random_leaf(rng)).collect(),
        extra: rng.bool().then(|| rng.i64(..)),
        grid: [rng.u32(..), rng.u32(..)],
    };
    Root {
        id: rng.u32(..),
        branch,
        labels: (0..rng.usize(0..4)).map(|_| random_string(rng)).collect(),
        weights: (0..rng.usize(0..6)).map(|_| rng.f32()).collect(),
        note: rng.bool().then(|| random_string(rng)),
        tail: rng.u8(..),
    }
}

fn check_at<T: CdrEncode + CdrDecode + PartialEq + Debug>(
    value: &T,
    mode: EncodingMode,
    start: usize,
) {
    let mut sizer = CdrSizer::with_start(mode, start);
    value.encode(&mut sizer).unwrap();
    let predicted = sizer.position() - start;

    let mut writer = CdrWriter::growable_at(mode, start);
    value.encode(&mut writer).unwrap();
    assert_eq!(writer.position() - start, predicted, "growable from {start}");
    let grown = writer.into_vec();

    let mut buf = vec![0xAAu8; start + predicted];
    let mut fixed = CdrWriter::fixed_at(&mut buf, start, mode).unwrap();
    value.encode(&mut fixed).unwrap();
    assert_eq!(fixed.position(), start + predicted, "fixed from {start}");
    assert_eq!(&buf[start..], grown.as_slice());

    let from_zero = serialize(value, mode).unwrap();
    assert_eq!(grown, from_zero, "bytes moved with start {start}");

    let back: T = deserialize(&from_zero, &CodecConfig::default().mode(mode)).unwrap();
    assert_eq!(&back, value);
}

#[test]
fn sizer_matches_writer_for_random_values() {
    let _ = env_logger::builder().is_test(true).try_init();
    let mut rng = fastrand::Rng::with_seed(0x5eed_cd12);
    for _ in 0..ITERATIONS {
        let value = random_root(&mut rng);
        let start = rng.usize(0..16);
        for mode in [EncodingMode::Xcdr1, EncodingMode::Xcdr2] {
            check_at(&value, mode, start);
        }
    }
}

#[test]
fn sizer_matches_writer_for_primitive_runs() {
    let mut rng = fastrand::Rng::with_seed(7);
    for _ in 0..ITERATIONS {
        let bytes: Vec<u8> = (0..rng.usize(0..9)).map(|_| rng.u8(..)).collect();
        let wide: Vec<u64> = (0..rng.usize(0..5)).map(|_| rng.u64(..)).collect();
        let start = rng.usize(0..9);
        for mode in [EncodingMode::Xcdr1, EncodingMode::Xcdr2] {
            check_at(&bytes, mode, start);
            check_at(&wide, mode, start);
            check_at(&(rng.bool().then(|| rng.u16(..))), mode, start);
        }
    }
}
