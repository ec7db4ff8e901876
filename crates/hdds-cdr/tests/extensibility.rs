// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema evolution across extensibility kinds.
//!
//! - Appendable: a newer writer's extra trailing members are skipped
//! - Mutable: unknown member ids are skipped in any wire order
//! - Must-understand members the reader does not know are rejected
//! - Members an older writer did not send take their default unless marked
//!   `#[cdr(required)]`

#![allow(clippy::float_cmp)]

use hdds_cdr::{deserialize, serialize, Cdr, CdrError, CodecConfig, EncodingMode};

#[derive(Cdr, Debug, PartialEq)]
struct PoseV1 {
    x: f64,
    y: f64,
}

#[derive(Cdr, Debug, PartialEq)]
struct PoseV2 {
    x: f64,
    y: f64,
    z: Option<f64>,
    frame: String,
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
struct ReadingV2 {
    #[cdr(id = 60)]
    label: Option<String>,
    #[cdr(id = 10)]
    id: i32,
    #[cdr(id = 99)]
    gain: u32,
}

#[test]
fn appendable_reader_skips_trailing_members() {
    let newer = PoseV2 {
        x: 1.0,
        y: 2.0,
        z: Some(3.0),
        frame: "map".into(),
    };
    let bytes = serialize(&newer, EncodingMode::Xcdr2).unwrap();
    let older: PoseV1 = deserialize(&bytes, &CodecConfig::xcdr2()).unwrap();
    assert_eq!(older, PoseV1 { x: 1.0, y: 2.0 });
}

#[test]
fn appendable_trailing_optional_defaults_when_missing() {
    #[derive(Cdr, Debug, PartialEq)]
    struct PoseV3 {
        x: f64,
        y: f64,
        z: Option<f64>,
    }

    let bytes = serialize(&PoseV1 { x: 1.0, y: 2.0 }, EncodingMode::Xcdr2).unwrap();
    let newer: PoseV3 = deserialize(&bytes, &CodecConfig::xcdr2()).unwrap();
    assert_eq!(
        newer,
        PoseV3 {
            x: 1.0,
            y: 2.0,
            z: None
        }
    );
}

#[test]
fn appendable_missing_members_take_defaults() {
    let bytes = serialize(&PoseV1 { x: 1.0, y: 2.0 }, EncodingMode::Xcdr2).unwrap();
    let newer: PoseV2 = deserialize(&bytes, &CodecConfig::xcdr2()).unwrap();
    assert_eq!(
        newer,
        PoseV2 {
            x: 1.0,
            y: 2.0,
            z: None,
            frame: String::new()
        }
    );

    // DHEADER declares 8 bytes: only `x` is inside the body.
    let mut bytes = vec![8, 0, 0, 0];
    bytes.extend_from_slice(&1.0f64.to_le_bytes());
    let short: PoseV1 = deserialize(&bytes, &CodecConfig::xcdr2()).unwrap();
    assert_eq!(short, PoseV1 { x: 1.0, y: 0.0 });
}

#[test]
fn appendable_missing_required_member_fails() {
    #[derive(Cdr, Debug, PartialEq)]
    struct StrictPose {
        x: f64,
        #[cdr(required)]
        y: f64,
    }

    let mut bytes = vec![8, 0, 0, 0];
    bytes.extend_from_slice(&1.0f64.to_le_bytes());
    assert!(matches!(
        deserialize::<StrictPose>(&bytes, &CodecConfig::xcdr2()),
        Err(CdrError::InvalidValue(_))
    ));
}

#[test]
fn mutable_reader_skips_unknown_ids_in_any_order() {
    let newer = ReadingV2 {
        label: Some("ok".into()),
        id: 5,
        gain: 0x0909_0909,
    };
    for mode in [EncodingMode::Xcdr1, EncodingMode::Xcdr2] {
        let bytes = serialize(&newer, mode).unwrap();
        let older: Reading = deserialize(&bytes, &CodecConfig::default().mode(mode)).unwrap();
        assert_eq!(
            older,
            Reading {
                id: 5,
                label: Some("ok".into())
            },
            "{mode:?}"
        );
    }
}

#[test]
fn mutable_unknown_member_layout() {
    let body: Vec<u8> = [
        &[0x63, 0x00, 0x00, 0x20, 9, 9, 9, 9][..], // id 99, LC=2
        &[0x0a, 0x00, 0x00, 0x20, 5, 0, 0, 0],       // id 10
        &[0x3c, 0x00, 0x00, 0x50, 3, 0, 0, 0, b'o', b'k', 0], // id 60, LC=5
    ]
    .concat();
    let mut bytes = (body.len() as u32).to_le_bytes().to_vec();
    bytes.extend_from_slice(&body);

    let decoded: Reading = deserialize(&bytes, &CodecConfig::xcdr2()).unwrap();
    assert_eq!(
        decoded,
        Reading {
            id: 5,
            label: Some("ok".into())
        }
    );
}

#[test]
fn unknown_must_understand_member_is_rejected() {
    let bytes = [
        16, 0, 0, 0, //
        0x63, 0x00, 0x00, 0xa0, 9, 9, 9, 9, // M=1, id 99
        0x0a, 0x00, 0x00, 0x20, 5, 0, 0, 0,
    ];
    assert_eq!(
        deserialize::<Reading>(&bytes, &CodecConfig::xcdr2()).unwrap_err(),
        CdrError::UnknownMustUnderstand { member_id: 99 }
    );
}

#[test]
fn mutable_missing_member_takes_default() {
    // Empty body: id 10 never arrives.
    let empty: Reading = deserialize(&[0, 0, 0, 0], &CodecConfig::xcdr2()).unwrap();
    assert_eq!(empty, Reading { id: 0, label: None });

    let old = Reading {
        id: 5,
        label: Some("ok".into()),
    };
    for mode in [EncodingMode::Xcdr1, EncodingMode::Xcdr2] {
        let bytes = serialize(&old, mode).unwrap();
        let newer: ReadingV2 = deserialize(&bytes, &CodecConfig::default().mode(mode)).unwrap();
        assert_eq!(
            newer,
            ReadingV2 {
                label: Some("ok".into()),
                id: 5,
                gain: 0
            },
            "{mode:?}"
        );
    }
}

#[test]
fn mutable_missing_required_member_fails() {
    #[derive(Cdr, Debug, PartialEq)]
    #[cdr(mutable)]
    struct StrictReading {
        #[cdr(id = 10, required)]
        id: i32,
        #[cdr(id = 60)]
        label: Option<String>,
    }

    let bytes = serialize(&StrictReading { id: 3, label: None }, EncodingMode::Xcdr2).unwrap();
    assert_eq!(
        deserialize::<StrictReading>(&bytes, &CodecConfig::xcdr2()).unwrap(),
        StrictReading { id: 3, label: None }
    );
    assert!(matches!(
        deserialize::<StrictReading>(&[0, 0, 0, 0], &CodecConfig::xcdr2()),
        Err(CdrError::InvalidValue(_))
    ));
}

#[test]
fn missing_nested_struct_and_enum_take_defaults() {
    #[derive(Cdr, Debug, PartialEq, Clone, Copy)]
    enum Mode {
        Idle = 3,
        Run,
    }

    #[derive(Cdr, Debug, PartialEq)]
    #[cdr(final)]
    struct Gain {
        value: f32,
        name: String,
    }

    #[derive(Cdr, Debug, PartialEq)]
    #[cdr(mutable)]
    struct Tuned {
        #[cdr(id = 10)]
        id: i32,
        mode: Mode,
        gain: Gain,
        taps: [u16; 2],
    }

    let bytes = serialize(&Reading { id: 4, label: None }, EncodingMode::Xcdr2).unwrap();
    let tuned: Tuned = deserialize(&bytes, &CodecConfig::xcdr2()).unwrap();
    assert_eq!(
        tuned,
        Tuned {
            id: 4,
            mode: Mode::Idle,
            gain: Gain {
                value: 0.0,
                name: String::new()
            },
            taps: [0, 0],
        }
    );
}

#[test]
fn dheader_longer_than_buffer_is_malformed() {
    let bytes = [64, 0, 0, 0, 5, 0, 0, 0];
    assert!(matches!(
        deserialize::<Reading>(&bytes, &CodecConfig::xcdr2()),
        Err(CdrError::MalformedLength { what: "DHEADER", .. })
    ));
}

#[test]
fn default_members_fill_in_for_older_writers() {
    #[derive(Cdr, Debug, PartialEq)]
    #[cdr(mutable)]
    struct ReadingV3 {
        #[cdr(id = 10)]
        id: i32,
        #[cdr(id = 60)]
        label: Option<String>,
        #[cdr(id = 70, default)]
        retries: u16,
    }

    #[derive(Cdr, Debug, PartialEq)]
    struct PoseV4 {
        x: f64,
        y: f64,
        #[cdr(default)]
        frame: String,
    }

    let old = Reading { id: 5, label: None };
    for mode in [EncodingMode::Xcdr1, EncodingMode::Xcdr2] {
        let bytes = serialize(&old, mode).unwrap();
        let newer: ReadingV3 = deserialize(&bytes, &CodecConfig::default().mode(mode)).unwrap();
        assert_eq!(
            newer,
            ReadingV3 {
                id: 5,
                label: None,
                retries: 0
            }
        );
    }

    let bytes = serialize(&PoseV1 { x: 1.0, y: 2.0 }, EncodingMode::Xcdr2).unwrap();
    let newer: PoseV4 = deserialize(&bytes, &CodecConfig::xcdr2()).unwrap();
    assert_eq!(newer.frame, "");
}
