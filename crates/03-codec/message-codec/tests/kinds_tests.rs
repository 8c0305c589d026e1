//! Scalar kinds, strings and repeated nested records, through the wire
//! format, the text format and the codec.
//! Uses the `Node` fixture, which declares one field of every scalar kind and
//! a list of child nodes.

use std::process::Command;
use std::sync::Arc;

use message_codec::wire::{self, WireError, RECURSION_LIMIT};
use message_codec::{CodecConfig, CodecError, FailureStrategy, MessageCodec};
use proptest::collection;
use proptest::prelude::*;
use schema::{
    approx_eq_text, debug_string, parse_text, short_debug_string, Record, RequiredFieldRegistry,
};
use testdata::Node;
use transport::Buffer;

fn codec() -> MessageCodec {
    MessageCodec::with_registry(Arc::new(testdata::required_fields().clone()))
}

fn encode(record: &dyn Record) -> Vec<u8> {
    let mut out = Vec::new();
    wire::encode(record, &mut out).expect("encode");
    assert_eq!(out.len(), wire::encoded_len(record).expect("encoded_len"));
    out
}

fn decode(bytes: &[u8]) -> Node {
    let mut node = Node::default();
    wire::decode(&mut node, bytes).expect("decode");
    node
}

fn full_node() -> Node {
    Node {
        x: Some(-3),
        y: Some(i64::MIN),
        ratio: Some(0.1),
        weight: Some(-1234.5678),
        count: Some(-7),
        total: Some(i64::MAX),
        small: Some(u32::MAX),
        crc: Some(0xdead_beef),
        stamp: Some(u64::MAX),
        offset: Some(i32::MIN),
        delta: Some(-2),
        flag: Some(true),
        label: Some("tab\there \"quoted\" é".to_owned()),
        kids: vec![
            Node::leaf(1),
            Node {
                x: Some(2),
                samples: vec![1.5, -2.0],
                kids: vec![Node::leaf(3)],
                ..Node::default()
            },
        ],
        samples: vec![0.25, 3.0e-5, -1.0e10],
        ..Node::default()
    }
}

/// Node with `depth` levels of single children below it.
fn chain(depth: usize) -> Node {
    (0..depth).fold(Node::leaf(0), |kid, level| Node {
        x: Some(level as i32 + 1),
        kids: vec![kid],
        ..Node::default()
    })
}

#[test]
fn scalar_kinds_use_their_wire_encodings() {
    let node = Node {
        x: Some(-1),
        y: Some(-3),
        ratio: Some(1.5),
        count: Some(-1),
        delta: Some(-2),
        label: Some("hé".to_owned()),
        samples: vec![0.5],
        ..Node::default()
    };
    let parts: [&[u8]; 7] = [
        &[0x08, 0x01],
        &[0x10, 0x05],
        &[0x1d, 0x00, 0x00, 0xc0, 0x3f],
        &[0x28, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0x01],
        &[0x59, 0xfe, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff],
        &[0x6a, 0x03, b'h', 0xc3, 0xa9],
        &[0x7a, 0x04, 0x00, 0x00, 0x00, 0x3f],
    ];
    let expected = parts.concat();
    assert_eq!(encode(&node), expected);
    assert_eq!(decode(&expected), node);
}

#[test]
fn every_kind_round_trips_through_the_wire() {
    let node = full_node();
    let back = decode(&encode(&node));
    assert_eq!(back, node);
    assert_eq!(back.kids[1].kids, vec![Node::leaf(3)]);
}

#[test]
fn unpacked_floats_are_accepted() {
    let bytes = [0x7d, 0x00, 0x00, 0x00, 0x3f, 0x7d, 0x00, 0x00, 0xc0, 0x3f];
    assert_eq!(decode(&bytes).samples, vec![0.5, 1.5]);
}

#[test]
fn strings_must_be_utf8() {
    let mut node = Node::default();
    let err = wire::decode(&mut node, &[0x6a, 0x01, 0xff]).unwrap_err();
    assert!(matches!(
        err,
        WireError::InvalidUtf8 {
            type_name: "testdata.Node",
            field: "label"
        }
    ));
}

#[test]
fn printer_spells_each_kind() {
    let node = Node {
        x: Some(-3),
        ratio: Some(0.1),
        weight: Some(-2.5),
        crc: Some(7),
        flag: Some(true),
        label: Some("a\"é".to_owned()),
        kids: vec![
            Node::leaf(1),
            Node {
                x: Some(2),
                samples: vec![1.5, -2.0],
                ..Node::default()
            },
        ],
        ..Node::default()
    };
    assert_eq!(
        short_debug_string(&node),
        "x: -3 ratio: 0.1 weight: -2.5 crc: 7 flag: true label: \"a\\\"é\" \
         kids { x: 1 } kids { x: 2 samples: [1.5, -2] }"
    );
}

#[test]
fn non_finite_floats_print_and_parse() {
    let node = Node {
        ratio: Some(f32::INFINITY),
        weight: Some(f64::NEG_INFINITY),
        samples: vec![f32::NAN],
        ..Node::default()
    };
    let text = short_debug_string(&node);
    assert_eq!(text, "ratio: inf weight: -inf samples: [nan]");
    assert!(approx_eq_text(&node, &text));
}

#[test]
fn every_kind_round_trips_through_text() {
    let node = full_node();
    let text = debug_string(&node);
    let mut back = Node::default();
    parse_text(&text, &mut back).expect("parse dump");
    assert_eq!(back, node);
    assert!(approx_eq_text(&node, &text));
}

#[test]
fn repeated_blocks_parse_in_either_style() {
    let mut node = Node::default();
    parse_text("x: 1 kids { x: 2 } kids < x: 3 kids { x: 4 } > flag: false", &mut node)
        .expect("parse");
    assert_eq!(
        node,
        Node {
            x: Some(1),
            flag: Some(false),
            kids: vec![
                Node::leaf(2),
                Node {
                    x: Some(3),
                    kids: vec![Node::leaf(4)],
                    ..Node::default()
                },
            ],
            ..Node::default()
        }
    );
}

#[test]
fn missing_fields_in_repeated_records_are_indexed() {
    let node = Node {
        x: Some(1),
        kids: vec![
            Node::leaf(2),
            Node {
                kids: vec![Node::default()],
                ..Node::default()
            },
        ],
        ..Node::default()
    };
    let expected = ["kids[1].x", "kids[1].kids[0].x"];
    assert_eq!(testdata::required_fields().missing_fields(&node), expected);

    let mut buffer = Buffer::new();
    MessageCodec::with_registry(Arc::new(RequiredFieldRegistry::empty()))
        .serialize(&node, &mut buffer, 2)
        .expect("serialize without checks");
    let mut parsed = Node::default();
    let err = codec().parse(&buffer, &mut parsed, 2).unwrap_err();
    assert_eq!(err.missing_fields(), expected);

    let strict = codec().with_config(CodecConfig {
        on_missing_required: FailureStrategy::Error,
    });
    let err = strict.serialize(&node, &mut buffer, 0).unwrap_err();
    assert!(matches!(err, CodecError::MissingRequired { .. }));
    assert_eq!(err.missing_fields(), expected);
}

#[test]
fn nesting_is_bounded() {
    let mut node = Node::default();
    wire::decode(&mut node, &encode(&chain(RECURSION_LIMIT))).expect("at the limit");
    assert_eq!(node, chain(RECURSION_LIMIT));

    let err = wire::decode(&mut node, &encode(&chain(RECURSION_LIMIT + 1))).unwrap_err();
    assert!(matches!(err, WireError::RecursionLimit));

    let mut buffer = Buffer::new();
    codec()
        .serialize(&chain(150), &mut buffer, 4)
        .expect("encoding has no depth limit");
    let err = codec().parse(&buffer, &mut node, 4).unwrap_err();
    assert!(matches!(
        err,
        CodecError::Decode {
            type_name: "testdata.Node",
            source: WireError::RecursionLimit
        }
    ));
}

fn comparable_f32() -> impl Strategy<Value = f32> {
    any::<f32>().prop_filter("NaN never compares equal", |v| !v.is_nan())
}

proptest! {
    /// Any value of any scalar kind survives the wire.
    #[test]
    fn scalar_values_round_trip(
        (x, count, offset) in (any::<i32>(), any::<i32>(), any::<i32>()),
        (y, total, delta) in (any::<i64>(), any::<i64>(), any::<i64>()),
        (small, crc, stamp) in (any::<u32>(), any::<u32>(), any::<u64>()),
        ratio in comparable_f32(),
        weight in any::<f64>().prop_filter("NaN never compares equal", |v| !v.is_nan()),
        flag in any::<bool>(),
        label in collection::vec(any::<char>(), 0..12),
        samples in collection::vec(comparable_f32(), 0..6),
    ) {
        let node = Node {
            x: Some(x),
            y: Some(y),
            ratio: Some(ratio),
            weight: Some(weight),
            count: Some(count),
            total: Some(total),
            small: Some(small),
            crc: Some(crc),
            stamp: Some(stamp),
            offset: Some(offset),
            delta: Some(delta),
            flag: Some(flag),
            label: Some(label.into_iter().collect()),
            kids: vec![Node::leaf(x)],
            samples,
            ..Node::default()
        };
        prop_assert_eq!(decode(&encode(&node)), node);
    }
}

const ABORT_CHILD: &str = "MESSAGE_CODEC_ABORT_CHILD";

#[test]
fn abort_strategy_terminates_the_process() {
    if std::env::var_os(ABORT_CHILD).is_some() {
        let codec = codec().with_config(CodecConfig {
            on_missing_required: FailureStrategy::Abort,
        });
        // Returning normally makes the parent's assertion fail.
        let _ = codec.serialize(&Node::default(), &mut Buffer::new(), 0);
        return;
    }

    let exe = std::env::current_exe().expect("test binary path");
    let status = Command::new(exe)
        .args(["--exact", "abort_strategy_terminates_the_process", "--test-threads=1"])
        .env(ABORT_CHILD, "1")
        .status()
        .expect("spawn test binary");
    assert!(!status.success(), "child exited with {status}");
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt;
        // SIGABRT
        assert_eq!(status.signal(), Some(6), "child exited with {status}");
    }
}
