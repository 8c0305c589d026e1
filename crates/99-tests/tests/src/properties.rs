//! Property checks over generated fixture records.

use std::sync::Arc;

use message_codec::MessageCodec;
use proptest::collection;
use proptest::option;
use proptest::prelude::*;
use schema::{approx_eq, approx_eq_text, debug_string};
use testdata::{MissingNew, MissingOld, TestMessage};
use transport::Buffer;

fn codec() -> MessageCodec {
    MessageCodec::with_registry(Arc::new(testdata::required_fields().clone()))
}

fn complete_test_message() -> impl Strategy<Value = TestMessage> {
    (
        any::<u64>(),
        any::<u64>(),
        collection::vec(any::<u64>(), 0..8),
        option::of(collection::vec(any::<u8>(), 0..24)),
    )
        .prop_map(|(a, b, c, d)| TestMessage {
            field_a: Some(a),
            field_b: Some(b),
            field_c: c,
            field_d: d,
            ..TestMessage::default()
        })
}

fn missing_new() -> impl Strategy<Value = MissingNew> {
    (
        option::of(any::<i32>()),
        option::of(any::<u64>()),
        option::of(complete_test_message()),
    )
        .prop_map(|(which, primitive, msg)| MissingNew {
            which,
            primitive,
            msg,
            ..MissingNew::default()
        })
}

proptest! {
    /// Serialize then parse reproduces the record for every header size.
    #[test]
    fn codec_round_trip(
        message in complete_test_message(),
        skip in prop_oneof![Just(0usize), Just(3usize), Just(8usize)],
    ) {
        let codec = codec();
        let mut buffer = Buffer::new();
        codec.serialize(&message, &mut buffer, skip).expect("serialize");
        prop_assert_eq!(buffer.data()[..skip].iter().filter(|b| **b != 0).count(), 0);

        let mut parsed = TestMessage::default();
        codec.parse(&buffer, &mut parsed, skip).expect("parse");
        prop_assert!(approx_eq(&parsed, &message));
        prop_assert_eq!(parsed, message);
    }

    /// Any enum number survives a reader that does not declare it.
    #[test]
    fn enum_numbers_survive_old_readers(which in any::<i32>()) {
        let codec = codec();
        let new = MissingNew { which: Some(which), ..MissingNew::default() };
        let mut buffer = Buffer::new();
        codec.serialize(&new, &mut buffer, 0).expect("serialize new");

        let mut old = MissingOld::default();
        codec.parse(&buffer, &mut old, 0).expect("parse old");
        prop_assert_eq!(old.which, Some(which));
    }

    /// new -> old -> new keeps every field the old revision does not know.
    #[test]
    fn evolution_is_non_destructive(new in missing_new(), skip in 0usize..4) {
        let codec = codec();
        let mut buffer = Buffer::new();
        codec.serialize(&new, &mut buffer, skip).expect("serialize new");

        let mut old = MissingOld::default();
        codec.parse(&buffer, &mut old, skip).expect("parse old");
        codec.serialize(&old, &mut buffer, skip).expect("serialize old");

        let mut back = MissingNew::default();
        codec.parse(&buffer, &mut back, skip).expect("parse new");
        prop_assert_eq!(back, new);
    }

    /// A record equals the literal of its own dump, whatever its bytes contain.
    #[test]
    fn dump_parses_back(message in complete_test_message()) {
        prop_assert!(approx_eq_text(&message, &debug_string(&message)));
    }
}
