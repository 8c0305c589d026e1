//! End-to-end codec scenarios: records through buffers, across schema
//! revisions, with the process-wide required-field table installed.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use message_codec::{parse, serialize, wire, CodecError};
use schema::{approx_eq_text, parse_text, short_debug_string, Record};
use testdata::{MissingNew, MissingOld, TestMessage};
use tracing::{Event, Level, Metadata, Subscriber};
use tracing_subscriber::layer::{Context, Layer, SubscriberExt};
use transport::{Buffer, Release};

/// Counts the events whose metadata `F` accepts.
struct CountEvents<F>(Arc<AtomicUsize>, F);

impl<S, F> Layer<S> for CountEvents<F>
where
    S: Subscriber,
    F: Fn(&Metadata<'_>) -> bool + Send + Sync + 'static,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if (self.1)(event.metadata()) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}

fn count_events(
    filter: impl Fn(&Metadata<'_>) -> bool + Send + Sync + 'static,
    f: impl FnOnce(),
) -> usize {
    let count = Arc::new(AtomicUsize::new(0));
    let subscriber = tracing_subscriber::registry().with(CountEvents(Arc::clone(&count), filter));
    tracing::subscriber::with_default(subscriber, f);
    count.load(Ordering::SeqCst)
}

fn count_warnings(f: impl FnOnce()) -> usize {
    count_events(|metadata| *metadata.level() == Level::WARN, f)
}

fn is_decoder_event(metadata: &Metadata<'_>) -> bool {
    metadata.target() == "message_codec::wire"
}

#[test]
fn parse_through_reserved_header() {
    crate::setup();
    let mut rpc = Buffer::new();
    let mut m = TestMessage::default();
    assert!(parse(&rpc, &mut m, 0).is_err());

    m.field_a = Some(3);
    m.field_b = Some(5);
    serialize(&m, &mut rpc, 8).expect("serialize");
    rpc.header_mut(8)
        .expect("header")
        .copy_from_slice(&0xdead_beef_dead_beef_u64.to_le_bytes());
    m.clear();

    parse(&rpc, &mut m, 8).expect("parse");
    assert_eq!(short_debug_string(&m), "field_a: 3 field_b: 5");
}

#[test]
fn parse_rejects_header_longer_than_buffer() {
    crate::setup();
    let rpc = Buffer::from_vec(vec![0; 4]);
    let mut m = TestMessage::default();
    let err = parse(&rpc, &mut m, 5).unwrap_err();
    assert!(matches!(
        err,
        CodecError::BufferTooSmall {
            skip_bytes: 5,
            length: 4
        }
    ));
}

#[test]
fn released_buffers_hand_back_their_bytes() {
    crate::setup();
    let returned = Arc::new(AtomicUsize::new(0));
    let mut rpc = Buffer::new();
    let seen = Arc::clone(&returned);
    rpc.set_data(
        vec![0x08, 1, 0x10, 2].into_boxed_slice(),
        Release::callback(move |bytes| {
            seen.fetch_add(bytes.len(), Ordering::SeqCst);
        }),
    );

    let mut m = TestMessage::default();
    parse(&rpc, &mut m, 0).expect("parse");
    assert_eq!(returned.load(Ordering::SeqCst), 0);

    serialize(&m, &mut rpc, 0).expect("serialize");
    assert_eq!(returned.load(Ordering::SeqCst), 4);
    drop(rpc);
    assert_eq!(returned.load(Ordering::SeqCst), 4);
}

#[test]
fn missing_enum_values_survive_an_old_reader() {
    crate::setup();
    for which in [MissingNew::FOUR, 99] {
        let new = MissingNew {
            which: Some(which),
            ..MissingNew::default()
        };
        let mut rpc = Buffer::new();
        serialize(&new, &mut rpc, 0).expect("serialize new");

        let mut old = MissingOld::default();
        parse(&rpc, &mut old, 0).expect("parse old");
        assert_eq!(short_debug_string(&old), format!("which: {which}"));

        serialize(&old, &mut rpc, 0).expect("serialize old");
        let mut back = MissingNew::default();
        parse(&rpc, &mut back, 0).expect("parse new");
        assert_eq!(back.which, Some(which));
    }
}

#[test]
fn missing_primitive_and_message_survive_an_old_reader() {
    crate::setup();
    let new = MissingNew {
        which: Some(MissingNew::ONE),
        primitive: Some(7),
        msg: Some(TestMessage {
            field_a: Some(30),
            field_b: Some(40),
            ..TestMessage::default()
        }),
        ..MissingNew::default()
    };
    let mut rpc = Buffer::new();
    serialize(&new, &mut rpc, 0).expect("serialize new");

    let mut old = MissingOld::default();
    parse(&rpc, &mut old, 0).expect("parse old");
    assert_eq!(old.which, Some(MissingOld::ONE));

    serialize(&old, &mut rpc, 0).expect("serialize old");
    let mut back = MissingNew::default();
    parse(&rpc, &mut back, 0).expect("parse new");
    assert!(approx_eq_text(
        &back,
        "which: ONE primitive: 7 msg { field_a: 30 field_b: 40 }"
    ));
}

#[test]
fn nested_required_fields_fail_parse() {
    crate::setup();
    let lenient = message_codec::MessageCodec::with_registry(Arc::new(
        schema::RequiredFieldRegistry::empty(),
    ));
    let new = MissingNew {
        msg: Some(TestMessage {
            field_a: Some(1),
            ..TestMessage::default()
        }),
        ..MissingNew::default()
    };
    let mut rpc = Buffer::new();
    lenient.serialize(&new, &mut rpc, 0).expect("serialize");

    let mut back = MissingNew::default();
    let err = parse(&rpc, &mut back, 0).unwrap_err();
    assert_eq!(err.missing_fields(), ["msg.field_b"]);
}

#[test]
fn decode_failures_warn_once() {
    crate::setup();
    let parse_malformed = || {
        let rpc = Buffer::from_vec(vec![0x0a, 0xff]);
        let mut m = TestMessage::default();
        assert!(parse(&rpc, &mut m, 0).is_err());
    };
    assert_eq!(count_warnings(parse_malformed), 1);
    assert_eq!(count_events(is_decoder_event, parse_malformed), 0);
}

#[test]
fn decoder_diagnostics_are_silenced_during_parse() {
    crate::setup();
    // field_a arrives as fixed32; the decoder keeps it as an unknown field.
    let mismatched = [0x0d, 1, 0, 0, 0, 0x08, 1, 0x10, 2];
    let direct = count_events(is_decoder_event, || {
        let mut m = TestMessage::default();
        wire::decode(&mut m, &mismatched).expect("decode");
    });
    assert_eq!(direct, 1);

    let through_parse = count_events(is_decoder_event, || {
        let mut m = TestMessage::default();
        parse(&Buffer::from_vec(mismatched.to_vec()), &mut m, 0).expect("parse");
        assert_eq!(m.unknown.len(), 1);
    });
    assert_eq!(through_parse, 0);

    let malformed = count_events(is_decoder_event, || {
        let mut m = TestMessage::default();
        assert!(wire::decode(&mut m, &[0x0a, 0xff]).is_err());
    });
    assert_eq!(malformed, 1);
}

#[test]
fn literal_comparison_is_silent() {
    let m = TestMessage {
        field_a: Some(3),
        ..TestMessage::default()
    };
    let silenced = count_warnings(|| {
        assert!(!approx_eq_text(&m, "field_a: {"));
    });
    assert_eq!(silenced, 0);

    let loud = count_warnings(|| {
        let mut scratch = TestMessage::default();
        assert!(parse_text("field_a: {", &mut scratch).is_err());
    });
    assert_eq!(loud, 1);
}
