//! Text dumps, copies and approximate equality of fixture records.

use schema::{
    approx_eq, approx_eq_text, copy, dump_string, dump_string_with, from_text, short_debug_string,
    Record, RequiredFieldRegistry,
};
use testdata::{MissingNew, MissingOld, TestMessage};

fn sample() -> TestMessage {
    TestMessage {
        field_a: Some(3),
        field_b: Some(5),
        field_c: vec![12, 19],
        field_d: Some(b"apostr'phe bin\x01\x02ry".to_vec()),
        ..TestMessage::default()
    }
}

#[test]
fn dump_string_plain_and_literal() {
    crate::setup();
    let m = sample();
    assert_eq!(
        dump_string(&m, false),
        "field_a: 3\n\
         field_b: 5\n\
         field_c: [12, 19]\n\
         field_d: \"apostr\\'phe bin\\001\\002ry\"\n"
    );
    assert_eq!(
        dump_string(&m, true),
        "              \"field_a: 3\"\n\
         \x20             \"field_b: 5\"\n\
         \x20             \"field_c: [12, 19]\"\n\
         \x20             \"field_d: 'apostr\\'phe bin\\001\\002ry'\"\n"
    );
}

#[test]
fn dump_string_marks_missing_required_fields() {
    let m = TestMessage {
        field_a: Some(3),
        ..TestMessage::default()
    };
    let registry = testdata::required_fields();
    assert_eq!(
        dump_string_with(&m, false, registry),
        "field_a: 3\nfield_b: UNDEFINED\n"
    );
    assert_eq!(
        dump_string_with(&m, true, registry),
        "              \"field_a: 3\"\n              \"field_b: UNDEFINED\"\n"
    );
    assert_eq!(
        dump_string_with(&m, false, &RequiredFieldRegistry::empty()),
        "field_a: 3\n"
    );
}

#[test]
fn literal_dump_of_nested_records_keeps_relative_indent() {
    let m = MissingNew {
        which: Some(MissingNew::TWO),
        msg: Some(TestMessage {
            field_a: Some(30),
            field_b: Some(40),
            ..TestMessage::default()
        }),
        ..MissingNew::default()
    };
    assert_eq!(
        dump_string_with(&m, true, testdata::required_fields()),
        "              \"which: TWO\"\n\
         \x20             \"msg {\"\n\
         \x20             \"  field_a: 30\"\n\
         \x20             \"  field_b: 40\"\n\
         \x20             \"}\"\n"
    );
}

#[test]
fn copy_is_equal_and_independent() {
    let m: Box<dyn Record> = Box::new(from_text::<TestMessage>("field_a: 3, field_b: 5"));
    let mut copied = copy(m.as_ref());
    assert!(*copied == *m);

    copied
        .set_field(1, schema::Value::U64(4))
        .expect("set field_a");
    assert!(*copied != *m);
    assert_eq!(short_debug_string(m.as_ref()), "field_a: 3 field_b: 5");
}

#[test]
fn records_compare_against_literals() {
    let m: Box<dyn Record> = Box::new(sample());
    assert!(*m == *"field_a: 3 field_b: 5 field_c: [12, 19] field_d: 'apostr\\'phe bin\\001\\002ry'");
    assert!(*"field_a: 3\nfield_b: 5\nfield_c: 12\nfield_c: 19\nfield_d: \"apostr'phe bin\\x01\\x02ry\"" == *m);
    assert!(*m != *"field_a: 3 field_b: 5");
    assert!(*m != *"field_a: 3 field_b: 5 bogus: 1");
}

#[test]
fn record_equals_the_literal_of_its_dump() {
    let m = sample();
    assert!(approx_eq_text(&m, &dump_string_with(&m, false, &RequiredFieldRegistry::empty())));

    let literal: String = dump_string(&m, true)
        .lines()
        .map(|line| line.trim().trim_matches('"'))
        .collect::<Vec<_>>()
        .join("\n");
    assert!(approx_eq_text(&m, &literal));
}

#[test]
fn different_types_never_compare_equal() {
    let old = MissingOld {
        which: Some(MissingOld::ONE),
        ..MissingOld::default()
    };
    let new = MissingNew {
        which: Some(MissingNew::ONE),
        ..MissingNew::default()
    };
    assert_eq!(short_debug_string(&old), short_debug_string(&new));
    assert!(!approx_eq(&old, &new));
}

#[test]
fn from_text_keeps_what_parsed_before_an_error() {
    let m: TestMessage = from_text("field_a: 1 field_b: oops");
    assert_eq!(m.field_a, Some(1));
    assert_eq!(m.field_b, None);
}
