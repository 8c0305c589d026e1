//! Human-readable dumps and approximate equality for tests and diagnostics.
//!
//! Two records are considered equal when they have the same type name and
//! the same plain text rendering. This is an approximation: it is exact for
//! everything the printer distinguishes, which covers values, presence,
//! order of repeated fields and unknown fields.

use std::sync::Arc;

use crate::record::Record;
use crate::required::{self, RequiredFieldRegistry};
use crate::silence::{silenced, LogSilencer};
use crate::text::{parse_text, Printer};

/// Indent level whose lines start at column 16.
const LITERAL_INDENT_LEVEL: usize = 8;
const LITERAL_PREFIX: &str = "                ";
const LITERAL_LINE_START: &str = "              \"";

/// Dumps `record` in text format, checking required fields against the
/// installed global registry.
///
/// With `for_test_literal` set, each line is wrapped as a string literal
/// indented by 14 spaces, with double quotes turned into single quotes so the
/// output can be pasted into test source unchanged.
pub fn dump_string(record: &dyn Record, for_test_literal: bool) -> String {
    let registry: Arc<RequiredFieldRegistry> = required::global();
    dump_string_with(record, for_test_literal, &registry)
}

/// [`dump_string`] with an explicit required-field registry.
///
/// Every missing required field adds a trailing `<path>: UNDEFINED` line.
pub fn dump_string_with(
    record: &dyn Record,
    for_test_literal: bool,
    registry: &RequiredFieldRegistry,
) -> String {
    let mut output = if for_test_literal {
        let printed = Printer::new()
            .with_initial_indent_level(LITERAL_INDENT_LEVEL)
            .print_to_string(record);
        let mut literal = String::with_capacity(printed.len() + printed.len() / 8);
        for line in printed.lines() {
            let line = line.replace('"', "'");
            match line.strip_prefix(LITERAL_PREFIX) {
                Some(rest) => {
                    literal.push_str(LITERAL_LINE_START);
                    literal.push_str(rest);
                }
                None => literal.push_str(&line),
            }
            literal.push_str("\"\n");
        }
        literal
    } else {
        debug_string(record)
    };

    for path in registry.missing_fields(record) {
        if for_test_literal {
            output.push_str(LITERAL_LINE_START);
            output.push_str(&path);
            output.push_str(": UNDEFINED\"\n");
        } else {
            output.push_str(&path);
            output.push_str(": UNDEFINED\n");
        }
    }
    output
}

/// Plain multi-line text rendering, without required-field annotations.
pub fn debug_string(record: &dyn Record) -> String {
    Printer::new().print_to_string(record)
}

/// Single-line rendering, e.g. `field_a: 3 field_b: 5`.
pub fn short_debug_string(record: &dyn Record) -> String {
    Printer::new().single_line(true).print_to_string(record)
}

/// Deep copy of `record`, unknown fields included.
pub fn copy(record: &dyn Record) -> Box<dyn Record> {
    record.clone_record()
}

pub fn approx_eq(a: &dyn Record, b: &dyn Record) -> bool {
    a.type_name() == b.type_name() && debug_string(a) == debug_string(b)
}

/// Compares `record` against a text-format literal.
///
/// The literal is parsed into a fresh record of the same type with logging
/// silenced; a literal that does not parse never compares equal.
pub fn approx_eq_text(record: &dyn Record, literal: &str) -> bool {
    let mut expected = record.new_instance();
    let parsed = {
        let _silencer = LogSilencer::new();
        parse_text(literal, expected.as_mut())
    };
    parsed.is_ok() && approx_eq(record, expected.as_ref())
}

/// Builds a `T` from a text-format literal.
///
/// Parse errors are ignored: the result holds whatever was read before the
/// error. Meant for tests, where the literal is a constant.
pub fn from_text<T: Record + Default>(text: &str) -> T {
    let mut record = T::default();
    let _ = silenced(|| parse_text(text, &mut record));
    record
}

impl PartialEq for dyn Record {
    fn eq(&self, other: &Self) -> bool {
        approx_eq(self, other)
    }
}

impl PartialEq<str> for dyn Record {
    fn eq(&self, other: &str) -> bool {
        approx_eq_text(self, other)
    }
}

impl PartialEq<dyn Record> for str {
    fn eq(&self, other: &dyn Record) -> bool {
        approx_eq_text(other, self)
    }
}
