//! Renders records in the protobuf text format.

use std::fmt::Write as _;

use crate::descriptor::{FieldDescriptor, FieldKind};
use crate::record::Record;
use crate::text::escape::{escape_bytes, escape_str};
use crate::unknown::{UnknownField, UnknownValue};
use crate::value::{FieldRef, ValueRef};

const INDENT: &str = "  ";

/// Configurable text-format printer.
///
/// Fields print in declaration order, followed by unknown fields as
/// `<number>: <value>`.
#[derive(Clone, Copy, Debug)]
pub struct Printer {
    initial_indent_level: usize,
    single_line: bool,
    short_repeated_primitives: bool,
}

impl Default for Printer {
    fn default() -> Self {
        Self {
            initial_indent_level: 0,
            single_line: false,
            short_repeated_primitives: true,
        }
    }
}

impl Printer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Indents every line by `level` steps of two spaces.
    pub fn with_initial_indent_level(mut self, level: usize) -> Self {
        self.initial_indent_level = level;
        self
    }

    /// Prints everything on one line, fields separated by single spaces.
    pub fn single_line(mut self, single_line: bool) -> Self {
        self.single_line = single_line;
        self
    }

    /// Prints repeated numeric, bool and enum fields as `name: [a, b]`.
    pub fn short_repeated_primitives(mut self, short: bool) -> Self {
        self.short_repeated_primitives = short;
        self
    }

    pub fn print_to_string(&self, record: &dyn Record) -> String {
        let mut out = String::new();
        self.print_record(record, self.initial_indent_level, &mut out);
        if self.single_line {
            let trimmed = out.trim_end().len();
            out.truncate(trimmed);
        }
        out
    }

    fn print_record(&self, record: &dyn Record, level: usize, out: &mut String) {
        for field in record.descriptor().fields {
            let Some(present) = record.field(field.number) else {
                continue;
            };
            match present {
                FieldRef::Repeated(values)
                    if self.short_repeated_primitives && field.kind.is_primitive() =>
                {
                    self.start_line(level, out);
                    out.push_str(field.name);
                    out.push_str(": [");
                    for (idx, value) in values.iter().enumerate() {
                        if idx > 0 {
                            out.push_str(", ");
                        }
                        push_scalar(field, value, out);
                    }
                    out.push(']');
                    self.end_line(out);
                }
                present => {
                    for value in present.values() {
                        self.print_value(field, value, level, out);
                    }
                }
            }
        }

        for unknown in record.unknown_fields() {
            self.start_line(level, out);
            push_unknown(unknown, out);
            self.end_line(out);
        }
    }

    fn print_value(&self, field: &FieldDescriptor, value: &ValueRef<'_>, level: usize, out: &mut String) {
        self.start_line(level, out);
        out.push_str(field.name);
        if let ValueRef::Message(nested) = value {
            out.push_str(" {");
            self.end_line(out);
            self.print_record(*nested, level + 1, out);
            self.start_line(level, out);
            out.push('}');
        } else {
            out.push_str(": ");
            push_scalar(field, value, out);
        }
        self.end_line(out);
    }

    fn start_line(&self, level: usize, out: &mut String) {
        if !self.single_line {
            for _ in 0..level {
                out.push_str(INDENT);
            }
        }
    }

    fn end_line(&self, out: &mut String) {
        out.push(if self.single_line { ' ' } else { '\n' });
    }
}

fn push_scalar(field: &FieldDescriptor, value: &ValueRef<'_>, out: &mut String) {
    let _ = match *value {
        ValueRef::F64(v) => write_float(v, out),
        ValueRef::F32(v) if v.is_finite() => write!(out, "{v}"),
        ValueRef::F32(v) => write_float(f64::from(v), out),
        ValueRef::I64(v) => write!(out, "{v}"),
        ValueRef::U64(v) => write!(out, "{v}"),
        ValueRef::I32(v) => write!(out, "{v}"),
        ValueRef::U32(v) => write!(out, "{v}"),
        ValueRef::Bool(v) => write!(out, "{v}"),
        ValueRef::Str(v) => write!(out, "\"{}\"", escape_str(v)),
        ValueRef::Bytes(v) => write!(out, "\"{}\"", escape_bytes(v)),
        ValueRef::Enum(number) => match field.kind {
            FieldKind::Enum(descriptor) => match descriptor.name_of(number) {
                Some(name) => write!(out, "{name}"),
                None => write!(out, "{number}"),
            },
            _ => write!(out, "{number}"),
        },
        // Nested records are printed as blocks by the caller.
        ValueRef::Message(_) => Ok(()),
    };
}

fn write_float(value: f64, out: &mut String) -> std::fmt::Result {
    if value.is_nan() {
        out.push_str("nan");
        Ok(())
    } else if value.is_infinite() {
        out.push_str(if value > 0.0 { "inf" } else { "-inf" });
        Ok(())
    } else {
        write!(out, "{value}")
    }
}

fn push_unknown(field: &UnknownField, out: &mut String) {
    let number = field.number;
    let _ = match &field.value {
        UnknownValue::Varint(v) => write!(out, "{number}: {v}"),
        UnknownValue::Fixed32(v) => write!(out, "{number}: 0x{v:08x}"),
        UnknownValue::Fixed64(v) => write!(out, "{number}: 0x{v:016x}"),
        UnknownValue::LengthDelimited(bytes) => {
            write!(out, "{number}: \"{}\"", escape_bytes(bytes))
        }
    };
}
