//! Dynamic field values exchanged through the [`Record`](crate::Record) accessors.

use smallvec::SmallVec;

use crate::descriptor::FieldKind;
use crate::record::Record;

/// Owned scalar value written into a record field.
///
/// Nested records are not carried by value; they are filled in place through
/// [`Record::message_mut`](crate::Record::message_mut).
#[derive(Clone, Debug, PartialEq)]
pub enum Value {
    F64(f64),
    F32(f32),
    I64(i64),
    U64(u64),
    I32(i32),
    U32(u32),
    Bool(bool),
    String(String),
    Bytes(Vec<u8>),
    /// Raw enum number, kept even when the schema does not declare it.
    Enum(i32),
}

impl Value {
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::F64(_) => "f64",
            Value::F32(_) => "f32",
            Value::I64(_) => "i64",
            Value::U64(_) => "u64",
            Value::I32(_) => "i32",
            Value::U32(_) => "u32",
            Value::Bool(_) => "bool",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Enum(_) => "enum",
        }
    }

    /// Zero value for a scalar kind; `None` for nested records.
    pub fn default_for(kind: &FieldKind) -> Option<Value> {
        Some(match kind {
            FieldKind::Double => Value::F64(0.0),
            FieldKind::Float => Value::F32(0.0),
            FieldKind::Int64 | FieldKind::SInt64 | FieldKind::SFixed64 => Value::I64(0),
            FieldKind::UInt64 | FieldKind::Fixed64 => Value::U64(0),
            FieldKind::Int32 | FieldKind::SInt32 | FieldKind::SFixed32 => Value::I32(0),
            FieldKind::UInt32 | FieldKind::Fixed32 => Value::U32(0),
            FieldKind::Bool => Value::Bool(false),
            FieldKind::String => Value::String(String::new()),
            FieldKind::Bytes => Value::Bytes(Vec::new()),
            FieldKind::Enum(_) => Value::Enum(0),
            FieldKind::Message(_) => return None,
        })
    }
}

/// Borrowed view of a single field value.
#[derive(Clone, Copy, Debug)]
pub enum ValueRef<'a> {
    F64(f64),
    F32(f32),
    I64(i64),
    U64(u64),
    I32(i32),
    U32(u32),
    Bool(bool),
    Str(&'a str),
    Bytes(&'a [u8]),
    Enum(i32),
    Message(&'a dyn Record),
}

/// Borrowed view of a present field.
#[derive(Clone, Debug)]
pub enum FieldRef<'a> {
    Singular(ValueRef<'a>),
    /// Never empty: an empty repeated field is reported as absent.
    Repeated(SmallVec<[ValueRef<'a>; 4]>),
}

impl<'a> FieldRef<'a> {
    /// Builds a repeated view, or `None` when `values` yields nothing.
    pub fn repeated<I>(values: I) -> Option<Self>
    where
        I: IntoIterator<Item = ValueRef<'a>>,
    {
        let values: SmallVec<[ValueRef<'a>; 4]> = values.into_iter().collect();
        if values.is_empty() {
            None
        } else {
            Some(FieldRef::Repeated(values))
        }
    }

    /// Values in order; a singular field yields one.
    pub fn values(&self) -> &[ValueRef<'a>] {
        match self {
            FieldRef::Singular(value) => std::slice::from_ref(value),
            FieldRef::Repeated(values) => values,
        }
    }
}
