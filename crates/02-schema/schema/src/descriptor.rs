//! Static descriptions of record types.
//!
//! Generated record types expose one `static` [`MessageDescriptor`] each. The
//! codec, the text printer and the required-field registry only ever look at a
//! record through its descriptor plus the [`Record`](crate::Record) accessors.

/// Whether a field holds at most one value or an ordered list.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cardinality {
    /// Zero or one value; presence is tracked independently of the value.
    Optional,
    /// Zero or more values in insertion order.
    Repeated,
}

/// Scalar or composite type of a field, following the protobuf type system.
#[derive(Clone, Copy, Debug)]
pub enum FieldKind {
    Double,
    Float,
    Int64,
    UInt64,
    Int32,
    UInt32,
    SInt32,
    SInt64,
    Fixed32,
    Fixed64,
    SFixed32,
    SFixed64,
    Bool,
    String,
    Bytes,
    Enum(&'static EnumDescriptor),
    Message(&'static MessageDescriptor),
}

impl FieldKind {
    /// Numeric, bool and enum kinds; these use the short `[a, b]` text form when repeated.
    pub fn is_primitive(&self) -> bool {
        !matches!(
            self,
            FieldKind::String | FieldKind::Bytes | FieldKind::Message(_)
        )
    }

    /// Human readable kind name used in diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            FieldKind::Double => "double",
            FieldKind::Float => "float",
            FieldKind::Int64 => "int64",
            FieldKind::UInt64 => "uint64",
            FieldKind::Int32 => "int32",
            FieldKind::UInt32 => "uint32",
            FieldKind::SInt32 => "sint32",
            FieldKind::SInt64 => "sint64",
            FieldKind::Fixed32 => "fixed32",
            FieldKind::Fixed64 => "fixed64",
            FieldKind::SFixed32 => "sfixed32",
            FieldKind::SFixed64 => "sfixed64",
            FieldKind::Bool => "bool",
            FieldKind::String => "string",
            FieldKind::Bytes => "bytes",
            FieldKind::Enum(_) => "enum",
            FieldKind::Message(_) => "message",
        }
    }
}

/// Describes one field of a record type.
#[derive(Clone, Copy, Debug)]
pub struct FieldDescriptor {
    /// Field name as written in the schema and in text dumps.
    pub name: &'static str,
    /// Wire tag number.
    pub number: u32,
    pub kind: FieldKind,
    pub cardinality: Cardinality,
}

impl FieldDescriptor {
    pub fn is_repeated(&self) -> bool {
        self.cardinality == Cardinality::Repeated
    }
}

/// Describes a record type: its stable full name and fields in declaration order.
#[derive(Debug)]
pub struct MessageDescriptor {
    pub full_name: &'static str,
    pub fields: &'static [FieldDescriptor],
}

impl MessageDescriptor {
    pub fn field_by_number(&self, number: u32) -> Option<&'static FieldDescriptor> {
        self.fields.iter().find(|field| field.number == number)
    }

    pub fn field_by_name(&self, name: &str) -> Option<&'static FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Position of field `number` in declaration order.
    pub fn position(&self, number: u32) -> Option<usize> {
        self.fields.iter().position(|field| field.number == number)
    }
}

/// Describes an enum type as a list of `(name, number)` pairs.
#[derive(Debug)]
pub struct EnumDescriptor {
    pub full_name: &'static str,
    pub values: &'static [(&'static str, i32)],
}

impl EnumDescriptor {
    /// Symbolic name of `number`, if the enum declares it.
    pub fn name_of(&self, number: i32) -> Option<&'static str> {
        self.values
            .iter()
            .find(|(_, value)| *value == number)
            .map(|(name, _)| *name)
    }

    pub fn number_of(&self, name: &str) -> Option<i32> {
        self.values
            .iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, value)| *value)
    }
}
