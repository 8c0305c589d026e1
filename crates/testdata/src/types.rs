//! Fixture record types used across the workspace tests.
//!
//! These stand in for generated code: each type carries a static descriptor
//! and a hand-written [`Record`] implementation.

use schema::{
    Cardinality, EnumDescriptor, FieldDescriptor, FieldKind, FieldRef, MessageDescriptor, Record,
    SchemaError, SchemaResult, UnknownFields, Value, ValueRef,
};

pub static TEST_MESSAGE: MessageDescriptor = MessageDescriptor {
    full_name: "testdata.TestMessage",
    fields: &[
        FieldDescriptor {
            name: "field_a",
            number: 1,
            kind: FieldKind::UInt64,
            cardinality: Cardinality::Optional,
        },
        FieldDescriptor {
            name: "field_b",
            number: 2,
            kind: FieldKind::UInt64,
            cardinality: Cardinality::Optional,
        },
        FieldDescriptor {
            name: "field_c",
            number: 3,
            kind: FieldKind::UInt64,
            cardinality: Cardinality::Repeated,
        },
        FieldDescriptor {
            name: "field_d",
            number: 4,
            kind: FieldKind::Bytes,
            cardinality: Cardinality::Optional,
        },
    ],
};

/// Record with two required integers, a list and an opaque payload.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TestMessage {
    pub field_a: Option<u64>,
    pub field_b: Option<u64>,
    pub field_c: Vec<u64>,
    pub field_d: Option<Vec<u8>>,
    pub unknown: UnknownFields,
}

impl Record for TestMessage {
    fn descriptor(&self) -> &'static MessageDescriptor {
        &TEST_MESSAGE
    }

    fn field(&self, number: u32) -> Option<FieldRef<'_>> {
        match number {
            1 => self.field_a.map(|v| FieldRef::Singular(ValueRef::U64(v))),
            2 => self.field_b.map(|v| FieldRef::Singular(ValueRef::U64(v))),
            3 => FieldRef::repeated(self.field_c.iter().map(|v| ValueRef::U64(*v))),
            4 => self
                .field_d
                .as_deref()
                .map(|v| FieldRef::Singular(ValueRef::Bytes(v))),
            _ => None,
        }
    }

    fn set_field(&mut self, number: u32, value: Value) -> SchemaResult<()> {
        match (number, value) {
            (1, Value::U64(v)) => self.field_a = Some(v),
            (2, Value::U64(v)) => self.field_b = Some(v),
            (3, Value::U64(v)) => self.field_c.push(v),
            (4, Value::Bytes(v)) => self.field_d = Some(v),
            (number, other) => return Err(SchemaError::mismatch(&TEST_MESSAGE, number, &other)),
        }
        Ok(())
    }

    fn message_mut(&mut self, number: u32) -> SchemaResult<&mut dyn Record> {
        Err(SchemaError::not_a_message(&TEST_MESSAGE, number))
    }

    fn clear(&mut self) {
        *self = Self::default();
    }

    fn unknown_fields(&self) -> &UnknownFields {
        &self.unknown
    }

    fn unknown_fields_mut(&mut self) -> &mut UnknownFields {
        &mut self.unknown
    }

    fn new_instance(&self) -> Box<dyn Record> {
        Box::<Self>::default()
    }

    fn clone_record(&self) -> Box<dyn Record> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

pub static MISSING_OLD_ENUM: EnumDescriptor = EnumDescriptor {
    full_name: "testdata.MissingOld.TestEnum",
    values: &[("UNKNOWN", 90), ("ONE", 1), ("TWO", 2), ("THREE", 3)],
};

pub static MISSING_OLD: MessageDescriptor = MessageDescriptor {
    full_name: "testdata.MissingOld",
    fields: &[FieldDescriptor {
        name: "which",
        number: 1,
        kind: FieldKind::Enum(&MISSING_OLD_ENUM),
        cardinality: Cardinality::Optional,
    }],
};

/// Older revision of [`MissingNew`]: knows three enum values and one field.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MissingOld {
    pub which: Option<i32>,
    pub unknown: UnknownFields,
}

impl MissingOld {
    pub const UNKNOWN: i32 = 90;
    pub const ONE: i32 = 1;
    pub const TWO: i32 = 2;
    pub const THREE: i32 = 3;
}

impl Record for MissingOld {
    fn descriptor(&self) -> &'static MessageDescriptor {
        &MISSING_OLD
    }

    fn field(&self, number: u32) -> Option<FieldRef<'_>> {
        match number {
            1 => self.which.map(|v| FieldRef::Singular(ValueRef::Enum(v))),
            _ => None,
        }
    }

    fn set_field(&mut self, number: u32, value: Value) -> SchemaResult<()> {
        match (number, value) {
            (1, Value::Enum(v)) => self.which = Some(v),
            (number, other) => return Err(SchemaError::mismatch(&MISSING_OLD, number, &other)),
        }
        Ok(())
    }

    fn message_mut(&mut self, number: u32) -> SchemaResult<&mut dyn Record> {
        Err(SchemaError::not_a_message(&MISSING_OLD, number))
    }

    fn clear(&mut self) {
        *self = Self::default();
    }

    fn unknown_fields(&self) -> &UnknownFields {
        &self.unknown
    }

    fn unknown_fields_mut(&mut self) -> &mut UnknownFields {
        &mut self.unknown
    }

    fn new_instance(&self) -> Box<dyn Record> {
        Box::<Self>::default()
    }

    fn clone_record(&self) -> Box<dyn Record> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

pub static MISSING_NEW_ENUM: EnumDescriptor = EnumDescriptor {
    full_name: "testdata.MissingNew.TestEnum",
    values: &[
        ("UNKNOWN_OPTESTNUM", 0),
        ("ONE", 1),
        ("TWO", 2),
        ("THREE", 3),
        ("FOUR", 4),
    ],
};

pub static MISSING_NEW: MessageDescriptor = MessageDescriptor {
    full_name: "testdata.MissingNew",
    fields: &[
        FieldDescriptor {
            name: "which",
            number: 1,
            kind: FieldKind::Enum(&MISSING_NEW_ENUM),
            cardinality: Cardinality::Optional,
        },
        FieldDescriptor {
            name: "primitive",
            number: 2,
            kind: FieldKind::UInt64,
            cardinality: Cardinality::Optional,
        },
        FieldDescriptor {
            name: "msg",
            number: 3,
            kind: FieldKind::Message(&TEST_MESSAGE),
            cardinality: Cardinality::Optional,
        },
    ],
};

/// Newer revision of [`MissingOld`]: one more enum value and two more fields.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MissingNew {
    pub which: Option<i32>,
    pub primitive: Option<u64>,
    pub msg: Option<TestMessage>,
    pub unknown: UnknownFields,
}

impl MissingNew {
    pub const UNKNOWN_OPTESTNUM: i32 = 0;
    pub const ONE: i32 = 1;
    pub const TWO: i32 = 2;
    pub const THREE: i32 = 3;
    pub const FOUR: i32 = 4;
}

impl Record for MissingNew {
    fn descriptor(&self) -> &'static MessageDescriptor {
        &MISSING_NEW
    }

    fn field(&self, number: u32) -> Option<FieldRef<'_>> {
        match number {
            1 => self.which.map(|v| FieldRef::Singular(ValueRef::Enum(v))),
            2 => self.primitive.map(|v| FieldRef::Singular(ValueRef::U64(v))),
            3 => self
                .msg
                .as_ref()
                .map(|msg| FieldRef::Singular(ValueRef::Message(msg))),
            _ => None,
        }
    }

    fn set_field(&mut self, number: u32, value: Value) -> SchemaResult<()> {
        match (number, value) {
            (1, Value::Enum(v)) => self.which = Some(v),
            (2, Value::U64(v)) => self.primitive = Some(v),
            (number, other) => return Err(SchemaError::mismatch(&MISSING_NEW, number, &other)),
        }
        Ok(())
    }

    fn message_mut(&mut self, number: u32) -> SchemaResult<&mut dyn Record> {
        match number {
            3 => Ok(self.msg.get_or_insert_with(TestMessage::default)),
            number => Err(SchemaError::not_a_message(&MISSING_NEW, number)),
        }
    }

    fn clear(&mut self) {
        *self = Self::default();
    }

    fn unknown_fields(&self) -> &UnknownFields {
        &self.unknown
    }

    fn unknown_fields_mut(&mut self) -> &mut UnknownFields {
        &mut self.unknown
    }

    fn new_instance(&self) -> Box<dyn Record> {
        Box::<Self>::default()
    }

    fn clone_record(&self) -> Box<dyn Record> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}

pub static NODE: MessageDescriptor = MessageDescriptor {
    full_name: "testdata.Node",
    fields: &[
        FieldDescriptor {
            name: "x",
            number: 1,
            kind: FieldKind::SInt32,
            cardinality: Cardinality::Optional,
        },
        FieldDescriptor {
            name: "y",
            number: 2,
            kind: FieldKind::SInt64,
            cardinality: Cardinality::Optional,
        },
        FieldDescriptor {
            name: "ratio",
            number: 3,
            kind: FieldKind::Float,
            cardinality: Cardinality::Optional,
        },
        FieldDescriptor {
            name: "weight",
            number: 4,
            kind: FieldKind::Double,
            cardinality: Cardinality::Optional,
        },
        FieldDescriptor {
            name: "count",
            number: 5,
            kind: FieldKind::Int32,
            cardinality: Cardinality::Optional,
        },
        FieldDescriptor {
            name: "total",
            number: 6,
            kind: FieldKind::Int64,
            cardinality: Cardinality::Optional,
        },
        FieldDescriptor {
            name: "small",
            number: 7,
            kind: FieldKind::UInt32,
            cardinality: Cardinality::Optional,
        },
        FieldDescriptor {
            name: "crc",
            number: 8,
            kind: FieldKind::Fixed32,
            cardinality: Cardinality::Optional,
        },
        FieldDescriptor {
            name: "stamp",
            number: 9,
            kind: FieldKind::Fixed64,
            cardinality: Cardinality::Optional,
        },
        FieldDescriptor {
            name: "offset",
            number: 10,
            kind: FieldKind::SFixed32,
            cardinality: Cardinality::Optional,
        },
        FieldDescriptor {
            name: "delta",
            number: 11,
            kind: FieldKind::SFixed64,
            cardinality: Cardinality::Optional,
        },
        FieldDescriptor {
            name: "flag",
            number: 12,
            kind: FieldKind::Bool,
            cardinality: Cardinality::Optional,
        },
        FieldDescriptor {
            name: "label",
            number: 13,
            kind: FieldKind::String,
            cardinality: Cardinality::Optional,
        },
        FieldDescriptor {
            name: "kids",
            number: 14,
            kind: FieldKind::Message(&NODE),
            cardinality: Cardinality::Repeated,
        },
        FieldDescriptor {
            name: "samples",
            number: 15,
            kind: FieldKind::Float,
            cardinality: Cardinality::Repeated,
        },
    ],
};

/// Tree node with one field of every scalar kind and a list of child nodes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Node {
    pub x: Option<i32>,
    pub y: Option<i64>,
    pub ratio: Option<f32>,
    pub weight: Option<f64>,
    pub count: Option<i32>,
    pub total: Option<i64>,
    pub small: Option<u32>,
    pub crc: Option<u32>,
    pub stamp: Option<u64>,
    pub offset: Option<i32>,
    pub delta: Option<i64>,
    pub flag: Option<bool>,
    pub label: Option<String>,
    pub kids: Vec<Node>,
    pub samples: Vec<f32>,
    pub unknown: UnknownFields,
}

impl Node {
    /// Leaf carrying only `x`.
    pub fn leaf(x: i32) -> Self {
        Self {
            x: Some(x),
            ..Self::default()
        }
    }
}

impl Record for Node {
    fn descriptor(&self) -> &'static MessageDescriptor {
        &NODE
    }

    fn field(&self, number: u32) -> Option<FieldRef<'_>> {
        match number {
            1 => self.x.map(|v| FieldRef::Singular(ValueRef::I32(v))),
            2 => self.y.map(|v| FieldRef::Singular(ValueRef::I64(v))),
            3 => self.ratio.map(|v| FieldRef::Singular(ValueRef::F32(v))),
            4 => self.weight.map(|v| FieldRef::Singular(ValueRef::F64(v))),
            5 => self.count.map(|v| FieldRef::Singular(ValueRef::I32(v))),
            6 => self.total.map(|v| FieldRef::Singular(ValueRef::I64(v))),
            7 => self.small.map(|v| FieldRef::Singular(ValueRef::U32(v))),
            8 => self.crc.map(|v| FieldRef::Singular(ValueRef::U32(v))),
            9 => self.stamp.map(|v| FieldRef::Singular(ValueRef::U64(v))),
            10 => self.offset.map(|v| FieldRef::Singular(ValueRef::I32(v))),
            11 => self.delta.map(|v| FieldRef::Singular(ValueRef::I64(v))),
            12 => self.flag.map(|v| FieldRef::Singular(ValueRef::Bool(v))),
            13 => self
                .label
                .as_deref()
                .map(|v| FieldRef::Singular(ValueRef::Str(v))),
            14 => FieldRef::repeated(self.kids.iter().map(|kid| ValueRef::Message(kid))),
            15 => FieldRef::repeated(self.samples.iter().map(|v| ValueRef::F32(*v))),
            _ => None,
        }
    }

    fn set_field(&mut self, number: u32, value: Value) -> SchemaResult<()> {
        match (number, value) {
            (1, Value::I32(v)) => self.x = Some(v),
            (2, Value::I64(v)) => self.y = Some(v),
            (3, Value::F32(v)) => self.ratio = Some(v),
            (4, Value::F64(v)) => self.weight = Some(v),
            (5, Value::I32(v)) => self.count = Some(v),
            (6, Value::I64(v)) => self.total = Some(v),
            (7, Value::U32(v)) => self.small = Some(v),
            (8, Value::U32(v)) => self.crc = Some(v),
            (9, Value::U64(v)) => self.stamp = Some(v),
            (10, Value::I32(v)) => self.offset = Some(v),
            (11, Value::I64(v)) => self.delta = Some(v),
            (12, Value::Bool(v)) => self.flag = Some(v),
            (13, Value::String(v)) => self.label = Some(v),
            (15, Value::F32(v)) => self.samples.push(v),
            (number, other) => return Err(SchemaError::mismatch(&NODE, number, &other)),
        }
        Ok(())
    }

    fn message_mut(&mut self, number: u32) -> SchemaResult<&mut dyn Record> {
        match number {
            14 => {
                self.kids.push(Node::default());
                let last = self.kids.len() - 1;
                Ok(&mut self.kids[last])
            }
            number => Err(SchemaError::not_a_message(&NODE, number)),
        }
    }

    fn clear(&mut self) {
        *self = Self::default();
    }

    fn unknown_fields(&self) -> &UnknownFields {
        &self.unknown
    }

    fn unknown_fields_mut(&mut self) -> &mut UnknownFields {
        &mut self.unknown
    }

    fn new_instance(&self) -> Box<dyn Record> {
        Box::<Self>::default()
    }

    fn clone_record(&self) -> Box<dyn Record> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
