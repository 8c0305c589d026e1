//! Reflection trait implemented by every record type the codec handles.
//!
//! Generated record types implement [`Record`] so the codec, the text printer
//! and the required-field registry can work on `&dyn Record` without knowing
//! the concrete type. All fields are optional at this level: presence is
//! queried with [`Record::has_field`], never inferred from a default value.

use std::any::{Any, TypeId};
use std::fmt;

use crate::descriptor::MessageDescriptor;
use crate::error::SchemaResult;
use crate::unknown::UnknownFields;
use crate::value::{FieldRef, Value};

pub trait Record: Any + fmt::Debug + Send + Sync {
    /// Static description of this record type.
    fn descriptor(&self) -> &'static MessageDescriptor;

    /// Stable, fully qualified type name.
    fn type_name(&self) -> &'static str {
        self.descriptor().full_name
    }

    /// Borrowed view of field `number`, or `None` when it is absent (or an empty list).
    fn field(&self, number: u32) -> Option<FieldRef<'_>>;

    fn has_field(&self, number: u32) -> bool {
        self.field(number).is_some()
    }

    /// Stores `value` into field `number`: singular fields are overwritten,
    /// repeated fields get `value` appended.
    fn set_field(&mut self, number: u32, value: Value) -> SchemaResult<()>;

    /// Nested record behind field `number`, created on demand.
    ///
    /// Singular fields return the present record (inserting a default one when
    /// absent); repeated fields append a default record and return it.
    fn message_mut(&mut self, number: u32) -> SchemaResult<&mut dyn Record>;

    /// Resets every field to absent and drops unknown fields.
    fn clear(&mut self);

    fn unknown_fields(&self) -> &UnknownFields;

    fn unknown_fields_mut(&mut self) -> &mut UnknownFields;

    /// Fresh, empty record of the same dynamic type.
    fn new_instance(&self) -> Box<dyn Record>;

    /// Deep copy with identical contents, unknown fields included.
    fn clone_record(&self) -> Box<dyn Record>;

    fn as_any(&self) -> &dyn Any;
}

/// `TypeId` of the concrete type behind `record`.
pub fn record_type_id(record: &dyn Record) -> TypeId {
    <dyn Any>::type_id(record.as_any())
}

impl Clone for Box<dyn Record> {
    fn clone(&self) -> Self {
        self.clone_record()
    }
}
