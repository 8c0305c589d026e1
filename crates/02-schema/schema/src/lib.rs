#![allow(missing_docs)]

//! Reflection model for schema-described records.
//!
//! Record types describe themselves through static descriptors and expose
//! their fields through the [`Record`] trait. On top of that this crate keeps
//! the required-field table, the text format, and the debugging helpers used
//! by tests to compare records.

pub mod debug;
mod descriptor;
mod error;
mod record;
mod registry;
pub mod required;
mod silence;
pub mod text;
mod unknown;
mod value;

pub use debug::{
    approx_eq, approx_eq_text, copy, debug_string, dump_string, dump_string_with, from_text,
    short_debug_string,
};
pub use descriptor::{Cardinality, EnumDescriptor, FieldDescriptor, FieldKind, MessageDescriptor};
pub use error::{SchemaError, SchemaResult};
pub use record::{record_type_id, Record};
pub use registry::{SchemaEntry, SchemaRegistry};
pub use required::{
    RequiredEntry, RequiredFieldRegistry, RequiredFieldRegistryBuilder, RequiredFieldSet,
};
pub use silence::{silenced, LogSilencer};
pub use text::{parse_text, Printer, TextError};
pub use unknown::{UnknownField, UnknownFields, UnknownValue};
pub use value::{FieldRef, Value, ValueRef};
