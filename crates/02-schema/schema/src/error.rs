use thiserror::Error;

use crate::value::Value;

pub type SchemaResult<T> = Result<T, SchemaError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("{type_name} has no field numbered {number}")]
    UnknownFieldNumber { type_name: &'static str, number: u32 },

    #[error("{type_name} has no field named {name:?}")]
    UnknownFieldName { type_name: String, name: String },

    #[error("field {field} of {type_name} cannot hold a {found} value")]
    TypeMismatch {
        type_name: &'static str,
        field: &'static str,
        found: &'static str,
    },

    #[error("field {field} of {type_name} is not a nested record")]
    NotAMessage {
        type_name: &'static str,
        field: &'static str,
    },

    #[error("unknown record type {0:?}")]
    UnknownType(String),

    #[error("field {field} of {type_name} is repeated and cannot be required")]
    RepeatedRequired {
        type_name: &'static str,
        field: &'static str,
    },

    #[error("a global required-field registry is already installed")]
    AlreadyInstalled,
}

impl SchemaError {
    /// Builds the error a record returns when `value` does not fit field `number`.
    pub fn mismatch(
        descriptor: &'static crate::MessageDescriptor,
        number: u32,
        value: &Value,
    ) -> Self {
        match descriptor.field_by_number(number) {
            Some(field) => SchemaError::TypeMismatch {
                type_name: descriptor.full_name,
                field: field.name,
                found: value.kind_name(),
            },
            None => SchemaError::UnknownFieldNumber {
                type_name: descriptor.full_name,
                number,
            },
        }
    }

    /// Builds the error a record returns when field `number` is not a nested record.
    pub fn not_a_message(descriptor: &'static crate::MessageDescriptor, number: u32) -> Self {
        match descriptor.field_by_number(number) {
            Some(field) => SchemaError::NotAMessage {
                type_name: descriptor.full_name,
                field: field.name,
            },
            None => SchemaError::UnknownFieldNumber {
                type_name: descriptor.full_name,
                number,
            },
        }
    }
}
