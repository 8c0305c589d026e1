#![allow(missing_docs)]

//! Serializes schema-described records into transport buffers and back.
//!
//! Records travel in the protobuf binary wire format behind an optional
//! caller-reserved header. Every field is optional on the wire; the codec
//! enforces the conventionally required ones from a [`RequiredFieldRegistry`].
//!
//! [`RequiredFieldRegistry`]: schema::RequiredFieldRegistry

mod codec;
pub mod config;
mod error;
pub mod wire;

pub use codec::{parse, serialize, MessageCodec};
pub use config::{CodecConfig, CodecSettings, FailureStrategy};
pub use error::{CodecError, CodecResult};
pub use wire::WireError;
