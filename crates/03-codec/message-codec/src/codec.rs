use std::sync::Arc;

use schema::{required, LogSilencer, Record, RequiredFieldRegistry};
use transport::{Buffer, Release};

use crate::config::{CodecConfig, FailureStrategy};
use crate::error::{CodecError, CodecResult};
use crate::wire;

/// Moves records in and out of [`Buffer`]s, enforcing required fields.
///
/// `skip_bytes` reserves a header region at the front of the buffer: parse
/// starts reading after it, serialize leaves it zeroed for the caller to fill.
#[derive(Clone, Debug)]
pub struct MessageCodec {
    config: CodecConfig,
    required: Arc<RequiredFieldRegistry>,
}

impl Default for MessageCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl MessageCodec {
    /// Codec checking the process-wide required-field registry.
    pub fn new() -> Self {
        Self::with_registry(required::global())
    }

    pub fn with_registry(required: Arc<RequiredFieldRegistry>) -> Self {
        Self {
            config: CodecConfig::default(),
            required,
        }
    }

    pub fn with_config(mut self, config: CodecConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    pub fn required(&self) -> &RequiredFieldRegistry {
        &self.required
    }

    /// Fills `record` from the bytes of `buffer` after the first `skip_bytes`.
    ///
    /// The record is cleared first. On failure its contents are unspecified.
    pub fn parse(&self, buffer: &Buffer, record: &mut dyn Record, skip_bytes: usize) -> CodecResult<()> {
        let type_name = record.type_name();
        let length = buffer.len();
        let Ok(payload) = buffer.payload(skip_bytes) else {
            tracing::warn!(skip_bytes, length, "buffer too small");
            return Err(CodecError::BufferTooSmall { skip_bytes, length });
        };

        let decoded = {
            let _silencer = LogSilencer::new();
            wire::decode(record, payload)
        };
        if let Err(source) = decoded {
            tracing::warn!(type_name, error = %source, "error parsing message");
            return Err(CodecError::Decode { type_name, source });
        }

        let missing = self.required.missing_fields(record);
        if !missing.is_empty() {
            tracing::warn!(
                type_name,
                missing = %missing.join(", "),
                "parsed message is missing fields"
            );
            return Err(CodecError::MissingFields {
                type_name,
                fields: missing,
            });
        }

        tracing::trace!(type_name, bytes = payload.len(), "parsed message");
        Ok(())
    }

    /// Replaces the contents of `buffer` with `skip_bytes` zeroed header bytes
    /// followed by the encoding of `record`.
    ///
    /// A record missing required fields is handled according to
    /// [`CodecConfig::on_missing_required`]; with the default strategy this panics.
    pub fn serialize(&self, record: &dyn Record, buffer: &mut Buffer, skip_bytes: usize) -> CodecResult<()> {
        let type_name = record.type_name();
        let missing = self.required.missing_fields(record);
        if !missing.is_empty() {
            self.missing_required(type_name, missing)?;
        }

        let encode_error = |source| CodecError::Encode { type_name, source };
        let length = wire::encoded_len(record).map_err(encode_error)?;
        let mut data = Vec::with_capacity(skip_bytes + length);
        data.resize(skip_bytes, 0);
        wire::encode(record, &mut data).map_err(encode_error)?;
        debug_assert_eq!(data.len(), skip_bytes + length);

        buffer.set_data(data.into_boxed_slice(), Release::Free);
        tracing::trace!(type_name, skip_bytes, length, "serialized message");
        Ok(())
    }

    fn missing_required(&self, type_name: &'static str, fields: Vec<String>) -> CodecResult<()> {
        let joined = fields.join(", ");
        match self.config.on_missing_required {
            FailureStrategy::Panic => {
                panic!("missing required fields in message of type {type_name}: {joined}")
            }
            FailureStrategy::Abort => {
                tracing::error!(type_name, missing = %joined, "missing required fields, aborting");
                std::process::abort()
            }
            FailureStrategy::Error => {
                tracing::error!(type_name, missing = %joined, "missing required fields");
                Err(CodecError::MissingRequired { type_name, fields })
            }
        }
    }
}

/// [`MessageCodec::parse`] with the default codec.
pub fn parse(buffer: &Buffer, record: &mut dyn Record, skip_bytes: usize) -> CodecResult<()> {
    MessageCodec::new().parse(buffer, record, skip_bytes)
}

/// [`MessageCodec::serialize`] with the default codec.
pub fn serialize(record: &dyn Record, buffer: &mut Buffer, skip_bytes: usize) -> CodecResult<()> {
    MessageCodec::new().serialize(record, buffer, skip_bytes)
}
