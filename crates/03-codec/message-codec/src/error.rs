use thiserror::Error;

use crate::wire::WireError;

pub type CodecResult<T> = Result<T, CodecError>;

#[derive(Debug, Error)]
pub enum CodecError {
    #[error("buffer too small: skip_bytes={skip_bytes}, length={length}")]
    BufferTooSmall { skip_bytes: usize, length: usize },

    #[error("failed to parse message of type {type_name}: {source}")]
    Decode {
        type_name: &'static str,
        #[source]
        source: WireError,
    },

    #[error("failed to serialize message of type {type_name}: {source}")]
    Encode {
        type_name: &'static str,
        #[source]
        source: WireError,
    },

    #[error("parsed message of type {type_name} is missing fields: {}", .fields.join(", "))]
    MissingFields {
        type_name: &'static str,
        fields: Vec<String>,
    },

    #[error("missing required fields in message of type {type_name}: {}", .fields.join(", "))]
    MissingRequired {
        type_name: &'static str,
        fields: Vec<String>,
    },
}

impl CodecError {
    /// Missing field paths carried by either required-field variant.
    pub fn missing_fields(&self) -> &[String] {
        match self {
            CodecError::MissingFields { fields, .. } | CodecError::MissingRequired { fields, .. } => {
                fields.as_slice()
            }
            _ => &[],
        }
    }
}
