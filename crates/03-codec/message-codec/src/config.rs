//! Codec configuration and its TOML file format.
//!
//! ```toml
//! [codec]
//! on_missing_required = "error"   # "panic" (default) | "abort" | "error"
//!
//! [[required]]
//! type = "testdata.TestMessage"
//! fields = ["field_a", "field_b"]
//! ```

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;

use schema::{RequiredEntry, RequiredFieldRegistry, SchemaRegistry};

use crate::codec::MessageCodec;

/// What [`MessageCodec::serialize`] does with a record missing required fields.
///
/// Serializing such a record is a bug in the caller, so the default is to panic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailureStrategy {
    #[default]
    Panic,
    /// Logs the missing fields and aborts the process without unwinding.
    Abort,
    /// Logs the missing fields and returns [`CodecError::MissingRequired`](crate::CodecError::MissingRequired).
    Error,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CodecConfig {
    pub on_missing_required: FailureStrategy,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct SettingsFile {
    codec: CodecConfig,
    required: Vec<RequiredEntry>,
}

/// Codec configuration together with the required-field table it enforces.
#[derive(Debug)]
pub struct CodecSettings {
    pub config: CodecConfig,
    pub required: RequiredFieldRegistry,
}

impl CodecSettings {
    /// Parses settings, resolving `[[required]]` type names through `schemas`.
    pub fn from_toml_str(text: &str, schemas: &SchemaRegistry) -> Result<Self> {
        let file: SettingsFile = toml::from_str(text).context("parsing codec settings")?;
        let required = RequiredFieldRegistry::from_entries(schemas, &file.required)
            .context("resolving required fields")?;
        Ok(Self {
            config: file.codec,
            required,
        })
    }

    pub fn load(path: impl AsRef<Path>, schemas: &SchemaRegistry) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading codec settings from {}", path.display()))?;
        Self::from_toml_str(&text, schemas).with_context(|| format!("loading {}", path.display()))
    }

    pub fn into_codec(self) -> MessageCodec {
        MessageCodec::with_registry(Arc::new(self.required)).with_config(self.config)
    }
}
