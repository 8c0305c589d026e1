//! Conventionally required fields, enforced on top of an all-optional schema.
//!
//! The schema system treats every field as optional so old and new peers can
//! interoperate. Some record types still must carry certain fields to make
//! sense; those are listed here as data. Entries are keyed by the concrete
//! record type's [`TypeId`] and checked through [`Record::has_field`], so a
//! lookup can never pair a record with another type's field list.

use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::OnceCell;
use serde::Deserialize;

use crate::descriptor::{FieldDescriptor, MessageDescriptor};
use crate::error::{SchemaError, SchemaResult};
use crate::record::{record_type_id, Record};
use crate::registry::{SchemaEntry, SchemaRegistry};
use crate::value::ValueRef;

static GLOBAL: OnceCell<Arc<RequiredFieldRegistry>> = OnceCell::new();

/// One `[[required]]` table of a configuration file.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
pub struct RequiredEntry {
    #[serde(rename = "type")]
    pub type_name: String,
    pub fields: Vec<String>,
}

/// Required fields of one record type, in declaration order.
#[derive(Clone, Debug)]
pub struct RequiredFieldSet {
    descriptor: &'static MessageDescriptor,
    fields: Vec<&'static FieldDescriptor>,
}

impl RequiredFieldSet {
    pub fn type_name(&self) -> &'static str {
        self.descriptor.full_name
    }

    pub fn field_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|field| field.name)
    }

    /// Required fields `record` does not have, in declaration order.
    pub fn missing_in<'s>(
        &'s self,
        record: &'s dyn Record,
    ) -> impl Iterator<Item = &'static str> + 's {
        self.fields
            .iter()
            .filter(move |field| !record.has_field(field.number))
            .map(|field| field.name)
    }
}

/// Immutable table of [`RequiredFieldSet`]s keyed by record type.
#[derive(Clone, Debug, Default)]
pub struct RequiredFieldRegistry {
    by_type: HashMap<TypeId, RequiredFieldSet>,
    by_name: HashMap<&'static str, TypeId>,
}

impl RequiredFieldRegistry {
    pub fn builder() -> RequiredFieldRegistryBuilder {
        RequiredFieldRegistryBuilder::default()
    }

    /// Registry with no required fields at all.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Builds a registry from configuration entries, resolving names through `schemas`.
    pub fn from_entries(schemas: &SchemaRegistry, entries: &[RequiredEntry]) -> SchemaResult<Self> {
        entries
            .iter()
            .try_fold(Self::builder(), |builder, entry| {
                builder.require_named(schemas, &entry.type_name, entry.fields.as_slice())
            })
            .map(RequiredFieldRegistryBuilder::build)
    }

    /// Names of the fields required for `type_name`; empty when none are registered.
    pub fn is_required(&self, type_name: &str) -> Vec<&'static str> {
        self.by_name
            .get(type_name)
            .and_then(|type_id| self.by_type.get(type_id))
            .map(|set| set.field_names().collect())
            .unwrap_or_default()
    }

    /// Required-field set registered for the concrete type of `record`.
    pub fn for_record(&self, record: &dyn Record) -> Option<&RequiredFieldSet> {
        self.by_type.get(&record_type_id(record))
    }

    /// Paths of every missing required field, descending into present nested records.
    ///
    /// Paths use the text-format convention: `field_a`, `msg.field_a`,
    /// `items[2].field_a`.
    pub fn missing_fields(&self, record: &dyn Record) -> Vec<String> {
        let mut missing = Vec::new();
        self.collect_missing(record, "", &mut missing);
        missing
    }

    pub fn is_complete(&self, record: &dyn Record) -> bool {
        self.missing_fields(record).is_empty()
    }

    pub fn len(&self) -> usize {
        self.by_type.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_type.is_empty()
    }

    fn collect_missing(&self, record: &dyn Record, prefix: &str, out: &mut Vec<String>) {
        if let Some(set) = self.for_record(record) {
            out.extend(set.missing_in(record).map(|name| format!("{prefix}{name}")));
        }

        for field in record.descriptor().fields {
            let Some(present) = record.field(field.number) else {
                continue;
            };
            let repeated = field.is_repeated();
            for (idx, value) in present.values().iter().enumerate() {
                if let ValueRef::Message(nested) = value {
                    let nested_prefix = if repeated {
                        format!("{prefix}{}[{idx}].", field.name)
                    } else {
                        format!("{prefix}{}.", field.name)
                    };
                    self.collect_missing(*nested, &nested_prefix, out);
                }
            }
        }
    }
}

/// Incrementally assembles a [`RequiredFieldRegistry`].
#[derive(Default)]
pub struct RequiredFieldRegistryBuilder {
    registry: RequiredFieldRegistry,
}

impl RequiredFieldRegistryBuilder {
    /// Requires `fields` on record type `T`.
    pub fn require<T: Record + Default>(self, fields: &[&str]) -> SchemaResult<Self> {
        self.require_entry(&SchemaEntry::of::<T>(), fields)
    }

    /// Requires `fields` on the record type registered as `type_name`.
    pub fn require_named<S: AsRef<str>>(
        self,
        schemas: &SchemaRegistry,
        type_name: &str,
        fields: &[S],
    ) -> SchemaResult<Self> {
        let entry = *schemas.lookup(type_name)?;
        self.require_entry(&entry, fields)
    }

    /// Requires `fields` on the record type described by `entry`.
    ///
    /// Fields are stored in declaration order regardless of the order given;
    /// requiring more fields of an already registered type extends its set.
    pub fn require_entry<S: AsRef<str>>(
        mut self,
        entry: &SchemaEntry,
        fields: &[S],
    ) -> SchemaResult<Self> {
        let descriptor = entry.descriptor;
        let mut resolved = Vec::with_capacity(fields.len());
        for name in fields {
            let name = name.as_ref();
            let field =
                descriptor
                    .field_by_name(name)
                    .ok_or_else(|| SchemaError::UnknownFieldName {
                        type_name: descriptor.full_name.to_owned(),
                        name: name.to_owned(),
                    })?;
            if field.is_repeated() {
                return Err(SchemaError::RepeatedRequired {
                    type_name: descriptor.full_name,
                    field: field.name,
                });
            }
            resolved.push(field);
        }

        let set = self
            .registry
            .by_type
            .entry(entry.type_id)
            .or_insert_with(|| RequiredFieldSet {
                descriptor,
                fields: Vec::new(),
            });
        for field in resolved {
            if !set.fields.iter().any(|known| known.number == field.number) {
                set.fields.push(field);
            }
        }
        set.fields
            .sort_by_key(|field| descriptor.position(field.number).unwrap_or(usize::MAX));
        self.registry
            .by_name
            .insert(descriptor.full_name, entry.type_id);
        Ok(self)
    }

    pub fn build(self) -> RequiredFieldRegistry {
        self.registry
    }
}

/// Installs the process-wide registry consulted by default codecs and dumps.
///
/// Meant to be called once at startup; a second call fails.
pub fn install_global(registry: RequiredFieldRegistry) -> SchemaResult<()> {
    GLOBAL
        .set(Arc::new(registry))
        .map_err(|_| SchemaError::AlreadyInstalled)
}

/// The installed process-wide registry, or an empty one when none was installed.
pub fn global() -> Arc<RequiredFieldRegistry> {
    GLOBAL.get().cloned().unwrap_or_default()
}
