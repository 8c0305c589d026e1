//! Name-indexed catalogue of record types known to a process.

use std::any::TypeId;
use std::collections::HashMap;

use crate::descriptor::MessageDescriptor;
use crate::error::{SchemaError, SchemaResult};
use crate::record::Record;

/// Everything the process knows about one record type.
#[derive(Clone, Copy, Debug)]
pub struct SchemaEntry {
    pub type_id: TypeId,
    pub descriptor: &'static MessageDescriptor,
    factory: fn() -> Box<dyn Record>,
}

impl SchemaEntry {
    pub fn of<T: Record + Default>() -> Self {
        fn make<T: Record + Default>() -> Box<dyn Record> {
            Box::<T>::default()
        }
        let factory: fn() -> Box<dyn Record> = make::<T>;
        Self {
            type_id: TypeId::of::<T>(),
            descriptor: factory().descriptor(),
            factory,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.descriptor.full_name
    }

    /// Creates an empty record of this type.
    pub fn new_record(&self) -> Box<dyn Record> {
        (self.factory)()
    }
}

/// Maps full type names to [`SchemaEntry`] values.
#[derive(Clone, Debug, Default)]
pub struct SchemaRegistry {
    by_name: HashMap<&'static str, SchemaEntry>,
}

impl SchemaRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `T`; registering the same type twice is a no-op.
    pub fn register<T: Record + Default>(mut self) -> Self {
        let entry = SchemaEntry::of::<T>();
        self.by_name.insert(entry.type_name(), entry);
        self
    }

    pub fn get(&self, type_name: &str) -> Option<&SchemaEntry> {
        self.by_name.get(type_name)
    }

    pub fn lookup(&self, type_name: &str) -> SchemaResult<&SchemaEntry> {
        self.get(type_name)
            .ok_or_else(|| SchemaError::UnknownType(type_name.to_owned()))
    }

    pub fn new_record(&self, type_name: &str) -> SchemaResult<Box<dyn Record>> {
        self.lookup(type_name).map(SchemaEntry::new_record)
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
