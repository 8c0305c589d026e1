//! Fixture record types and required-field tables for workspace tests.

mod types;

pub use types::{
    MissingNew, MissingOld, Node, TestMessage, MISSING_NEW, MISSING_NEW_ENUM, MISSING_OLD,
    MISSING_OLD_ENUM, NODE, TEST_MESSAGE,
};

use once_cell::sync::{Lazy, OnceCell};
use schema::{RequiredEntry, RequiredFieldRegistry, SchemaRegistry};
use serde::Deserialize;

/// Required-field table of the fixture types, in the configuration file format.
pub const REQUIRED_FIELDS_TOML: &str = include_str!("../required_fields.toml");

#[derive(Deserialize)]
struct RequiredFile {
    required: Vec<RequiredEntry>,
}

static SCHEMAS: Lazy<SchemaRegistry> = Lazy::new(|| {
    SchemaRegistry::new()
        .register::<TestMessage>()
        .register::<MissingOld>()
        .register::<MissingNew>()
        .register::<Node>()
});

static REQUIRED: Lazy<RequiredFieldRegistry> = Lazy::new(|| {
    let file: RequiredFile = toml::from_str(REQUIRED_FIELDS_TOML)
        .unwrap_or_else(|err| panic!("invalid fixture required-field table: {err}"));
    RequiredFieldRegistry::from_entries(&SCHEMAS, &file.required)
        .unwrap_or_else(|err| panic!("unresolvable fixture required-field table: {err}"))
});

static INSTALLED: OnceCell<()> = OnceCell::new();

/// Every fixture record type, by full name.
pub fn schemas() -> &'static SchemaRegistry {
    &SCHEMAS
}

/// Required fields of the fixture types.
pub fn required_fields() -> &'static RequiredFieldRegistry {
    &REQUIRED
}

/// Installs [`required_fields`] as the process-wide registry.
///
/// Safe to call from every test; only the first call installs anything.
pub fn init() {
    INSTALLED.get_or_init(|| {
        // Another component may have installed a registry first.
        let _ = schema::required::install_global(required_fields().clone());
    });
}
