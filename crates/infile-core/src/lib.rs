//! Core types and traits for infile bulk loading.
//!
//! This crate provides the foundations shared by the buffer, loader and
//! bridge crates:
//!
//! - `Value` for dynamically typed column values
//! - `EntitySchema` and friends, the static schema descriptors
//! - `Entity` / `RowFields` capability traits for loadable records
//! - `MetadataInspector` for structural questions about types
//! - `ExecutionBridge`, the contract for running bulk-load statements

pub mod bridge;
pub mod entity;
pub mod error;
pub mod identifiers;
pub mod inspector;
pub mod metadata;
pub mod value;

pub use bridge::{DISABLE_FOREIGN_KEY_CHECKS, ExecutionBridge, LoadWarning};
pub use entity::{
    Entity, EntityRef, Related, RowFields, borrow_entity, borrow_entity_mut, entity_key,
    entity_ref,
};
pub use error::{
    AccessorError, AccessorErrorKind, CapacityError, CapacityErrorKind, ConfigError,
    EncodingError, Error, LoadError, Result, SchemaError, SchemaErrorKind,
};
pub use identifiers::{check_column_name, quote_ident_mysql, split_ident_list, unquote_ident_mysql};
pub use inspector::{MetadataInspector, SchemaInspector};
pub use metadata::{
    ColumnInfo, Dependency, EmbeddedInfo, EntitySchema, Generation, IdentityInfo,
    RelationshipInfo, RelationshipKind, SecondaryTableInfo,
};
pub use value::{Value, days_in_month, days_to_ymd, format_date, ymd_to_days};
