//! Infile Rust - hierarchical bulk loading of object graphs through
//! `LOAD DATA LOCAL INFILE`.
//!
//! Entities describe themselves with static schema descriptors and a small
//! capability trait; the loader walks their graph, orders rows so every
//! referenced row is written before the row that references it, and streams
//! each table's rows in large batches through an [`ExecutionBridge`].
//!
//! # Quick Start
//!
//! ```
//! use infile::prelude::*;
//!
//! static CUSTOMER: EntitySchema = EntitySchema::new("Customer")
//!     .table("customer")
//!     .identity(IdentityInfo::auto("id"))
//!     .columns(&[ColumnInfo::new("last_seen_on")]);
//!
//! struct Customer {
//!     id: Option<i64>,
//!     last_seen_on: Option<i32>,
//! }
//!
//! impl RowFields for Customer {
//!     fn type_name(&self) -> &'static str {
//!         "Customer"
//!     }
//!
//!     fn field_value(&self, field: &str) -> Result<Value> {
//!         match field {
//!             "id" => Ok(self.id.into()),
//!             "last_seen_on" => Ok(self.last_seen_on.map_or(Value::Null, Value::Date)),
//!             other => Err(Error::unknown_field("Customer", other)),
//!         }
//!     }
//! }
//!
//! impl Entity for Customer {
//!     fn schema(&self) -> &'static EntitySchema {
//!         &CUSTOMER
//!     }
//!
//!     fn related(&self, relation: &str) -> Result<Related> {
//!         Err(Error::unknown_relation("Customer", relation))
//!     }
//!
//!     fn assign(&mut self, field: &str, value: Value) -> Result<()> {
//!         match field {
//!             "id" => self.id = value.try_into()?,
//!             other => return Err(Error::unknown_field("Customer", other)),
//!         }
//!         Ok(())
//!     }
//! }
//!
//! let mut loader = HierarchicalLoader::new();
//! loader.set_connection(MemoryBridge::new())?;
//!
//! let customer = entity_ref(Customer { id: None, last_seen_on: None });
//! loader.persist(&customer)?;
//! assert_eq!(customer.borrow().identity()?, Value::BigInt(1));
//!
//! loader.flush()?;
//! let bridge = loader.bridge().unwrap();
//! assert_eq!(bridge.table("customer").unwrap().row(0), Some(vec![Some("1"), None]));
//! # Ok::<(), infile::Error>(())
//! ```
//!
//! # Crates
//!
//! - `infile-core`: values, schema descriptors, capability traits, bridge contract
//! - `infile-buffer`: row and batch byte buffers
//! - `infile-loader`: projections, per-table loaders, the graph loader
//! - `infile-memory`: an in-memory bridge for tests and dry runs

pub use infile_core::{
    AccessorError, AccessorErrorKind, CapacityError, CapacityErrorKind, ColumnInfo, ConfigError,
    DISABLE_FOREIGN_KEY_CHECKS, Dependency, EmbeddedInfo, EncodingError, Entity, EntityRef,
    EntitySchema, Error, ExecutionBridge, Generation, IdentityInfo, LoadError, LoadWarning,
    MetadataInspector, Related, RelationshipInfo, RelationshipKind, Result, RowFields,
    SchemaError, SchemaErrorKind, SchemaInspector, SecondaryTableInfo, Value, borrow_entity,
    borrow_entity_mut, check_column_name, days_in_month, days_to_ymd, entity_key, entity_ref,
    format_date, quote_ident_mysql, split_ident_list, unquote_ident_mysql, ymd_to_days,
};

pub use infile_buffer::{
    Charset, DEFAULT_INFILE_BUFFER_SIZE, DEFAULT_ROW_BUFFER_SIZE, InfileDataBuffer, InfileRow,
    NULL_MARKER,
};

pub use infile_loader::{
    ColumnSource, HierarchicalLoader, IdentitySequence, LoaderConfig, MetadataCache, NoOpCallback,
    ProjectedColumn, ProjectedIdentity, ProjectionBuilder, ResolutionState, SaveCallback,
    SaveCallbacks, SaveEvent, SchemaProjection, SingleEntityLoader, TypeProjections,
    TypeRelations, load_statement,
};

pub use infile_memory::{LoadStatement, MemoryBridge, MemoryTable};

/// Everything needed to describe entities and load them.
pub mod prelude {
    pub use crate::{
        Charset, ColumnInfo, EmbeddedInfo, Entity, EntityRef, EntitySchema, Error,
        ExecutionBridge, HierarchicalLoader, IdentityInfo, LoadWarning, LoaderConfig,
        MemoryBridge, Related, RelationshipInfo, Result, RowFields, SaveCallback, SaveCallbacks,
        SaveEvent, SecondaryTableInfo, Value, entity_ref,
    };
}
