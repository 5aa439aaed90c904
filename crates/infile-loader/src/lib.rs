//! Loaders that turn entity graphs into `LOAD DATA LOCAL INFILE` batches.
//!
//! - [`ProjectionBuilder`] derives the column layout of a table from schema descriptors
//! - [`SingleEntityLoader`] buffers rows for one table and flushes them through a bridge
//! - [`HierarchicalLoader`] walks object graphs and orders inserts by foreign-key dependency
//!
//! Loaders are single-threaded: entities are shared through `Rc<RefCell<_>>`
//! and every operation runs to completion on the calling thread.

pub mod cache;
pub mod callback;
pub mod config;
pub mod hierarchical;
pub mod projection;
pub mod sequence;
pub mod single;

pub use cache::{MetadataCache, ResolutionState, TypeProjections, TypeRelations};
pub use callback::{NoOpCallback, SaveCallback, SaveCallbacks, SaveEvent};
pub use config::LoaderConfig;
pub use hierarchical::HierarchicalLoader;
pub use projection::{
    ColumnSource, ProjectedColumn, ProjectedIdentity, ProjectionBuilder, SchemaProjection,
    load_statement,
};
pub use sequence::IdentitySequence;
pub use single::SingleEntityLoader;
