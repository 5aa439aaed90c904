//! Metadata inspection contract.
//!
//! The projection builder and the graph loader consult a [`MetadataInspector`]
//! rather than reading descriptors directly, so table names and relationship
//! sets can be remapped without touching the entity types.

use crate::metadata::{
    ColumnInfo, EmbeddedInfo, EntitySchema, IdentityInfo, RelationshipInfo, RelationshipKind,
    SecondaryTableInfo,
};

/// Answers structural questions about entity types.
pub trait MetadataInspector {
    /// The primary table name of a type, if it declares one.
    fn table_name(&self, schema: &'static EntitySchema) -> Option<&'static str> {
        schema.table
    }

    /// Whether the type declares a table.
    fn has_table(&self, schema: &'static EntitySchema) -> bool {
        self.table_name(schema).is_some()
    }

    /// Secondary tables, in declaration order.
    fn secondary_tables(&self, schema: &'static EntitySchema) -> &'static [SecondaryTableInfo] {
        schema.secondary_tables
    }

    /// Scalar columns, in declaration order.
    fn columns(&self, schema: &'static EntitySchema) -> &'static [ColumnInfo] {
        schema.columns
    }

    /// Relationships of one kind, in declaration order. For one-to-one,
    /// `primary_key_join` selects the side that shares the primary key.
    fn relationships(
        &self,
        schema: &'static EntitySchema,
        kind: RelationshipKind,
        primary_key_join: Option<bool>,
    ) -> Vec<&'static RelationshipInfo> {
        schema
            .relationships
            .iter()
            .filter(|r| r.kind == kind)
            .filter(|r| primary_key_join.is_none_or(|pk| r.primary_key_join == pk))
            .collect()
    }

    /// All relationships, in declaration order.
    fn all_relationships(&self, schema: &'static EntitySchema) -> &'static [RelationshipInfo] {
        schema.relationships
    }

    /// Embedded values, in declaration order.
    fn embedded(&self, schema: &'static EntitySchema) -> &'static [EmbeddedInfo] {
        schema.embedded
    }

    /// The identity of a type.
    fn identity(&self, schema: &'static EntitySchema) -> Option<IdentityInfo> {
        schema.identity
    }
}

/// Inspector that reports the static descriptors as declared.
#[derive(Debug, Clone, Copy, Default)]
pub struct SchemaInspector;

impl MetadataInspector for SchemaInspector {}
