//! Per-type metadata memoized for a loader's lifetime.
//!
//! Resolution of a type walks every related type so the whole reachable type
//! universe is primed at first contact. Each entry is either `Resolving` or
//! `Resolved`; a type that is still resolving when reached again through a
//! cycle is simply skipped.

use crate::projection::{ProjectionBuilder, SchemaProjection};
use infile_core::error::Result;
use infile_core::inspector::MetadataInspector;
use infile_core::metadata::{Dependency, EntitySchema, RelationshipInfo};
use std::collections::HashMap;
use std::rc::Rc;
use tracing::trace;

/// Resolution state of one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolutionState {
    /// Resolution has started but related types are still being visited.
    Resolving,
    /// Relations are known.
    Resolved,
}

/// Relations of one type, split by the insertion order they impose.
#[derive(Debug, Clone, Default)]
pub struct TypeRelations {
    /// Targets that must be added before this type (many-to-one, owning one-to-one).
    pub child_dependents: Vec<&'static RelationshipInfo>,
    /// Targets that receive this type's key (one-to-many, key-sharing one-to-one).
    pub parent_dependents: Vec<&'static RelationshipInfo>,
}

impl TypeRelations {
    fn inspect<I: MetadataInspector + ?Sized>(inspector: &I, schema: &'static EntitySchema) -> Self {
        let mut relations = Self::default();
        for relation in inspector.all_relationships(schema) {
            match relation.dependency() {
                Dependency::Child => relations.child_dependents.push(relation),
                Dependency::Parent => relations.parent_dependents.push(relation),
            }
        }
        relations
    }
}

/// Projections of one type: its primary table and each secondary table.
#[derive(Debug, Clone)]
pub struct TypeProjections {
    /// Primary table projection.
    pub primary: SchemaProjection,
    /// Secondary table projections, in declaration order.
    pub secondary: Vec<SchemaProjection>,
}

#[derive(Debug)]
enum Entry {
    Resolving,
    Resolved(Rc<TypeRelations>),
}

/// Metadata cache keyed by entity name.
#[derive(Debug, Default)]
pub struct MetadataCache {
    relations: HashMap<&'static str, Entry>,
    projections: HashMap<&'static str, Rc<TypeProjections>>,
}

impl MetadataCache {
    /// An empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Relations of `schema`, resolving it and every reachable type on first use.
    pub fn relations<I: MetadataInspector + ?Sized>(
        &mut self,
        inspector: &I,
        schema: &'static EntitySchema,
    ) -> Rc<TypeRelations> {
        self.prime(inspector, schema);
        match self.relations.get(schema.entity) {
            Some(Entry::Resolved(relations)) => Rc::clone(relations),
            _ => Rc::new(TypeRelations::inspect(inspector, schema)),
        }
    }

    fn prime<I: MetadataInspector + ?Sized>(&mut self, inspector: &I, schema: &'static EntitySchema) {
        if self.relations.contains_key(schema.entity) {
            return;
        }
        trace!(entity = schema.entity, "resolving relations");
        self.relations.insert(schema.entity, Entry::Resolving);
        let relations = TypeRelations::inspect(inspector, schema);
        for relation in relations
            .child_dependents
            .iter()
            .chain(relations.parent_dependents.iter())
        {
            self.prime(inspector, relation.target_schema());
        }
        self.relations
            .insert(schema.entity, Entry::Resolved(Rc::new(relations)));
    }

    /// Projections of `schema`, built once.
    pub fn projections<I: MetadataInspector + ?Sized>(
        &mut self,
        inspector: &I,
        schema: &'static EntitySchema,
    ) -> Result<Rc<TypeProjections>> {
        if let Some(projections) = self.projections.get(schema.entity) {
            return Ok(Rc::clone(projections));
        }
        let primary = ProjectionBuilder::new(inspector, schema).build()?;
        let secondary = inspector
            .secondary_tables(schema)
            .iter()
            .map(|table| {
                ProjectionBuilder::new(inspector, schema)
                    .using_secondary_table(table)
                    .build()
            })
            .collect::<Result<Vec<_>>>()?;
        let projections = Rc::new(TypeProjections { primary, secondary });
        self.projections
            .insert(schema.entity, Rc::clone(&projections));
        Ok(projections)
    }

    /// Resolution state of a type, `None` if never reached.
    pub fn state(&self, entity: &str) -> Option<ResolutionState> {
        self.relations.get(entity).map(|entry| match entry {
            Entry::Resolving => ResolutionState::Resolving,
            Entry::Resolved(_) => ResolutionState::Resolved,
        })
    }

    /// Number of types whose relations are known.
    pub fn resolved_types(&self) -> usize {
        self.relations
            .values()
            .filter(|entry| matches!(entry, Entry::Resolved(_)))
            .count()
    }
}
