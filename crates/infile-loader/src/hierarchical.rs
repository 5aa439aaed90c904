//! Graph loader: persists whole object graphs through per-table loaders.
//!
//! For each entity reached, the loader
//!
//! 1. skips it if already visited in this call or if its type is ignored,
//! 2. persists its child dependents (many-to-one, owning one-to-one) first,
//! 3. adds the entity's row to its primary table, generating its key if needed,
//! 4. hands the key to its parent dependents (one-to-many, key-sharing
//!    one-to-one) and persists them,
//! 5. adds the entity's secondary-table rows.
//!
//! Rows are buffered per table and streamed to the [`ExecutionBridge`] when a
//! batch fills up or on [`flush`](HierarchicalLoader::flush).

use crate::cache::{MetadataCache, TypeRelations};
use crate::callback::{NoOpCallback, SaveCallback};
use crate::config::LoaderConfig;
use crate::sequence::IdentitySequence;
use crate::single::SingleEntityLoader;
use infile_core::bridge::{ExecutionBridge, LoadWarning};
use infile_core::entity::{EntityRef, Related, borrow_entity, borrow_entity_mut, entity_key};
use infile_core::error::{Error, Result};
use infile_core::inspector::{MetadataInspector, SchemaInspector};
use infile_core::metadata::{EntitySchema, RelationshipInfo};
use infile_core::value::Value;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;
use tracing::{debug, info};

/// Entities visited during one top-level call.
///
/// Holds a clone of every visited reference so addresses cannot be reused
/// while the call is running.
#[derive(Default)]
struct PendingSet {
    keys: HashSet<usize>,
    retained: Vec<EntityRef>,
}

impl PendingSet {
    fn contains(&self, entity: &EntityRef) -> bool {
        self.keys.contains(&entity_key(entity))
    }

    fn insert(&mut self, entity: &EntityRef) {
        if self.keys.insert(entity_key(entity)) {
            self.retained.push(Rc::clone(entity));
        }
    }
}

/// The loaders of one entity type: its primary table followed by its secondary tables.
#[derive(Debug)]
struct TypeLoaders {
    entity: &'static str,
    primary: SingleEntityLoader,
    secondary: Vec<SingleEntityLoader>,
}

impl TypeLoaders {
    fn iter_mut(&mut self) -> impl Iterator<Item = &mut SingleEntityLoader> {
        std::iter::once(&mut self.primary).chain(self.secondary.iter_mut())
    }

    fn iter(&self) -> impl Iterator<Item = &SingleEntityLoader> {
        std::iter::once(&self.primary).chain(self.secondary.iter())
    }
}

fn no_connection() -> Error {
    Error::config("connection is not set, did you call set_connection()?")
}

/// Persists object graphs in foreign-key order through bulk loads.
///
/// ```
/// use infile_loader::HierarchicalLoader;
/// # use infile_core::{ExecutionBridge, LoadWarning, Result};
/// # struct Discard;
/// # impl ExecutionBridge for Discard {
/// #     fn execute(&mut self, _: &str) -> Result<()> { Ok(()) }
/// #     fn load_infile(&mut self, _: &str, _: &[u8]) -> Result<Vec<LoadWarning>> { Ok(vec![]) }
/// # }
///
/// let mut loader = HierarchicalLoader::new();
/// loader.set_connection(Discard)?;
/// loader.flush()?;
/// assert_eq!(loader.loader_count(), 0);
/// # Ok::<(), infile_core::Error>(())
/// ```
pub struct HierarchicalLoader<B, I = SchemaInspector> {
    config: LoaderConfig,
    inspector: I,
    bridge: Option<B>,
    callback: Box<dyn SaveCallback>,
    cache: MetadataCache,
    loaders: Vec<TypeLoaders>,
    index: HashMap<&'static str, usize>,
    sequences: HashMap<&'static str, IdentitySequence>,
    retained_warnings: Vec<LoadWarning>,
}

impl<B: ExecutionBridge> HierarchicalLoader<B, SchemaInspector> {
    /// Create a loader with the default configuration.
    pub fn new() -> Self {
        Self::with_inspector(LoaderConfig::default(), SchemaInspector)
    }

    /// Create a loader with a validated configuration.
    pub fn with_config(config: LoaderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_inspector(config, SchemaInspector))
    }
}

impl<B: ExecutionBridge> Default for HierarchicalLoader<B, SchemaInspector> {
    fn default() -> Self {
        Self::new()
    }
}

impl<B: ExecutionBridge, I: MetadataInspector> HierarchicalLoader<B, I> {
    /// Create a loader that reads metadata through a custom inspector.
    pub fn with_inspector(config: LoaderConfig, inspector: I) -> Self {
        Self {
            config,
            inspector,
            bridge: None,
            callback: Box::new(NoOpCallback),
            cache: MetadataCache::new(),
            loaders: Vec::new(),
            index: HashMap::new(),
            sequences: HashMap::new(),
            retained_warnings: Vec::new(),
        }
    }

    /// Install the save hooks (builder pattern).
    #[must_use]
    pub fn with_callback(mut self, callback: impl SaveCallback + 'static) -> Self {
        self.callback = Box::new(callback);
        self
    }

    /// Replace the save hooks.
    pub fn set_callback(&mut self, callback: impl SaveCallback + 'static) {
        self.callback = Box::new(callback);
    }

    /// Install the bridge used for every statement, turning off foreign key
    /// checks on it first when configured to.
    pub fn set_connection(&mut self, mut bridge: B) -> Result<()> {
        if self.config.disable_foreign_key_checks {
            bridge.disable_foreign_key_checks()?;
        }
        self.bridge = Some(bridge);
        Ok(())
    }

    /// Entity names to skip during traversal.
    pub fn set_ignored_types<S: Into<String>>(&mut self, entities: impl IntoIterator<Item = S>) {
        self.config.ignored_types = entities.into_iter().map(Into::into).collect();
    }

    /// Secondary tables to leave untouched. Applies to loaders created afterwards.
    pub fn set_ignored_secondary_tables<S: Into<String>>(
        &mut self,
        tables: impl IntoIterator<Item = S>,
    ) {
        self.config.ignored_secondary_tables = tables.into_iter().map(Into::into).collect();
    }

    /// The active configuration.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// The installed bridge.
    pub fn bridge(&self) -> Option<&B> {
        self.bridge.as_ref()
    }

    /// The installed bridge, mutably.
    pub fn bridge_mut(&mut self) -> Option<&mut B> {
        self.bridge.as_mut()
    }

    /// Remove and return the bridge. Buffered rows stay buffered.
    pub fn take_bridge(&mut self) -> Option<B> {
        self.bridge.take()
    }

    /// The metadata cache.
    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    /// Persist the graph reachable from `root`.
    pub fn persist(&mut self, root: &EntityRef) -> Result<()> {
        if self.bridge.is_none() {
            return Err(no_connection());
        }
        let mut pending = PendingSet::default();
        self.visit(root, &mut pending)
    }

    /// Persist several graphs; each root gets its own visited set.
    pub fn persist_all<'e>(&mut self, roots: impl IntoIterator<Item = &'e EntityRef>) -> Result<()> {
        if self.bridge.is_none() {
            return Err(no_connection());
        }
        for root in roots {
            let mut pending = PendingSet::default();
            self.visit(root, &mut pending)?;
        }
        Ok(())
    }

    fn visit(&mut self, entity: &EntityRef, pending: &mut PendingSet) -> Result<()> {
        let schema = borrow_entity(entity, "schema")?.schema();

        if pending.contains(entity) {
            debug!(
                entity = schema.entity,
                "skipping entity already persisted in this call"
            );
            return Ok(());
        }
        if self.config.ignored_types.contains(schema.entity) {
            debug!(entity = schema.entity, "ignoring entity");
            return Ok(());
        }
        debug!(entity = schema.entity, "persisting entity");

        let relations = self.cache.relations(&self.inspector, schema);
        let slot = self.loader_slot(schema)?;
        pending.insert(entity);

        for relation in &relations.child_dependents {
            for target in related(entity, relation)?.into_vec() {
                self.visit(&target, pending)?;
            }
        }

        self.callback.on_before_save(entity)?;
        {
            let bridge = self.bridge.as_mut().ok_or_else(no_connection)?;
            self.loaders[slot].primary.add(entity, bridge)?;
        }
        self.callback.on_after_save(entity)?;

        let id = borrow_entity(entity, "identity")?.identity()?;
        self.persist_parent_dependents(entity, &relations, &id, pending)?;

        let bridge = self.bridge.as_mut().ok_or_else(no_connection)?;
        for loader in &mut self.loaders[slot].secondary {
            loader.add(entity, bridge)?;
        }
        Ok(())
    }

    fn persist_parent_dependents(
        &mut self,
        entity: &EntityRef,
        relations: &TypeRelations,
        id: &Value,
        pending: &mut PendingSet,
    ) -> Result<()> {
        for relation in &relations.parent_dependents {
            match related(entity, relation)? {
                Related::None => {}
                Related::One(target) => {
                    propagate_key(relation, &target, id, pending, false)?;
                    self.visit(&target, pending)?;
                }
                Related::Many(targets) => {
                    for target in targets {
                        propagate_key(relation, &target, id, pending, true)?;
                        self.visit(&target, pending)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Index of the loaders for `schema`, creating them on first contact.
    fn loader_slot(&mut self, schema: &'static EntitySchema) -> Result<usize> {
        if let Some(&slot) = self.index.get(schema.entity) {
            return Ok(slot);
        }
        let projections = self.cache.projections(&self.inspector, schema)?;
        let sequence = self
            .sequences
            .get(projections.primary.table())
            .copied()
            .unwrap_or_default();
        let primary = SingleEntityLoader::with_sequence(
            projections.primary.clone(),
            self.config.new_buffer()?,
            sequence,
        );
        let mut secondary = Vec::with_capacity(projections.secondary.len());
        for projection in &projections.secondary {
            if self.config.ignored_secondary_tables.contains(projection.table()) {
                debug!(table = projection.table(), "ignoring secondary table");
                continue;
            }
            secondary.push(SingleEntityLoader::new(
                projection.clone(),
                self.config.new_buffer()?,
            ));
        }
        debug!(
            entity = schema.entity,
            table = projections.primary.table(),
            secondary = secondary.len(),
            "created loaders"
        );

        let slot = self.loaders.len();
        self.loaders.push(TypeLoaders {
            entity: schema.entity,
            primary,
            secondary,
        });
        self.index.insert(schema.entity, slot);
        Ok(slot)
    }

    /// Flush every table loader, primaries before their secondaries, in
    /// creation order.
    #[tracing::instrument(level = "info", skip(self))]
    pub fn flush(&mut self) -> Result<()> {
        if self.loaders.is_empty() {
            return Ok(());
        }
        let bridge = self.bridge.as_mut().ok_or_else(no_connection)?;
        debug!(types = self.loaders.len(), "flushing all object loaders");
        for loaders in &mut self.loaders {
            for loader in loaders.iter_mut() {
                loader.flush(bridge)?;
            }
        }
        let rows: usize = self
            .loaders
            .iter()
            .flat_map(TypeLoaders::iter)
            .map(SingleEntityLoader::rows_added)
            .sum();
        info!(rows, "flush complete");
        Ok(())
    }

    /// Flush, then discard every table loader so the next `persist` starts
    /// from a clean slate. Metadata, key sequences and warnings are kept.
    pub fn close(&mut self) -> Result<()> {
        self.flush()?;
        debug!(types = self.loaders.len(), "closing all object loaders");
        for mut loaders in self.loaders.drain(..) {
            let sequence = loaders.primary.sequence();
            if sequence.is_seeded() {
                self.sequences
                    .insert(loaders.primary.projection().table(), sequence);
            }
            for loader in loaders.iter_mut() {
                self.retained_warnings.extend(loader.take_warnings());
            }
        }
        self.index.clear();
        Ok(())
    }

    /// Every warning reported so far, including those of closed loaders.
    pub fn warnings(&self) -> Vec<&LoadWarning> {
        self.retained_warnings
            .iter()
            .chain(
                self.loaders
                    .iter()
                    .flat_map(TypeLoaders::iter)
                    .flat_map(SingleEntityLoader::warnings),
            )
            .collect()
    }

    /// Number of live table loaders, primary and secondary.
    pub fn loader_count(&self) -> usize {
        self.loaders.iter().map(|l| 1 + l.secondary.len()).sum()
    }

    /// Rows added per table, in loader creation order.
    pub fn table_row_counts(&self) -> Vec<(&'static str, usize)> {
        self.loaders
            .iter()
            .flat_map(TypeLoaders::iter)
            .map(|l| (l.projection().table(), l.rows_added()))
            .collect()
    }

    /// Entity names with live loaders, in creation order.
    pub fn loaded_types(&self) -> Vec<&'static str> {
        self.loaders.iter().map(|l| l.entity).collect()
    }
}

impl<B, I> std::fmt::Debug for HierarchicalLoader<B, I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HierarchicalLoader")
            .field("config", &self.config)
            .field("connected", &self.bridge.is_some())
            .field("loaders", &self.loaders)
            .field("sequences", &self.sequences)
            .field("retained_warnings", &self.retained_warnings.len())
            .finish_non_exhaustive()
    }
}

fn related(entity: &EntityRef, relation: &RelationshipInfo) -> Result<Related> {
    let record = borrow_entity(entity, relation.name)?;
    record.related(relation.name)
}

/// Write the owner's key into a parent dependent.
///
/// The key goes into the relationship's `mapped_by` field when declared.
/// Otherwise a single target receives it as its own identity, and elements
/// of a collection are left alone. Targets already visited are not touched.
fn propagate_key(
    relation: &RelationshipInfo,
    target: &EntityRef,
    id: &Value,
    pending: &PendingSet,
    element: bool,
) -> Result<()> {
    if id.is_null() || pending.contains(target) {
        return Ok(());
    }
    let field = match relation.mapped_by {
        Some(field) => field,
        None if element => return Ok(()),
        None => match borrow_entity(target, relation.name)?.schema().identity {
            Some(identity) => identity.field,
            None => return Ok(()),
        },
    };
    borrow_entity_mut(target, field)?.assign(field, id.clone())
}
