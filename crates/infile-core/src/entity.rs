//! Entity capability traits.
//!
//! Loaders never reflect over structs. Instead each loadable type describes
//! itself: [`RowFields`] hands out column values by field name, and
//! [`Entity`] adds its schema, relationship accessors and a mutator used for
//! identity assignment and key propagation.
//!
//! Entities form graphs with shared and cyclic references, so they are held
//! as [`EntityRef`] (`Rc<RefCell<dyn Entity>>`). Two references denote the
//! same entity when they point at the same allocation.

use crate::error::{AccessorError, AccessorErrorKind, Error, Result};
use crate::metadata::EntitySchema;
use crate::value::Value;
use std::cell::{Ref, RefCell, RefMut};
use std::rc::Rc;

/// Shared handle to an entity in an object graph.
pub type EntityRef = Rc<RefCell<dyn Entity>>;

/// Wrap an entity into an [`EntityRef`].
pub fn entity_ref<E: Entity + 'static>(entity: E) -> EntityRef {
    Rc::new(RefCell::new(entity))
}

/// Reference identity of an entity: the address of its allocation.
///
/// Only meaningful while the referenced entity is alive.
pub fn entity_key(entity: &EntityRef) -> usize {
    Rc::as_ptr(entity).cast::<()>() as usize
}

/// Values of a relationship accessor.
#[derive(Clone, Default)]
pub enum Related {
    /// No related entity.
    #[default]
    None,
    /// A single related entity.
    One(EntityRef),
    /// An ordered sequence of related entities.
    Many(Vec<EntityRef>),
}

impl Related {
    /// Collect an optional reference.
    pub fn from_option(entity: Option<&EntityRef>) -> Self {
        entity.map_or(Related::None, |e| Related::One(Rc::clone(e)))
    }

    /// Collect a slice of references.
    pub fn from_slice(entities: &[EntityRef]) -> Self {
        Related::Many(entities.to_vec())
    }

    /// Whether nothing is related.
    pub fn is_empty(&self) -> bool {
        match self {
            Related::None => true,
            Related::One(_) => false,
            Related::Many(items) => items.is_empty(),
        }
    }

    /// The related entities, in order.
    pub fn into_vec(self) -> Vec<EntityRef> {
        match self {
            Related::None => Vec::new(),
            Related::One(entity) => vec![entity],
            Related::Many(items) => items,
        }
    }
}

impl std::fmt::Debug for Related {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Related::None => write!(f, "Related::None"),
            Related::One(_) => write!(f, "Related::One(..)"),
            Related::Many(items) => write!(f, "Related::Many({} items)", items.len()),
        }
    }
}

/// A type that can describe itself as row fields.
///
/// Implemented by entities and by embeddable value types.
pub trait RowFields {
    /// Name used in error messages; usually the schema's entity name.
    fn type_name(&self) -> &'static str;

    /// The value of a scalar field.
    fn field_value(&self, field: &str) -> Result<Value>;

    /// An embedded value, or `None` when the field is unset.
    fn embedded(&self, field: &str) -> Result<Option<&dyn RowFields>> {
        Err(Error::accessor(
            AccessorErrorKind::UnknownEmbedded,
            self.type_name(),
            field,
        ))
    }
}

/// A loadable domain record.
pub trait Entity: RowFields {
    /// The static schema of this type.
    fn schema(&self) -> &'static EntitySchema;

    /// The values of a relationship accessor.
    fn related(&self, relation: &str) -> Result<Related>;

    /// Assign a field; used for identity generation and key propagation.
    fn assign(&mut self, field: &str, value: Value) -> Result<()>;

    /// The current identity value, `Value::Null` when unset or when the type
    /// has no identity.
    fn identity(&self) -> Result<Value> {
        match self.schema().identity {
            Some(identity) => self.field_value(identity.field),
            None => Ok(Value::Null),
        }
    }
}

/// Borrow an entity immutably, reporting re-entrant access as an accessor error.
pub fn borrow_entity<'a>(
    entity: &'a EntityRef,
    context: &str,
) -> Result<Ref<'a, dyn Entity + 'static>> {
    entity.try_borrow().map_err(|_| {
        Error::Accessor(AccessorError {
            kind: AccessorErrorKind::Borrow,
            entity: "entity",
            name: context.to_string(),
            message: None,
        })
    })
}

/// Borrow an entity mutably, reporting re-entrant access as an accessor error.
pub fn borrow_entity_mut<'a>(
    entity: &'a EntityRef,
    context: &str,
) -> Result<RefMut<'a, dyn Entity + 'static>> {
    entity.try_borrow_mut().map_err(|_| {
        Error::Accessor(AccessorError {
            kind: AccessorErrorKind::Borrow,
            entity: "entity",
            name: context.to_string(),
            message: None,
        })
    })
}
