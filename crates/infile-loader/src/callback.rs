//! Save hooks fired around each primary-table add.

use infile_core::entity::EntityRef;
use infile_core::error::Result;

/// Hooks invoked immediately before and after an entity is added to its
/// primary table. An error aborts the traversal.
pub trait SaveCallback {
    /// Called before the entity's row is rendered.
    fn on_before_save(&mut self, entity: &EntityRef) -> Result<()> {
        let _ = entity;
        Ok(())
    }

    /// Called after the entity's row has been buffered.
    fn on_after_save(&mut self, entity: &EntityRef) -> Result<()> {
        let _ = entity;
        Ok(())
    }
}

/// Callback that does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpCallback;

impl SaveCallback for NoOpCallback {}

/// Save lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveEvent {
    /// Fired before the row is rendered.
    BeforeSave,
    /// Fired after the row is buffered.
    AfterSave,
}

type SaveEventFn = Box<dyn FnMut(&EntityRef) -> Result<()>>;

/// Closure-based callback registry.
///
/// ```
/// use infile_loader::{SaveCallbacks, SaveEvent};
///
/// let mut callbacks = SaveCallbacks::default();
/// callbacks.on(SaveEvent::BeforeSave, |_entity| Ok(()));
/// assert_eq!(callbacks.len(SaveEvent::BeforeSave), 1);
/// ```
#[derive(Default)]
pub struct SaveCallbacks {
    before_save: Vec<SaveEventFn>,
    after_save: Vec<SaveEventFn>,
}

impl std::fmt::Debug for SaveCallbacks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaveCallbacks")
            .field("before_save", &self.before_save.len())
            .field("after_save", &self.after_save.len())
            .finish()
    }
}

impl SaveCallbacks {
    /// Register a closure for `event`.
    pub fn on<F>(&mut self, event: SaveEvent, callback: F) -> &mut Self
    where
        F: FnMut(&EntityRef) -> Result<()> + 'static,
    {
        self.callbacks_mut(event).push(Box::new(callback));
        self
    }

    /// Number of closures registered for `event`.
    pub fn len(&self, event: SaveEvent) -> usize {
        match event {
            SaveEvent::BeforeSave => self.before_save.len(),
            SaveEvent::AfterSave => self.after_save.len(),
        }
    }

    /// Whether no closures are registered at all.
    pub fn is_empty(&self) -> bool {
        self.before_save.is_empty() && self.after_save.is_empty()
    }

    fn callbacks_mut(&mut self, event: SaveEvent) -> &mut Vec<SaveEventFn> {
        match event {
            SaveEvent::BeforeSave => &mut self.before_save,
            SaveEvent::AfterSave => &mut self.after_save,
        }
    }

    fn fire(&mut self, event: SaveEvent, entity: &EntityRef) -> Result<()> {
        for cb in self.callbacks_mut(event).iter_mut() {
            cb(entity)?;
        }
        Ok(())
    }
}

impl SaveCallback for SaveCallbacks {
    fn on_before_save(&mut self, entity: &EntityRef) -> Result<()> {
        self.fire(SaveEvent::BeforeSave, entity)
    }

    fn on_after_save(&mut self, entity: &EntityRef) -> Result<()> {
        self.fire(SaveEvent::AfterSave, entity)
    }
}
