//! Entity Collections
//!
//! An ordered, name-unique container for one entity kind. Every mutation is announced on the
//! event bus:
//! - `<kind>-list-changed` after entities were added, removed, reordered or replaced
//! - `<kind>-selection-changed` after the selection changed
//! - `<kind>-changed` after a display attribute of one entity changed
//!
//! Events fire after the collection released its internal borrows, so handlers may read
//! (or even mutate) the collection.

use std::cell::RefCell;
use std::rc::Rc;

use serde_json::Value;
use tracing::{debug, info};

use crate::data::CollectionItem;
use crate::error::CollectionError;
use crate::event_bus::{self, EventBus, EventPayload};

/// Direction for [`Collection::move_item`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveDirection {
    /// Towards index 0
    Up,
    /// Towards the end
    Down,
}

/// Smallest `template` instance not in `existing`, counting from 1
///
/// `{}` in the template is replaced by the counter.
pub fn non_conflicting_name<S: AsRef<str>>(template: &str, existing: &[S]) -> String {
    let mut counter = 1usize;
    loop {
        let candidate = template.replace("{}", &counter.to_string());
        if !existing.iter().any(|name| name.as_ref() == candidate) {
            return candidate;
        }
        counter += 1;
    }
}

/// Ordered collection of one entity kind
pub struct Collection<T: CollectionItem> {
    items: RefCell<Vec<Rc<T>>>,
    selection: RefCell<Vec<String>>,
    events: Rc<EventBus>,
}

impl<T: CollectionItem> Collection<T> {
    /// Create an empty collection announcing changes on `events`
    pub fn new(events: Rc<EventBus>) -> Self {
        Self {
            items: RefCell::new(Vec::new()),
            selection: RefCell::new(Vec::new()),
            events,
        }
    }

    fn key(&self) -> String {
        T::KIND.collection_key().to_string()
    }

    fn emit_list_changed(&self) {
        self.events
            .emit(&event_bus::list_changed(T::KIND.event_prefix()));
    }

    fn emit_selection_changed(&self) {
        self.events
            .emit(&event_bus::selection_changed(T::KIND.event_prefix()));
    }

    /// Add an entity
    ///
    /// A missing or blank `name` (and a blank entity name) is replaced with a generated,
    /// non-conflicting one; an explicit name already in use is rejected. Returns the name
    /// the entity was stored under.
    pub fn add(&self, mut entity: T, name: Option<&str>) -> Result<String, CollectionError> {
        let requested = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string)
            .or_else(|| Some(entity.name().trim().to_string()).filter(|n| !n.is_empty()));
        let name = {
            let items = self.items.borrow();
            match requested {
                Some(name) => {
                    if items.iter().any(|e| e.name() == name) {
                        return Err(CollectionError::DuplicateName {
                            collection: self.key(),
                            name,
                        });
                    }
                    name
                }
                None => {
                    let existing: Vec<&str> = items.iter().map(|e| e.name()).collect();
                    non_conflicting_name(T::KIND.name_template(), &existing)
                }
            }
        };
        entity.set_name(name.clone());
        let app = entity.app_values();
        app.set("name", Value::String(name.clone()));
        if app.get("visible").is_none() {
            app.set("visible", Value::Bool(true));
        }
        info!("Adding new {}: {}", T::KIND.event_prefix(), name);
        self.items.borrow_mut().push(Rc::new(entity));
        self.emit_list_changed();
        Ok(name)
    }

    /// Remove the entity at `index`
    pub fn remove(&self, index: usize) -> Result<Rc<T>, CollectionError> {
        let removed = {
            let mut items = self.items.borrow_mut();
            if index >= items.len() {
                return Err(self.out_of_range(index, items.len()));
            }
            items.remove(index)
        };
        debug!("Removed {} '{}'", T::KIND.event_prefix(), removed.name());
        let deselected = self.deselect_missing();
        self.emit_list_changed();
        if deselected {
            self.emit_selection_changed();
        }
        Ok(removed)
    }

    /// Swap the entity at `index` with its neighbour
    ///
    /// Returns `false` when the entity is already at that end of the collection.
    pub fn move_item(&self, index: usize, direction: MoveDirection) -> Result<bool, CollectionError> {
        {
            let mut items = self.items.borrow_mut();
            let len = items.len();
            if index >= len {
                return Err(self.out_of_range(index, len));
            }
            let other = match direction {
                MoveDirection::Up if index > 0 => index - 1,
                MoveDirection::Down if index + 1 < len => index + 1,
                _ => return Ok(false),
            };
            items.swap(index, other);
        }
        self.emit_list_changed();
        Ok(true)
    }

    /// Remove everything
    pub fn clear(&self) {
        let was_empty = {
            let mut items = self.items.borrow_mut();
            let was_empty = items.is_empty();
            items.clear();
            was_empty
        };
        let deselected = self.deselect_missing();
        if !was_empty {
            self.emit_list_changed();
        }
        if deselected {
            self.emit_selection_changed();
        }
    }

    /// Replace the entity called `name`, keeping its name and position
    pub fn replace(&self, name: &str, mut entity: T) -> Result<Rc<T>, CollectionError> {
        let old = {
            let mut items = self.items.borrow_mut();
            let index = items
                .iter()
                .position(|e| e.name() == name)
                .ok_or_else(|| self.not_found(name))?;
            entity.set_name(name.to_string());
            entity.app_values().set("name", Value::String(name.to_string()));
            std::mem::replace(&mut items[index], Rc::new(entity))
        };
        self.emit_list_changed();
        Ok(old)
    }

    /// Remove every entity matching `obsolete`, returning how many were removed
    ///
    /// Indices are collected first and deleted from the highest down so the remaining
    /// indices stay valid.
    pub fn purge(&self, obsolete: impl Fn(&T) -> bool) -> usize {
        let removed = {
            let mut items = self.items.borrow_mut();
            let indices: Vec<usize> = items
                .iter()
                .enumerate()
                .filter_map(|(i, e)| obsolete(&**e).then_some(i))
                .collect();
            for &index in indices.iter().rev() {
                let entity = items.remove(index);
                info!(
                    "Removing obsolete {} '{}'",
                    T::KIND.event_prefix(),
                    entity.name()
                );
            }
            indices.len()
        };
        if removed > 0 {
            let deselected = self.deselect_missing();
            self.emit_list_changed();
            if deselected {
                self.emit_selection_changed();
            }
        }
        removed
    }

    /// First entity called `name`
    pub fn get_by_name(&self, name: &str) -> Result<Rc<T>, CollectionError> {
        self.items
            .borrow()
            .iter()
            .find(|e| e.name() == name)
            .cloned()
            .ok_or_else(|| self.not_found(name))
    }

    /// Entity at `index`
    pub fn get(&self, index: usize) -> Option<Rc<T>> {
        self.items.borrow().get(index).cloned()
    }

    /// Position of the entity called `name`
    pub fn position(&self, name: &str) -> Option<usize> {
        self.items.borrow().iter().position(|e| e.name() == name)
    }

    /// Snapshot of all entities in order
    pub fn get_all(&self) -> Vec<Rc<T>> {
        self.items.borrow().clone()
    }

    /// Names of all entities in order
    pub fn names(&self) -> Vec<String> {
        self.items
            .borrow()
            .iter()
            .map(|e| e.name().to_string())
            .collect()
    }

    /// Number of entities
    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    /// True if the collection is empty
    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// Replace the selection
    ///
    /// Unknown names are ignored. `selection-changed` fires only if the selection differs.
    pub fn select<S: AsRef<str>>(&self, names: &[S]) {
        let selection: Vec<String> = {
            let items = self.items.borrow();
            items
                .iter()
                .filter(|e| names.iter().any(|n| n.as_ref() == e.name()))
                .map(|e| e.name().to_string())
                .collect()
        };
        let changed = {
            let mut current = self.selection.borrow_mut();
            if *current == selection {
                false
            } else {
                *current = selection;
                true
            }
        };
        if changed {
            self.emit_selection_changed();
        }
    }

    /// The selected entities in collection order; empty if nothing is selected
    pub fn get_selected(&self) -> Vec<Rc<T>> {
        let selection = self.selection.borrow();
        self.items
            .borrow()
            .iter()
            .filter(|e| selection.iter().any(|n| n == e.name()))
            .cloned()
            .collect()
    }

    /// Change a display attribute of one entity
    pub fn set_app_value(&self, name: &str, key: &str, value: Value) -> Result<(), CollectionError> {
        let entity = self.get_by_name(name)?;
        entity.app_values().set(key, value);
        self.events.emit_with(
            &event_bus::entity_changed(T::KIND.event_prefix()),
            EventPayload::Entity {
                collection: self.key(),
                name: name.to_string(),
            },
        );
        Ok(())
    }

    fn deselect_missing(&self) -> bool {
        let items = self.items.borrow();
        let mut selection = self.selection.borrow_mut();
        let before = selection.len();
        selection.retain(|n| items.iter().any(|e| e.name() == n));
        before != selection.len()
    }

    fn out_of_range(&self, index: usize, len: usize) -> CollectionError {
        CollectionError::IndexOutOfRange {
            collection: self.key(),
            index,
            len,
        }
    }

    fn not_found(&self, name: &str) -> CollectionError {
        CollectionError::NotFound {
            collection: self.key(),
            name: name.to_string(),
        }
    }
}

impl<T: CollectionItem> std::fmt::Debug for Collection<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("kind", &T::KIND)
            .field("names", &self.names())
            .finish()
    }
}
