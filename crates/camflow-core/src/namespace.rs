//! Namespace registry
//!
//! A flat key → capability table. Plugins publish functions or objects here so that other
//! plugins can use them without holding a direct reference. A missing key means "capability
//! not available" and callers degrade instead of failing.

use std::any::Any;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;
use tracing::info;

use crate::error::RegistryError;
use crate::types::SharedAny;

/// Registry of published capabilities
#[derive(Default)]
pub struct Namespace {
    entries: RefCell<HashMap<String, SharedAny>>,
}

impl Namespace {
    /// Create an empty namespace
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a value under `key`
    ///
    /// An existing key is never overwritten.
    pub fn publish<T: Any>(&self, key: impl Into<String>, value: Rc<T>) -> Result<(), RegistryError> {
        let key = key.into();
        let mut entries = self.entries.borrow_mut();
        if entries.contains_key(&key) {
            info!("Trying to register the same key in namespace twice: {}", key);
            return Err(RegistryError::DuplicateKey { key });
        }
        entries.insert(key, value);
        Ok(())
    }

    /// Remove a key, returning its value
    pub fn withdraw(&self, key: &str) -> Option<SharedAny> {
        let removed = self.entries.borrow_mut().remove(key);
        if removed.is_none() {
            info!("Tried to unregister an unknown name from namespace: {}", key);
        }
        removed
    }

    /// Look a capability up with its concrete type
    ///
    /// Returns `None` if the key is absent or holds a different type.
    pub fn get<T: Any>(&self, key: &str) -> Option<Rc<T>> {
        let value = self.entries.borrow().get(key).cloned()?;
        value.downcast::<T>().ok()
    }

    /// Look a capability up without knowing its type
    pub fn get_any(&self, key: &str) -> Option<SharedAny> {
        self.entries.borrow().get(key).cloned()
    }

    /// Whether `key` is published
    pub fn contains(&self, key: &str) -> bool {
        self.entries.borrow().contains_key(key)
    }

    /// All published keys, sorted
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = self.entries.borrow().keys().cloned().collect();
        keys.sort();
        keys
    }
}

impl std::fmt::Debug for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Namespace").field("keys", &self.keys()).finish()
    }
}
