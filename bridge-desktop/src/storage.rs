//! In-memory Web Storage and cookie jar for native hosts.

use bridge_traits::{
    error::Result,
    storage::{CookieJar, WebStorage},
};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Process-lifetime key-value store with Web Storage semantics.
pub struct MemoryWebStorage {
    label: String,
    entries: Mutex<BTreeMap<String, String>>,
}

impl MemoryWebStorage {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            entries: Mutex::new(BTreeMap::new()),
        }
    }

    /// Stand-in for `sessionStorage`
    pub fn session() -> Self {
        Self::new("sessionStorage")
    }

    /// Stand-in for `localStorage`
    pub fn local() -> Self {
        Self::new("localStorage")
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    fn entries(&self) -> MutexGuard<'_, BTreeMap<String, String>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WebStorage for MemoryWebStorage {
    fn label(&self) -> &str {
        &self.label
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries().keys().cloned().collect())
    }

    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries().get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries().insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries().remove(key);
        Ok(())
    }
}

/// Cookie jar holding names only, like `document.cookie` seen from script.
#[derive(Default)]
pub struct MemoryCookieJar {
    names: Mutex<BTreeSet<String>>,
}

impl MemoryCookieJar {
    pub fn new() -> Self {
        Self::default()
    }

    fn names_guard(&self) -> MutexGuard<'_, BTreeSet<String>> {
        self.names.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl CookieJar for MemoryCookieJar {
    fn names(&self) -> Result<Vec<String>> {
        Ok(self.names_guard().iter().cloned().collect())
    }

    fn set(&self, name: &str, _value: &str) -> Result<()> {
        self.names_guard().insert(name.to_string());
        Ok(())
    }

    fn expire(&self, name: &str) -> Result<()> {
        self.names_guard().remove(name);
        Ok(())
    }
}
