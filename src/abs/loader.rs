//! Name-keyed resource caches.
//!
//! [`ResourceCache`] is the storage shared by [`crate::abs::ShaderLoader`],
//! [`crate::abs::TextureLoader`] and [`crate::abs::MeshLoader`]. Entries own their GPU
//! objects and release them in `Drop`, so removing an entry or dropping the cache frees
//! everything it holds.

use fxhash::FxHashMap;

use crate::error::{Error, Result};

/// An owning map from cache key to resource.
pub struct ResourceCache<T> {
    kind: &'static str,
    entries: FxHashMap<String, T>,
}

impl<T> ResourceCache<T> {
    /// Creates an empty cache. `kind` names the resource in errors and logs.
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: FxHashMap::default(),
        }
    }

    /// Fails if `key` is already taken.
    ///
    /// Loaders call this before creating any GPU object so a duplicate load leaks nothing.
    pub fn ensure_vacant(&self, key: &str) -> Result<()> {
        if self.entries.contains_key(key) {
            return Err(Error::DuplicateKey {
                kind: self.kind,
                key: key.to_string(),
            });
        }
        Ok(())
    }

    /// Inserts a resource under a new key and returns a borrow of it.
    pub fn insert(&mut self, key: &str, value: T) -> Result<&T> {
        self.ensure_vacant(key)?;
        log::debug!("loaded {} '{}'", self.kind, key);
        Ok(self.entries.entry(key.to_string()).or_insert(value))
    }

    /// Returns the resource stored under `key`.
    pub fn get(&self, key: &str) -> Result<&T> {
        self.entries.get(key).ok_or_else(|| self.not_found(key))
    }

    /// Removes and returns the resource stored under `key`.
    pub fn remove(&mut self, key: &str) -> Result<T> {
        let value = self.entries.remove(key).ok_or_else(|| self.not_found(key))?;
        log::debug!("unloaded {} '{}'", self.kind, key);
        Ok(value)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over the keys in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    fn not_found(&self, key: &str) -> Error {
        Error::NotFound {
            kind: self.kind,
            key: key.to_string(),
        }
    }
}

impl<T> Drop for ResourceCache<T> {
    fn drop(&mut self) {
        if !self.entries.is_empty() {
            log::debug!("releasing {} remaining {}(s)", self.entries.len(), self.kind);
        }
    }
}
