//! The [`IdRegistry`] trait and an in-memory implementation.
//!
//! The registry is the arena that replaces parent/child object references:
//! a parent field holds a key, and the registry says which path that key
//! was last stored at.

use std::collections::HashMap;
use std::sync::RwLock;

use nodemap_types::DocumentKey;

/// Lookup of already-resolved object paths.
pub trait IdRegistry {
    /// Path the object with `key` resolved to, if known.
    fn resolved_path_of(&self, key: DocumentKey) -> Option<String>;
}

/// Bidirectional key <-> path map behind a `RwLock`.
#[derive(Debug, Default)]
pub struct InMemoryIdRegistry {
    inner: RwLock<Maps>,
}

#[derive(Debug, Default)]
struct Maps {
    paths: HashMap<DocumentKey, String>,
    keys: HashMap<String, DocumentKey>,
}

impl InMemoryIdRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that `key` lives at `path`, replacing any previous entry for
    /// either side.
    pub fn register(&self, key: DocumentKey, path: impl Into<String>) {
        let path = path.into();
        let mut maps = self.inner.write().expect("lock poisoned");
        if let Some(old_path) = maps.paths.insert(key, path.clone()) {
            maps.keys.remove(&old_path);
        }
        if let Some(old_key) = maps.keys.insert(path, key) {
            if old_key != key {
                maps.paths.remove(&old_key);
            }
        }
    }

    /// Forget `key`. Returns the path it was registered at.
    pub fn unregister(&self, key: DocumentKey) -> Option<String> {
        let mut maps = self.inner.write().expect("lock poisoned");
        let path = maps.paths.remove(&key)?;
        maps.keys.remove(&path);
        Some(path)
    }

    /// Forget every object at or below `path`. Returns how many were dropped.
    pub fn unregister_subtree(&self, path: &str) -> usize {
        let below = format!("{}/", path.trim_end_matches('/'));
        let mut maps = self.inner.write().expect("lock poisoned");
        let doomed: Vec<String> = maps
            .keys
            .keys()
            .filter(|p| p.as_str() == path || p.starts_with(&below))
            .cloned()
            .collect();
        for p in &doomed {
            if let Some(key) = maps.keys.remove(p) {
                maps.paths.remove(&key);
            }
        }
        doomed.len()
    }

    /// Key registered at `path`, if any.
    pub fn key_for_path(&self, path: &str) -> Option<DocumentKey> {
        self.inner
            .read()
            .expect("lock poisoned")
            .keys
            .get(path)
            .copied()
    }

    /// Number of registered objects.
    pub fn len(&self) -> usize {
        self.inner.read().expect("lock poisoned").paths.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl IdRegistry for InMemoryIdRegistry {
    fn resolved_path_of(&self, key: DocumentKey) -> Option<String> {
        self.inner
            .read()
            .expect("lock poisoned")
            .paths
            .get(&key)
            .cloned()
    }
}
