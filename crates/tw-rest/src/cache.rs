//! Per-client entity caches.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Entities keyed by id.
///
/// Entries are never evicted. Each [`crate::TwitterClient`] owns its own
/// caches; clones of a client share them.
#[derive(Debug)]
pub struct EntityCache<V> {
    entries: RwLock<HashMap<String, V>>,
}

impl<V> Default for EntityCache<V> {
    fn default() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl<V: Clone> EntityCache<V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// A copy of the cached entity.
    pub fn get(&self, id: &str) -> Option<V> {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned()
    }

    /// Store an entity, returning the one it replaced.
    pub fn insert(&self, id: impl Into<String>, value: V) -> Option<V> {
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.into(), value)
    }

    /// The cached entity, or the result of `make` stored under `id`.
    pub fn get_or_insert_with<F>(&self, id: &str, make: F) -> V
    where
        F: FnOnce() -> V,
    {
        if let Some(value) = self.get(id) {
            return value;
        }
        self.entries
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(id.to_string())
            .or_insert_with(make)
            .clone()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_insert_and_get() {
        let cache = EntityCache::new();
        assert!(cache.get("1").is_none());
        assert!(cache.insert("1", "first".to_string()).is_none());
        assert_eq!(cache.get("1").as_deref(), Some("first"));
        assert_eq!(cache.insert("1", "second".to_string()).as_deref(), Some("first"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_get_or_insert_with_runs_once() {
        let cache = EntityCache::new();
        let mut calls = 0;
        let first = cache.get_or_insert_with("7", || {
            calls += 1;
            70
        });
        let second = cache.get_or_insert_with("7", || {
            calls += 1;
            71
        });

        assert_eq!((first, second), (70, 70));
        assert_eq!(calls, 1);
        assert!(cache.contains("7"));
    }

    #[test]
    fn test_shared_between_threads() {
        let cache = Arc::new(EntityCache::new());
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    cache.insert(i.to_string(), i);
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(cache.len(), 4);
        assert!(!cache.is_empty());
    }
}
