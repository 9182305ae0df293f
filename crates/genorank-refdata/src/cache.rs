use std::collections::HashMap;
use std::hash::Hash;
use std::sync::{Arc, PoisonError, RwLock};

use genorank_common::Result;

/// Keyed load-once cache of immutable values.
///
/// The loader runs without any lock held, so a slow parse never blocks
/// readers of other keys. If two callers race on the same key both parse,
/// and the first insert wins; both get the same `Arc` back.
pub struct LoadOnce<K, V> {
    entries: RwLock<HashMap<K, Arc<V>>>,
}

impl<K: Eq + Hash + Clone, V> LoadOnce<K, V> {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    pub fn get_or_try_load(&self, key: &K, load: impl FnOnce() -> Result<V>) -> Result<Arc<V>> {
        // Values are never mutated after insert, so a poisoned map is still sound.
        if let Some(hit) = self.entries.read().unwrap_or_else(PoisonError::into_inner).get(key) {
            return Ok(Arc::clone(hit));
        }
        let loaded = Arc::new(load()?);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(entries.entry(key.clone()).or_insert(loaded)))
    }

    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }
}

impl<K: Eq + Hash + Clone, V> Default for LoadOnce<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
