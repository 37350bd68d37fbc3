//! Insert-once keyed cache for lazily derived model data.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use parking_lot::RwLock;

/// Keyed memo table shared by every reader of a model.
///
/// `get_or_insert_with` probes under a read lock, computes with no lock
/// held, then stores under a write lock with `entry().or_insert`. Two
/// threads racing on a cold key may both compute, but both get back the
/// value that landed in the map first. Because no lock is held while
/// computing, a computation may itself consult the cache.
pub struct LazyCache<K, V> {
    map: RwLock<HashMap<K, V>>,
}

impl<K, V> LazyCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            map: RwLock::new(HashMap::new()),
        }
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.map.read().get(key).cloned()
    }

    pub fn get_or_insert_with<F>(&self, key: K, compute: F) -> V
    where
        F: FnOnce() -> V,
    {
        if let Some(value) = self.map.read().get(&key) {
            return value.clone();
        }

        let computed = compute();
        let mut map = self.map.write();
        map.entry(key).or_insert(computed).clone()
    }

    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }
}

impl<K, V> Default for LazyCache<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> fmt::Debug for LazyCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LazyCache")
            .field("entries", &self.map.read().len())
            .finish()
    }
}
