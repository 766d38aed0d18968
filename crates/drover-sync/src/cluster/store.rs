use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use drover_model::ActiveInstanceCache;

/// In-memory keyed store of per-cluster caches.
///
/// Hard precondition: a given key is read and written only by that cluster's
/// own task run (single writer per key). The lock here serializes access
/// from different tasks to *different* keys sharing the map; it is not a
/// cross-process sharing mechanism. Updates replace the whole entry so a
/// reader never observes a partially updated cache.
#[derive(Clone, Default)]
pub struct InstanceCacheStore {
    inner: Arc<RwLock<HashMap<String, ActiveInstanceCache>>>,
}

impl InstanceCacheStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current cache for a key; a cold-start default if none exists yet.
    pub fn snapshot(&self, key: &str) -> ActiveInstanceCache {
        let inner = self.inner.read().unwrap();
        inner.get(key).cloned().unwrap_or_default()
    }

    /// Whole-entry replacement after a completed run.
    pub fn replace(&self, key: &str, cache: ActiveInstanceCache) {
        let mut inner = self.inner.write().unwrap();
        inner.insert(key.to_string(), cache);
    }

    /// External cleanup hook; entries are otherwise never deleted.
    pub fn invalidate(&self, key: &str) -> bool {
        let mut inner = self.inner.write().unwrap();
        inner.remove(key).is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        let inner = self.inner.read().unwrap();
        inner.contains_key(key)
    }

    pub fn len(&self) -> usize {
        let inner = self.inner.read().unwrap();
        inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::time::{Duration, UNIX_EPOCH};

    use super::*;

    #[test]
    fn snapshot_of_unknown_key_is_cold_start() {
        let store = InstanceCacheStore::new();
        let cache = store.snapshot("cluster-a");
        assert_eq!(cache, ActiveInstanceCache::default());
        // A read does not create the entry.
        assert!(!store.contains("cluster-a"));
    }

    #[test]
    fn replace_overwrites_the_whole_entry() {
        let store = InstanceCacheStore::new();

        let mut first = ActiveInstanceCache::default();
        first.active_vm_ids = BTreeSet::from(["i-1".to_string(), "i-2".to_string()]);
        store.replace("cluster-a", first);

        let mut second = ActiveInstanceCache::default();
        second.active_vm_ids = BTreeSet::from(["i-3".to_string()]);
        second.last_processed = UNIX_EPOCH + Duration::from_secs(60);
        store.replace("cluster-a", second.clone());

        assert_eq!(store.snapshot("cluster-a"), second);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn invalidate_removes_the_entry() {
        let store = InstanceCacheStore::new();
        store.replace("cluster-a", ActiveInstanceCache::default());

        assert!(store.invalidate("cluster-a"));
        assert!(!store.invalidate("cluster-a"));
        assert!(store.is_empty());
    }
}
