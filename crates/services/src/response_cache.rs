use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, PoisonError};

/// Entries kept before the least recently used one is dropped.
pub const DEFAULT_CAPACITY: usize = 128;

/// Bounded LRU cache of query text to response text.
///
/// Owned by the component that queries, not module-global; clones share one
/// backing map. Callers only insert successful responses, so a failed query
/// stays uncached and retries hit the service again.
#[derive(Clone)]
pub struct ResponseCache {
    inner: Arc<Mutex<CacheInner>>,
}

struct CacheInner {
    capacity: usize,
    entries: HashMap<String, String>,
    recency: VecDeque<String>,
}

impl ResponseCache {
    /// Creates a cache holding at most `capacity` entries.
    ///
    /// A zero capacity would evict every insert immediately; it is bumped
    /// to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Arc::new(Mutex::new(CacheInner {
                capacity: capacity.max(1),
                entries: HashMap::new(),
                recency: VecDeque::new(),
            })),
        }
    }

    /// Returns the cached response for `key`, refreshing its recency.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<String> {
        let mut inner = self.lock();
        let value = inner.entries.get(key).cloned()?;
        touch(&mut inner.recency, key);
        Some(value)
    }

    /// Stores a response, evicting the least recently used entry when full.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let mut inner = self.lock();
        if inner.entries.insert(key.clone(), value.into()).is_none()
            && inner.entries.len() > inner.capacity
        {
            if let Some(oldest) = inner.recency.pop_front() {
                inner.entries.remove(&oldest);
            }
        }
        touch(&mut inner.recency, &key);
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ResponseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

// Linear recency upkeep; capacities here are three digits at most.
fn touch(recency: &mut VecDeque<String>, key: &str) {
    if let Some(position) = recency.iter().position(|entry| entry == key) {
        recency.remove(position);
    }
    recency.push_back(key.to_owned());
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn miss_then_hit() {
        let cache = ResponseCache::new(4);
        assert_eq!(cache.get("水"), None);

        cache.insert("水", "water");
        assert_eq!(cache.get("水").as_deref(), Some("water"));
    }

    #[test]
    fn full_cache_evicts_least_recently_used() {
        let cache = ResponseCache::new(2);
        cache.insert("a", "1");
        cache.insert("b", "2");

        // A hit on `a` makes `b` the eviction candidate.
        assert!(cache.get("a").is_some());
        cache.insert("c", "3");

        assert_eq!(cache.len(), 2);
        assert!(cache.get("b").is_none());
        assert!(cache.get("a").is_some());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn reinserting_a_key_updates_without_growing() {
        let cache = ResponseCache::new(2);
        cache.insert("a", "1");
        cache.insert("a", "one");

        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("a").as_deref(), Some("one"));
    }

    #[test]
    fn zero_capacity_still_holds_one_entry() {
        let cache = ResponseCache::new(0);
        cache.insert("a", "1");
        assert_eq!(cache.get("a").as_deref(), Some("1"));

        cache.insert("b", "2");
        assert_eq!(cache.len(), 1);
        assert!(cache.get("a").is_none());
    }

    #[test]
    fn clones_share_entries() {
        let cache = ResponseCache::new(4);
        let view = cache.clone();
        cache.insert("a", "1");
        assert_eq!(view.get("a").as_deref(), Some("1"));
    }
}
