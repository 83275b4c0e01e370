//! Bounded, content-keyed memoization.
//!
//! Entries are evicted least-recently-used once `capacity` is reached. The
//! cache holds no configuration: callers key one cache per configuration.

use std::hash::Hash;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use lru::LruCache;

/// Snapshot of cache counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub len: usize,
    pub capacity: usize,
}

/// Thread-safe LRU cache. A capacity of 0 disables storage; every lookup
/// then recomputes.
pub struct ContentCache<K, V> {
    inner: Option<Mutex<LruCache<K, V>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl<K: Hash + Eq, V: Clone> ContentCache<K, V> {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: NonZeroUsize::new(capacity).map(|cap| Mutex::new(LruCache::new(cap))),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Return the cached value for `key`, computing and storing it on a miss.
    ///
    /// The lock is not held while `compute` runs, so two threads missing on
    /// the same key may both compute; the values are identical for a pure
    /// `compute`.
    pub fn get_or_try_insert_with<E, F>(&self, key: K, compute: F) -> Result<V, E>
    where
        F: FnOnce() -> Result<V, E>,
    {
        if let Some(cache) = &self.inner {
            if let Some(value) = lock(cache).get(&key) {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Ok(value.clone());
            }
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        let value = compute()?;
        if let Some(cache) = &self.inner {
            lock(cache).put(key, value.clone());
        }
        Ok(value)
    }

    pub fn get_or_insert_with<F>(&self, key: K, compute: F) -> V
    where
        F: FnOnce() -> V,
    {
        match self.get_or_try_insert_with::<std::convert::Infallible, _>(key, || Ok(compute())) {
            Ok(value) => value,
            Err(never) => match never {},
        }
    }

    pub fn stats(&self) -> CacheStats {
        let (len, capacity) = self
            .inner
            .as_ref()
            .map(|cache| {
                let guard = lock(cache);
                (guard.len(), guard.cap().get())
            })
            .unwrap_or((0, 0));
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            len,
            capacity,
        }
    }

    pub fn clear(&self) {
        if let Some(cache) = &self.inner {
            lock(cache).clear();
        }
    }
}

// A panic while holding the lock cannot leave the LRU half-updated in a way
// that matters for a memo table, so poisoning is ignored.
fn lock<K: Hash + Eq, V>(cache: &Mutex<LruCache<K, V>>) -> MutexGuard<'_, LruCache<K, V>> {
    cache
        .lock()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn caches_computed_values() {
        let cache = ContentCache::new(4);
        let mut calls = 0;
        for _ in 0..3 {
            let v = cache.get_or_insert_with("k", || {
                calls += 1;
                42
            });
            assert_eq!(v, 42);
        }
        assert_eq!(calls, 1);
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.len), (2, 1, 1));
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = ContentCache::new(2);
        cache.get_or_insert_with(1, || "a");
        cache.get_or_insert_with(2, || "b");
        cache.get_or_insert_with(1, || "a"); // 1 is now most recent
        cache.get_or_insert_with(3, || "c"); // evicts 2
        assert_eq!(cache.get_or_insert_with(2, || "recomputed"), "recomputed");
        assert_eq!(cache.get_or_insert_with(3, || "x"), "c");
    }

    #[test]
    fn zero_capacity_never_stores() {
        let cache = ContentCache::new(0);
        cache.get_or_insert_with(1, || 1);
        assert_eq!(cache.get_or_insert_with(1, || 2), 2);
        let stats = cache.stats();
        assert_eq!((stats.hits, stats.misses, stats.capacity), (0, 2, 0));
    }

    #[test]
    fn errors_are_not_cached() {
        let cache: ContentCache<u8, u8> = ContentCache::new(4);
        let err: Result<u8, &str> = cache.get_or_try_insert_with(1, || Err("boom"));
        assert_eq!(err, Err("boom"));
        assert_eq!(cache.get_or_try_insert_with::<&str, _>(1, || Ok(9)), Ok(9));
        assert_eq!(cache.stats().len, 1);
    }

    #[test]
    fn shared_across_threads() {
        let cache = Arc::new(ContentCache::new(64));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..16u32 {
                        assert_eq!(cache.get_or_insert_with(i, || i * 2), i * 2);
                    }
                    t
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(cache.stats().len, 16);
    }
}
