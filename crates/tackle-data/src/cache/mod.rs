// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! A size-bounded, least-recently-used cache of resource handles.
//!
//! The cache is independent from the resource manager: it only keeps extra
//! [`ResourceHandle`]s alive. Evicting an entry drops the cache's handle and
//! never unloads the resource, which survives as long as someone else holds it.

mod config;
mod stats;

pub use config::{CacheConfig, DEFAULT_CACHE_SIZE_LIMIT, DEFAULT_EVICTION_TARGET_PERCENT};
pub use stats::CacheStats;

use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tackle_core::resource::{Resource, ResourceHandle};

#[derive(Debug)]
struct CacheEntry {
    handle: ResourceHandle,
    size: usize,
    last_accessed: u64,
}

/// Everything guarded by the cache lock.
///
/// `recency` maps each entry's last access tick to its key, so the first
/// element is always the least recently used entry.
#[derive(Debug)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    recency: BTreeMap<u64, String>,
    clock: u64,
    size_limit: usize,
    current_size: usize,
    target_percent: u8,
    hits: u64,
    misses: u64,
    evictions: u64,
    refusals: u64,
}

impl CacheState {
    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }

    fn target_size(&self) -> usize {
        (self.size_limit as u128 * self.target_percent as u128 / 100) as usize
    }

    fn insert(&mut self, key: String, handle: ResourceHandle, size: usize) {
        let tick = self.tick();
        self.recency.insert(tick, key.clone());
        self.entries.insert(
            key,
            CacheEntry {
                handle,
                size,
                last_accessed: tick,
            },
        );
        self.current_size += size;
    }

    fn detach(&mut self, key: &str) -> Option<CacheEntry> {
        let entry = self.entries.remove(key)?;
        self.recency.remove(&entry.last_accessed);
        self.current_size -= entry.size;
        Some(entry)
    }

    fn touch(&mut self, key: &str) -> Option<ResourceHandle> {
        let tick = self.tick();
        let entry = self.entries.get_mut(key)?;
        self.recency.remove(&entry.last_accessed);
        entry.last_accessed = tick;
        self.recency.insert(tick, key.to_owned());
        Some(entry.handle.clone())
    }

    /// Evicts least recently used entries until `current_size + incoming` is at
    /// most the eviction target, or nothing is left. Returns the number evicted.
    fn evict_for(&mut self, incoming: usize) -> usize {
        let target = self.target_size();
        let mut evicted = 0;
        while self.current_size.saturating_add(incoming) > target {
            let Some((_, key)) = self.recency.pop_first() else {
                break;
            };
            if let Some(entry) = self.entries.remove(&key) {
                self.current_size -= entry.size;
                evicted += 1;
                log::trace!("Evicted '{}' ({} bytes) from the resource cache", key, entry.size);
            }
        }
        self.evictions += evicted as u64;
        evicted
    }
}

/// A thread-safe LRU cache of resource handles with a byte budget.
///
/// When an insertion would push the cache above its budget, the least recently
/// used entries are evicted until the cache, including the new entry, fits in
/// the eviction target (80% of the budget by default). Evicting below the hard
/// limit leaves headroom so that the next insertions do not each trigger a pass.
///
/// # Examples
///
/// ```
/// # use std::any::Any;
/// # use tackle_core::resource::{BoxedError, Resource, ResourceHandle, ResourceInfo, ResourceType};
/// # #[derive(Debug)]
/// # struct Blob(ResourceInfo, usize);
/// # impl Resource for Blob {
/// #     fn info(&self) -> &ResourceInfo { &self.0 }
/// #     fn load(&mut self) -> Result<(), BoxedError> { Ok(()) }
/// #     fn unload(&self) {}
/// #     fn size(&self) -> usize { self.1 }
/// #     fn as_any(&self) -> &dyn Any { self }
/// # }
/// # fn blob(path: &str, size: usize) -> ResourceHandle {
/// #     ResourceHandle::new(Blob(ResourceInfo::new(path, path, ResourceType::new("blob")), size))
/// # }
/// use tackle_data::{CacheConfig, ResourceCache};
///
/// let cache = ResourceCache::new(CacheConfig::with_limit(1000));
/// assert!(cache.cache_resource("a", blob("a", 400)));
/// assert!(cache.cache_resource("b", blob("b", 400)));
/// assert!(cache.cache_resource("c", blob("c", 400)));
///
/// assert!(!cache.contains("a"));
/// assert_eq!(cache.cache_size(), 800);
/// ```
#[derive(Debug)]
pub struct ResourceCache {
    state: Mutex<CacheState>,
}

impl ResourceCache {
    /// Creates an empty cache.
    pub fn new(config: CacheConfig) -> Self {
        let target_percent = config.effective_target_percent();
        Self {
            state: Mutex::new(CacheState {
                entries: HashMap::new(),
                recency: BTreeMap::new(),
                clock: 0,
                size_limit: config.size_limit_bytes,
                current_size: 0,
                target_percent,
                hits: 0,
                misses: 0,
                evictions: 0,
                refusals: 0,
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Changes the byte budget and immediately runs an eviction pass against it.
    ///
    /// Returns the number of entries evicted.
    pub fn set_cache_size_limit(&self, limit: usize) -> usize {
        let mut state = self.lock();
        state.size_limit = limit;
        let evicted = state.evict_for(0);
        log::debug!(
            "Resource cache limit set to {} bytes ({} entries evicted)",
            limit,
            evicted
        );
        evicted
    }

    /// Inserts `resource` under `key`, or replaces the entry already stored there.
    ///
    /// Returns `false` if the resource is larger than the whole budget, in which
    /// case the cache is left unchanged. Anything smaller is admitted, evicting
    /// least recently used entries first when needed. Replacing an entry makes
    /// it the most recently used one.
    pub fn cache_resource(&self, key: impl Into<String>, resource: ResourceHandle) -> bool {
        let key = key.into();
        let size = resource.size();
        let mut state = self.lock();

        if size > state.size_limit {
            state.refusals += 1;
            log::debug!(
                "Refusing to cache '{}': {} bytes exceeds the {} byte limit",
                key,
                size,
                state.size_limit
            );
            return false;
        }

        state.detach(&key);
        let fits = state
            .current_size
            .checked_add(size)
            .is_some_and(|total| total <= state.size_limit);
        if !fits {
            let evicted = state.evict_for(size);
            log::debug!("Resource cache evicted {} entries to admit '{}'", evicted, key);
        }

        state.insert(key, resource, size);
        true
    }

    /// Returns the resource stored under `key` and marks it as most recently used.
    pub fn get_cached_resource(&self, key: &str) -> Option<ResourceHandle> {
        let mut state = self.lock();
        let found = state.touch(key);
        if found.is_some() {
            state.hits += 1;
        } else {
            state.misses += 1;
        }
        found
    }

    /// Removes the entry stored under `key`, returning its handle.
    pub fn remove_cached_resource(&self, key: &str) -> Option<ResourceHandle> {
        self.lock().detach(key).map(|entry| entry.handle)
    }

    /// Removes every entry.
    pub fn clear_cache(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.recency.clear();
        state.current_size = 0;
    }

    /// Bytes currently held by the cache.
    pub fn cache_size(&self) -> usize {
        self.lock().current_size
    }

    /// The byte budget.
    pub fn cache_limit(&self) -> usize {
        self.lock().size_limit
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    /// Returns `true` if the cache holds no entry.
    pub fn is_empty(&self) -> bool {
        self.lock().entries.is_empty()
    }

    /// Returns `true` if `key` is cached. Does not count as an access.
    pub fn contains(&self, key: &str) -> bool {
        self.lock().entries.contains_key(key)
    }

    /// The logical access tick of `key`; larger means more recent.
    pub fn last_accessed(&self, key: &str) -> Option<u64> {
        self.lock().entries.get(key).map(|entry| entry.last_accessed)
    }

    /// Every cached key, least recently used first.
    pub fn keys_by_recency(&self) -> Vec<String> {
        self.lock().recency.values().cloned().collect()
    }

    /// A snapshot of the counters and occupancy.
    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            hits: state.hits,
            misses: state.misses,
            evictions: state.evictions,
            refusals: state.refusals,
            current_size: state.current_size,
            size_limit: state.size_limit,
            entry_count: state.entries.len(),
        }
    }
}

impl Default for ResourceCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;
    use std::thread;
    use tackle_core::resource::{BoxedError, ResourceInfo, ResourceType};

    #[derive(Debug)]
    struct Blob {
        info: ResourceInfo,
        bytes: usize,
        unloaded: AtomicBool,
    }

    impl Resource for Blob {
        fn info(&self) -> &ResourceInfo {
            &self.info
        }
        fn load(&mut self) -> Result<(), BoxedError> {
            Ok(())
        }
        fn unload(&self) {
            self.unloaded.store(true, Ordering::SeqCst);
        }
        fn size(&self) -> usize {
            self.bytes
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
    }

    fn blob(key: &str, bytes: usize) -> ResourceHandle {
        ResourceHandle::new(Blob {
            info: ResourceInfo::new(key, key, ResourceType::new("blob")),
            bytes,
            unloaded: AtomicBool::new(false),
        })
    }

    fn cache_with_limit(limit: usize) -> ResourceCache {
        ResourceCache::new(CacheConfig::with_limit(limit))
    }

    #[test]
    fn test_default_budget_is_100_mib() {
        let cache = ResourceCache::default();
        assert_eq!(cache.cache_limit(), 100 * 1024 * 1024);
        assert_eq!(cache.cache_size(), 0);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_oldest_entry_is_evicted_down_to_the_target() {
        let cache = cache_with_limit(1000);
        assert!(cache.cache_resource("a", blob("a", 400)));
        assert!(cache.cache_resource("b", blob("b", 400)));
        assert!(cache.cache_resource("c", blob("c", 400)));

        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
        assert!(cache.contains("c"));
        assert_eq!(cache.cache_size(), 800);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_eviction_stops_exactly_at_the_target() {
        let cache = cache_with_limit(1000);
        for i in 0..10 {
            let key = format!("r{i}");
            assert!(cache.cache_resource(key.clone(), blob(&key, 100)));
        }
        // Reaching the limit exactly does not evict.
        assert_eq!(cache.cache_size(), 1000);
        assert_eq!(cache.stats().evictions, 0);

        assert!(cache.cache_resource("r10", blob("r10", 100)));

        assert_eq!(cache.cache_size(), 800);
        assert_eq!(cache.stats().evictions, 3);
        for evicted in ["r0", "r1", "r2"] {
            assert!(!cache.contains(evicted));
        }
        assert!(cache.contains("r3"));
    }

    #[test]
    fn test_touched_entry_survives_eviction() {
        let cache = cache_with_limit(1000);
        cache.cache_resource("a", blob("a", 300));
        cache.cache_resource("b", blob("b", 300));
        cache.cache_resource("c", blob("c", 300));

        assert!(cache.get_cached_resource("a").is_some());
        let a_tick = cache.last_accessed("a").unwrap();
        for other in ["b", "c"] {
            assert!(cache.last_accessed(other).unwrap() < a_tick);
        }

        assert!(cache.cache_resource("d", blob("d", 300)));

        assert_eq!(cache.keys_by_recency(), vec!["a", "d"]);
        assert_eq!(cache.cache_size(), 600);
    }

    #[test]
    fn test_entry_larger_than_target_stays_above_it() {
        let cache = cache_with_limit(1000);
        cache.cache_resource("a", blob("a", 100));
        cache.cache_resource("b", blob("b", 100));

        assert!(cache.cache_resource("big", blob("big", 900)));
        assert_eq!(cache.keys_by_recency(), vec!["big"]);
        assert_eq!(cache.cache_size(), 900);

        // Still under the hard limit: no eviction.
        assert!(cache.cache_resource("small", blob("small", 50)));
        assert_eq!(cache.cache_size(), 950);

        assert!(cache.cache_resource("next", blob("next", 100)));
        assert_eq!(cache.keys_by_recency(), vec!["small", "next"]);
        assert_eq!(cache.cache_size(), 150);
    }

    #[test]
    fn test_entry_larger_than_limit_is_refused() {
        let cache = cache_with_limit(1000);
        let original = blob("a", 200);
        cache.cache_resource("a", original.clone());
        cache.cache_resource("b", blob("b", 200));

        assert!(!cache.cache_resource("huge", blob("huge", 1001)));
        assert!(!cache.cache_resource("a", blob("a", 1001)));

        assert!(!cache.contains("huge"));
        let kept = cache.get_cached_resource("a").unwrap();
        assert!(ResourceHandle::ptr_eq(&kept, &original));
        assert_eq!(cache.cache_size(), 400);
        assert_eq!(cache.stats().refusals, 2);
        assert_eq!(cache.stats().evictions, 0);
    }

    #[test]
    fn test_refresh_replaces_and_moves_to_most_recent() {
        let cache = cache_with_limit(1000);
        cache.cache_resource("a", blob("a", 400));
        cache.cache_resource("b", blob("b", 400));

        let replacement = blob("a", 300);
        assert!(cache.cache_resource("a", replacement.clone()));

        assert_eq!(cache.len(), 2);
        assert_eq!(cache.cache_size(), 700);
        assert_eq!(cache.keys_by_recency(), vec!["b", "a"]);
        let stored = cache.get_cached_resource("a").unwrap();
        assert!(ResourceHandle::ptr_eq(&stored, &replacement));
    }

    #[test]
    fn test_eviction_drops_the_handle_without_unloading() {
        let cache = cache_with_limit(1000);
        let held = blob("a", 600);
        cache.cache_resource("a", held.clone());
        assert_eq!(ResourceHandle::strong_count(&held), 2);

        cache.cache_resource("b", blob("b", 600));

        assert!(!cache.contains("a"));
        assert_eq!(ResourceHandle::strong_count(&held), 1);
        let blob = held.downcast_ref::<Blob>().unwrap();
        assert!(!blob.unloaded.load(Ordering::SeqCst));
    }

    #[test]
    fn test_lowering_the_limit_runs_an_eviction_pass() {
        let cache = cache_with_limit(1000);
        for key in ["a", "b", "c", "d"] {
            cache.cache_resource(key, blob(key, 100));
        }

        assert_eq!(cache.set_cache_size_limit(400), 1);
        assert_eq!(cache.cache_limit(), 400);
        assert_eq!(cache.cache_size(), 300);
        assert_eq!(cache.keys_by_recency(), vec!["b", "c", "d"]);
    }

    #[test]
    fn test_remove_and_clear() {
        let cache = cache_with_limit(1000);
        cache.cache_resource("a", blob("a", 100));
        cache.cache_resource("b", blob("b", 200));

        assert!(cache.remove_cached_resource("a").is_some());
        assert!(cache.remove_cached_resource("a").is_none());
        assert_eq!(cache.cache_size(), 200);

        cache.clear_cache();
        assert!(cache.is_empty());
        assert_eq!(cache.cache_size(), 0);
        assert!(cache.keys_by_recency().is_empty());
    }

    #[test]
    fn test_stats_track_hits_and_misses() {
        let cache = cache_with_limit(1000);
        cache.cache_resource("a", blob("a", 100));

        cache.get_cached_resource("a");
        cache.get_cached_resource("a");
        cache.get_cached_resource("missing");

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.entry_count, 1);
        assert_eq!(stats.current_size, 100);
    }

    #[test]
    fn test_custom_eviction_target() {
        let cache = ResourceCache::new(CacheConfig {
            size_limit_bytes: 1000,
            eviction_target_percent: 50,
        });
        for key in ["a", "b", "c", "d", "e"] {
            cache.cache_resource(key, blob(key, 200));
        }
        assert!(cache.cache_resource("f", blob("f", 200)));
        assert_eq!(cache.cache_size(), 400);
    }

    #[test]
    fn test_sizes_near_usize_max_do_not_overflow() {
        let cache = cache_with_limit(usize::MAX);
        assert!(cache.cache_resource("a", blob("a", usize::MAX - 10)));
        assert!(cache.cache_resource("b", blob("b", 100)));

        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
        assert_eq!(cache.cache_size(), 100);
        assert_eq!(cache.stats().evictions, 1);
    }

    #[test]
    fn test_size_stays_consistent_under_contention() {
        let cache = Arc::new(cache_with_limit(10_000));
        let workers: Vec<_> = (0..4)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..200 {
                        let key = format!("{t}-{}", i % 25);
                        cache.cache_resource(key.clone(), blob(&key, 100 + (i % 7) * 50));
                        cache.get_cached_resource(&format!("{}-{}", (t + 1) % 4, i % 25));
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let expected: usize = cache
            .keys_by_recency()
            .iter()
            .filter_map(|key| cache.get_cached_resource(key))
            .map(|handle| handle.size())
            .sum();
        assert_eq!(cache.cache_size(), expected);
        assert!(cache.cache_size() <= cache.cache_limit());
    }
}
