//! Bounded image byte cache keyed by poster path.
//!
//! Entries are held in an explicit recency-ordered map ([`lru::LruCache`]) so the
//! evicted entry is always the oldest by a well-defined order, never whatever a
//! hash map happens to iterate first.

use std::num::NonZeroUsize;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use lru::LruCache;

/// Default number of images kept in memory.
pub const DEFAULT_IMAGE_CAPACITY: usize = 50;

/// Which entry goes when the cache is full.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EvictionPolicy {
    /// Evict the entry written longest ago. Reads do not reorder entries and run
    /// under the shared lock.
    #[default]
    InsertionOrder,
    /// Evict the entry read or written longest ago. Reads reorder entries and
    /// therefore take the exclusive lock.
    LeastRecentlyUsed,
}

impl From<env_config::ImageEviction> for EvictionPolicy {
    fn from(value: env_config::ImageEviction) -> Self {
        match value {
            env_config::ImageEviction::InsertionOrder => Self::InsertionOrder,
            env_config::ImageEviction::LeastRecentlyUsed => Self::LeastRecentlyUsed,
        }
    }
}

/// Thread-safe cache of raw encoded image bytes, bounded by entry count.
///
/// The entry count never exceeds [`capacity`](Self::capacity); inserting a new path
/// into a full cache evicts exactly one entry first. A capacity of 0 disables caching.
pub struct ImageCache {
    entries: RwLock<LruCache<String, Arc<[u8]>>>,
    capacity: usize,
    policy: EvictionPolicy,
}

impl ImageCache {
    pub fn new(capacity: usize) -> Self {
        Self::with_policy(capacity, EvictionPolicy::default())
    }

    pub fn with_policy(capacity: usize, policy: EvictionPolicy) -> Self {
        let bound = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: RwLock::new(LruCache::new(bound)),
            capacity,
            policy,
        }
    }

    /// Returns the bytes stored for `path`, or `None` on a miss.
    pub fn get(&self, path: &str) -> Option<Arc<[u8]>> {
        let hit = match self.policy {
            EvictionPolicy::InsertionOrder => self.read().peek(path).cloned(),
            EvictionPolicy::LeastRecentlyUsed => self.write().get(path).cloned(),
        };
        match &hit {
            Some(_) => tracing::trace!(path, "image cache hit"),
            None => tracing::trace!(path, "image cache miss"),
        }
        hit
    }

    /// Stores `bytes` under `path`. Replacing an existing path never evicts another entry.
    pub fn put(&self, path: impl Into<String>, bytes: impl Into<Arc<[u8]>>) {
        if self.capacity == 0 {
            return;
        }
        let path = path.into();
        let mut entries = self.write();
        if let Some((old_path, _)) = entries.push(path.clone(), bytes.into()) {
            if old_path != path {
                tracing::debug!(evicted = %old_path, inserted = %path, "image cache eviction");
            }
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.read().contains(path)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    fn read(&self) -> RwLockReadGuard<'_, LruCache<String, Arc<[u8]>>> {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, LruCache<String, Arc<[u8]>>> {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new(DEFAULT_IMAGE_CAPACITY)
    }
}

impl std::fmt::Debug for ImageCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity)
            .field("policy", &self.policy)
            .finish()
    }
}
