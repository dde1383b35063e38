//! In-memory keyed response cache: the last decoded page per [`RequestCacheKey`].
//!
//! Reads take a shared lock and run in parallel; writes take the exclusive lock.
//! Stored pages sit behind an `Arc` and are swapped whole, so a reader sees either
//! the previous page or the new one, never a mix. Last write wins.

use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::key::RequestCacheKey;
use crate::model::CachedPage;

/// Thread-safe map from request key to the last successfully decoded page.
///
/// Never fails: a poisoned lock is recovered and any problem reads as a miss.
///
/// ## Example
///
/// ```rust
/// use movie_cache::{CachedPage, RequestCacheKey, ResponseCache};
///
/// let cache = ResponseCache::new();
/// let key = RequestCacheKey::for_search("alien", 1);
/// cache.put(key.clone(), CachedPage::new(1, 3, vec![]));
/// assert_eq!(cache.get(&key).map(|p| p.total_pages), Some(3));
/// ```
#[derive(Debug, Default)]
pub struct ResponseCache {
    entries: RwLock<HashMap<RequestCacheKey, Arc<CachedPage>>>,
}

impl ResponseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached page for `key`, or `None` on a miss.
    pub fn get(&self, key: &RequestCacheKey) -> Option<Arc<CachedPage>> {
        let hit = self.read().get(key).cloned();
        match &hit {
            Some(_) => tracing::trace!(key = %key, "response cache hit"),
            None => tracing::trace!(key = %key, "response cache miss"),
        }
        hit
    }

    /// Stores `page` under `key`, replacing any previous page.
    pub fn put(&self, key: RequestCacheKey, page: CachedPage) {
        tracing::debug!(key = %key, results = page.results.len(), "response cache put");
        self.write().insert(key, Arc::new(page));
    }

    pub fn remove(&self, key: &RequestCacheKey) -> Option<Arc<CachedPage>> {
        self.write().remove(key)
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn clear(&self) {
        self.write().clear();
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<RequestCacheKey, Arc<CachedPage>>> {
        self.entries.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<RequestCacheKey, Arc<CachedPage>>> {
        self.entries
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
