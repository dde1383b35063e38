//! In-memory ResponseStorage. Not persistent.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use async_trait::async_trait;

use crate::key::RequestCacheKey;
use crate::model::{CachedPage, MovieDetail};
use crate::response_cache::ResponseCache;
use crate::storage::{ResponseStorage, StorageError};

/// [`ResponseStorage`] over a [`ResponseCache`] and a detail map. Never returns an error.
#[derive(Debug, Default)]
pub struct InMemoryResponseStorage {
    responses: ResponseCache,
    details: RwLock<HashMap<u64, Arc<MovieDetail>>>,
}

impl InMemoryResponseStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Shares the page cache with callers that want the synchronous fast path.
    pub fn responses(&self) -> &ResponseCache {
        &self.responses
    }
}

#[async_trait]
impl ResponseStorage for InMemoryResponseStorage {
    async fn get_response(
        &self,
        key: &RequestCacheKey,
    ) -> Result<Option<CachedPage>, StorageError> {
        Ok(self.responses.get(key).map(|page| (*page).clone()))
    }

    async fn save(&self, page: &CachedPage, key: &RequestCacheKey) -> Result<(), StorageError> {
        self.responses.put(key.clone(), page.clone());
        Ok(())
    }

    async fn get_movie_detail(&self, movie_id: u64) -> Result<Option<MovieDetail>, StorageError> {
        let details = self
            .details
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        Ok(details.get(&movie_id).map(|d| (**d).clone()))
    }

    async fn save_detail(&self, detail: &MovieDetail) -> Result<(), StorageError> {
        tracing::debug!(movie_id = detail.id, "memory storage save detail");
        self.details
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(detail.id, Arc::new(detail.clone()));
        Ok(())
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
