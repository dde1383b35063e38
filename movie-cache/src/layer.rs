//! Composition root: builds the cache instances once and hands them to repositories.

use std::sync::Arc;

use env_config::CacheSettings;

use crate::image_cache::{EvictionPolicy, ImageCache};
use crate::repository::{
    ImageFetcher, MovieDetailFetcher, MovieDetailsRepository, MovieListFetcher, MoviesRepository,
    PosterImagesRepository,
};
use crate::storage::{build_storage, InMemoryResponseStorage, ResponseStorage, StorageError};

/// The caches of one running app instance. Cheap to clone; clones share the caches.
#[derive(Clone)]
pub struct CacheLayer {
    pub responses: Arc<dyn ResponseStorage>,
    pub images: Arc<ImageCache>,
}

impl CacheLayer {
    /// Builds the layer described by `settings` (backend, database path, image bound).
    pub fn from_settings(settings: &CacheSettings) -> Result<Self, StorageError> {
        let responses = build_storage(settings)?;
        let images = Arc::new(ImageCache::with_policy(
            settings.image_capacity,
            EvictionPolicy::from(settings.image_eviction),
        ));
        tracing::info!(
            backend = responses.name(),
            image_capacity = images.capacity(),
            "cache layer ready"
        );
        Ok(Self { responses, images })
    }

    /// Process-local layer with default bounds, for tests and previews.
    pub fn in_memory() -> Self {
        Self {
            responses: Arc::new(InMemoryResponseStorage::new()),
            images: Arc::new(ImageCache::default()),
        }
    }

    pub fn movies(&self, fetcher: Arc<dyn MovieListFetcher>) -> MoviesRepository {
        MoviesRepository::new(Arc::clone(&self.responses), fetcher)
    }

    pub fn movie_details(&self, fetcher: Arc<dyn MovieDetailFetcher>) -> MovieDetailsRepository {
        MovieDetailsRepository::new(Arc::clone(&self.responses), fetcher)
    }

    pub fn posters(&self, fetcher: Arc<dyn ImageFetcher>) -> PosterImagesRepository {
        PosterImagesRepository::new(Arc::clone(&self.images), fetcher)
    }
}

impl std::fmt::Debug for CacheLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheLayer")
            .field("responses", &self.responses.name())
            .field("images", &self.images)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use env_config::{ImageEviction, StorageBackendKind};

    #[test]
    fn from_settings_applies_image_bounds() {
        let settings = CacheSettings {
            image_capacity: 3,
            image_eviction: ImageEviction::LeastRecentlyUsed,
            ..CacheSettings::default()
        };
        let layer = CacheLayer::from_settings(&settings).unwrap();
        assert_eq!(layer.images.capacity(), 3);
        assert_eq!(layer.images.policy(), EvictionPolicy::LeastRecentlyUsed);
        assert_eq!(layer.responses.name(), "memory");
    }

    #[test]
    fn layers_do_not_share_state() {
        let a = CacheLayer::in_memory();
        let b = CacheLayer::in_memory();
        a.images.put("/x.jpg", vec![1]);
        assert!(b.images.get("/x.jpg").is_none());
        let a2 = a.clone();
        assert!(a2.images.get("/x.jpg").is_some());
    }

    #[test]
    fn sqlite_backend_from_settings() {
        let dir = tempfile::tempdir().unwrap();
        let settings = CacheSettings {
            backend: StorageBackendKind::Sqlite,
            database_path: Some(dir.path().join("cache.sqlite3")),
            ..CacheSettings::default()
        };
        let layer = CacheLayer::from_settings(&settings).unwrap();
        assert_eq!(layer.responses.name(), "sqlite");
    }
}
