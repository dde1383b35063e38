//! Repositories that put the caches beside the network fetch.
//!
//! Flow for every request: build the key, then look in the cache and fetch side by
//! side; a hit goes to the caller as soon as the lookup returns, and a successful
//! fetch is written back under the same key and returned. A cache problem never fails the fetch path: storage
//! errors are logged and treated as a miss (or an unsaved write).

use std::sync::Arc;

use async_trait::async_trait;

use crate::image_cache::ImageCache;
use crate::key::RequestCacheKey;
use crate::model::{CachedPage, MovieDetail};
use crate::storage::ResponseStorage;

/// Error from the transport collaborators. The caches never produce it.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FetchError {
    #[error("transport: {0}")]
    Transport(String),
    #[error("decode: {0}")]
    Decode(String),
}

/// Fetches and decodes one page of list or search results.
#[async_trait]
pub trait MovieListFetcher: Send + Sync {
    async fn fetch_page(&self, key: &RequestCacheKey) -> Result<CachedPage, FetchError>;
}

#[async_trait]
pub trait MovieDetailFetcher: Send + Sync {
    async fn fetch_detail(&self, movie_id: u64) -> Result<MovieDetail, FetchError>;
}

/// Downloads raw encoded image bytes for a poster path.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch_image(&self, path: &str) -> Result<Vec<u8>, FetchError>;
}

/// Movie list / search pages, served from cache first and then from the network.
pub struct MoviesRepository {
    storage: Arc<dyn ResponseStorage>,
    fetcher: Arc<dyn MovieListFetcher>,
}

impl MoviesRepository {
    pub fn new(storage: Arc<dyn ResponseStorage>, fetcher: Arc<dyn MovieListFetcher>) -> Self {
        Self { storage, fetcher }
    }

    /// Looks up the cached page and fetches the fresh one concurrently; `on_cached`
    /// runs as soon as the lookup hits, however long the fetch takes.
    ///
    /// A slow lookup never delays the fetch. The fresh page is stored after the
    /// lookup has finished and before it is returned, so a later lookup for the
    /// same key sees it.
    pub async fn fetch_movies<F>(
        &self,
        key: &RequestCacheKey,
        on_cached: F,
    ) -> Result<CachedPage, FetchError>
    where
        F: FnOnce(CachedPage) + Send,
    {
        let lookup = async {
            match self.storage.get_response(key).await {
                Ok(Some(page)) => on_cached(page),
                Ok(None) => {}
                Err(e) => tracing::warn!(
                    key = %key,
                    backend = self.storage.name(),
                    error = %e,
                    "response cache unavailable, treating as miss"
                ),
            }
        };
        let ((), fetched) = tokio::join!(lookup, self.fetcher.fetch_page(key));

        let page = fetched?;
        if let Err(e) = self.storage.save(&page, key).await {
            tracing::warn!(
                key = %key,
                backend = self.storage.name(),
                error = %e,
                "response cache write failed"
            );
        }
        Ok(page)
    }
}

/// Per-movie details, served from cache first and then from the network.
pub struct MovieDetailsRepository {
    storage: Arc<dyn ResponseStorage>,
    fetcher: Arc<dyn MovieDetailFetcher>,
}

impl MovieDetailsRepository {
    pub fn new(storage: Arc<dyn ResponseStorage>, fetcher: Arc<dyn MovieDetailFetcher>) -> Self {
        Self { storage, fetcher }
    }

    pub async fn fetch_detail<F>(&self, movie_id: u64, on_cached: F) -> Result<MovieDetail, FetchError>
    where
        F: FnOnce(MovieDetail) + Send,
    {
        let lookup = async {
            match self.storage.get_movie_detail(movie_id).await {
                Ok(Some(detail)) => on_cached(detail),
                Ok(None) => {}
                Err(e) => tracing::warn!(
                    movie_id,
                    backend = self.storage.name(),
                    error = %e,
                    "detail cache unavailable, treating as miss"
                ),
            }
        };
        let ((), fetched) = tokio::join!(lookup, self.fetcher.fetch_detail(movie_id));

        let detail = fetched?;
        if let Err(e) = self.storage.save_detail(&detail).await {
            tracing::warn!(movie_id, error = %e, "detail cache write failed");
        }
        Ok(detail)
    }
}

/// Poster bytes; a cached image skips the download entirely.
pub struct PosterImagesRepository {
    cache: Arc<ImageCache>,
    fetcher: Arc<dyn ImageFetcher>,
}

impl PosterImagesRepository {
    pub fn new(cache: Arc<ImageCache>, fetcher: Arc<dyn ImageFetcher>) -> Self {
        Self { cache, fetcher }
    }

    pub async fn fetch_image(&self, path: &str) -> Result<Arc<[u8]>, FetchError> {
        if let Some(bytes) = self.cache.get(path) {
            return Ok(bytes);
        }
        let bytes: Arc<[u8]> = self.fetcher.fetch_image(path).await?.into();
        self.cache.put(path, Arc::clone(&bytes));
        Ok(bytes)
    }
}
