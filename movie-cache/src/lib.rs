//! # movie-cache
//!
//! Caching layer of the movie browser. It sits between the network transport and
//! the repositories and is always a best-effort accelerator: a miss or a broken
//! cache costs a redundant fetch, never an error the user sees.
//!
//! ## Components
//!
//! - [`RequestCacheKey`]: normalized request shape, `(query?, page)`.
//! - [`ResponseCache`]: in-memory, thread-safe, last-write-wins page cache with
//!   synchronous `get`/`put`.
//! - [`ImageCache`]: raw poster bytes, bounded by entry count (default
//!   [`DEFAULT_IMAGE_CAPACITY`]) with deterministic [`EvictionPolicy`].
//! - [`ResponseStorage`]: async request → page and movie id → detail storage;
//!   [`InMemoryResponseStorage`] or durable [`SqliteResponseStorage`].
//! - [`MoviesRepository`], [`MovieDetailsRepository`], [`PosterImagesRepository`]:
//!   serve the cached value first, then fetch and write back.
//! - [`CacheLayer`]: builds all of the above from [`CacheSettings`]; no globals.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use movie_cache::{CacheLayer, CacheSettings, RequestCacheKey};
//!
//! # async fn run(fetcher: std::sync::Arc<dyn movie_cache::MovieListFetcher>) -> Result<(), Box<dyn std::error::Error>> {
//! let settings = CacheSettings::default();
//! let layer = CacheLayer::from_settings(&settings)?;
//! let movies = layer.movies(fetcher);
//!
//! let key = RequestCacheKey::for_search("alien", 1);
//! let fresh = movies
//!     .fetch_movies(&key, |cached| println!("cached: {} results", cached.results.len()))
//!     .await?;
//! println!("fresh: {} results", fresh.results.len());
//! # Ok(())
//! # }
//! ```

pub mod image_cache;
pub mod key;
pub mod layer;
pub mod model;
pub mod repository;
pub mod response_cache;
pub mod storage;

pub use env_config::{CacheSettings, ImageEviction, StorageBackendKind};
pub use image_cache::{EvictionPolicy, ImageCache, DEFAULT_IMAGE_CAPACITY};
pub use key::RequestCacheKey;
pub use layer::CacheLayer;
pub use model::{CachedPage, MovieDetail, MovieSummary};
pub use repository::{
    FetchError, ImageFetcher, MovieDetailFetcher, MovieDetailsRepository, MovieListFetcher,
    MoviesRepository, PosterImagesRepository,
};
pub use response_cache::ResponseCache;
pub use storage::{
    build_storage, InMemoryResponseStorage, ResponseStorage, SqliteResponseStorage, StorageError,
    StoredCounts,
};
