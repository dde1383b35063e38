//! # Response storage: request → page and movie id → detail
//!
//! [`ResponseStorage`] is the capability set repositories depend on. Two backends
//! implement it and are picked at composition time ([`build_storage`]):
//!
//! | Type                         | Persistence | Errors                         |
//! |------------------------------|-------------|--------------------------------|
//! | [`InMemoryResponseStorage`]  | Process     | Never                          |
//! | [`SqliteResponseStorage`]    | SQLite file | [`StorageError`] on I/O faults |
//!
//! A miss is `Ok(None)`. An `Err` means the cache itself is unavailable; callers
//! treat it like a miss for the user but can log the difference.

mod memory;
mod sqlite;

pub use memory::InMemoryResponseStorage;
pub use sqlite::{SqliteResponseStorage, StoredCounts};

use std::sync::Arc;

use async_trait::async_trait;
use env_config::{CacheSettings, StorageBackendKind};

use crate::key::RequestCacheKey;
use crate::model::{CachedPage, MovieDetail};

/// Error from [`ResponseStorage`] operations. Distinct from a miss.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum StorageError {
    /// Backing store could not be read or written (I/O, lock, worker failure).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
    /// A stored record could not be decoded.
    #[error("corrupt record: {0}")]
    Corrupt(String),
}

impl StorageError {
    /// Both variants mean the cache cannot answer right now.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable(_) | Self::Corrupt(_))
    }
}

impl From<rusqlite::Error> for StorageError {
    fn from(e: rusqlite::Error) -> Self {
        match e {
            rusqlite::Error::FromSqlConversionFailure(..)
            | rusqlite::Error::InvalidColumnType(..)
            | rusqlite::Error::IntegralValueOutOfRange(..) => Self::Corrupt(e.to_string()),
            other => Self::Unavailable(other.to_string()),
        }
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        Self::Corrupt(e.to_string())
    }
}

/// Cached responses and movie details, keyed by request shape and movie id.
///
/// - `save`: replaces whatever was stored for the key in one unit of work.
/// - `save_detail`: replaces the detail for `detail.id` in one unit of work.
///
/// Once a `save` future has resolved, a later `get_response` for the same key
/// observes the new page. There is no ordering across keys.
#[async_trait]
pub trait ResponseStorage: Send + Sync {
    async fn get_response(
        &self,
        key: &RequestCacheKey,
    ) -> Result<Option<CachedPage>, StorageError>;

    async fn save(&self, page: &CachedPage, key: &RequestCacheKey) -> Result<(), StorageError>;

    async fn get_movie_detail(&self, movie_id: u64) -> Result<Option<MovieDetail>, StorageError>;

    async fn save_detail(&self, detail: &MovieDetail) -> Result<(), StorageError>;

    /// Backend name for logs.
    fn name(&self) -> &'static str;
}

/// Builds the backend selected in `settings`.
pub fn build_storage(settings: &CacheSettings) -> Result<Arc<dyn ResponseStorage>, StorageError> {
    match settings.backend {
        StorageBackendKind::Memory => Ok(Arc::new(InMemoryResponseStorage::new())),
        StorageBackendKind::Sqlite => {
            let path = settings
                .resolved_database_path()
                .ok_or_else(|| StorageError::Unavailable("no cache directory for sqlite".into()))?;
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir).map_err(|e| {
                    StorageError::Unavailable(format!("create {}: {e}", dir.display()))
                })?;
            }
            tracing::info!(path = %path.display(), "opening sqlite response storage");
            Ok(Arc::new(SqliteResponseStorage::open(&path)?))
        }
    }
}
