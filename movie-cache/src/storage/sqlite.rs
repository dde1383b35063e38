//! SQLite-backed ResponseStorage. Persistent across process restarts.
//!
//! Layout:
//! - `requests (query?, page) → response_id`, one row per request shape.
//! - `responses` with child rows in `response_movies`, cascade-deleted with their parent.
//! - `movie_details (movie_id → JSON payload)`.
//!
//! Every replace runs delete-then-insert inside one transaction, so a reader never
//! sees two responses for one key and a failed write leaves the old value in place.

use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};

use crate::key::RequestCacheKey;
use crate::model::{CachedPage, MovieDetail, MovieSummary};
use crate::storage::{ResponseStorage, StorageError};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS responses (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    page INTEGER NOT NULL,
    total_pages INTEGER NOT NULL,
    saved_at INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS response_movies (
    response_id INTEGER NOT NULL REFERENCES responses(id) ON DELETE CASCADE,
    position INTEGER NOT NULL,
    movie_id INTEGER NOT NULL,
    title TEXT NOT NULL,
    poster_path TEXT,
    overview TEXT NOT NULL,
    release_date TEXT,
    rating REAL,
    PRIMARY KEY (response_id, position)
);
CREATE TABLE IF NOT EXISTS requests (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    query TEXT,
    page INTEGER NOT NULL,
    response_id INTEGER NOT NULL UNIQUE REFERENCES responses(id) ON DELETE CASCADE
);
CREATE UNIQUE INDEX IF NOT EXISTS idx_requests_shape ON requests(ifnull(query, ''), page);
CREATE TABLE IF NOT EXISTS movie_details (
    movie_id INTEGER PRIMARY KEY,
    payload TEXT NOT NULL,
    saved_at INTEGER NOT NULL
);
"#;

fn system_time_to_millis(time: SystemTime) -> i64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

fn movie_id_to_sql(id: u64) -> Result<i64, StorageError> {
    i64::try_from(id).map_err(|_| StorageError::Corrupt(format!("movie id {id} out of range")))
}

fn movie_id_from_sql(id: i64) -> Result<u64, StorageError> {
    u64::try_from(id).map_err(|_| StorageError::Corrupt(format!("negative movie id {id}")))
}

/// Row counts per table, for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StoredCounts {
    pub requests: u64,
    pub responses: u64,
    pub movies: u64,
    pub details: u64,
}

/// SQLite-backed [`ResponseStorage`].
///
/// Holds one connection behind a mutex and runs every operation on the blocking
/// pool, so all reads and writes against the file go through one serialization point.
pub struct SqliteResponseStorage {
    db: Arc<Mutex<Connection>>,
}

impl SqliteResponseStorage {
    /// Opens or creates the database file and its tables.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let conn = Connection::open(path.as_ref())?;
        Self::init(conn)
    }

    /// Private in-memory database; gone when the storage is dropped.
    pub fn in_memory() -> Result<Self, StorageError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StorageError> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            db: Arc::new(Mutex::new(conn)),
        })
    }

    /// Returns how many rows each table holds.
    pub async fn counts(&self) -> Result<StoredCounts, StorageError> {
        self.run(|conn| {
            let count = |table: &str| -> Result<u64, StorageError> {
                let n: i64 =
                    conn.query_row(&format!("SELECT count(*) FROM {table}"), [], |row| row.get(0))?;
                Ok(n as u64)
            };
            Ok(StoredCounts {
                requests: count("requests")?,
                responses: count("responses")?,
                movies: count("response_movies")?,
                details: count("movie_details")?,
            })
        })
        .await
    }

    async fn run<T, F>(&self, f: F) -> Result<T, StorageError>
    where
        T: Send + 'static,
        F: FnOnce(&mut Connection) -> Result<T, StorageError> + Send + 'static,
    {
        let db = Arc::clone(&self.db);
        tokio::task::spawn_blocking(move || {
            let mut conn = db
                .lock()
                .map_err(|_| StorageError::Unavailable("connection lock poisoned".into()))?;
            f(&mut conn)
        })
        .await
        .map_err(|e| StorageError::Unavailable(e.to_string()))?
    }
}

fn read_page(conn: &Connection, key: &RequestCacheKey) -> Result<Option<CachedPage>, StorageError> {
    let header: Option<(i64, u32, u32)> = conn
        .query_row(
            "SELECT r.id, r.page, r.total_pages FROM requests q \
             JOIN responses r ON r.id = q.response_id \
             WHERE q.query IS ?1 AND q.page = ?2",
            params![key.query(), key.page()],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?;
    let Some((response_id, page, total_pages)) = header else {
        return Ok(None);
    };

    let mut stmt = conn.prepare_cached(
        "SELECT movie_id, title, poster_path, overview, release_date, rating \
         FROM response_movies WHERE response_id = ?1 ORDER BY position",
    )?;
    let rows = stmt.query_map(params![response_id], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, String>(1)?,
            row.get::<_, Option<String>>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, Option<String>>(4)?,
            // SQLite stores NaN as NULL.
            row.get::<_, Option<f64>>(5)?.unwrap_or(f64::NAN),
        ))
    })?;
    let mut results = Vec::new();
    for row in rows {
        let (id, title, poster_path, overview, release_date, rating) = row?;
        results.push(MovieSummary {
            id: movie_id_from_sql(id)?,
            title,
            poster_path,
            overview,
            release_date,
            rating,
        });
    }
    Ok(Some(CachedPage {
        page,
        total_pages,
        results,
    }))
}

fn replace_page(
    conn: &mut Connection,
    key: &RequestCacheKey,
    page: &CachedPage,
) -> Result<bool, StorageError> {
    let now = system_time_to_millis(SystemTime::now());
    let tx = conn.transaction()?;

    // Cascade removes the stale request row and its movie rows with the response.
    let replaced = tx.execute(
        "DELETE FROM responses WHERE id IN \
         (SELECT response_id FROM requests WHERE query IS ?1 AND page = ?2)",
        params![key.query(), key.page()],
    )?;

    tx.execute(
        "INSERT INTO responses (page, total_pages, saved_at) VALUES (?1, ?2, ?3)",
        params![page.page, page.total_pages, now],
    )?;
    let response_id = tx.last_insert_rowid();
    {
        let mut stmt = tx.prepare_cached(
            "INSERT INTO response_movies \
             (response_id, position, movie_id, title, poster_path, overview, release_date, rating) \
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        )?;
        for (position, movie) in page.results.iter().enumerate() {
            stmt.execute(params![
                response_id,
                position as i64,
                movie_id_to_sql(movie.id)?,
                movie.title,
                movie.poster_path,
                movie.overview,
                movie.release_date,
                movie.rating,
            ])?;
        }
    }
    tx.execute(
        "INSERT INTO requests (query, page, response_id) VALUES (?1, ?2, ?3)",
        params![key.query(), key.page(), response_id],
    )?;
    tx.commit()?;
    Ok(replaced > 0)
}

#[async_trait]
impl ResponseStorage for SqliteResponseStorage {
    async fn get_response(
        &self,
        key: &RequestCacheKey,
    ) -> Result<Option<CachedPage>, StorageError> {
        let key = key.clone();
        let found = self.run(move |conn| read_page(conn, &key)).await?;
        tracing::trace!(hit = found.is_some(), "sqlite storage get_response");
        Ok(found)
    }

    async fn save(&self, page: &CachedPage, key: &RequestCacheKey) -> Result<(), StorageError> {
        let page = page.clone();
        let key = key.clone();
        self.run(move |conn| {
            let replaced = replace_page(conn, &key, &page)?;
            tracing::debug!(key = %key, replaced, results = page.results.len(), "sqlite storage save");
            Ok(())
        })
        .await
    }

    async fn get_movie_detail(&self, movie_id: u64) -> Result<Option<MovieDetail>, StorageError> {
        // Ids beyond i64 can never have been saved.
        let Ok(id) = i64::try_from(movie_id) else {
            return Ok(None);
        };
        let payload: Option<String> = self
            .run(move |conn| {
                Ok(conn
                    .query_row(
                        "SELECT payload FROM movie_details WHERE movie_id = ?1",
                        params![id],
                        |row| row.get(0),
                    )
                    .optional()?)
            })
            .await?;
        match payload {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }

    async fn save_detail(&self, detail: &MovieDetail) -> Result<(), StorageError> {
        let id = movie_id_to_sql(detail.id)?;
        let payload = serde_json::to_string(detail)?;
        let now = system_time_to_millis(SystemTime::now());
        self.run(move |conn| {
            let tx = conn.transaction()?;
            let replaced = tx.execute("DELETE FROM movie_details WHERE movie_id = ?1", params![id])?;
            tx.execute(
                "INSERT INTO movie_details (movie_id, payload, saved_at) VALUES (?1, ?2, ?3)",
                params![id, payload, now],
            )?;
            tx.commit()?;
            tracing::debug!(movie_id = id, replaced = replaced > 0, "sqlite storage save detail");
            Ok(())
        })
        .await
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}
