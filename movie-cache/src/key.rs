//! Cache key construction shared by every cache in this crate.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Normalized identity of a movie-list request: optional search text plus a 1-based page.
///
/// Two keys are equal iff both fields are equal. An empty query is folded into `None`
/// so that `search("", 2)` and `page(2)` address the same trending page; any other
/// query text is kept exactly as given.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestCacheKey {
    query: Option<String>,
    page: u32,
}

impl RequestCacheKey {
    /// Key for a plain list request (trending, popular, ...).
    pub fn for_page(page: u32) -> Self {
        Self { query: None, page }
    }

    /// Key for a search request.
    pub fn for_search(query: impl Into<String>, page: u32) -> Self {
        let query = query.into();
        Self {
            query: if query.is_empty() { None } else { Some(query) },
            page,
        }
    }

    pub fn query(&self) -> Option<&str> {
        self.query.as_deref()
    }

    pub fn page(&self) -> u32 {
        self.page
    }
}

impl fmt::Display for RequestCacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.query {
            Some(q) => write!(f, "query={:?} page={}", q, self.page),
            None => write!(f, "page={}", self.page),
        }
    }
}
