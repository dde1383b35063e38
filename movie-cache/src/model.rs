//! Decoded payloads held by the caches. The cache never parses wire data itself;
//! these arrive already decoded from the transport layer.

use serde::{Deserialize, Deserializer, Serialize};

/// JSON has no NaN; serde_json writes it as `null`, so read `null` back as NaN.
fn rating_or_nan<'de, D: Deserializer<'de>>(deserializer: D) -> Result<f64, D::Error> {
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}

/// One movie row of a list page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieSummary {
    pub id: u64,
    pub title: String,
    pub poster_path: Option<String>,
    pub overview: String,
    /// `YYYY-MM-DD` as delivered by the API; absent for unreleased titles.
    pub release_date: Option<String>,
    /// NaN when the API has no rating.
    #[serde(deserialize_with = "rating_or_nan")]
    pub rating: f64,
}

/// A decoded page of list or search results.
///
/// Immutable once cached: a later write for the same key replaces the whole page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CachedPage {
    pub page: u32,
    pub total_pages: u32,
    pub results: Vec<MovieSummary>,
}

impl CachedPage {
    pub fn new(page: u32, total_pages: u32, results: Vec<MovieSummary>) -> Self {
        Self {
            page,
            total_pages,
            results,
        }
    }
}

/// Per-movie detail record, keyed by [`MovieDetail::id`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MovieDetail {
    pub id: u64,
    pub title: String,
    pub overview: String,
    #[serde(default)]
    pub tagline: Option<String>,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub runtime_minutes: Option<u32>,
    #[serde(default)]
    pub genres: Vec<String>,
    #[serde(deserialize_with = "rating_or_nan")]
    pub rating: f64,
    #[serde(default)]
    pub vote_count: u64,
}
