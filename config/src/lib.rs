//! Load cache settings from XDG `config.toml`, a project `.env`, and the process
//! environment, with priority: **existing env > .env > XDG**.
//!
//! ```toml
//! # ~/.config/movie-cache/config.toml
//! [cache]
//! backend = "sqlite"
//! database_path = "/var/tmp/movie-cache.sqlite3"
//! image_capacity = 80
//! image_eviction = "least_recently_used"
//! ```
//!
//! Environment keys: [`ENV_BACKEND`], [`ENV_DATABASE`], [`ENV_IMAGE_CAPACITY`],
//! [`ENV_IMAGE_EVICTION`].

mod dotenv;
mod xdg_toml;

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const ENV_BACKEND: &str = "MOVIE_CACHE_BACKEND";
pub const ENV_DATABASE: &str = "MOVIE_CACHE_DB";
pub const ENV_IMAGE_CAPACITY: &str = "MOVIE_CACHE_IMAGE_CAPACITY";
pub const ENV_IMAGE_EVICTION: &str = "MOVIE_CACHE_IMAGE_EVICTION";

const DEFAULT_APP_NAME: &str = "movie-cache";
const DEFAULT_IMAGE_CAPACITY: usize = 50;
const DATABASE_FILE: &str = "responses.sqlite3";

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("xdg config path: {0}")]
    XdgPath(String),
    #[error("read xdg config: {0}")]
    XdgRead(std::io::Error),
    #[error("parse xdg toml: {0}")]
    XdgParse(#[from] toml::de::Error),
    #[error("read .env: {0}")]
    DotenvRead(String),
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue { key: &'static str, value: String },
}

/// Which response storage backend the cache layer builds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackendKind {
    #[default]
    Memory,
    Sqlite,
}

impl FromStr for StorageBackendKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" | "in_memory" => Ok(Self::Memory),
            "sqlite" => Ok(Self::Sqlite),
            _ => Err(()),
        }
    }
}

/// Image cache eviction order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageEviction {
    #[default]
    InsertionOrder,
    LeastRecentlyUsed,
}

impl FromStr for ImageEviction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "insertion_order" | "fifo" => Ok(Self::InsertionOrder),
            "least_recently_used" | "lru" => Ok(Self::LeastRecentlyUsed),
            _ => Err(()),
        }
    }
}

/// Settings for the cache layer. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    pub backend: StorageBackendKind,
    /// SQLite file; `None` means `<cache dir>/<app>/responses.sqlite3`.
    pub database_path: Option<PathBuf>,
    pub image_capacity: usize,
    pub image_eviction: ImageEviction,
    /// Used for the default database location.
    #[serde(skip)]
    pub app_name: String,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackendKind::default(),
            database_path: None,
            image_capacity: DEFAULT_IMAGE_CAPACITY,
            image_eviction: ImageEviction::default(),
            app_name: DEFAULT_APP_NAME.to_string(),
        }
    }
}

impl CacheSettings {
    /// The configured database path, else `$XDG_CACHE_HOME/<app>/responses.sqlite3`.
    /// `None` only when no path is configured and no home directory can be found.
    pub fn resolved_database_path(&self) -> Option<PathBuf> {
        self.database_path.clone().or_else(|| {
            cross_xdg::BaseDirs::new()
                .ok()
                .map(|base| base.cache_home().join(&self.app_name).join(DATABASE_FILE))
        })
    }

    /// Applies overrides: `env` wins, then `dotenv`, then what is already set.
    fn apply_overrides(
        &mut self,
        dotenv: &HashMap<String, String>,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<(), LoadError> {
        let lookup = |key: &str| env(key).or_else(|| dotenv.get(key).cloned());

        if let Some(v) = lookup(ENV_BACKEND) {
            self.backend = v.parse().map_err(|_| LoadError::InvalidValue {
                key: ENV_BACKEND,
                value: v,
            })?;
        }
        if let Some(v) = lookup(ENV_DATABASE) {
            if !v.trim().is_empty() {
                self.database_path = Some(PathBuf::from(v));
            }
        }
        if let Some(v) = lookup(ENV_IMAGE_CAPACITY) {
            self.image_capacity = v.trim().parse().map_err(|_| LoadError::InvalidValue {
                key: ENV_IMAGE_CAPACITY,
                value: v,
            })?;
        }
        if let Some(v) = lookup(ENV_IMAGE_EVICTION) {
            self.image_eviction = v.parse().map_err(|_| LoadError::InvalidValue {
                key: ENV_IMAGE_EVICTION,
                value: v,
            })?;
        }
        Ok(())
    }
}

/// Loads [`CacheSettings`] for `app_name`.
///
/// Order of precedence per key:
/// 1. Process environment
/// 2. Project `.env` (current directory, or `override_dir` if given)
/// 3. `[cache]` table of `$XDG_CONFIG_HOME/<app_name>/config.toml`
/// 4. Defaults
pub fn load_settings(
    app_name: &str,
    override_dir: Option<&Path>,
) -> Result<CacheSettings, LoadError> {
    let mut settings = xdg_toml::load_cache_table(app_name)?;
    settings.app_name = app_name.to_string();
    let dotenv_map = dotenv::load_env_map(override_dir)?;
    settings.apply_overrides(&dotenv_map, |key| std::env::var(key).ok())?;
    Ok(settings)
}
