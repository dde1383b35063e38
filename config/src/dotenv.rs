//! Read the project `.env` into a map. Nothing is written to the process environment.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::LoadError;

/// `.env` in `override_dir` if given, else in the current directory.
fn dotenv_path(override_dir: Option<&Path>) -> Option<PathBuf> {
    let dir = override_dir
        .map(Path::to_path_buf)
        .or_else(|| std::env::current_dir().ok())?;
    let path = dir.join(".env");
    path.is_file().then_some(path)
}

/// Missing file returns an empty map.
pub fn load_env_map(override_dir: Option<&Path>) -> Result<HashMap<String, String>, LoadError> {
    let Some(path) = dotenv_path(override_dir) else {
        return Ok(HashMap::new());
    };
    let iter = ::dotenv::from_path_iter(&path).map_err(|e| LoadError::DotenvRead(e.to_string()))?;
    iter.map(|item| item.map_err(|e| LoadError::DotenvRead(e.to_string())))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_returns_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(load_env_map(Some(dir.path())).unwrap().is_empty());
    }

    #[test]
    fn reads_keys_and_skips_comments() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(".env"),
            "# cache\nMOVIE_CACHE_BACKEND=sqlite\nMOVIE_CACHE_DB=\"/tmp/m.sqlite3\"\n",
        )
        .unwrap();

        let m = load_env_map(Some(dir.path())).unwrap();

        assert_eq!(m.len(), 2);
        assert_eq!(m.get("MOVIE_CACHE_BACKEND").map(String::as_str), Some("sqlite"));
        assert_eq!(m.get("MOVIE_CACHE_DB").map(String::as_str), Some("/tmp/m.sqlite3"));
    }

    #[test]
    fn does_not_touch_process_env() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join(".env"), "CONFIG_DOTENV_UNTOUCHED=1\n").unwrap();

        let m = load_env_map(Some(dir.path())).unwrap();

        assert_eq!(m.get("CONFIG_DOTENV_UNTOUCHED").map(String::as_str), Some("1"));
        assert!(std::env::var("CONFIG_DOTENV_UNTOUCHED").is_err());
    }
}
