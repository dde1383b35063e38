//! Load the `[cache]` table from `$XDG_CONFIG_HOME/<app>/config.toml`.

use std::path::{Path, PathBuf};

use crate::{CacheSettings, LoadError};

/// `$XDG_CONFIG_HOME`, falling back to `~/.config` on every platform.
fn config_home() -> Result<PathBuf, LoadError> {
    let base = cross_xdg::BaseDirs::new().map_err(|e| LoadError::XdgPath(e.to_string()))?;
    Ok(base.config_home().to_path_buf())
}

fn config_path(app_name: &str) -> Result<Option<PathBuf>, LoadError> {
    let path = config_home()?.join(app_name).join("config.toml");
    if path.exists() {
        Ok(Some(path))
    } else {
        Ok(None)
    }
}

#[derive(serde::Deserialize, Default)]
struct ConfigFile {
    #[serde(default)]
    cache: CacheSettings,
}

fn parse_cache_table(path: &Path) -> Result<CacheSettings, LoadError> {
    let content = std::fs::read_to_string(path).map_err(LoadError::XdgRead)?;
    let config: ConfigFile = toml::from_str(&content)?;
    Ok(config.cache)
}

/// Returns settings from the `[cache]` section. Missing file or section returns defaults.
pub fn load_cache_table(app_name: &str) -> Result<CacheSettings, LoadError> {
    match config_path(app_name)? {
        Some(path) => parse_cache_table(&path),
        None => Ok(CacheSettings::default()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ImageEviction, StorageBackendKind};

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, content).unwrap();
        (dir, path)
    }

    /// **Scenario**: with `XDG_CONFIG_HOME` unset the lookup uses `~/.config`, not the
    /// platform application-support directory; when set, it is used as is.
    #[test]
    fn config_home_follows_xdg_layout() {
        let _guard = crate::tests::ENV_LOCK.lock().unwrap_or_else(|p| p.into_inner());
        let prev = std::env::var_os("XDG_CONFIG_HOME");

        std::env::remove_var("XDG_CONFIG_HOME");
        let unset = config_home();
        let dir = tempfile::tempdir().unwrap();
        std::env::set_var("XDG_CONFIG_HOME", dir.path());
        let set = config_home();

        match prev {
            Some(p) => std::env::set_var("XDG_CONFIG_HOME", p),
            None => std::env::remove_var("XDG_CONFIG_HOME"),
        }

        assert!(unset.unwrap().ends_with(".config"));
        assert_eq!(set.unwrap(), dir.path());
    }

    #[test]
    fn missing_config_returns_defaults() {
        let settings = load_cache_table("config-crate-test-nonexistent-12345").unwrap();
        assert_eq!(settings, CacheSettings::default());
    }

    #[test]
    fn reads_cache_table() {
        let (_dir, path) = write_config(
            r#"
[cache]
backend = "sqlite"
database_path = "/var/tmp/movies.sqlite3"
image_capacity = 80
image_eviction = "least_recently_used"
"#,
        );
        let settings = parse_cache_table(&path).unwrap();
        assert_eq!(settings.backend, StorageBackendKind::Sqlite);
        assert_eq!(
            settings.database_path,
            Some(PathBuf::from("/var/tmp/movies.sqlite3"))
        );
        assert_eq!(settings.image_capacity, 80);
        assert_eq!(settings.image_eviction, ImageEviction::LeastRecentlyUsed);
    }

    #[test]
    fn partial_table_keeps_defaults() {
        let (_dir, path) = write_config("[cache]\nimage_capacity = 5\n");
        let settings = parse_cache_table(&path).unwrap();
        assert_eq!(settings.image_capacity, 5);
        assert_eq!(settings.backend, StorageBackendKind::Memory);
    }

    #[test]
    fn config_without_cache_section_returns_defaults() {
        let (_dir, path) = write_config("[other]\nkey = \"ignored\"\n");
        assert_eq!(parse_cache_table(&path).unwrap(), CacheSettings::default());
    }

    #[test]
    fn invalid_toml_returns_xdg_parse_error() {
        let (_dir, path) = write_config("not valid toml [[[\n");
        assert!(matches!(
            parse_cache_table(&path),
            Err(LoadError::XdgParse(_))
        ));
    }

    #[test]
    fn unknown_backend_is_a_parse_error() {
        let (_dir, path) = write_config("[cache]\nbackend = \"redis\"\n");
        assert!(matches!(
            parse_cache_table(&path),
            Err(LoadError::XdgParse(_))
        ));
    }
}
