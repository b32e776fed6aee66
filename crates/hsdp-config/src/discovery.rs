//! Config file discovery.
//!
//! Resolution order:
//! 1. An explicit path (`--config`), which must exist
//! 2. `$HSDP_CONFIG_DIR/config.toml`
//! 3. `~/.config/hsdp/config.toml` (platform config dir)
//!
//! Secrets from the environment are applied on top of whichever file loads.

use std::path::{Path, PathBuf};

use crate::{ConfigError, HsdpConfig, Result};

/// Default config filename within the config directory.
const CONFIG_FILE: &str = "config.toml";

/// Application name for config directory resolution.
const APP_NAME: &str = "hsdp";

/// Environment variable to override the config directory.
const CONFIG_DIR_ENV: &str = "HSDP_CONFIG_DIR";

/// Load configuration, then apply environment overrides.
///
/// Without an explicit path a missing default file yields an empty config.
pub fn load_config(explicit: Option<&Path>) -> Result<HsdpConfig> {
    let mut config = match explicit {
        Some(path) => load_config_file(path)?,
        None => {
            let path = config_path().ok_or(ConfigError::NoConfigDir)?;
            if path.is_file() {
                load_config_file(&path)?
            } else {
                HsdpConfig::new()
            }
        }
    };

    config.apply_env_overrides();
    Ok(config)
}

/// Load config from a specific file path (no discovery, no overrides).
pub fn load_config_file(path: &Path) -> Result<HsdpConfig> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.display().to_string(),
        source: e,
    })?;
    HsdpConfig::from_toml(&contents)
}

/// Path of the default config file.
pub fn config_path() -> Option<PathBuf> {
    config_dir().map(|d| d.join(CONFIG_FILE))
}

/// Config directory: `HSDP_CONFIG_DIR`, then the platform default.
pub fn config_dir() -> Option<PathBuf> {
    if let Ok(dir) = std::env::var(CONFIG_DIR_ENV)
        && !dir.is_empty()
    {
        return Some(PathBuf::from(dir));
    }
    dirs::config_dir().map(|d| d.join(APP_NAME))
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_load_config_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(
            &path,
            "[tdr]\nurl = \"https://tdr.example.com\"\n[client]\ntimeout_secs = 5\n",
        )
        .unwrap();

        let config = load_config_file(&path).unwrap();
        assert_eq!(config.tdr().unwrap().url, "https://tdr.example.com");
        assert_eq!(config.client.timeout_secs, Some(5));
    }

    #[test]
    fn test_load_config_file_not_found() {
        let dir = TempDir::new().unwrap();
        let result = load_config_file(&dir.path().join("missing.toml"));

        match result {
            Err(ConfigError::ReadFile { path, .. }) => assert!(path.ends_with("missing.toml")),
            other => panic!("expected ReadFile error, got {other:?}"),
        }
    }

    #[test]
    fn test_explicit_path_must_exist() {
        let dir = TempDir::new().unwrap();
        let result = load_config(Some(&dir.path().join("nope.toml")));
        assert!(matches!(result, Err(ConfigError::ReadFile { .. })));
    }

    #[test]
    fn test_explicit_path_invalid_toml() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "not = [valid").unwrap();

        assert!(matches!(
            load_config(Some(&path)),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_config_path_file_name() {
        if let Some(path) = config_path() {
            assert!(path.ends_with(CONFIG_FILE));
        }
    }
}
