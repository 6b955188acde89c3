//! Configuration module
//!
//! Defaults for both tools can be kept in a TOML file, located at
//! `$FERROZIP_CONFIG` or `<config dir>/ferrozip/config.toml`.

use crate::archive::{ExtractOptions, PackOptions, DEFAULT_LEVEL};
use crate::{Error, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Environment variable overriding the configuration file location
pub const CONFIG_ENV: &str = "FERROZIP_CONFIG";

/// Main configuration structure
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Archive creation defaults
    pub pack: PackConfig,
    /// Extraction defaults
    pub extract: ExtractConfig,
}

/// Archive creation defaults
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackConfig {
    /// Compression level (-1 = codec default, 0 = store, 1-9 = deflate)
    pub level: i32,
    /// Recurse into directories
    pub recursive: bool,
    /// Glob patterns always excluded
    pub exclude: Vec<String>,
}

/// Extraction defaults
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Overwrite existing files without failing
    pub overwrite: bool,
    /// Drop directory components from entry names
    pub junk_paths: bool,
}

impl Default for PackConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL,
            recursive: false,
            exclude: Vec::new(),
        }
    }
}

impl Config {
    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Ok(PathBuf::from(path));
        }

        let config_dir = config_dir()
            .ok_or_else(|| Error::Config("Unable to determine config directory".to_string()))?;

        Ok(config_dir.join("ferrozip").join("config.toml"))
    }

    /// Load configuration, falling back to defaults when no file exists
    pub fn load() -> Result<Self> {
        let path = Self::config_path()?;
        if !path.exists() {
            debug!(path = ?path, "No configuration file, using defaults");
            return Ok(Self::default());
        }
        Self::load_from(&path)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| Error::at("read", path, e))?;
        let config: Config = toml::from_str(&contents).map_err(|e| {
            Error::Config(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        debug!(path = ?path, "Loaded configuration");
        Ok(config)
    }

    /// Save configuration to a specific file, creating parent directories
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| Error::io_at("mkdir", parent, e))?;
        }
        fs::write(path, contents).map_err(|e| Error::io_at("write", path, e))?;
        Ok(())
    }

    /// Pack options seeded from this configuration
    pub fn pack_options(&self) -> PackOptions {
        PackOptions {
            recursive: self.pack.recursive,
            level: self.pack.level,
            exclude: self.pack.exclude.clone(),
        }
    }

    /// Extract options seeded from this configuration
    pub fn extract_options(&self) -> ExtractOptions {
        ExtractOptions {
            overwrite: self.extract.overwrite,
            junk_paths: self.extract.junk_paths,
            ..ExtractOptions::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.pack.level, -1);
        assert!(!config.pack.recursive);
        assert!(config.pack.exclude.is_empty());
        assert!(!config.extract.overwrite);
        assert!(!config.extract.junk_paths);
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let toml_str = r#"
            [pack]
            exclude = ["*.o", ".git"]
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.pack.level, -1);
        assert_eq!(config.pack.exclude, vec!["*.o", ".git"]);
        assert!(!config.extract.overwrite);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested/config.toml");

        let mut config = Config::default();
        config.pack.level = 9;
        config.pack.recursive = true;
        config.extract.junk_paths = true;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded, config);

        let pack = loaded.pack_options();
        assert_eq!(pack.level, 9);
        assert!(pack.recursive);
        assert!(loaded.extract_options().junk_paths);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("config.toml");
        fs::write(&path, "[pack]\nlevel = \"high\"\n").unwrap();

        let err = Config::load_from(&path).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
