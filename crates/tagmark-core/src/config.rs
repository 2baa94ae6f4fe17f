//! Configuration management for Tagmark.
//!
//! This module provides configuration loading, saving, and defaults.
//! Configuration is stored in TOML format in a platform-appropriate location.

use crate::error::{Result, TagmarkError};
use crate::index::{IndexOptions, DEFAULT_PARALLEL_THRESHOLD};
use crate::search::{SortBy, SortOrder};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Main configuration structure for Tagmark.
///
/// ## Example Configuration File (tagmark.toml)
///
/// ```toml
/// [general]
/// data_dir = "/home/me/.bookmarks"
/// log_level = "info"
///
/// [search]
/// default_limit = 50
/// default_sort = "relevance"
/// default_order = "desc"
/// parallel_threshold = 2048
///
/// [storage]
/// compress = true
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Search defaults and tuning
    pub search: SearchConfig,

    /// Database file settings
    pub storage: StorageConfig,
}

/// General configuration options
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Database directory (None = default location)
    pub data_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        GeneralConfig {
            data_dir: None,
            log_level: "info".to_string(),
        }
    }
}

/// Search configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Result limit applied when a query does not set one (0 = unbounded)
    pub default_limit: usize,

    /// Sort key applied when a query does not set one
    pub default_sort: String,

    /// Sort direction applied when a query does not set one
    pub default_order: String,

    /// Candidate count at which scoring goes parallel (0 = never)
    pub parallel_threshold: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            default_limit: 50,
            default_sort: SortBy::Relevance.to_string(),
            default_order: SortOrder::Desc.to_string(),
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
        }
    }
}

impl SearchConfig {
    /// Parsed default sort key.
    pub fn sort_by(&self) -> Result<SortBy> {
        self.default_sort
            .parse()
            .map_err(|reason| TagmarkError::ConfigError { reason })
    }

    /// Parsed default sort direction.
    pub fn sort_order(&self) -> Result<SortOrder> {
        self.default_order
            .parse()
            .map_err(|reason| TagmarkError::ConfigError { reason })
    }
}

/// Storage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Use LZ4 compression for the database file
    pub compress: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig { compress: true }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Returns default config if no config file exists.
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Config::default());
        }

        info!(path = %path.display(), "Loading configuration");
        let contents = fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents).map_err(|e| TagmarkError::ConfigError {
            reason: format!("Failed to parse config: {}", e),
        })?;

        // Surface bad sort names at load time rather than on first search.
        config.search.sort_by()?;
        config.search.sort_order()?;

        Ok(config)
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<()> {
        let config_path = Self::default_config_path()?;
        self.save_to(&config_path)
    }

    /// Save configuration to a specific path.
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        info!(path = %path.display(), "Saving configuration");
        let contents = toml::to_string_pretty(self).map_err(|e| TagmarkError::ConfigError {
            reason: format!("Failed to serialize config: {}", e),
        })?;

        fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> Result<PathBuf> {
        let dirs = project_dirs("Could not determine config directory")?;
        Ok(dirs.config_dir().join("tagmark.toml"))
    }

    /// Get the default data directory path.
    pub fn default_data_dir() -> Result<PathBuf> {
        let dirs = project_dirs("Could not determine data directory")?;
        Ok(dirs.data_dir().to_path_buf())
    }

    /// Get the database directory (from config or default).
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.general.data_dir {
            Some(path) => Ok(path.clone()),
            None => Self::default_data_dir(),
        }
    }

    /// Index tuning derived from the search section.
    pub fn index_options(&self) -> IndexOptions {
        IndexOptions {
            parallel_threshold: self.search.parallel_threshold,
        }
    }
}

fn project_dirs(reason: &str) -> Result<ProjectDirs> {
    ProjectDirs::from("", "", "tagmark").ok_or_else(|| TagmarkError::ConfigError {
        reason: reason.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.search.default_limit, 50);
        assert_eq!(config.search.sort_by().unwrap(), SortBy::Relevance);
        assert_eq!(config.search.sort_order().unwrap(), SortOrder::Desc);
        assert!(config.storage.compress);
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("test.toml");

        let mut config = Config::default();
        config.general.data_dir = Some(temp_dir.path().join("data"));
        config.search.default_limit = 10;
        config.search.default_sort = "title".to_string();
        config.storage.compress = false;

        config.save_to(&config_path).unwrap();
        let loaded = Config::load_from(&config_path).unwrap();

        assert_eq!(loaded.general.data_dir, Some(temp_dir.path().join("data")));
        assert_eq!(loaded.search.default_limit, 10);
        assert_eq!(loaded.search.sort_by().unwrap(), SortBy::Title);
        assert!(!loaded.storage.compress);
    }

    #[test]
    fn test_load_nonexistent() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nonexistent.toml");

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.search.default_limit, 50); // Default value
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("partial.toml");
        fs::write(&config_path, "[search]\nparallel_threshold = 0\n").unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.index_options().parallel_threshold, 0);
        assert_eq!(config.search.default_limit, 50);
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn test_invalid_sort_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("bad.toml");
        fs::write(&config_path, "[search]\ndefault_sort = \"popularity\"\n").unwrap();

        let result = Config::load_from(&config_path);
        assert!(matches!(result, Err(TagmarkError::ConfigError { .. })));
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("broken.toml");
        fs::write(&config_path, "[search\n").unwrap();

        assert!(Config::load_from(&config_path).is_err());
    }

    #[test]
    fn test_explicit_data_dir() {
        let mut config = Config::default();
        config.general.data_dir = Some(PathBuf::from("/tmp/tagmark-data"));
        assert_eq!(config.data_dir().unwrap(), PathBuf::from("/tmp/tagmark-data"));
    }
}
