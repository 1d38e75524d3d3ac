//! # Configuration Management Module
//!
//! ## Purpose
//! Centralized configuration management for the field trial indexing service,
//! supporting TOML files and environment variable overrides with validation
//! and type-safe access to all settings.
//!
//! ## Input/Output Specification
//! - **Input**: Configuration files (TOML), environment variables
//! - **Output**: Validated configuration structs with defaults and overrides
//! - **Validation**: Log level parsing, non-empty path checks
//!
//! ## Configuration Sources (in order of precedence)
//! 1. Environment variables (`FT_INDEXER_*`)
//! 2. Configuration file
//! 3. Default values
//!
//! The cache and package directories are optional on purpose: when they are
//! absent the corresponding operations report `Idle` and do no work, rather
//! than treating the missing configuration as an error.

use crate::errors::{IndexingError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure containing all system settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Document store settings
    #[serde(default)]
    pub store: StoreConfig,
    /// Search index settings
    #[serde(default)]
    pub index: IndexConfig,
    /// Study cache settings
    #[serde(default)]
    pub cache: CacheConfig,
    /// Derived data-package settings
    #[serde(default)]
    pub packages: PackageConfig,
    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Document store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding one JSON file per record collection
    pub data_dir: PathBuf,
}

/// Search index configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Directory the index client writes per-collection indices into
    pub index_dir: PathBuf,
}

/// Study cache configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Directory holding cached study files; cache operations are idle
    /// when unset
    pub study_cache_dir: Option<PathBuf>,
}

/// Derived data-package configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageConfig {
    /// Directory generated study packages are written to; package
    /// generation is idle when unset
    pub package_dir: Option<PathBuf>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (trace, debug, info, warn, error)
    pub level: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data/collections"),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            index_dir: PathBuf::from("./data/index"),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        Self::from_file("config.toml")
    }

    /// Load configuration from a specific file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::warn!("Configuration file not found: {:?}, using defaults", path);
            let mut config = Self::default();
            config.apply_env_overrides();
            config.validate()?;
            return Ok(config);
        }

        let content = std::fs::read_to_string(path).map_err(|e| IndexingError::Config {
            message: format!("Failed to read config file {:?}: {}", path, e),
        })?;

        let mut config: Config = toml::from_str(&content).map_err(|e| IndexingError::Config {
            message: format!("Failed to parse config file {:?}: {}", path, e),
        })?;

        config.apply_env_overrides();
        config.validate()?;

        Ok(config)
    }

    /// Apply environment variable overrides
    fn apply_env_overrides(&mut self) {
        if let Ok(dir) = std::env::var("FT_INDEXER_DATA_DIR") {
            self.store.data_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("FT_INDEXER_INDEX_DIR") {
            self.index.index_dir = PathBuf::from(dir);
        }
        if let Ok(dir) = std::env::var("FT_INDEXER_CACHE_DIR") {
            self.cache.study_cache_dir = Some(PathBuf::from(dir));
        }
        if let Ok(dir) = std::env::var("FT_INDEXER_PACKAGE_DIR") {
            self.packages.package_dir = Some(PathBuf::from(dir));
        }
        if let Ok(level) = std::env::var("FT_INDEXER_LOG_LEVEL") {
            self.logging.level = level;
        }
    }

    /// Validate configuration values
    fn validate(&self) -> Result<()> {
        if self.logging.level.parse::<tracing::Level>().is_err() {
            return Err(IndexingError::ValidationFailed {
                field: "logging.level".to_string(),
                reason: format!("invalid log level '{}'", self.logging.level),
            });
        }

        if self.store.data_dir.as_os_str().is_empty() {
            return Err(IndexingError::ValidationFailed {
                field: "store.data_dir".to_string(),
                reason: "data directory cannot be empty".to_string(),
            });
        }

        if self.index.index_dir.as_os_str().is_empty() {
            return Err(IndexingError::ValidationFailed {
                field: "index.index_dir".to_string(),
                reason: "index directory cannot be empty".to_string(),
            });
        }

        if let Some(dir) = &self.cache.study_cache_dir {
            if dir.as_os_str().is_empty() {
                return Err(IndexingError::ValidationFailed {
                    field: "cache.study_cache_dir".to_string(),
                    reason: "cache directory cannot be empty when set".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Get configuration as TOML string
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = self.to_toml()?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_roundtrips_through_toml() {
        let config = Config::default();
        let raw = config.to_toml().unwrap();
        let parsed: Config = toml::from_str(&raw).unwrap();
        assert_eq!(parsed.logging.level, "info");
        assert_eq!(parsed.store.data_dir, PathBuf::from("./data/collections"));
        assert!(parsed.cache.study_cache_dir.is_none());
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            "[cache]\nstudy_cache_dir = \"/var/cache/studies\"\n",
        )
        .unwrap();

        let config = Config::from_file(&path).unwrap();
        assert_eq!(
            config.cache.study_cache_dir,
            Some(PathBuf::from("/var/cache/studies"))
        );
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_invalid_log_level_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[logging]\nlevel = \"loud\"\n").unwrap();

        assert!(Config::from_file(&path).is_err());
    }
}
