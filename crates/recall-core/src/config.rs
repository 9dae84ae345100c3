//! Configuration management for recall
//!
//! Handles loading and validation of recall.toml configuration files.

use std::fmt;
use std::hash::Hash;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::concurrent_map::MAX_SHARDS;
use crate::error::ConfigError;
use crate::logging::LogConfig;
use crate::shared::SharedCache;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LogConfig,
}

/// Concurrency strategy of a [`SharedCache`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Single reader-writer lock around the whole cache
    #[default]
    Locked,
    /// Sharded key index plus a separately locked recency list
    Split,
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Locked => write!(f, "locked"),
            Self::Split => write!(f, "split"),
        }
    }
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "locked" => Ok(Self::Locked),
            "split" => Ok(Self::Split),
            _ => Err(format!(
                "unknown backend: {s}. Expected one of: locked, split"
            )),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-friendly output
    #[default]
    Pretty,
    /// JSON lines
    Json,
}

impl fmt::Display for LogFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pretty => write!(f, "pretty"),
            Self::Json => write!(f, "json"),
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            _ => Err(format!(
                "unknown log format: {s}. Expected one of: pretty, json"
            )),
        }
    }
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CacheConfig {
    /// Maximum number of resident entries
    #[serde(default = "default_capacity")]
    pub capacity: usize,

    /// Concurrency backend
    #[serde(default)]
    pub backend: Backend,

    /// Key index shards (split backend only)
    #[serde(default = "default_index_shards")]
    pub index_shards: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            backend: Backend::default(),
            index_shards: default_index_shards(),
        }
    }
}

fn default_capacity() -> usize {
    1024
}

fn default_index_shards() -> usize {
    crate::concurrent_map::DEFAULT_SHARDS
}

impl CacheConfig {
    /// Reject configurations that cannot build a cache.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.capacity == 0 {
            return Err(ConfigError::InvalidCapacity {
                capacity: self.capacity,
            });
        }
        if !(1..=MAX_SHARDS).contains(&self.index_shards) {
            return Err(ConfigError::ValidationError(format!(
                "cache.index_shards must be in 1..={MAX_SHARDS} (got {})",
                self.index_shards
            )));
        }
        Ok(())
    }

    /// Build a validated shared cache.
    pub fn build<K, V>(&self) -> Result<SharedCache<K, V>, ConfigError>
    where
        K: Hash + Eq + Clone,
    {
        self.validate()?;
        SharedCache::try_with_shards(self.backend, self.capacity, self.index_shards)
    }
}

impl Config {
    /// Parse and validate configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self =
            toml::from_str(text).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        let shown = path.display().to_string();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(shown).into());
        }
        let text = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::ReadFailed(shown.clone(), e.to_string()))?;
        let config = Self::from_toml_str(&text)?;
        tracing::debug!(
            path = %shown,
            capacity = config.cache.capacity,
            backend = %config.cache.backend,
            "loaded config"
        );
        Ok(config)
    }

    /// Validate every section
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.cache.validate()?;
        self.logging.validate()
    }
}
