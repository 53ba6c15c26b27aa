// src/config.rs

//! Configuration for the dataset-preparation pipeline.
//!
//! Configuration is parsed from TOML, optionally overridden from `VXS_`
//! environment variables, and validated before use.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::error::{PipelineError, Result};

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub cache: CacheConfig,
    pub dataset: DatasetConfig,
    pub storage: StorageConfig,
}

/// Repeat-cache configuration.
///
/// These settings are immutable per cache instance: `prefix` namespaces slot
/// files so that caches for different transforms can share a directory,
/// `repeat` is the number of independently stored variants per item, and
/// `pick_randomly` selects between randomized and exhaustive serving.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    // Namespacing string prepended to every slot file name.
    pub prefix: String,
    // Number of slots per item. Must be at least 1.
    pub repeat: usize,
    // true: serve one random pre-rendered variant (training).
    // false: materialize and return all variants in index order (evaluation).
    pub pick_randomly: bool,
}

/// Which split of the corpus tree to enumerate.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Split {
    #[default]
    Train,
    Test,
}

impl Split {
    /// The path segment this split occupies in the corpus layout.
    pub fn dir_name(self) -> &'static str {
        match self {
            Split::Train => "train",
            Split::Test => "test",
        }
    }
}

/// Dataset enumeration options.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatasetConfig {
    // Root of the <label>/<split>/<item>.obj corpus tree.
    pub root: PathBuf,
    pub split: Split,
}

/// Local storage tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    // Whether to memory-map slot files when reading.
    pub use_mmap: bool,
    // File size threshold (bytes) above which to use mmap.
    pub mmap_threshold: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            prefix: "v64_".to_string(),
            repeat: 1,
            pick_randomly: true,
        }
    }
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./modelnet10"),
            split: Split::Train,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            use_mmap: true,
            mmap_threshold: 1024 * 1024, // 1 MB
        }
    }
}

impl FromStr for PipelineConfig {
    type Err = PipelineError;

    /// Parse configuration from a TOML string.
    fn from_str(s: &str) -> Result<Self> {
        toml::from_str(s)
            .map_err(|e| PipelineError::config_with_source("failed to parse TOML config", e))
    }
}

impl PipelineConfig {
    /// Load configuration from a TOML file and validate it.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            PipelineError::storage_with_source(path, "failed to read config file", e)
        })?;
        let config: Self = content.parse()?;
        config.validate()?;
        Ok(config)
    }

    // Apply environment variable overrides.
    //
    // Variables are prefixed with `VXS_`:
    // - `VXS_CACHE_PREFIX` overrides `cache.prefix`
    // - `VXS_CACHE_REPEAT` overrides `cache.repeat`
    // - `VXS_CACHE_PICK_RANDOMLY` overrides `cache.pick_randomly`
    // - `VXS_DATASET_ROOT` overrides `dataset.root`
    // - `VXS_DATASET_SPLIT` overrides `dataset.split` ("train" or "test")
    // - `VXS_STORAGE_USE_MMAP` overrides `storage.use_mmap`
    // - `VXS_STORAGE_MMAP_THRESHOLD` overrides `storage.mmap_threshold`
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(val) = std::env::var("VXS_CACHE_PREFIX") {
            self.cache.prefix = val;
        }
        if let Ok(val) = std::env::var("VXS_CACHE_REPEAT") {
            if let Ok(v) = val.parse() {
                self.cache.repeat = v;
            }
        }
        if let Ok(val) = std::env::var("VXS_CACHE_PICK_RANDOMLY") {
            if let Ok(v) = val.parse() {
                self.cache.pick_randomly = v;
            }
        }
        if let Ok(val) = std::env::var("VXS_DATASET_ROOT") {
            self.dataset.root = PathBuf::from(val);
        }
        if let Ok(val) = std::env::var("VXS_DATASET_SPLIT") {
            match val.to_lowercase().as_str() {
                "train" => self.dataset.split = Split::Train,
                "test" => self.dataset.split = Split::Test,
                _ => {} // ignore invalid values
            }
        }
        if let Ok(val) = std::env::var("VXS_STORAGE_USE_MMAP") {
            if let Ok(v) = val.parse() {
                self.storage.use_mmap = v;
            }
        }
        if let Ok(val) = std::env::var("VXS_STORAGE_MMAP_THRESHOLD") {
            if let Ok(v) = val.parse() {
                self.storage.mmap_threshold = v;
            }
        }
        self
    }

    /// Validate all configuration values.
    pub fn validate(&self) -> Result<()> {
        self.cache.validate()
    }
}

impl CacheConfig {
    pub fn validate(&self) -> Result<()> {
        if self.repeat == 0 {
            return Err(PipelineError::config("cache.repeat must be at least 1"));
        }
        if self.prefix.is_empty() {
            return Err(PipelineError::config("cache.prefix must not be empty"));
        }
        if self.prefix.contains(std::path::MAIN_SEPARATOR) {
            return Err(PipelineError::config(
                "cache.prefix must not contain path separators",
            ));
        }
        Ok(())
    }
}
