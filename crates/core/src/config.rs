//! Configuration management for mdatlas.
//!
//! This module handles loading and merging configuration from multiple sources:
//! - Environment variables
//! - Command-line flags
//! - Config files (`.mdatlas/config.yaml` under the base directory)
//!
//! Cache and access-control settings are explicit structs handed to the
//! components that use them, so independently configured instances can coexist.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{AppError, AppResult};

const DEFAULT_MAX_ENTRIES: usize = 100;
const DEFAULT_TTL_SECS: u64 = 30 * 60;
const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 5 * 60;
const DEFAULT_MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Main application configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Root directory every served document must live under
    pub base_dir: PathBuf,

    /// Optional config file path
    pub config_file: Option<PathBuf>,

    /// Log level override
    pub log_level: Option<String>,

    /// Verbose mode (enables debug logging)
    pub verbose: bool,

    /// Disable colored output
    pub no_color: bool,

    /// Structure cache settings
    pub cache: CacheConfig,

    /// File access restrictions
    pub access: AccessConfig,
}

/// Settings for the document structure cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheConfig {
    /// Maximum number of cached documents before LRU eviction kicks in
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,

    /// Seconds since last access after which an entry expires
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,

    /// Seconds between background expiry sweeps
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

fn default_max_entries() -> usize {
    DEFAULT_MAX_ENTRIES
}

fn default_ttl_secs() -> u64 {
    DEFAULT_TTL_SECS
}

fn default_sweep_interval_secs() -> u64 {
    DEFAULT_SWEEP_INTERVAL_SECS
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            max_entries: default_max_entries(),
            ttl_secs: default_ttl_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl CacheConfig {
    /// Replace zero values with the defaults.
    pub fn normalized(mut self) -> Self {
        if self.max_entries == 0 {
            self.max_entries = DEFAULT_MAX_ENTRIES;
        }
        if self.ttl_secs == 0 {
            self.ttl_secs = DEFAULT_TTL_SECS;
        }
        if self.sweep_interval_secs == 0 {
            self.sweep_interval_secs = DEFAULT_SWEEP_INTERVAL_SECS;
        }
        self
    }

    /// Entry time-to-live.
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Interval between background expiry sweeps.
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// File access restrictions applied before any document is read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessConfig {
    /// Permitted file extensions, including the leading dot (".md")
    #[serde(default = "default_allowed_extensions")]
    pub allowed_extensions: Vec<String>,

    /// Largest file, in bytes, that may be served
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

fn default_allowed_extensions() -> Vec<String> {
    vec![".md".to_string(), ".markdown".to_string(), ".txt".to_string()]
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

impl Default for AccessConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: default_allowed_extensions(),
            max_file_size: default_max_file_size(),
        }
    }
}

/// Full configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ConfigFile {
    cache: Option<CacheConfig>,
    access: Option<AccessConfig>,
    logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct LoggingConfig {
    level: Option<String>,
    color: Option<bool>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            base_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            config_file: None,
            log_level: None,
            verbose: false,
            no_color: false,
            cache: CacheConfig::default(),
            access: AccessConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables, config file and defaults.
    ///
    /// Environment variables:
    /// - `MDATLAS_BASE_DIR`: Override base directory
    /// - `MDATLAS_CONFIG`: Path to config file
    /// - `RUST_LOG`: Log level
    /// - `NO_COLOR`: Disable colored output
    ///
    /// # Example
    /// ```no_run
    /// use mdatlas_core::config::AppConfig;
    ///
    /// let config = AppConfig::load().expect("Failed to load config");
    /// println!("Base directory: {:?}", config.base_dir);
    /// ```
    pub fn load() -> AppResult<Self> {
        let base_dir = std::env::var("MDATLAS_BASE_DIR").ok().map(PathBuf::from);
        let config_file = std::env::var("MDATLAS_CONFIG").ok().map(PathBuf::from);
        Self::load_from(base_dir, config_file)
    }

    /// Load configuration for an explicit base directory and config file.
    ///
    /// The config file defaults to `<base_dir>/.mdatlas/config.yaml` and is
    /// optional in that case; an explicitly named file must exist.
    pub fn load_from(base_dir: Option<PathBuf>, config_file: Option<PathBuf>) -> AppResult<Self> {
        let mut config = Self::default();

        if let Some(base_dir) = base_dir {
            config.base_dir = base_dir;
        }
        config.config_file = config_file;

        let config_path = config
            .config_file
            .clone()
            .unwrap_or_else(|| config.default_config_path());

        if config_path.exists() {
            config = config.merge_yaml(&config_path)?;
        } else if config.config_file.is_some() {
            return Err(AppError::Config(format!(
                "Config file does not exist: {:?}",
                config_path
            )));
        }

        // Environment variables override the config file
        if let Ok(level) = std::env::var("RUST_LOG") {
            config.log_level = Some(level);
        }

        if std::env::var("NO_COLOR").is_ok() {
            config.no_color = true;
        }

        Ok(config)
    }

    /// Merge a YAML configuration file into this config.
    pub fn merge_yaml(&self, path: &Path) -> AppResult<Self> {
        let contents = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("Failed to read config file {:?}: {}", path, e))
        })?;

        let config_file: ConfigFile = serde_yaml::from_str(&contents).map_err(|e| {
            AppError::Config(format!("Failed to parse config file {:?}: {}", path, e))
        })?;

        let mut result = self.clone();

        if let Some(cache) = config_file.cache {
            result.cache = cache;
        }

        if let Some(access) = config_file.access {
            result.access = access;
        }

        if let Some(logging) = config_file.logging {
            if let Some(level) = logging.level {
                result.log_level = Some(level);
            }
            if let Some(color) = logging.color {
                result.no_color = !color;
            }
        }

        tracing::debug!("Merged config file {:?}", path);
        Ok(result)
    }

    /// Apply CLI overrides to the configuration.
    ///
    /// Command-line flags take precedence over environment variables and
    /// the config file.
    pub fn with_overrides(mut self, log_level: Option<String>, verbose: bool, no_color: bool) -> Self {
        if let Some(log_level) = log_level {
            self.log_level = Some(log_level);
        }

        if verbose {
            self.verbose = true;
            // Verbose mode implies debug logging
            if self.log_level.is_none() {
                self.log_level = Some("debug".to_string());
            }
        }

        if no_color {
            self.no_color = true;
        }

        self
    }

    /// Default location of the config file for the current base directory.
    pub fn default_config_path(&self) -> PathBuf {
        self.base_dir.join(".mdatlas").join("config.yaml")
    }

    /// Validate the configuration.
    pub fn validate(&self) -> AppResult<()> {
        if !self.base_dir.is_dir() {
            return Err(AppError::Config(format!(
                "Base directory does not exist: {:?}",
                self.base_dir
            )));
        }

        if self.cache.max_entries == 0 {
            return Err(AppError::Config(
                "cache.maxEntries must be positive".to_string(),
            ));
        }

        if self.cache.ttl_secs == 0 || self.cache.sweep_interval_secs == 0 {
            return Err(AppError::Config(
                "cache.ttlSecs and cache.sweepIntervalSecs must be positive".to_string(),
            ));
        }

        if self.access.max_file_size == 0 {
            return Err(AppError::Config(
                "access.maxFileSize must be positive".to_string(),
            ));
        }

        if self.access.allowed_extensions.is_empty() {
            return Err(AppError::Config(
                "at least one allowed extension must be specified".to_string(),
            ));
        }

        Ok(())
    }
}
