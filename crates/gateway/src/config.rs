//! Configuration management for the Treegate gateway.
//!
//! This module provides TOML-based configuration file loading and saving.
//! The default configuration path is `~/.config/treegate/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("log_level must be one of: trace, debug, info, warn, error; got {0}")]
    InvalidLogLevel(String),

    #[error("cache_ttl_secs must be between 1 and 3600 seconds, got {0}")]
    InvalidCacheTtl(u64),

    #[error("max_files must be greater than 0, got {0}")]
    InvalidMaxFiles(usize),

    #[error("max_depth must be between 1 and 256, got {0}")]
    InvalidMaxDepth(usize),

    #[error("workers must be between 1 and 64, got {0}")]
    InvalidWorkers(usize),

    #[error("max_results must be greater than 0, got {0}")]
    InvalidMaxResults(usize),

    #[error("extensions are written without a dot or slash, got {0:?}")]
    InvalidExtension(String),
}

/// Valid log level values for tracing configuration.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Main configuration structure for the gateway.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// Sandbox root and logging.
    pub gateway: GatewayConfig,

    /// Visibility, binary classification and protection rules.
    pub filter: FilterConfig,

    /// Recursive index limits.
    pub index: IndexConfig,

    /// Search and replace limits.
    pub search: SearchConfig,
}

/// General gateway configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    /// Directory that every request is confined to.
    pub root: PathBuf,

    /// Logging level (trace, debug, info, warn, error).
    pub log_level: String,
}

/// Allow-list and protection rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct FilterConfig {
    /// Extensions (without the dot) of files that may be listed and edited.
    pub allowed_extensions: Vec<String>,

    /// Extensions whose content is transferred as base64.
    pub binary_extensions: Vec<String>,

    /// Bare filenames that are visible regardless of extension.
    pub allowed_filenames: Vec<String>,

    /// Directory names that are never descended into.
    pub excluded_dirs: Vec<String>,

    /// Paths (first segment or whole path) that cannot be deleted or renamed.
    pub protected_paths: Vec<String>,

    /// Directories whose whole subtree is visible.
    pub always_visible_dirs: Vec<String>,
}

/// Limits for the recursive tree index.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct IndexConfig {
    /// Seconds a cached scan stays fresh.
    pub cache_ttl_secs: u64,

    /// Maximum number of files scanned by one walk.
    pub max_files: usize,

    /// Maximum directory depth below the root.
    pub max_depth: usize,
}

/// Limits for search and replace.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SearchConfig {
    /// Size of the per-call worker pool.
    pub workers: usize,

    /// Global cap on returned matches.
    pub max_results: usize,

    /// Cap on matches collected from a single file.
    pub max_matches_per_file: usize,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            log_level: "info".to_string(),
        }
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            allowed_extensions: strings(&[
                "yaml", "yml", "json", "py", "js", "css", "html", "txt", "csv", "md", "conf",
                "cfg", "ini", "sh", "log", "gitignore", "jinja", "jinja2", "j2", "db", "sqlite",
                "pem", "crt", "key", "der", "bin", "ota", "cpp", "h", "tar", "gz", "lock", "jpg",
                "jpeg", "png", "gif", "bmp", "svg", "webp", "ico", "pdf", "zip", "mp4", "webm",
                "mov", "avi", "mkv", "flv", "wmv", "m4v",
            ]),
            binary_extensions: strings(&[
                "jpg", "jpeg", "png", "gif", "bmp", "webp", "ico", "pdf", "zip", "db", "sqlite",
                "der", "bin", "ota", "tar", "gz", "mp4", "webm", "mov", "avi", "mkv", "flv", "wmv",
                "m4v",
            ]),
            allowed_filenames: strings(&[".gitignore", ".ha_run.lock"]),
            excluded_dirs: strings(&[
                "__pycache__",
                ".git",
                ".cache",
                "deps",
                "tts",
                ".git_credential_helper",
                "node_modules",
                "target",
            ]),
            protected_paths: strings(&[
                "configuration.yaml",
                "secrets.yaml",
                "home-assistant.log",
                ".storage",
            ]),
            always_visible_dirs: strings(&[".storage"]),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            cache_ttl_secs: 30,
            max_files: 50_000,
            max_depth: 20,
        }
    }
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            workers: 10,
            max_results: 2000,
            max_matches_per_file: 100,
        }
    }
}

/// Returns the default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("treegate")
        .join("config.toml")
}

impl Config {
    /// Configuration rooted at `root` with every other value defaulted.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        let mut config = Self::default();
        config.gateway.root = root.into();
        config
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Environment variables take precedence over config file values.
    /// Supported variables:
    /// - TREEGATE_ROOT: Override the sandbox root
    /// - TREEGATE_LOG_LEVEL: Override log level (trace, debug, info, warn, error)
    pub fn apply_env_overrides(&mut self) {
        if let Ok(root) = std::env::var("TREEGATE_ROOT") {
            if !root.is_empty() {
                tracing::info!("Overriding root from environment: {}", root);
                self.gateway.root = PathBuf::from(root);
            }
        }

        if let Ok(level) = std::env::var("TREEGATE_LOG_LEVEL") {
            if !level.is_empty() {
                tracing::info!("Overriding log_level from environment: {}", level);
                self.gateway.log_level = level;
            }
        }
    }

    /// Validate the configuration values.
    ///
    /// Returns an error if any configuration value is outside the valid range.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let level = self.gateway.log_level.to_lowercase();
        if !VALID_LOG_LEVELS.contains(&level.as_str()) {
            return Err(ConfigError::InvalidLogLevel(self.gateway.log_level.clone()));
        }

        // cache_ttl_secs: 1-3600
        let ttl = self.index.cache_ttl_secs;
        if ttl == 0 || ttl > 3600 {
            return Err(ConfigError::InvalidCacheTtl(ttl));
        }

        if self.index.max_files == 0 {
            return Err(ConfigError::InvalidMaxFiles(self.index.max_files));
        }

        // max_depth: 1-256
        let depth = self.index.max_depth;
        if depth == 0 || depth > 256 {
            return Err(ConfigError::InvalidMaxDepth(depth));
        }

        // workers: 1-64
        let workers = self.search.workers;
        if workers == 0 || workers > 64 {
            return Err(ConfigError::InvalidWorkers(workers));
        }

        if self.search.max_results == 0 {
            return Err(ConfigError::InvalidMaxResults(self.search.max_results));
        }

        let extensions = self
            .filter
            .allowed_extensions
            .iter()
            .chain(self.filter.binary_extensions.iter());
        for ext in extensions {
            if ext.is_empty() || ext.contains('.') || ext.contains('/') {
                return Err(ConfigError::InvalidExtension(ext.clone()));
            }
        }

        Ok(())
    }

    /// Load configuration from a file.
    ///
    /// If the file does not exist, returns the default configuration.
    /// If the file exists but is invalid TOML, returns an error with
    /// a helpful message.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self> {
        Self::load(default_config_path())
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| anyhow::anyhow!("Invalid TOML configuration: {}", format_toml_error(&e)))
    }

    /// Save configuration to a file.
    ///
    /// Creates parent directories if they don't exist.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = self.to_toml()?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::debug!("Configuration saved to {:?}", path);
        Ok(())
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }
}

/// Format a TOML deserialization error for user-friendly display.
fn format_toml_error(error: &toml::de::Error) -> String {
    let mut msg = error.message().to_string();

    if let Some(span) = error.span() {
        msg.push_str(&format!(" (at position {}..{})", span.start, span.end));
    }

    msg
}
