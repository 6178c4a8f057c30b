//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::loader::{JsonShape, LoaderResult};
use crate::series::{default_criteria, Criteria};

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Series engine defaults
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Row cap applied to loaded series; 0 means uncapped
    #[serde(default)]
    pub max_size: usize,

    /// Column to aggregation function used when resampling
    #[serde(default = "default_criteria")]
    pub criteria: Criteria,

    #[serde(default)]
    pub check_non_critical: bool,

    /// Shape assumed for JSON input
    #[serde(default = "default_json_schema")]
    pub json_schema: String,
}

fn default_json_schema() -> String {
    "split".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_size: 0,
            criteria: default_criteria(),
            check_non_critical: false,
            json_schema: default_json_schema(),
        }
    }
}

impl EngineConfig {
    /// The configured JSON shape
    pub fn json_shape(&self) -> LoaderResult<JsonShape> {
        self.json_schema.parse()
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,

    pub file: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            file: None,
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("chronoframe").join("config.toml")),
            Some(PathBuf::from("/etc/chronoframe/config.toml")),
            Some(PathBuf::from("./config.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Apply overrides from a variable lookup
    fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(max_size) = lookup("CHRONOFRAME_MAX_SIZE") {
            match max_size.parse() {
                Ok(n) => self.engine.max_size = n,
                Err(_) => tracing::warn!(value = %max_size, "ignoring invalid CHRONOFRAME_MAX_SIZE"),
            }
        }
        if let Some(schema) = lookup("CHRONOFRAME_JSON_SCHEMA") {
            self.engine.json_schema = schema;
        }

        if let Some(level) = lookup("CHRONOFRAME_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Some(format) = lookup("CHRONOFRAME_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Chronoframe Configuration
#
# Environment variables override these settings:
# - CHRONOFRAME_MAX_SIZE
# - CHRONOFRAME_JSON_SCHEMA
# - CHRONOFRAME_LOG_LEVEL
# - CHRONOFRAME_LOG_FORMAT

[engine]
# Keep at most this many rows after appends (0 = uncapped)
max_size = 0

# Report unsorted or duplicate timestamps and all-zero rows/columns
check_non_critical = false

# JSON input shape: split, split0, split1, yahoo, generic
json_schema = "split"

# Aggregation used per column when resampling
# (first, last, sum, min, max, mean, sd)
[engine.criteria]
open = "first"
high = "max"
low = "min"
close = "last"
volume = "sum"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"

# Optional log file path
# file = "/var/log/chronoframe/chronoframe.log"
"#
    .to_string()
}
