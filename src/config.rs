//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub discovery: DiscoveryConfig,

    #[serde(default)]
    pub telemetry: TelemetryConfig,

    #[serde(default)]
    pub identity: IdentityConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Discovery configuration
#[derive(Debug, Clone, Deserialize)]
pub struct DiscoveryConfig {
    /// Fixed location of the genesis manifest
    #[serde(default = "default_manifest_url")]
    pub manifest_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_manifest_url() -> String {
    "https://raw.githubusercontent.com/razzaqinspires/AION/main/aion_genesis.json".to_string()
}

fn default_request_timeout() -> u64 {
    5000
}

impl Default for DiscoveryConfig {
    fn default() -> Self {
        Self {
            manifest_url: default_manifest_url(),
            request_timeout_ms: default_request_timeout(),
        }
    }
}

/// Telemetry polling configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    /// Status poll cadence while a dashboard is open (ms)
    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval() -> u64 {
    1000
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: default_poll_interval(),
        }
    }
}

/// Identity store configuration
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityConfig {
    /// Directory the profile blob lives in
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

fn default_data_dir() -> String {
    crate::identity::FileStore::default_dir()
        .to_string_lossy()
        .to_string()
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
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
            dirs::config_dir().map(|p| p.join("aion-link").join("config.toml")),
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

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("AION_MANIFEST_URL") {
            self.discovery.manifest_url = url;
        }
        if let Ok(timeout) = std::env::var("AION_REQUEST_TIMEOUT_MS") {
            if let Ok(t) = timeout.parse() {
                self.discovery.request_timeout_ms = t;
            }
        }

        if let Ok(interval) = std::env::var("AION_POLL_INTERVAL_MS") {
            if let Ok(i) = interval.parse() {
                self.telemetry.poll_interval_ms = i;
            }
        }

        if let Ok(data_dir) = std::env::var("AION_DATA_DIR") {
            self.identity.data_dir = data_dir;
        }

        if let Ok(level) = std::env::var("AION_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("AION_LOG_FORMAT") {
            self.logging.format = format;
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            discovery: DiscoveryConfig::default(),
            telemetry: TelemetryConfig::default(),
            identity: IdentityConfig::default(),
            logging: LoggingConfig::default(),
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
    r#"# AION Link Configuration
#
# Environment variables override these settings:
# - AION_MANIFEST_URL
# - AION_REQUEST_TIMEOUT_MS
# - AION_POLL_INTERVAL_MS
# - AION_DATA_DIR
# - AION_LOG_LEVEL
# - AION_LOG_FORMAT

[discovery]
# Fixed location of the genesis manifest
manifest_url = "https://raw.githubusercontent.com/razzaqinspires/AION/main/aion_genesis.json"

# Per-request timeout (ms)
request_timeout_ms = 5000

[telemetry]
# Status poll cadence while a dashboard is open (ms)
poll_interval_ms = 1000

[identity]
# Directory the operator profile lives in
# data_dir = "~/.local/share/aion-link"

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
