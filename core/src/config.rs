//! Layered configuration.
//!
//! Precedence, lowest to highest:
//! 1. Defaults (from code)
//! 2. Config file (`statwatch.toml`)
//! 3. Environment variables (`STATWATCH_` prefix, `__` for nesting, e.g.
//!    `STATWATCH_API__KEY`, `STATWATCH_STORE__KEY_MODE=user_id`)

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::key::KeyMode;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    LoadError(String),

    #[error("Configuration file not found at path: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    #[error("Invalid configuration value: {0}")]
    ValidationError(String),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

impl From<config::ConfigError> for ConfigError {
    fn from(err: config::ConfigError) -> Self {
        ConfigError::LoadError(err.to_string())
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::ParseError(err.to_string())
    }
}

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub store: StoreConfig,
}

/// Remote API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL without trailing slash.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key sent as the `key` query parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Freshness window in seconds.
    #[serde(default = "default_freshness_secs")]
    pub freshness_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory holding one `<key>.json` per tracked player.
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Which identifier snapshots are keyed by.
    #[serde(default)]
    pub key_mode: KeyMode,
}

fn default_base_url() -> String {
    "https://api.torn.com".to_string()
}
fn default_timeout_secs() -> u64 {
    5
}
fn default_freshness_secs() -> u64 {
    60
}
fn default_data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("statwatch").join("snapshots"))
        .unwrap_or_else(|| PathBuf::from("snapshots"))
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            freshness_secs: default_freshness_secs(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            key_mode: KeyMode::default(),
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl CacheConfig {
    pub fn freshness(&self) -> Duration {
        Duration::from_secs(self.freshness_secs)
    }
}

impl AppConfig {
    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "api.base_url must not be empty".to_string(),
            ));
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::ValidationError(
                "api.timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.cache.freshness_secs == 0 {
            return Err(ConfigError::ValidationError(
                "cache.freshness_secs must be greater than zero".to_string(),
            ));
        }
        if self.api.key.as_deref().is_some_and(|k| k.trim().is_empty()) {
            return Err(ConfigError::ValidationError(
                "api.key must not be blank when set".to_string(),
            ));
        }
        Ok(())
    }
}

/// Configuration loader with layered merging support.
pub struct ConfigLoader {
    config_path: Option<PathBuf>,
    env_prefix: String,
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            config_path: None,
            env_prefix: "STATWATCH".to_string(),
        }
    }

    /// Set the configuration file path.
    pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.config_path = Some(path.as_ref().to_path_buf());
        self
    }

    /// Override the environment variable prefix.
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env_prefix = prefix.to_string();
        self
    }

    /// Load defaults, then the config file if set, then the environment.
    pub fn load(&self) -> Result<AppConfig> {
        let mut builder = Config::builder();

        let defaults_json = serde_json::to_string(&AppConfig::default())?;
        builder = builder.add_source(File::from_str(&defaults_json, config::FileFormat::Json));

        if let Some(ref path) = self.config_path {
            if path.exists() {
                builder = builder.add_source(File::from(path.as_ref()));
            } else {
                return Err(ConfigError::FileNotFound(path.clone()));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix(&self.env_prefix)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let app_config: AppConfig = builder.build()?.try_deserialize()?;
        app_config.validate()?;
        tracing::debug!(
            data_dir = %app_config.store.data_dir.display(),
            key_mode = %app_config.store.key_mode,
            "configuration loaded"
        );
        Ok(app_config)
    }

    /// Locate the default config file:
    /// 1. `./statwatch.toml`
    /// 2. `$XDG_CONFIG_HOME/statwatch/config.toml`
    /// 3. `~/.statwatch.toml`
    pub fn find_config_file() -> Option<PathBuf> {
        let cwd_config = PathBuf::from("./statwatch.toml");
        if cwd_config.exists() {
            return Some(cwd_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let xdg_config = config_dir.join("statwatch").join("config.toml");
            if xdg_config.exists() {
                return Some(xdg_config);
            }
        }

        if let Some(home_dir) = dirs::home_dir() {
            let home_config = home_dir.join(".statwatch.toml");
            if home_config.exists() {
                return Some(home_config);
            }
        }

        None
    }

    /// Load configuration from the default locations.
    pub fn load_default() -> Result<AppConfig> {
        match Self::find_config_file() {
            Some(path) => ConfigLoader::new().with_file(path).load(),
            None => ConfigLoader::new().load(),
        }
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
