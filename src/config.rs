//! Configuration loading and management.
//!
//! Configuration is loaded with the following precedence:
//! 1. Environment variables (`PICOCO_*`)
//! 2. Config file (`~/.picoco/config.toml`)
//! 3. Defaults

use crate::error::{Error, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration struct.
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,

    /// Session relay configuration.
    pub relay: RelayConfig,

    /// Image resolver configuration.
    pub resolver: ResolverConfig,

    /// AI analysis configuration.
    pub analysis: AnalysisConfig,

    /// Session API server configuration.
    pub server: ServerConfig,
}

/// Storage configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the durable key-value files.
    pub path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: default_picoco_home(),
        }
    }
}

/// Session relay configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RelayConfig {
    /// Lifetime of a relay entry in seconds. Not renewed on access.
    pub ttl_seconds: u64,

    /// Maximum number of live entries.
    pub max_entries: usize,

    /// Maximum payload length in bytes.
    pub max_payload_bytes: usize,

    /// Delete an entry on its first successful read.
    pub consume_on_read: bool,
}

impl RelayConfig {
    /// TTL as a `Duration`.
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: 5 * 60,
            max_entries: 512,
            max_payload_bytes: 20 * 1024 * 1024,
            consume_on_read: false,
        }
    }
}

/// Image resolver configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Session payloads below this size are copied into the volatile cache.
    pub cache_threshold_bytes: usize,

    /// Base URL of the session API.
    pub api_base_url: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            cache_threshold_bytes: 5 * 1024 * 1024,
            api_base_url: "http://localhost:3000".to_string(),
        }
    }
}

/// AI analysis configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Full URL of the analysis endpoint.
    pub endpoint: String,

    /// Multipart field carrying the image.
    pub field_name: String,

    /// File name reported for the uploaded image.
    pub file_name: String,

    /// Request timeout in seconds. Unset means no timeout.
    pub timeout_seconds: Option<u64>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://api.picoco.app/ai/analyze-image".to_string(),
            field_name: "image".to_string(),
            file_name: "analyze-image.jpg".to_string(),
            timeout_seconds: None,
        }
    }
}

/// Session API server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the server listens on.
    pub bind: String,

    /// Seconds between background purges of expired sessions.
    pub sweep_interval_seconds: u64,
}

impl ServerConfig {
    /// Sweep interval as a `Duration`.
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_seconds.max(1))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            sweep_interval_seconds: 60,
        }
    }
}

/// Get the default picoco home directory.
fn default_picoco_home() -> PathBuf {
    dirs::home_dir().map_or_else(|| PathBuf::from(".picoco"), |h| h.join(".picoco"))
}

/// Load configuration with precedence: env vars → file → defaults.
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed.
pub fn load_config() -> Result<Config> {
    let mut config = Config::default();

    let config_path = get_config_path();
    if config_path.exists() {
        let contents = fs::read_to_string(&config_path).map_err(Error::Storage)?;
        config = parse_config(&contents)?;
    }

    apply_env_overrides(&mut config, |key| env::var(key).ok());

    Ok(config)
}

/// Parse a TOML config document.
///
/// # Errors
///
/// Returns an error if the document is not valid TOML for [`Config`].
pub fn parse_config(contents: &str) -> Result<Config> {
    toml::from_str(contents).map_err(|e| Error::Config(e.to_string()))
}

/// Get the path to the config file.
fn get_config_path() -> PathBuf {
    if let Ok(path) = env::var("PICOCO_CONFIG") {
        return PathBuf::from(path);
    }

    if let Ok(home) = env::var("PICOCO_HOME") {
        return PathBuf::from(home).join("config.toml");
    }

    default_picoco_home().join("config.toml")
}

/// Apply environment overrides, reading variables through `lookup`.
fn apply_env_overrides(config: &mut Config, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(path) = lookup("PICOCO_STORAGE_PATH") {
        config.storage.path = PathBuf::from(path);
    } else if let Some(home) = lookup("PICOCO_HOME") {
        config.storage.path = PathBuf::from(home);
    }

    if let Some(url) = lookup("PICOCO_API_URL") {
        config.resolver.api_base_url = url;
    }

    if let Some(url) = lookup("PICOCO_ANALYZE_URL") {
        config.analysis.endpoint = url;
    }

    if let Some(val) = lookup("PICOCO_SESSION_TTL") {
        if let Ok(secs) = val.parse() {
            config.relay.ttl_seconds = secs;
        }
    }

    if let Some(val) = lookup("PICOCO_MAX_SESSIONS") {
        if let Ok(max) = val.parse() {
            config.relay.max_entries = max;
        }
    }

    if let Some(addr) = lookup("PICOCO_BIND") {
        config.server.bind = addr;
    }
}
