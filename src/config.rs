use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::ProxyError;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub data: DataConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    /// Interface to bind
    #[serde(default = "default_host")]
    pub host: String,

    /// First port tried at startup
    #[serde(default = "default_port")]
    pub port: u16,

    /// Number of consecutive ports tried before giving up
    #[serde(default = "default_port_attempts")]
    pub port_attempts: u16,
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    /// Base URL of the JSON API (`/vn` and `/stats` are appended)
    #[serde(default = "default_kana_url")]
    pub kana_url: String,

    /// Host of the legacy TCP API
    #[serde(default = "default_legacy_host")]
    pub legacy_host: String,

    /// Port of the legacy TCP API (plain text)
    #[serde(default = "default_legacy_port")]
    pub legacy_port: u16,

    /// Timeout for a whole upstream request in seconds
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Timeout for connecting and logging in to the legacy API in milliseconds
    #[serde(default = "default_acquire_timeout")]
    pub acquire_timeout_ms: u64,

    /// Client name sent with the legacy login
    #[serde(default = "default_client_name")]
    pub client_name: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DataConfig {
    /// JSON file holding the tag dataset
    #[serde(default = "default_tags_path")]
    pub tags_path: String,

    /// Image path returned for VNs without a cover
    #[serde(default = "default_placeholder_image")]
    pub placeholder_image: String,
}

fn default_host() -> String { "127.0.0.1".to_string() }
fn default_port() -> u16 { 8080 }
fn default_port_attempts() -> u16 { 11 }
fn default_kana_url() -> String { "https://api.vndb.org/kana".to_string() }
fn default_legacy_host() -> String { "api.vndb.org".to_string() }
fn default_legacy_port() -> u16 { 19534 }
fn default_timeout() -> u64 { 30 }
fn default_acquire_timeout() -> u64 { 1000 }
fn default_client_name() -> String { "vndb-proxy".to_string() }
fn default_tags_path() -> String { "data/tags.json".to_string() }
fn default_placeholder_image() -> String { "/nsfw-warning.webp".to_string() }

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            port_attempts: default_port_attempts(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            kana_url: default_kana_url(),
            legacy_host: default_legacy_host(),
            legacy_port: default_legacy_port(),
            timeout_secs: default_timeout(),
            acquire_timeout_ms: default_acquire_timeout(),
            client_name: default_client_name(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            tags_path: default_tags_path(),
            placeholder_image: default_placeholder_image(),
        }
    }
}

impl Config {
    /// Load `config.toml` from the working directory, falling back to defaults.
    pub fn load() -> Self {
        let path = Path::new("config.toml");
        if !path.exists() {
            return Self::default();
        }
        match Self::from_path(path) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("Ignoring config.toml: {}", e);
                Self::default()
            }
        }
    }

    pub fn from_path(path: &Path) -> Result<Self, ProxyError> {
        let content = fs::read_to_string(path)?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, ProxyError> {
        toml::from_str::<Config>(content).map_err(|e| ProxyError::Config(e.to_string()))
    }
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_ms)
    }

    pub fn legacy_addr(&self) -> String {
        format!("{}:{}", self.legacy_host, self.legacy_port)
    }
}
