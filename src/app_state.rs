//! Application state for the Actix-web server
//!
//! `AppState` is built once at startup, wrapped in `web::Data` and shared by
//! every handler. Apart from the metrics counters nothing in it changes after
//! startup.

use std::path::Path;

use crate::config::Config;
use crate::error::ProxyError;
use crate::http_client::{HttpClientConfig, KanaClient};
use crate::legacy::LegacyClient;
use crate::metrics::MetricsTracker;
use crate::tags::TagStore;

pub struct AppState {
    /// Client for the kana JSON API
    pub kana: KanaClient,
    /// Client for the legacy TCP API
    pub legacy: LegacyClient,
    /// Tag dataset, read-only
    pub tags: TagStore,
    /// Upstream call statistics
    pub metrics: MetricsTracker,
    /// Application configuration
    pub config: Config,
}

impl AppState {
    /// Build state from configuration, loading the tag dataset from disk.
    pub fn from_config(config: Config) -> Result<Self, ProxyError> {
        let tags = TagStore::load(Path::new(&config.data.tags_path))?;
        Self::with_tags(config, tags)
    }

    pub fn with_tags(config: Config, tags: TagStore) -> Result<Self, ProxyError> {
        let kana = KanaClient::with_config(HttpClientConfig::from(&config.upstream))?;
        let legacy = LegacyClient::new(&config.upstream);
        Ok(Self {
            kana,
            legacy,
            tags,
            metrics: MetricsTracker::new(),
            config,
        })
    }

    pub fn placeholder_image(&self) -> &str {
        &self.config.data.placeholder_image
    }
}
