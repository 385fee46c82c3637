use reqwest::{Client, ClientBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

use crate::config::UpstreamConfig;
use crate::error::ProxyError;
use crate::models::{KanaResponse, VnRecord};
use crate::query::KanaQuery;

/// Configuration for the kana HTTP client
#[derive(Clone)]
pub struct HttpClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self::from(&UpstreamConfig::default())
    }
}

impl From<&UpstreamConfig> for HttpClientConfig {
    fn from(cfg: &UpstreamConfig) -> Self {
        Self {
            base_url: cfg.kana_url.trim_end_matches('/').to_string(),
            timeout: cfg.timeout(),
            user_agent: format!("{}/{}", cfg.client_name, env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Client for the kana JSON API. Failed calls are returned as-is, never retried.
pub struct KanaClient {
    client: Client,
    config: HttpClientConfig,
}

impl KanaClient {
    pub fn new() -> Result<Self, reqwest::Error> {
        Self::with_config(HttpClientConfig::default())
    }

    pub fn with_config(config: HttpClientConfig) -> Result<Self, reqwest::Error> {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("application/json"),
        );

        let client = ClientBuilder::new()
            .timeout(config.timeout)
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .pool_idle_timeout(Some(Duration::from_secs(90)))
            .build()?;

        Ok(Self { client, config })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.config.base_url, path)
    }

    /// `POST /vn` with the given query.
    pub async fn query_vn(&self, query: &KanaQuery) -> Result<KanaResponse<VnRecord>, ProxyError> {
        let url = self.url("vn");
        log::debug!("POST {} {}", url, serde_json::to_string(query)?);
        let response = self.client.post(&url).json(query).send().await?;
        Self::decode(response).await
    }

    /// `GET /stats`, returned untouched.
    pub async fn stats(&self) -> Result<Value, ProxyError> {
        let url = self.url("stats");
        log::debug!("GET {}", url);
        let response = self.client.get(&url).send().await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ProxyError> {
        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));
            return Err(ProxyError::Upstream {
                status: status.as_u16(),
                body,
            });
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_client_creation() {
        let client = KanaClient::new();
        assert!(client.is_ok());
    }

    #[test]
    fn test_config_from_upstream() {
        let upstream = UpstreamConfig {
            kana_url: "http://localhost:9000/kana/".to_string(),
            timeout_secs: 3,
            ..UpstreamConfig::default()
        };
        let cfg = HttpClientConfig::from(&upstream);
        assert_eq!(cfg.base_url, "http://localhost:9000/kana");
        assert_eq!(cfg.timeout, Duration::from_secs(3));
        assert!(cfg.user_agent.starts_with("vndb-proxy/"));

        let client = KanaClient::with_config(cfg).unwrap();
        assert_eq!(client.url("vn"), "http://localhost:9000/kana/vn");
    }
}
