use async_trait::async_trait;
use once_cell::sync::Lazy;
use serde_json::Value;

use crate::{core::constants::CONFIG_PATH, traits::ConfigSource, ReplacerError, Result};

/// Shared HTTP client so every resolver reuses one connection pool.
pub(crate) static HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

/// Loads the configuration document over HTTP with `reqwest`.
pub struct HttpConfigSource {
    client: reqwest::Client,
    url: reqwest::Url,
}

impl HttpConfigSource {
    pub fn new(url: reqwest::Url) -> Self {
        Self { client: HTTP_CLIENT.clone(), url }
    }

    /// Source for the well-known config path on the page's origin.
    pub fn for_origin(origin: &str) -> Result<Self> {
        let base = reqwest::Url::parse(origin)
            .map_err(|e| ReplacerError::InvalidUrl(format!("{}: {}", origin, e)))?;
        let url = base
            .join(CONFIG_PATH)
            .map_err(|e| ReplacerError::InvalidUrl(format!("{}: {}", origin, e)))?;
        Ok(Self::new(url))
    }

    pub fn url(&self) -> &reqwest::Url {
        &self.url
    }
}

#[async_trait(?Send)]
impl ConfigSource for HttpConfigSource {
    async fn fetch(&self) -> Result<Value> {
        let resp = self.client.get(self.url.clone()).send().await?;
        if !resp.status().is_success() {
            return Err(ReplacerError::HttpStatus(resp.status().as_u16()));
        }
        let bytes = resp.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn describe(&self) -> String {
        self.url.to_string()
    }
}

/// A source that always yields the same document, for embedded hosts that
/// already hold their configuration.
#[derive(Debug, Clone)]
pub struct StaticConfigSource {
    document: Value,
}

impl StaticConfigSource {
    pub fn new(document: Value) -> Self {
        Self { document }
    }
}

#[async_trait(?Send)]
impl ConfigSource for StaticConfigSource {
    async fn fetch(&self) -> Result<Value> {
        Ok(self.document.clone())
    }

    fn describe(&self) -> String {
        "static config".to_string()
    }
}
