use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use reqwest::{Client, Url};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::cache::FetchCache;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL scheme: {0}")]
    InvalidUrl(String),
    #[error("error fetching {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Accepts only absolute `http` and `https` URLs.
pub fn validate_url(url: &str) -> bool {
    if url.is_empty() {
        return false;
    }
    match Url::parse(url) {
        Ok(parsed) => matches!(parsed.scheme(), "http" | "https"),
        Err(_) => false,
    }
}

pub struct Fetcher {
    client: Client,
    cache: Arc<dyn FetchCache>,
}

impl Fetcher {
    pub fn new(
        cache: Arc<dyn FetchCache>,
        user_agent: &str,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()?;

        Ok(Self { client, cache })
    }

    /// Returns the body at `url`, from the cache while it is fresh.
    ///
    /// Failures are logged here and never cached, so the next call retries.
    pub async fn fetch(&self, url: &str) -> Result<Bytes, FetchError> {
        if !validate_url(url) {
            warn!("Invalid URL scheme: {}", url);
            return Err(FetchError::InvalidUrl(url.to_string()));
        }

        if let Some(body) = self.cache.get(url).await {
            return Ok(body);
        }

        debug!("Fetching {}", url);
        match self.request(url).await {
            Ok(body) => {
                info!("Fetched {} ({} bytes)", url, body.len());
                self.cache.put(url, body.clone()).await;
                Ok(body)
            }
            Err(source) => {
                warn!("Error fetching {}: {}", url, source);
                Err(FetchError::Request {
                    url: url.to_string(),
                    source,
                })
            }
        }
    }

    async fn request(&self, url: &str) -> Result<Bytes, reqwest::Error> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        response.bytes().await
    }
}
