//! Paced HTTP client.
//!
//! Thin wrapper around `reqwest` that applies a fixed politeness delay
//! after every request. All network degradation policy (treating failures
//! as "no data") lives in the callers; this layer only fetches and paces.

use std::time::Duration;

use reqwest::{Client, Response};

use crate::config::CrawlConfig;

/// HTTP client with per-request timeout and a fixed inter-request delay.
#[derive(Clone)]
pub struct HttpClient {
    client: Client,
    request_delay: Duration,
}

impl HttpClient {
    /// Build a client from crawl settings. The delay defaults to the page
    /// fetch delay; use [`HttpClient::with_request_delay`] for other stages.
    pub fn new(config: &CrawlConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(&config.user_agent)
            .timeout(Duration::from_secs(config.timeout_secs))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Self {
            client,
            request_delay: Duration::from_millis(config.page_delay_ms),
        })
    }

    /// Clone of this client with a different politeness delay. The
    /// underlying connection pool is shared.
    pub fn with_request_delay(&self, delay: Duration) -> Self {
        Self {
            client: self.client.clone(),
            request_delay: delay,
        }
    }

    /// GET with redirect following. Paces after the response arrives.
    pub async fn get(&self, url: &str) -> Result<Response, reqwest::Error> {
        let result = self.client.get(url).send().await;
        self.pace().await;
        result
    }

    /// GET returning the body as text, `None` on any failure.
    pub async fn get_text(&self, url: &str) -> Option<String> {
        let response = self.get(url).await.ok()?;
        if !response.status().is_success() {
            return None;
        }
        response.text().await.ok()
    }

    /// HEAD request. Paces after the response arrives.
    pub async fn head(&self, url: &str) -> Result<Response, reqwest::Error> {
        let result = self.client.head(url).send().await;
        self.pace().await;
        result
    }

    async fn pace(&self) {
        if !self.request_delay.is_zero() {
            tokio::time::sleep(self.request_delay).await;
        }
    }
}
