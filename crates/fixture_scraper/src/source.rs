use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(8);

/// One upstream listing page and the delimiters its rows use between team names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceConfig {
    pub id: String,
    pub url: String,
    pub row_delimiters: Vec<String>,
}

impl SourceConfig {
    pub fn new(id: &str, url: impl Into<String>, row_delimiters: &[&str]) -> Self {
        Self {
            id: id.to_string(),
            url: url.into(),
            row_delimiters: row_delimiters.iter().map(|d| d.to_string()).collect(),
        }
    }
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("timeout after {}ms", .0.as_millis())]
    Timeout(Duration),
    #[error("HTTP {0}")]
    Status(StatusCode),
    #[error("network error: {0}")]
    Network(#[source] reqwest::Error),
    #[error("body read failed: {0}")]
    Body(#[source] reqwest::Error),
}

/// Anything that can hand back the raw text of a source page.
#[async_trait]
pub trait PageSource: Send + Sync {
    async fn fetch_page(&self, source: &SourceConfig) -> Result<String, FetchError>;
}

/// HTTP page source with a hard per-request deadline.
///
/// Dropping the returned future aborts the request, so a caller that stops
/// waiting (client disconnect, shutdown) cancels the fetch as well.
pub struct SourceFetcher {
    client: reqwest::Client,
    timeout: Duration,
}

impl SourceFetcher {
    pub fn new(timeout: Duration) -> Self {
        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(
            reqwest::header::ACCEPT,
            reqwest::header::HeaderValue::from_static("text/html,application/xhtml+xml"),
        );

        Self {
            client: reqwest::Client::builder()
                // Listing sites serve a stripped page to non-browser agents
                .user_agent("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
                .default_headers(headers)
                .timeout(timeout)
                .gzip(true)
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
            timeout,
        }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn fetch_html_http(&self, url: &str) -> Result<String, FetchError> {
        let resp = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout)
            } else {
                FetchError::Network(e)
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        resp.text().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(self.timeout)
            } else {
                FetchError::Body(e)
            }
        })
    }
}

impl Default for SourceFetcher {
    fn default() -> Self {
        Self::new(DEFAULT_FETCH_TIMEOUT)
    }
}

#[async_trait]
impl PageSource for SourceFetcher {
    async fn fetch_page(&self, source: &SourceConfig) -> Result<String, FetchError> {
        debug!("fetching source {} from {}", source.id, source.url);
        // The client timeout covers connect + headers; this one also bounds a slow body.
        match tokio::time::timeout(self.timeout, self.fetch_html_http(&source.url)).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout(self.timeout)),
        }
    }
}
