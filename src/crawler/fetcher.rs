//! HTTP fetcher implementation
//!
//! This module handles page requests for the crawler:
//! - Building the shared HTTP client with a proper user agent string
//! - GET requests with a per-request timeout
//! - Classifying failures (non-200 status, timeout, transport error)
//!
//! There are no retries; a failed page is reported and the crawl moves on.

use crate::config::UserAgentConfig;
use crate::FetchError;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::time::Duration;
use url::Url;

/// A successfully fetched HTML page
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedPage {
    /// The URL that was requested
    pub url: Url,

    /// Response body
    pub html: String,
}

/// Capability the crawl loop fetches pages through
#[async_trait]
pub trait PageFetcher: Send + Sync {
    /// Fetches a single page
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError>;
}

/// Builds the HTTP client shared by the fetcher and the archive resolver
///
/// The client carries only a connect timeout; each caller sets its own
/// request timeout, since page fetches and archive downloads need very
/// different bounds.
///
/// # Example
///
/// ```no_run
/// use bucket_ferry::config::UserAgentConfig;
/// use bucket_ferry::crawler::build_http_client;
/// use std::time::Duration;
///
/// let client = build_http_client(&UserAgentConfig::default(), Duration::from_secs(10)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    connect_timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(connect_timeout)
        .gzip(true)
        .brotli(true)
        .build()
}

/// [`PageFetcher`] backed by a [`reqwest::Client`]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: Client,
    timeout: Duration,
}

impl HttpFetcher {
    /// Creates a fetcher; `timeout` bounds each request including the body
    pub fn new(client: Client, timeout: Duration) -> Self {
        Self { client, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

#[async_trait]
impl PageFetcher for HttpFetcher {
    async fn fetch(&self, url: &Url) -> Result<FetchedPage, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| classify_error(url, e))?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html = response.text().await.map_err(|e| classify_error(url, e))?;

        Ok(FetchedPage {
            url: url.clone(),
            html,
        })
    }
}

/// Maps a transport error onto a [`FetchError`]
fn classify_error(url: &Url, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
        }
    } else if error.is_connect() {
        FetchError::Transport {
            url: url.to_string(),
            message: "Connection refused".to_string(),
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
