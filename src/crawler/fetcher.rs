//! HTTP fetching behind the browser-tab abstraction
//!
//! This module defines how pages are fetched, including:
//! - The `Browser` and `Tab` traits the crawl engine is written against
//! - The reqwest-backed `HttpBrowser` used by default
//! - Redirect following (final URLs are reported back to the engine)
//! - Timeout and transport error classification

use async_trait::async_trait;
use reqwest::header::HeaderMap;
use reqwest::{redirect::Policy, Client};
use std::time::Duration;
use thiserror::Error;
use url::Url;

/// User agent sent when the configuration does not override it
pub const DEFAULT_USER_AGENT: &str = concat!("weft/", env!("CARGO_PKG_VERSION"));

/// A fetched page, as seen after redirects
#[derive(Debug, Clone)]
pub struct PageResponse {
    /// The URL the fetch was asked for
    pub requested_url: Url,
    /// The final URL after any redirects; links are resolved against this
    pub url: Url,
    /// HTTP status code of the final response
    pub status: u16,
    /// Response headers of the final response
    pub headers: HeaderMap,
    /// Decoded response body
    pub body: String,
}

impl PageResponse {
    /// Whether the fetch was redirected away from the requested URL
    pub fn is_redirect(&self) -> bool {
        self.url != self.requested_url
    }

    /// Whether the final status is a success (below 300)
    ///
    /// Error pages are still fetched pages; the crawl persists them and
    /// follows their links like any other.
    pub fn status_ok(&self) -> bool {
        self.status < 300
    }

    /// The Content-Type header value, if present and valid UTF-8
    pub fn content_type(&self) -> Option<&str> {
        self.headers
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
    }
}

/// A failed fetch attempt
///
/// Fetch failures are per-URL events. The engine reports them and moves
/// on; they never abort the crawl.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The request did not complete within the configured timeout
    #[error("request timed out after {timeout:?}: {url}")]
    Timeout { url: String, timeout: Duration },

    /// Connection, TLS, protocol, or body-read failure
    #[error("request failed for {url}: {message}")]
    Transport { url: String, message: String },
}

/// A reusable fetch resource
///
/// One tab performs one fetch at a time. Implementations must survive
/// their fetch future being dropped mid-flight: the engine races fetches
/// against a timeout, and a tab that loses the race goes straight back
/// into the pool.
#[async_trait]
pub trait Tab: Send {
    /// Fetches `url`, following redirects, within `timeout`
    async fn fetch(&mut self, url: &Url, timeout: Duration) -> Result<PageResponse, FetchError>;
}

/// Factory for tabs
///
/// The crawl engine asks the browser for one tab per concurrency slot at
/// startup. A failure here is fatal; nothing has been crawled yet.
#[async_trait]
pub trait Browser: Send + Sync {
    /// Opens a new tab
    async fn new_tab(&self) -> crate::Result<Box<dyn Tab>>;
}

/// Plain-HTTP browser backed by reqwest
///
/// Each tab gets its own `Client`, so connection pools and cookies stay
/// per-tab, the way separate browser tabs behave.
pub struct HttpBrowser {
    user_agent: String,
}

impl HttpBrowser {
    /// Creates a browser with the default user agent
    pub fn new() -> Self {
        Self::with_user_agent(DEFAULT_USER_AGENT)
    }

    /// Creates a browser that identifies itself as `user_agent`
    pub fn with_user_agent(user_agent: impl Into<String>) -> Self {
        HttpBrowser {
            user_agent: user_agent.into(),
        }
    }
}

impl Default for HttpBrowser {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Browser for HttpBrowser {
    async fn new_tab(&self) -> crate::Result<Box<dyn Tab>> {
        let client = Client::builder()
            .user_agent(&self.user_agent)
            .redirect(Policy::limited(10))
            .gzip(true)
            .brotli(true)
            .build()?;

        Ok(Box::new(HttpTab { client }))
    }
}

/// A single reqwest-backed tab
pub struct HttpTab {
    client: Client,
}

#[async_trait]
impl Tab for HttpTab {
    async fn fetch(&mut self, url: &Url, timeout: Duration) -> Result<PageResponse, FetchError> {
        let response = self
            .client
            .get(url.clone())
            .timeout(timeout)
            .send()
            .await
            .map_err(|e| classify_error(url, timeout, e))?;

        let final_url = response.url().clone();
        let status = response.status().as_u16();
        let headers = response.headers().clone();

        let body = response
            .text()
            .await
            .map_err(|e| classify_error(url, timeout, e))?;

        Ok(PageResponse {
            requested_url: url.clone(),
            url: final_url,
            status,
            headers,
            body,
        })
    }
}

fn classify_error(url: &Url, timeout: Duration, error: reqwest::Error) -> FetchError {
    if error.is_timeout() {
        FetchError::Timeout {
            url: url.to_string(),
            timeout,
        }
    } else {
        FetchError::Transport {
            url: url.to_string(),
            message: error.to_string(),
        }
    }
}
