use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Weft
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub crawl: CrawlConfig,
    #[serde(default)]
    pub output: OutputConfig,
}

/// Crawl behavior configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CrawlConfig {
    /// Seed URLs the crawl starts from
    #[serde(rename = "start-urls")]
    pub start_urls: Vec<String>,

    /// Base URLs whose network locations bound link expansion
    #[serde(rename = "allowed-domains")]
    pub allowed_domains: Vec<String>,

    /// Number of workers, which is also the fetch-tab pool size
    #[serde(default = "defaults::concurrency")]
    pub concurrency: usize,

    /// Seconds allowed per fetch, including the post-load delay
    #[serde(
        rename = "request-timeout-secs",
        default = "defaults::request_timeout_secs"
    )]
    pub request_timeout_secs: f64,

    /// Seconds to linger after a fetch completes before extraction
    #[serde(rename = "post-load-delay-secs", default)]
    pub post_load_delay_secs: f64,

    /// User-Agent header sent with every request (default: weft/<version>)
    #[serde(rename = "user-agent", default)]
    pub user_agent: Option<String>,
}

/// Output configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct OutputConfig {
    /// Where to append one JSON record per fetched page; omit to discard pages
    #[serde(rename = "pages-path", default)]
    pub pages_path: Option<String>,
}

impl CrawlConfig {
    /// Builds a configuration with default concurrency, timeout, and delay
    ///
    /// A single seed URL is simply a one-element collection.
    pub fn new(start_urls: Vec<String>, allowed_domains: Vec<String>) -> Self {
        Self {
            start_urls,
            allowed_domains,
            concurrency: defaults::concurrency(),
            request_timeout_secs: defaults::request_timeout_secs(),
            post_load_delay_secs: 0.0,
            user_agent: None,
        }
    }

    /// The per-request timeout as a `Duration`
    ///
    /// Callers must validate the configuration first; a non-positive,
    /// non-finite, or oversized timeout would panic here.
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.request_timeout_secs)
    }

    /// The post-load delay as a `Duration`
    ///
    /// Callers must validate the configuration first; a negative,
    /// non-finite, or oversized delay would panic here.
    pub fn post_load_delay(&self) -> Duration {
        Duration::from_secs_f64(self.post_load_delay_secs)
    }
}

mod defaults {
    pub(super) fn concurrency() -> usize {
        4
    }

    pub(super) fn request_timeout_secs() -> f64 {
        30.0
    }
}
