//! Weft: a bounded-tab web crawler
//!
//! Weft fetches pages starting from a set of seed URLs, extracts links that
//! fall inside a domain allow-list, and hands every fetched page to a
//! pluggable persistence sink. Concurrency is bounded by a fixed pool of
//! reusable fetch tabs; the crawl terminates once the work frontier drains.

pub mod config;
pub mod crawler;
pub mod pool;
pub mod sink;
pub mod url;

use thiserror::Error;

/// Main error type for Weft operations
///
/// Per-URL failures (timeouts, transport errors, extraction and persistence
/// failures) never surface here; they are contained inside the worker loop.
/// This type covers the fatal cases: invalid configuration, tab-pool
/// construction, and sink construction.
#[derive(Debug, Error)]
pub enum WeftError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("Sink error: {0}")]
    Sink(#[from] sink::SinkError),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// Result type alias for Weft operations
pub type Result<T> = std::result::Result<T, WeftError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

// Re-export commonly used types
pub use config::{load_config, Config, CrawlConfig};
pub use crawler::{crawl, CrawlReport, Crawler, CrawlerBuilder, FetchError, PageResponse};
pub use sink::{NullSink, PageSink, SinkError};
pub use self::url::ScopeSet;
