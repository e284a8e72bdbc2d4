//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - The browser-tab fetch abstraction and its reqwest implementation
//! - The shared URL frontier that deduplicates and drives termination
//! - Anchor-based link extraction
//! - The engine that runs workers and produces the crawl report

mod engine;
mod extract;
mod fetcher;
mod frontier;
mod observer;

pub use engine::{CrawlReport, Crawler, CrawlerBuilder};
pub use extract::{AnchorExtractor, ExtractError, LinkExtractor};
pub use fetcher::{
    Browser, FetchError, HttpBrowser, PageResponse, Tab, DEFAULT_USER_AGENT,
};
pub use frontier::Frontier;
pub use observer::{CrawlObserver, LogObserver};

use crate::config::Config;
use crate::sink::JsonLinesSink;

/// Runs a complete crawl from a loaded configuration
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Open the JSON Lines sink, if an output path is configured
/// 2. Build a crawler with default components
/// 3. Seed the frontier and run workers until the frontier drains
/// 4. Return the crawl report
///
/// # Arguments
///
/// * `config` - The full configuration, crawl and output sections included
///
/// # Returns
///
/// * `Ok(CrawlReport)` - Crawl completed; per-URL failures are counts in
///   the report
/// * `Err(WeftError)` - The configuration was unusable, a tab could not
///   be opened, or the output file could not be created
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use weft::config::load_config;
/// use weft::crawler::crawl;
///
/// #[tokio::main]
/// async fn main() -> weft::Result<()> {
///     let config = load_config(Path::new("config.toml"))?;
///     let report = crawl(config).await?;
///     println!("Fetched {} pages", report.pages_fetched);
///     Ok(())
/// }
/// ```
pub async fn crawl(config: Config) -> crate::Result<CrawlReport> {
    let Config { crawl, output } = config;

    let mut builder = Crawler::builder(crawl);
    if let Some(path) = &output.pages_path {
        builder = builder.sink(JsonLinesSink::create(path).await?);
    }

    let crawler = builder.build().await?;
    crawler.run().await
}
