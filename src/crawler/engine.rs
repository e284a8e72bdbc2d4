//! Crawl engine
//!
//! Coordinates a whole crawl:
//!
//! 1. Validate the configuration and open one tab per concurrency slot
//! 2. Seed the frontier with the start URLs
//! 3. Run one worker per tab: dequeue, fetch, extract, persist, offer
//!    newly discovered in-scope links back to the frontier
//! 4. Wait for the frontier to drain, then shut the workers down
//!
//! Per-URL failures (timeouts, transport errors, extraction and
//! persistence failures) are counted and reported through the observer;
//! they never end the run. The crawl ends when every admitted URL has
//! been processed, and `run` returns a report of what happened.

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

use crate::config::{validate_crawl_config, CrawlConfig};
use crate::crawler::extract::{AnchorExtractor, LinkExtractor};
use crate::crawler::fetcher::{Browser, FetchError, HttpBrowser, PageResponse, Tab};
use crate::crawler::frontier::Frontier;
use crate::crawler::observer::{CrawlObserver, LogObserver};
use crate::pool::TabPool;
use crate::sink::{NullSink, PageSink};
use crate::url::ScopeSet;
use crate::ConfigError;

/// Summary of a finished crawl
#[derive(Debug, Clone)]
pub struct CrawlReport {
    /// When the crawl started
    pub started_at: DateTime<Utc>,
    /// How long the crawl took
    pub elapsed: Duration,
    /// Pages fetched successfully
    pub pages_fetched: usize,
    /// Fetches that timed out or failed in transport
    pub fetch_failures: usize,
    /// Pages whose links could not be extracted
    pub extract_failures: usize,
    /// Pages the sink refused
    pub persist_failures: usize,
    /// In-scope links found on fetched pages
    pub links_discovered: usize,
    /// Discovered links that were new and so were queued
    pub links_enqueued: usize,
    /// Distinct URLs admitted over the whole run, seeds included
    pub urls_seen: usize,
}

#[derive(Default)]
struct Counters {
    pages_fetched: AtomicUsize,
    fetch_failures: AtomicUsize,
    extract_failures: AtomicUsize,
    persist_failures: AtomicUsize,
    links_discovered: AtomicUsize,
    links_enqueued: AtomicUsize,
}

impl Counters {
    fn snapshot(&self, started_at: DateTime<Utc>, elapsed: Duration, urls_seen: usize) -> CrawlReport {
        CrawlReport {
            started_at,
            elapsed,
            pages_fetched: self.pages_fetched.load(Ordering::Relaxed),
            fetch_failures: self.fetch_failures.load(Ordering::Relaxed),
            extract_failures: self.extract_failures.load(Ordering::Relaxed),
            persist_failures: self.persist_failures.load(Ordering::Relaxed),
            links_discovered: self.links_discovered.load(Ordering::Relaxed),
            links_enqueued: self.links_enqueued.load(Ordering::Relaxed),
            urls_seen,
        }
    }
}

/// Configures and builds a `Crawler`
///
/// Every component has a default: reqwest-backed tabs, anchor
/// extraction, a discarding sink, and a logging observer. Override the
/// ones the crawl needs.
pub struct CrawlerBuilder {
    config: CrawlConfig,
    browser: Option<Box<dyn Browser>>,
    extractor: Option<Box<dyn LinkExtractor>>,
    sink: Option<Box<dyn PageSink>>,
    observer: Option<Box<dyn CrawlObserver>>,
}

impl CrawlerBuilder {
    /// Replaces the default HTTP browser
    pub fn browser(mut self, browser: impl Browser + 'static) -> Self {
        self.browser = Some(Box::new(browser));
        self
    }

    /// Replaces the default anchor-based link extractor
    pub fn link_extractor(mut self, extractor: impl LinkExtractor + 'static) -> Self {
        self.extractor = Some(Box::new(extractor));
        self
    }

    /// Replaces the default discarding sink
    pub fn sink(mut self, sink: impl PageSink + 'static) -> Self {
        self.sink = Some(Box::new(sink));
        self
    }

    /// Replaces the default logging observer
    pub fn observer(mut self, observer: impl CrawlObserver + 'static) -> Self {
        self.observer = Some(Box::new(observer));
        self
    }

    /// Validates the configuration and opens the tab pool
    ///
    /// # Returns
    ///
    /// * `Ok(Crawler)` - Ready to run
    /// * `Err(WeftError)` - The configuration is unusable or a tab could
    ///   not be opened; these are the only fatal errors a crawl has
    pub async fn build(self) -> crate::Result<Crawler> {
        validate_crawl_config(&self.config)?;

        let mut seeds = Vec::with_capacity(self.config.start_urls.len());
        for raw in &self.config.start_urls {
            let url = Url::parse(raw).map_err(|e| {
                ConfigError::InvalidUrl(format!("Invalid start URL '{}': {}", raw, e))
            })?;
            seeds.push(url);
        }

        let scope = ScopeSet::from_allowed(&self.config.allowed_domains)?;

        let browser: Box<dyn Browser> = match self.browser {
            Some(browser) => browser,
            None => match &self.config.user_agent {
                Some(ua) => Box::new(HttpBrowser::with_user_agent(ua.clone())),
                None => Box::new(HttpBrowser::new()),
            },
        };

        let pool = TabPool::create(self.config.concurrency, || browser.new_tab()).await?;

        Ok(Crawler {
            seeds,
            scope: Arc::new(scope),
            frontier: Arc::new(Frontier::new()),
            pool: Arc::new(pool),
            extractor: Arc::from(
                self.extractor
                    .unwrap_or_else(|| Box::new(AnchorExtractor)),
            ),
            sink: Arc::from(self.sink.unwrap_or_else(|| Box::new(NullSink))),
            observer: Arc::from(self.observer.unwrap_or_else(|| Box::new(LogObserver))),
            concurrency: self.config.concurrency,
            request_timeout: self.config.request_timeout(),
            post_load_delay: self.config.post_load_delay(),
        })
    }
}

/// A configured crawl, ready to run
///
/// # Example
///
/// ```no_run
/// use weft::config::CrawlConfig;
/// use weft::crawler::Crawler;
///
/// #[tokio::main]
/// async fn main() -> weft::Result<()> {
///     let config = CrawlConfig::new(
///         vec!["https://example.com/".to_string()],
///         vec!["https://example.com".to_string()],
///     );
///
///     let crawler = Crawler::new(config).await?;
///     let report = crawler.run().await?;
///     println!("Fetched {} pages", report.pages_fetched);
///     Ok(())
/// }
/// ```
pub struct Crawler {
    seeds: Vec<Url>,
    scope: Arc<ScopeSet>,
    frontier: Arc<Frontier>,
    pool: Arc<TabPool<Box<dyn Tab>>>,
    extractor: Arc<dyn LinkExtractor>,
    sink: Arc<dyn PageSink>,
    observer: Arc<dyn CrawlObserver>,
    concurrency: usize,
    request_timeout: Duration,
    post_load_delay: Duration,
}

impl Crawler {
    /// Starts configuring a crawler
    pub fn builder(config: CrawlConfig) -> CrawlerBuilder {
        CrawlerBuilder {
            config,
            browser: None,
            extractor: None,
            sink: None,
            observer: None,
        }
    }

    /// Builds a crawler with all default components
    pub async fn new(config: CrawlConfig) -> crate::Result<Crawler> {
        Self::builder(config).build().await
    }

    /// Runs the crawl to completion
    ///
    /// Returns once every admitted URL has been processed and all workers
    /// have stopped. A panic in a component kills that worker's task, not
    /// the run: the URL it held is still accounted for, and if every
    /// worker dies the run ends and reports what was done up to that
    /// point. A crawler performs one crawl; calling `run` again afterwards
    /// returns immediately without fetching anything, since the frontier
    /// stays closed.
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlReport)` - What the crawl did; per-URL failures are
    ///   counts in the report, never errors here
    pub async fn run(&self) -> crate::Result<CrawlReport> {
        let started_at = Utc::now();
        let started = Instant::now();

        let seeded = self.frontier.seed(self.seeds.iter().cloned());
        tracing::info!(
            "Seeded {} start URL(s), crawling with {} tab(s)",
            seeded,
            self.concurrency
        );

        let counters = Arc::new(Counters::default());

        let mut handles = Vec::with_capacity(self.concurrency);
        for id in 0..self.concurrency {
            let worker = Worker {
                id,
                frontier: Arc::clone(&self.frontier),
                pool: Arc::clone(&self.pool),
                scope: Arc::clone(&self.scope),
                extractor: Arc::clone(&self.extractor),
                sink: Arc::clone(&self.sink),
                observer: Arc::clone(&self.observer),
                counters: Arc::clone(&counters),
                request_timeout: self.request_timeout,
                post_load_delay: self.post_load_delay,
                started,
            };
            handles.push(tokio::spawn(worker.run()));
        }

        let drain_workers = async {
            for handle in handles {
                if let Err(e) = handle.await {
                    tracing::error!("Worker task failed: {}", e);
                }
            }
        };
        tokio::pin!(drain_workers);

        tokio::select! {
            _ = self.frontier.join() => {
                self.frontier.close();
                drain_workers.await;
            }
            // Every worker has exited with URLs still outstanding; no one
            // is left to drain them.
            _ = &mut drain_workers => {
                self.frontier.close();
            }
        }

        let report = counters.snapshot(started_at, started.elapsed(), self.frontier.seen_len());
        self.observer.on_crawl_finished(&report);
        Ok(report)
    }

    /// Number of tabs currently idle in the pool
    ///
    /// After `run` returns, this equals the configured concurrency.
    pub fn idle_tabs(&self) -> usize {
        self.pool.available()
    }
}

struct Worker {
    id: usize,
    frontier: Arc<Frontier>,
    pool: Arc<TabPool<Box<dyn Tab>>>,
    scope: Arc<ScopeSet>,
    extractor: Arc<dyn LinkExtractor>,
    sink: Arc<dyn PageSink>,
    observer: Arc<dyn CrawlObserver>,
    counters: Arc<Counters>,
    request_timeout: Duration,
    post_load_delay: Duration,
    started: Instant,
}

impl Worker {
    async fn run(self) {
        tracing::debug!("Worker {} started", self.id);
        while let Some(url) = self.frontier.dequeue().await {
            // Exactly one mark_done per dequeued URL, on every outcome;
            // the guard fires during a panic unwind as well.
            let done = DoneGuard(&self.frontier);
            self.process(&url).await;
            drop(done);
        }
        tracing::debug!("Worker {} stopped", self.id);
    }

    async fn process(&self, url: &Url) {
        let page = match self.fetch_page(url).await {
            Ok(page) => page,
            Err(error) => {
                self.counters.fetch_failures.fetch_add(1, Ordering::Relaxed);
                self.observer.on_fetch_failed(url, &error);
                return;
            }
        };

        let fetched = self.counters.pages_fetched.fetch_add(1, Ordering::Relaxed) + 1;
        if fetched % 10 == 0 {
            let elapsed = self.started.elapsed().as_secs_f64().max(0.001);
            tracing::info!(
                "Progress: {} pages crawled, {} in frontier, {:.2} pages/sec",
                fetched,
                self.frontier.queued_len(),
                fetched as f64 / elapsed
            );
        }
        self.observer.on_page_fetched(&page);

        let links = match self.extractor.extract(&page, &self.scope) {
            Ok(links) => links,
            Err(error) => {
                self.counters.extract_failures.fetch_add(1, Ordering::Relaxed);
                self.observer.on_extract_failed(url, &error);
                Vec::new()
            }
        };

        if let Err(error) = self.sink.persist(&page).await {
            self.counters.persist_failures.fetch_add(1, Ordering::Relaxed);
            self.observer.on_persist_failed(url, &error);
        }

        for link in links {
            self.counters.links_discovered.fetch_add(1, Ordering::Relaxed);
            if self.frontier.offer(link) {
                self.counters.links_enqueued.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Fetches one URL using a pooled tab
    ///
    /// The tab goes back to the pool when this returns, before any
    /// extraction or persistence work starts. The whole attempt,
    /// post-load delay included, races the request timeout; losing the
    /// race drops the in-flight fetch and frees the tab.
    async fn fetch_page(&self, url: &Url) -> Result<PageResponse, FetchError> {
        let mut tab = self.pool.acquire().await;

        let attempt = async {
            let page = tab.fetch(url, self.request_timeout).await?;
            if !self.post_load_delay.is_zero() {
                tokio::time::sleep(self.post_load_delay).await;
            }
            Ok(page)
        };

        match tokio::time::timeout(self.request_timeout, attempt).await {
            Ok(result) => result,
            Err(_) => Err(FetchError::Timeout {
                url: url.to_string(),
                timeout: self.request_timeout,
            }),
        }
    }
}

/// Calls `Frontier::mark_done` when dropped
struct DoneGuard<'a>(&'a Frontier);

impl Drop for DoneGuard<'_> {
    fn drop(&mut self) {
        self.0.mark_done();
    }
}
