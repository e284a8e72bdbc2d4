//! Crawl event reporting
//!
//! Workers report per-URL outcomes through a `CrawlObserver` instead of
//! returning them: a failed fetch or persist is information about one
//! URL, not a reason to stop the run. The default observer logs; custom
//! observers can collect, alert, or ignore.

use url::Url;

use crate::crawler::engine::CrawlReport;
use crate::crawler::extract::ExtractError;
use crate::crawler::fetcher::{FetchError, PageResponse};
use crate::sink::SinkError;

/// Receives crawl events as they happen
///
/// All methods default to doing nothing, so implementations only
/// override the events they care about. Methods are called from worker
/// tasks and should return quickly.
pub trait CrawlObserver: Send + Sync {
    /// A page was fetched successfully
    fn on_page_fetched(&self, _page: &PageResponse) {}

    /// A fetch timed out or failed in transport
    fn on_fetch_failed(&self, _url: &Url, _error: &FetchError) {}

    /// A fetched page could not be parsed for links
    fn on_extract_failed(&self, _url: &Url, _error: &ExtractError) {}

    /// A fetched page could not be persisted
    fn on_persist_failed(&self, _url: &Url, _error: &SinkError) {}

    /// The crawl has ended and the report is final
    fn on_crawl_finished(&self, _report: &CrawlReport) {}
}

/// Default observer: failures become warnings, progress becomes info
pub struct LogObserver;

impl CrawlObserver for LogObserver {
    fn on_page_fetched(&self, page: &PageResponse) {
        tracing::debug!("Fetched {} ({})", page.url, page.status);
    }

    fn on_fetch_failed(&self, url: &Url, error: &FetchError) {
        tracing::warn!("Fetch failed for {}: {}", url, error);
    }

    fn on_extract_failed(&self, url: &Url, error: &ExtractError) {
        tracing::warn!("Link extraction failed for {}: {}", url, error);
    }

    fn on_persist_failed(&self, url: &Url, error: &SinkError) {
        tracing::warn!("Failed to persist {}: {}", url, error);
    }

    fn on_crawl_finished(&self, report: &CrawlReport) {
        tracing::info!(
            "Crawl finished: {} pages fetched, {} fetch failures, {} URLs seen in {:.2?}",
            report.pages_fetched,
            report.fetch_failures,
            report.urls_seen,
            report.elapsed
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct PartialObserver {
        fetch_failures: Mutex<Vec<String>>,
    }

    impl CrawlObserver for PartialObserver {
        fn on_fetch_failed(&self, url: &Url, _error: &FetchError) {
            self.fetch_failures.lock().unwrap().push(url.to_string());
        }
    }

    #[test]
    fn test_unimplemented_hooks_are_no_ops() {
        let observer = PartialObserver {
            fetch_failures: Mutex::new(Vec::new()),
        };
        let url = Url::parse("https://a.test/").unwrap();

        // Only on_fetch_failed is overridden; the rest must not panic.
        observer.on_extract_failed(&url, &ExtractError("bad html".to_string()));
        observer.on_fetch_failed(
            &url,
            &FetchError::Transport {
                url: url.to_string(),
                message: "refused".to_string(),
            },
        );

        assert_eq!(
            observer.fetch_failures.lock().unwrap().as_slice(),
            ["https://a.test/"]
        );
    }
}
