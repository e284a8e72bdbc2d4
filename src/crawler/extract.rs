//! Link extraction from fetched pages
//!
//! This module turns a fetched page into the set of in-scope URLs it
//! links to:
//! - Anchor hrefs are resolved against the page's final URL, so links on
//!   a redirected page resolve where the content actually lives
//! - Non-navigational hrefs (javascript:, mailto:, tel:, data:, bare
//!   fragments) are skipped
//! - Links whose network location is outside the allowed-domain set are
//!   dropped
//! - Fragments are stripped and duplicates collapse before the links are
//!   handed back

use scraper::{Html, Selector};
use std::collections::HashSet;
use thiserror::Error;
use url::Url;

use crate::crawler::fetcher::PageResponse;
use crate::url::{defragment, ScopeSet};

/// A failed link extraction
///
/// Like fetch failures, extraction failures are per-URL events and never
/// abort the crawl.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ExtractError(pub String);

/// Extracts in-scope links from a fetched page
///
/// Implementations receive the allowed-domain scope and return only the
/// links the crawl should follow; the engine offers every returned link
/// to the frontier.
pub trait LinkExtractor: Send + Sync {
    /// Returns the in-scope links found on `page`, resolved to absolute URLs
    fn extract(&self, page: &PageResponse, scope: &ScopeSet) -> Result<Vec<Url>, ExtractError>;
}

/// Default extractor: every in-scope `<a href>` on an HTML page
///
/// Pages whose Content-Type is present but not HTML yield no links. A
/// missing Content-Type is treated as HTML, since the body may well be.
pub struct AnchorExtractor;

impl LinkExtractor for AnchorExtractor {
    fn extract(&self, page: &PageResponse, scope: &ScopeSet) -> Result<Vec<Url>, ExtractError> {
        if let Some(content_type) = page.content_type() {
            if !content_type.contains("text/html") {
                tracing::debug!(
                    "Skipping link extraction for {} (content type: {})",
                    page.url,
                    content_type
                );
                return Ok(Vec::new());
            }
        }

        let document = Html::parse_document(&page.body);
        let selector = Selector::parse("a")
            .map_err(|e| ExtractError(format!("invalid anchor selector: {:?}", e)))?;

        let mut links = HashSet::new();
        for element in document.select(&selector) {
            if let Some(href) = element.value().attr("href") {
                if let Some(link) = resolve_href(&page.url, href) {
                    if scope.contains(&link) {
                        links.insert(link);
                    } else {
                        tracing::debug!("Skipping out-of-scope link {}", link);
                    }
                }
            }
        }

        Ok(links.into_iter().collect())
    }
}

/// Resolves a raw href against the page URL
///
/// Returns `None` for hrefs that do not navigate anywhere new: scripts,
/// mail and phone links, inline data, bare fragments, and anything that
/// fails to parse.
fn resolve_href(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    for scheme in ["javascript:", "mailto:", "tel:", "data:"] {
        if lower.starts_with(scheme) {
            return None;
        }
    }

    let resolved = match base.join(href) {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!("Skipping unparseable href '{}' on {}: {}", href, base, e);
            return None;
        }
    };

    match resolved.scheme() {
        "http" | "https" => Some(defragment(resolved)),
        _ => None,
    }
}
