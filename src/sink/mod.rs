//! Page persistence
//!
//! Every successfully fetched page is handed to a `PageSink`. The sink
//! decides what "keeping" a page means: appending to a JSON Lines file,
//! indexing, or nothing at all.
//!
//! Sink failures are per-page events; the crawl reports them and keeps
//! going.

use async_trait::async_trait;
use thiserror::Error;

use crate::crawler::PageResponse;

mod json_lines;

pub use json_lines::JsonLinesSink;

/// A failed persistence attempt
#[derive(Debug, Error)]
pub enum SinkError {
    /// Filesystem failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Page record could not be serialized
    #[error("serialization error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Failure in a custom sink
    #[error("{0}")]
    Write(String),
}

/// Destination for successfully fetched pages
#[async_trait]
pub trait PageSink: Send + Sync {
    /// Persists one fetched page
    async fn persist(&self, page: &PageResponse) -> Result<(), SinkError>;
}

/// Sink that discards every page
///
/// Used when no output path is configured, and in crawls that only care
/// about the report.
pub struct NullSink;

#[async_trait]
impl PageSink for NullSink {
    async fn persist(&self, _page: &PageResponse) -> Result<(), SinkError> {
        Ok(())
    }
}
