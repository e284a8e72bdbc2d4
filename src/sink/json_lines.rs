//! JSON Lines file sink

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;
use tokio::fs::{File, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use super::{PageSink, SinkError};
use crate::crawler::PageResponse;
use async_trait::async_trait;

/// One line per page, appended to a file
///
/// Each line is a self-contained JSON object, so the output can be
/// streamed, tailed, and processed with line-oriented tools while the
/// crawl is still running.
pub struct JsonLinesSink {
    file: Mutex<File>,
}

#[derive(Serialize)]
struct PageRecord<'a> {
    url: &'a str,
    requested_url: &'a str,
    status: u16,
    redirected: bool,
    fetched_at: DateTime<Utc>,
    body: &'a str,
}

impl JsonLinesSink {
    /// Opens (or creates) the output file in append mode
    ///
    /// # Arguments
    ///
    /// * `path` - Where page records are appended
    ///
    /// # Returns
    ///
    /// * `Ok(JsonLinesSink)` - File is open and ready
    /// * `Err(SinkError)` - The file could not be opened
    pub async fn create(path: impl AsRef<Path>) -> Result<Self, SinkError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await?;

        Ok(JsonLinesSink {
            file: Mutex::new(file),
        })
    }
}

#[async_trait]
impl PageSink for JsonLinesSink {
    async fn persist(&self, page: &PageResponse) -> Result<(), SinkError> {
        let record = PageRecord {
            url: page.url.as_str(),
            requested_url: page.requested_url.as_str(),
            status: page.status,
            redirected: page.is_redirect(),
            fetched_at: Utc::now(),
            body: &page.body,
        };

        let mut line = serde_json::to_vec(&record)?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        file.write_all(&line).await?;
        file.flush().await?;

        Ok(())
    }
}
