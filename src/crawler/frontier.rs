//! URL frontier shared by all crawl workers
//!
//! The frontier is the single source of truth for what remains to be
//! crawled. It combines:
//!
//! - A FIFO queue of URLs waiting to be fetched
//! - A seen-set that admits every URL at most once for the whole run
//! - An outstanding-work count that drives crawl termination
//!
//! URLs are defragmented before the seen-set check, so `/page`, `/page#a`
//! and `/page#b` are one URL as far as the crawl is concerned.
//!
//! A URL that is accepted by `offer` must be balanced by exactly one
//! `mark_done` call once its processing ends, successfully or not. When
//! the done count catches up with the accepted count, `join` unblocks and
//! the crawl is over.

use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;
use tokio::sync::Notify;
use url::Url;

use crate::url::defragment;

struct FrontierInner {
    queue: VecDeque<Url>,
    seen: HashSet<String>,
    unfinished: usize,
    closed: bool,
}

/// Shared work queue with deduplication and completion tracking
pub struct Frontier {
    inner: Mutex<FrontierInner>,
    work_ready: Notify,
    drained: Notify,
}

impl Frontier {
    /// Creates an empty frontier
    pub fn new() -> Self {
        Frontier {
            inner: Mutex::new(FrontierInner {
                queue: VecDeque::new(),
                seen: HashSet::new(),
                unfinished: 0,
                closed: false,
            }),
            work_ready: Notify::new(),
            drained: Notify::new(),
        }
    }

    /// Offers a URL to the frontier
    ///
    /// The fragment is stripped before the seen-set check, and the check
    /// and the insert are one atomic step, so concurrent offers of the
    /// same URL admit it exactly once.
    ///
    /// # Returns
    ///
    /// * `true` - The URL was new and is now queued; the caller side of the
    ///   crawl owes one `mark_done` for it
    /// * `false` - The URL was seen before, or the frontier is closed
    pub fn offer(&self, url: Url) -> bool {
        let url = defragment(url);

        let mut inner = self.inner.lock().unwrap();
        if inner.closed {
            return false;
        }
        if !inner.seen.insert(url.as_str().to_string()) {
            return false;
        }

        inner.unfinished += 1;
        inner.queue.push_back(url);
        drop(inner);

        self.work_ready.notify_one();
        true
    }

    /// Offers every URL in `urls`, returning how many were accepted
    ///
    /// Duplicate seeds collapse to a single queue entry just like any
    /// other URL.
    pub fn seed<I>(&self, urls: I) -> usize
    where
        I: IntoIterator<Item = Url>,
    {
        urls.into_iter().filter(|url| self.offer(url.clone())).count()
    }

    /// Takes the next URL to crawl, waiting if the queue is empty
    ///
    /// # Returns
    ///
    /// * `Some(url)` - The oldest queued URL
    /// * `None` - The frontier has been closed; a worker receiving `None`
    ///   should exit. Closing wins over queued URLs, so a closed frontier
    ///   never hands out more work.
    pub async fn dequeue(&self) -> Option<Url> {
        loop {
            let notified = self.work_ready.notified();
            tokio::pin!(notified);
            // Register before checking the queue so an offer landing
            // between the check and the await still wakes us.
            notified.as_mut().enable();

            {
                let mut inner = self.inner.lock().unwrap();
                if inner.closed {
                    return None;
                }
                if let Some(url) = inner.queue.pop_front() {
                    if !inner.queue.is_empty() {
                        // Wake another waiter; a single permit may have
                        // been stored for several queued URLs.
                        self.work_ready.notify_one();
                    }
                    return Some(url);
                }
            }

            notified.as_mut().await;
        }
    }

    /// Records that one accepted URL has finished processing
    ///
    /// Must be called exactly once per URL that `offer` accepted, on
    /// success and failure alike. When the last outstanding URL is marked
    /// done, `join` unblocks.
    pub fn mark_done(&self) {
        let mut inner = self.inner.lock().unwrap();
        if inner.unfinished == 0 {
            tracing::warn!("mark_done called with no outstanding work");
            return;
        }

        inner.unfinished -= 1;
        if inner.unfinished == 0 {
            drop(inner);
            self.drained.notify_waiters();
        }
    }

    /// Waits until every accepted URL has been marked done
    ///
    /// Returns immediately when there is no outstanding work, or when the
    /// frontier has been closed.
    pub async fn join(&self) {
        loop {
            let notified = self.drained.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let inner = self.inner.lock().unwrap();
                if inner.unfinished == 0 || inner.closed {
                    return;
                }
            }

            notified.as_mut().await;
        }
    }

    /// Closes the frontier
    ///
    /// Every worker blocked in `dequeue` wakes up and receives `None`,
    /// and later `offer` calls are rejected.
    pub fn close(&self) {
        {
            let mut inner = self.inner.lock().unwrap();
            inner.closed = true;
        }
        self.work_ready.notify_waiters();
        self.drained.notify_waiters();
    }

    /// Number of URLs currently waiting in the queue
    pub fn queued_len(&self) -> usize {
        self.inner.lock().unwrap().queue.len()
    }

    /// Number of distinct URLs the frontier has ever accepted
    pub fn seen_len(&self) -> usize {
        self.inner.lock().unwrap().seen.len()
    }
}

impl Default for Frontier {
    fn default() -> Self {
        Self::new()
    }
}
