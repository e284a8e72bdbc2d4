//! Fixed-size pool of reusable crawl resources
//!
//! The crawler opens a fixed number of browser tabs up front and recycles
//! them for the whole run. This module provides the pool that owns those
//! tabs:
//!
//! - `TabPool::create` runs an async factory once per slot
//! - `TabPool::acquire` waits until a tab is idle and checks it out
//! - Dropping the returned `TabGuard` checks the tab back in
//!
//! Check-in happens in `Drop`, so a tab finds its way back to the pool on
//! every exit path, including early returns and cancelled futures.

use std::future::Future;
use std::ops::{Deref, DerefMut};
use std::sync::Mutex;
use tokio::sync::Semaphore;

/// A fixed-size pool of reusable values
///
/// The pool never grows or shrinks after creation. `acquire` blocks until
/// a value is idle; there is no failure path once the pool exists.
pub struct TabPool<T> {
    slots: Mutex<Vec<T>>,
    free: Semaphore,
    size: usize,
}

impl<T> TabPool<T> {
    /// Creates a pool by running `factory` once per slot
    ///
    /// # Arguments
    ///
    /// * `count` - Number of slots; the caller validates that it is nonzero
    /// * `factory` - Async constructor invoked `count` times
    ///
    /// # Returns
    ///
    /// * `Ok(TabPool)` - All slots initialized successfully
    /// * `Err(WeftError)` - A factory call failed; already-built slots are dropped
    pub async fn create<F, Fut>(count: usize, mut factory: F) -> crate::Result<TabPool<T>>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = crate::Result<T>>,
    {
        let mut slots = Vec::with_capacity(count);
        for _ in 0..count {
            slots.push(factory().await?);
        }

        Ok(TabPool {
            slots: Mutex::new(slots),
            free: Semaphore::new(count),
            size: count,
        })
    }

    /// Checks out an idle value, waiting if none is available
    ///
    /// Waiters are served as slots free up. The value is returned to the
    /// pool when the guard is dropped.
    pub async fn acquire(&self) -> TabGuard<'_, T> {
        let permit = self
            .free
            .acquire()
            .await
            .expect("pool semaphore is never closed");
        // The permit is restored by add_permits when the guard drops.
        permit.forget();

        let tab = self
            .slots
            .lock()
            .unwrap()
            .pop()
            .expect("permit held but no idle slot");

        TabGuard {
            pool: self,
            tab: Some(tab),
        }
    }

    /// Number of slots the pool was created with
    pub fn size(&self) -> usize {
        self.size
    }

    /// Number of values currently idle in the pool
    pub fn available(&self) -> usize {
        self.free.available_permits()
    }

    fn release(&self, tab: T) {
        self.slots.lock().unwrap().push(tab);
        self.free.add_permits(1);
    }
}

/// Exclusive access to a pooled value
///
/// Dereferences to the value. Dropping the guard returns the value to the
/// pool and wakes one waiter.
pub struct TabGuard<'a, T> {
    pool: &'a TabPool<T>,
    tab: Option<T>,
}

impl<T> Deref for TabGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.tab.as_ref().expect("guard accessed after drop")
    }
}

impl<T> DerefMut for TabGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.tab.as_mut().expect("guard accessed after drop")
    }
}

impl<T> Drop for TabGuard<'_, T> {
    fn drop(&mut self) {
        if let Some(tab) = self.tab.take() {
            self.pool.release(tab);
        }
    }
}
