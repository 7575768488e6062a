//! Blocking iteration over store writes
//!
//! Consumers pick the pattern that fits their loop:
//! - Blocking: `recv()`, `for event in iter`
//! - Non-blocking: `try_recv()`, `try_iter()`
//! - Bounded wait: `recv_timeout()`, `timeout_iter()`

use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use crate::event::ChangeEvent;

/// Blocking iterator over change events for watched keys
///
/// All clones of a store share one receiver, so each event is delivered
/// to exactly one consumer.
///
/// ```rust,ignore
/// for event in store.iter().timeout_iter(Duration::from_millis(200)) {
///     println!("{} written", event.key);
/// }
/// ```
pub struct ChangeIterator {
    rx: Arc<Mutex<mpsc::Receiver<ChangeEvent>>>,
}

impl ChangeIterator {
    pub(crate) fn new(rx: Arc<Mutex<mpsc::Receiver<ChangeEvent>>>) -> Self {
        Self { rx }
    }

    /// Block until the next event arrives
    ///
    /// Returns `None` once every sender is gone.
    pub fn recv(&self) -> Option<ChangeEvent> {
        self.rx.lock().ok()?.recv().ok()
    }

    /// Block for at most `timeout`
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ChangeEvent> {
        self.rx.lock().ok()?.recv_timeout(timeout).ok()
    }

    /// Return a queued event without blocking
    pub fn try_recv(&self) -> Option<ChangeEvent> {
        self.rx.lock().ok()?.try_recv().ok()
    }

    /// Drain the events queued right now
    pub fn try_iter(&self) -> TryIter<'_> {
        TryIter { inner: self }
    }

    /// Iterate until no event arrives within `timeout`
    pub fn timeout_iter(&self, timeout: Duration) -> TimeoutIter<'_> {
        TimeoutIter {
            inner: self,
            timeout,
        }
    }
}

impl Iterator for ChangeIterator {
    type Item = ChangeEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.recv()
    }
}

/// Non-blocking drain, see [`ChangeIterator::try_iter`]
pub struct TryIter<'a> {
    inner: &'a ChangeIterator,
}

impl Iterator for TryIter<'_> {
    type Item = ChangeEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.try_recv()
    }
}

/// Bounded-wait iterator, see [`ChangeIterator::timeout_iter`]
pub struct TimeoutIter<'a> {
    inner: &'a ChangeIterator,
    timeout: Duration,
}

impl Iterator for TimeoutIter<'_> {
    type Item = ChangeEvent;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.recv_timeout(self.timeout)
    }
}
