//! Deadlines and cancellation for search calls.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::{Duration, Instant},
};

use tantivy::{
    SegmentOrdinal, SegmentReader, TantivyError,
    collector::{Collector, SegmentCollector},
};

use crate::SearchError;

/// Shared flag the request handler sets when the caller goes away.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    /// Creates a flag that is not cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks the flag as cancelled. All clones observe the change.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// True once [`Self::cancel`] was called on any clone.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// A point in time after which a search must stop, plus a cancellation flag.
#[derive(Debug, Clone)]
pub struct Deadline {
    /// When the deadline passes; `None` when the timeout is too large for an `Instant`.
    expires_at: Option<Instant>,
    /// The timeout the deadline was built from, for error reporting.
    timeout: Duration,
    /// Caller cancellation.
    cancel: CancelFlag,
}

impl Deadline {
    /// Creates a deadline `timeout` from now.
    ///
    /// A timeout that overflows the clock never expires; cancellation still applies.
    pub fn new(timeout: Duration, cancel: CancelFlag) -> Self {
        Self {
            expires_at: Instant::now().checked_add(timeout),
            timeout,
            cancel,
        }
    }

    /// Creates a deadline from an optional caller request, never longer than `configured`.
    pub fn capped(requested: Option<Duration>, configured: Duration, cancel: CancelFlag) -> Self {
        let timeout = requested.map_or(configured, |r| r.min(configured));
        Self::new(timeout, cancel)
    }

    /// The timeout this deadline enforces.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Time left before expiry.
    pub fn remaining(&self) -> Duration {
        self.expires_at
            .map_or(Duration::MAX, |at| at.saturating_duration_since(Instant::now()))
    }

    /// Fails with `Cancelled` or `Timeout` when the search must stop.
    pub fn check(&self) -> Result<(), SearchError> {
        if self.cancel.is_cancelled() {
            return Err(SearchError::Cancelled);
        }
        if self.expires_at.is_some_and(|at| Instant::now() >= at) {
            return Err(SearchError::Timeout {
                timeout: self.timeout,
            });
        }
        Ok(())
    }
}

/// Wraps a collector so every segment, and the final merge, first checks a deadline.
///
/// Tantivy has no way to interrupt a running segment, so an expired deadline
/// stops the search at the next segment boundary.
pub struct DeadlineCollector<C> {
    /// The wrapped collector.
    inner: C,
    /// The deadline to enforce.
    deadline: Deadline,
}

impl<C> DeadlineCollector<C> {
    /// Wraps `inner`.
    pub fn new(inner: C, deadline: Deadline) -> Self {
        Self { inner, deadline }
    }

    /// Converts an expired deadline into a Tantivy error to abort the search.
    fn check(&self) -> tantivy::Result<()> {
        self.deadline
            .check()
            .map_err(|e| TantivyError::InternalError(e.to_string()))
    }
}

impl<C: Collector> Collector for DeadlineCollector<C> {
    type Fruit = C::Fruit;
    type Child = C::Child;

    fn for_segment(
        &self,
        segment_local_id: SegmentOrdinal,
        segment: &SegmentReader,
    ) -> tantivy::Result<Self::Child> {
        self.check()?;
        self.inner.for_segment(segment_local_id, segment)
    }

    fn requires_scoring(&self) -> bool {
        self.inner.requires_scoring()
    }

    fn merge_fruits(
        &self,
        segment_fruits: Vec<<Self::Child as SegmentCollector>::Fruit>,
    ) -> tantivy::Result<Self::Fruit> {
        self.check()?;
        self.inner.merge_fruits(segment_fruits)
    }
}
