//! Cache metrics.
//!
//! Small, copyable structs describing what a rebuild did and how the cache has
//! been used since. Counters are relaxed atomics: they are diagnostics, not
//! synchronization.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Outcome of one [`ClassificationCache::rebuild`](super::ClassificationCache::rebuild).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RebuildMetrics {
    /// Generation number of the table that was published.
    pub generation: u64,
    /// Identities classified.
    pub identities: usize,
    /// Identities restricted for at least one verb.
    pub restricted: usize,
    /// Wall time spent classifying and publishing.
    pub duration: Duration,
}

/// Point-in-time view of the cache.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub generation: u64,
    /// Entries precomputed by the last rebuild.
    pub entries: usize,
    /// Identities memoized after the last rebuild.
    pub late_entries: usize,
    pub hits: u64,
    pub misses: u64,
}

#[derive(Debug, Default)]
pub(crate) struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
}

impl Counters {
    pub(crate) fn hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> (u64, u64) {
        (self.hits.load(Ordering::Relaxed), self.misses.load(Ordering::Relaxed))
    }
}
