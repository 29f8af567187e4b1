use std::sync::atomic::{AtomicU64, Ordering};

/// Counters maintained by the reorder worker.
///
/// Uses atomic counters with `Relaxed` ordering since these are purely
/// statistical - no control flow depends on exact values, and eventual
/// visibility is acceptable for observability. They exist to tune the fast
/// buffer size and to diagnose producer skew; correctness never depends on
/// them.
#[derive(Debug, Default)]
pub struct ReorderStats {
    /// Elements popped from the source queue.
    processed: AtomicU64,
    /// Elements that arrived exactly in order and were emitted immediately.
    direct_hits: AtomicU64,
    /// Elements emitted out of the direct-mapped fast buffer.
    l1_hits: AtomicU64,
    /// Elements emitted out of the overflow map.
    l2_hits: AtomicU64,
    /// Elements discarded because their sequence was already emitted.
    /// Nonzero means the producer side sent duplicates or re-sent old data.
    stale: AtomicU64,
    /// Largest observed distance between an early arrival and the sequence
    /// the worker was waiting for.
    max_gap: AtomicU64,
}

impl ReorderStats {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub(crate) fn add_processed(&self) {
        self.processed.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_direct_hit(&self) {
        self.direct_hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_l1_hit(&self) {
        self.l1_hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_l2_hit(&self) {
        self.l2_hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn add_stale(&self) {
        self.stale.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub(crate) fn record_gap(&self, gap: u64) {
        self.max_gap.fetch_max(gap, Ordering::Relaxed);
    }

    /// Take a snapshot of the current counter values.
    pub fn snapshot(&self) -> ReorderSnapshot {
        ReorderSnapshot {
            processed: self.processed.load(Ordering::Relaxed),
            direct_hits: self.direct_hits.load(Ordering::Relaxed),
            l1_hits: self.l1_hits.load(Ordering::Relaxed),
            l2_hits: self.l2_hits.load(Ordering::Relaxed),
            stale: self.stale.load(Ordering::Relaxed),
            max_gap: self.max_gap.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of [`ReorderStats`].
///
/// Plain data (Copy, Clone) for easy aggregation and display. Once the
/// worker has drained a quiescent source completely,
/// `direct_hits + l1_hits + l2_hits + stale == processed`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReorderSnapshot {
    pub processed: u64,
    pub direct_hits: u64,
    pub l1_hits: u64,
    pub l2_hits: u64,
    pub stale: u64,
    pub max_gap: u64,
}

impl ReorderSnapshot {
    /// Elements that left the worker in order (everything but stale drops).
    #[inline]
    pub fn emitted(&self) -> u64 {
        self.direct_hits + self.l1_hits + self.l2_hits
    }
}
