use crate::ring::Spsc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// Error types for producer registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RegisterError {
    /// Every shard already has a producer bound to it.
    ///
    /// Each shard is a single-producer ring, so handing out more than `P`
    /// handles would silently break the per-shard contract. Callers that
    /// cannot bound their producer count should use
    /// [`SlotMpsc`](crate::SlotMpsc) instead.
    #[error("all {max} shards already have a registered producer")]
    ShardsExhausted {
        /// The shard count `P` of this queue.
        max: usize,
    },
}

/// Multi-producer single-consumer queue built from SPSC shard decomposition.
///
/// `P` independent SPSC rings of capacity `N` each; every producer is bound
/// to its own shard by [`register`](ShardedMpsc::register), eliminating
/// producer-producer contention entirely. The single consumer visits the
/// shards round-robin, resuming after the last shard that produced a hit.
///
/// # Ordering
///
/// Within a shard, FIFO holds, so each producer observes its own pushes
/// consumed in order. There is no ordering across producers.
///
/// # Example
///
/// ```
/// use seqring::ShardedMpsc;
///
/// let queue: ShardedMpsc<u64, 16, 2> = ShardedMpsc::new();
/// let p0 = queue.register().unwrap();
/// let p1 = queue.register().unwrap();
///
/// assert!(p0.push(10));
/// assert!(p1.push(20));
///
/// let mut got = vec![queue.pop().unwrap(), queue.pop().unwrap()];
/// got.sort_unstable();
/// assert_eq!(got, vec![10, 20]);
/// ```
pub struct ShardedMpsc<T, const N: usize, const P: usize> {
    inner: Arc<Inner<T, N, P>>,
}

struct Inner<T, const N: usize, const P: usize> {
    shards: [Spsc<T, N>; P],
    /// Number of handed-out producer handles.
    producers: AtomicUsize,
    /// Where the consumer's round-robin scan resumes. Only the consumer
    /// stores it; Relaxed is enough since it is a scan hint, not data.
    hint: AtomicUsize,
}

impl<T: Copy, const N: usize, const P: usize> ShardedMpsc<T, N, P> {
    const SHARDS_OK: () = assert!(P >= 1, "ShardedMpsc needs at least one shard");

    /// Creates a queue with `P` empty shards.
    pub fn new() -> Self {
        let () = Self::SHARDS_OK;

        Self {
            inner: Arc::new(Inner {
                shards: std::array::from_fn(|_| Spsc::new()),
                producers: AtomicUsize::new(0),
                hint: AtomicUsize::new(0),
            }),
        }
    }

    /// Binds a new producer to the next free shard.
    ///
    /// The returned handle is the only writer of its shard; registration is
    /// sticky for the handle's lifetime. Fails once all `P` shards are taken.
    pub fn register(&self) -> Result<ShardProducer<T, N, P>, RegisterError> {
        let id = self.inner.producers.fetch_add(1, Ordering::SeqCst);
        if id >= P {
            self.inner.producers.fetch_sub(1, Ordering::SeqCst);
            return Err(RegisterError::ShardsExhausted { max: P });
        }

        Ok(ShardProducer {
            inner: Arc::clone(&self.inner),
            shard: id,
        })
    }

    /// Registered shard range for the consumer scan.
    #[inline]
    fn active(&self) -> usize {
        self.inner.producers.load(Ordering::Acquire).min(P)
    }

    /// Pops one value, visiting each active shard at most once.
    ///
    /// Returns `None` only if every shard looked empty during its single
    /// visit. That is not a linearizable emptiness check, but it is enough to
    /// establish quiescence once the producers have stopped.
    pub fn pop(&self) -> Option<T> {
        let count = self.active();
        let start = self.inner.hint.load(Ordering::Relaxed);

        for i in 0..count {
            let idx = (start + i) % count;
            if let Some(value) = self.inner.shards[idx].pop() {
                self.inner.hint.store((idx + 1) % count, Ordering::Relaxed);
                return Some(value);
            }
        }
        None
    }

    /// Closure form of [`pop`](Self::pop); the reader sees the value in the
    /// winning shard's slot. Returns false iff every shard looked empty.
    ///
    /// `FnMut` rather than `FnOnce` because the scan may offer the closure to
    /// several shards before one of them has data (it still runs at most
    /// once).
    pub fn pop_with<F>(&self, mut reader: F) -> bool
    where
        F: FnMut(&T),
    {
        let count = self.active();
        let start = self.inner.hint.load(Ordering::Relaxed);

        for i in 0..count {
            let idx = (start + i) % count;
            if self.inner.shards[idx].pop_with(&mut reader) {
                self.inner.hint.store((idx + 1) % count, Ordering::Relaxed);
                return true;
            }
        }
        false
    }

    /// Fills `dst` from the shards in round-robin order, each shard visited
    /// at most once. Returns the number of elements written.
    pub fn pop_bulk(&self, dst: &mut [T]) -> usize {
        let count = self.active();
        let start = self.inner.hint.load(Ordering::Relaxed);
        let mut total = 0;

        for i in 0..count {
            if total == dst.len() {
                break;
            }
            let idx = (start + i) % count;
            let got = self.inner.shards[idx].pop_bulk(&mut dst[total..]);
            if got > 0 {
                self.inner.hint.store((idx + 1) % count, Ordering::Relaxed);
            }
            total += got;
        }
        total
    }

    /// Total items across all shards (approximate under concurrency).
    pub fn len(&self) -> usize {
        self.inner.shards.iter().map(Spsc::len).sum()
    }

    /// True if every shard appears empty.
    pub fn is_empty(&self) -> bool {
        self.inner.shards.iter().all(Spsc::is_empty)
    }

    /// Aggregate usable capacity: `P * (N - 1)`.
    #[inline]
    pub const fn capacity(&self) -> usize {
        P * (N - 1)
    }

    /// Number of registered producers.
    #[inline]
    pub fn producer_count(&self) -> usize {
        self.active()
    }
}

impl<T: Copy, const N: usize, const P: usize> Default for ShardedMpsc<T, N, P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize, const P: usize> Clone for ShardedMpsc<T, N, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

/// Producer handle bound to one shard of a [`ShardedMpsc`].
///
/// Owning the handle is owning the shard's producer side, which is why the
/// handle implements neither `Clone` nor `Copy`: two clones pushing from two
/// threads would be two producers on one SPSC ring.
pub struct ShardProducer<T, const N: usize, const P: usize> {
    inner: Arc<Inner<T, N, P>>,
    shard: usize,
}

impl<T: Copy, const N: usize, const P: usize> ShardProducer<T, N, P> {
    /// The shard this producer is bound to.
    #[inline]
    pub fn shard(&self) -> usize {
        self.shard
    }

    /// Pushes a value into this producer's shard. Returns false iff the
    /// shard is full.
    #[inline]
    pub fn push(&self, value: T) -> bool {
        self.inner.shards[self.shard].push(value)
    }

    /// In-place writer form of [`push`](Self::push).
    #[inline]
    pub fn push_with<F>(&self, writer: F) -> bool
    where
        F: FnOnce(&mut std::mem::MaybeUninit<T>),
    {
        self.inner.shards[self.shard].push_with(writer)
    }

    /// Bulk push into this producer's shard. Returns the count accepted.
    #[inline]
    pub fn push_bulk(&self, src: &[T]) -> usize {
        self.inner.shards[self.shard].push_bulk(src)
    }
}

impl<T, const N: usize, const P: usize> std::fmt::Debug for ShardProducer<T, N, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardProducer")
            .field("shard", &self.shard)
            .finish_non_exhaustive()
    }
}
