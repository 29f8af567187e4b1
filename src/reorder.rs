use crate::backoff::Backoff;
use crate::metrics::{ReorderSnapshot, ReorderStats};
use crate::ring::Spsc;
use crate::slot::SlotMpsc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// An element tagged with its logical sequence number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Sequenced<T> {
    pub seq: u64,
    pub value: T,
}

impl<T> Sequenced<T> {
    pub const fn new(seq: u64, value: T) -> Self {
        Self { seq, value }
    }
}

/// Background worker that turns an unordered MPSC stream into an ordered
/// SPSC stream.
///
/// Producers push [`Sequenced`] elements into a shared [`SlotMpsc`] in
/// whatever order they complete; the worker thread re-sequences them and
/// emits `0, 1, 2, …` into a private output ring that [`pop`](Reorderer::pop)
/// reads from.
///
/// Early arrivals are staged in two tiers: a direct-mapped array of `FAST`
/// slots indexed by `seq % FAST`, and a map for arrivals that lose a slot
/// collision. On a collision the entry closer to the next expected sequence
/// keeps the fast slot. Sequences older than the emit cursor are dropped and
/// counted (`stale` in the [`snapshot`](ReorderStats::snapshot)).
///
/// Dropping the `Reorderer` stops and joins the worker; elements still
/// staged at that point are discarded.
///
/// # Example
///
/// ```
/// use seqring::{Reorderer, Sequenced, SlotMpsc};
/// use std::sync::Arc;
///
/// let source: Arc<SlotMpsc<Sequenced<u64>, 64>> = Arc::new(SlotMpsc::new());
/// let reorderer: Reorderer<u64, 64> = Reorderer::spawn(Arc::clone(&source));
///
/// // Sequences arrive out of order...
/// assert!(source.push(Sequenced::new(1, 11)));
/// assert!(source.push(Sequenced::new(0, 10)));
///
/// // ...and come out ordered.
/// let mut got = Vec::new();
/// while got.len() < 2 {
///     if let Some(item) = reorderer.pop() {
///         got.push(item.seq);
///     }
/// }
/// assert_eq!(got, vec![0, 1]);
/// ```
pub struct Reorderer<T, const OUT: usize, const FAST: usize = 1024> {
    output: Arc<Spsc<Sequenced<T>, OUT>>,
    stats: Arc<ReorderStats>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl<T, const OUT: usize, const FAST: usize> Reorderer<T, OUT, FAST>
where
    T: Copy + Send + 'static,
{
    const FAST_OK: () = assert!(FAST >= 1, "Reorderer fast buffer cannot be empty");

    /// Spawns the worker thread draining `source`.
    ///
    /// The first emitted sequence is 0.
    pub fn spawn<const SRC: usize>(source: Arc<SlotMpsc<Sequenced<T>, SRC>>) -> Self {
        let () = Self::FAST_OK;

        let output = Arc::new(Spsc::new());
        let stats = Arc::new(ReorderStats::new());
        let stop = Arc::new(AtomicBool::new(false));

        let worker = {
            let output = Arc::clone(&output);
            let stats = Arc::clone(&stats);
            let stop = Arc::clone(&stop);
            thread::Builder::new()
                .name("seqring-reorder".into())
                .spawn(move || {
                    Worker::<T, OUT, FAST> {
                        output,
                        stats,
                        stop,
                        fast: vec![None; FAST].into_boxed_slice(),
                        overflow: HashMap::new(),
                        expected: 0,
                    }
                    .run(&source)
                })
                .expect("failed to spawn reorder worker")
        };

        Self {
            output,
            stats,
            stop,
            worker: Some(worker),
        }
    }

    /// Reads the next in-order element, or `None` if the worker has not
    /// emitted it yet.
    #[inline]
    pub fn pop(&self) -> Option<Sequenced<T>> {
        self.output.pop()
    }

    /// Snapshot of the worker's counters.
    pub fn snapshot(&self) -> ReorderSnapshot {
        self.stats.snapshot()
    }
}

impl<T, const OUT: usize, const FAST: usize> Drop for Reorderer<T, OUT, FAST> {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

/// Worker-private state; lives entirely on the worker thread.
struct Worker<T, const OUT: usize, const FAST: usize> {
    output: Arc<Spsc<Sequenced<T>, OUT>>,
    stats: Arc<ReorderStats>,
    stop: Arc<AtomicBool>,
    /// Direct-mapped staging tier, indexed by `seq % FAST`.
    fast: Box<[Option<Sequenced<T>>]>,
    /// Staging tier for arrivals that lose a fast-slot collision.
    overflow: HashMap<u64, Sequenced<T>>,
    /// Next sequence to emit.
    expected: u64,
}

impl<T: Copy + Send, const OUT: usize, const FAST: usize> Worker<T, OUT, FAST> {
    fn run<const SRC: usize>(mut self, source: &SlotMpsc<Sequenced<T>, SRC>) {
        while !self.stop.load(Ordering::Relaxed) {
            match source.pop() {
                Some(item) => {
                    self.stats.add_processed();
                    self.process(item);
                }
                None => thread::yield_now(),
            }
        }
    }

    fn process(&mut self, item: Sequenced<T>) {
        if item.seq == self.expected {
            self.stats.add_direct_hit();
            self.emit(item);
            self.expected += 1;
            self.drain_ready();
            return;
        }

        if item.seq < self.expected {
            // Already emitted this sequence once; the counter makes
            // caller-side duplicate sends observable.
            self.stats.add_stale();
            return;
        }

        self.stats.record_gap(item.seq - self.expected);
        self.stage(item);
    }

    /// Stages an early arrival in the fast buffer, demoting the entry
    /// farther from `expected` to the overflow map on a collision.
    fn stage(&mut self, item: Sequenced<T>) {
        let idx = (item.seq % FAST as u64) as usize;
        match &mut self.fast[idx] {
            slot @ None => *slot = Some(item),
            Some(held) if held.seq == item.seq => {
                // Duplicate of an already staged sequence; keep the first.
            }
            Some(held) => {
                if item.seq - self.expected < held.seq - self.expected {
                    self.overflow.insert(held.seq, *held);
                    *held = item;
                } else {
                    self.overflow.insert(item.seq, item);
                }
            }
        }
    }

    /// Emits every staged element that is now in order, fast tier first.
    fn drain_ready(&mut self) {
        loop {
            let idx = (self.expected % FAST as u64) as usize;
            if let Some(held) = self.fast[idx] {
                if held.seq == self.expected {
                    self.fast[idx] = None;
                    self.stats.add_l1_hit();
                    self.emit(held);
                    self.expected += 1;
                    continue;
                }
            }
            if let Some(item) = self.overflow.remove(&self.expected) {
                self.stats.add_l2_hit();
                self.emit(item);
                self.expected += 1;
                continue;
            }
            break;
        }
    }

    /// Spin-pushes into the output ring; gives up only when stopping, so a
    /// full output with a gone consumer cannot wedge Drop.
    fn emit(&self, item: Sequenced<T>) {
        let mut backoff = Backoff::new();
        while !self.output.push(item) {
            if self.stop.load(Ordering::Relaxed) {
                return;
            }
            backoff.snooze();
        }
    }
}
