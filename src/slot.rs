use crate::backoff::Backoff;
use crate::invariants::debug_assert_phase;
use crate::ring::CacheAligned;
use std::cell::UnsafeCell;
use std::mem::MaybeUninit;
use std::sync::atomic::{AtomicUsize, Ordering};

/// A slot in the sequenced ring.
///
/// The sequence number encodes both position and lifecycle phase. For the
/// position currently mapped to slot `i`:
/// - `seq == pos`: empty, writable
/// - `seq == pos + 1`: filled, readable
/// - `seq == pos + N`: consumed, writable on the next revolution
struct Slot<T> {
    seq: AtomicUsize,
    data: UnsafeCell<MaybeUninit<T>>,
}

/// Multi-producer single-consumer queue over a single shared ring.
///
/// Producers contend on `tail` with CAS, but only after observing the slot's
/// sequence match their claimed position, so a slow producer never corrupts a
/// fast one's slot. The per-slot sequence grows monotonically with each
/// revolution, which rules out ABA on the tail CAS: a position is never
/// claimable twice.
///
/// Unlike the sharded queue, any number of producer threads may push through
/// a shared reference; there is no registration step. The pop side remains
/// single-consumer by contract.
///
/// FIFO order is commit order: the order in which producers win the tail CAS.
///
/// # Example
///
/// ```
/// use seqring::SlotMpsc;
///
/// let queue: SlotMpsc<u64, 8> = SlotMpsc::new();
/// assert!(queue.push(5));
/// assert!(queue.push(6));
/// assert_eq!(queue.pop(), Some(5));
/// assert_eq!(queue.pop(), Some(6));
/// assert_eq!(queue.pop(), None);
/// ```
pub struct SlotMpsc<T, const N: usize> {
    /// Consumer read position. Written only by the consumer.
    head: CacheAligned<AtomicUsize>,
    /// Producer claim position. Shared among producers via CAS.
    tail: CacheAligned<AtomicUsize>,
    slots: Box<[Slot<T>]>,
}

// Safety: slot hand-off is synchronized by the per-slot sequence protocol
// (Release publish, Acquire observe); head/tail are atomics.
unsafe impl<T: Send, const N: usize> Send for SlotMpsc<T, N> {}
unsafe impl<T: Send, const N: usize> Sync for SlotMpsc<T, N> {}

impl<T: Copy, const N: usize> SlotMpsc<T, N> {
    const MASK: usize = N - 1;

    const CAPACITY_OK: () = {
        assert!(N >= 2, "SlotMpsc capacity must be at least 2");
        assert!(N.is_power_of_two(), "SlotMpsc capacity must be a power of two");
    };

    /// Creates an empty queue. Slot `i` starts with sequence `i` (writable).
    pub fn new() -> Self {
        let () = Self::CAPACITY_OK;

        let slots = (0..N)
            .map(|i| Slot {
                seq: AtomicUsize::new(i),
                data: UnsafeCell::new(MaybeUninit::uninit()),
            })
            .collect::<Vec<_>>()
            .into_boxed_slice();

        Self {
            head: CacheAligned::new(AtomicUsize::new(0)),
            tail: CacheAligned::new(AtomicUsize::new(0)),
            slots,
        }
    }

    /// Pushes a value. Returns false only when the ring is genuinely full:
    /// transient CAS races with other producers are retried internally.
    #[inline]
    pub fn push(&self, value: T) -> bool {
        self.push_with(|slot| {
            slot.write(value);
        })
    }

    /// In-place writer form of [`push`](Self::push). The writer runs only
    /// after the slot has been claimed, and must fully initialize it.
    pub fn push_with<F>(&self, writer: F) -> bool
    where
        F: FnOnce(&mut MaybeUninit<T>),
    {
        let mut backoff = Backoff::new();
        let mut pos = self.tail.load(Ordering::Relaxed);

        loop {
            let slot = &self.slots[pos & Self::MASK];
            let seq = slot.seq.load(Ordering::Acquire);
            let diff = seq as isize - pos as isize;

            if diff == 0 {
                // Slot is writable for this position; race other producers
                // for it. The CAS is Relaxed: the linearization point is the
                // Release sequence publish below, not the claim.
                match self.tail.compare_exchange_weak(
                    pos,
                    pos.wrapping_add(1),
                    Ordering::Relaxed,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        // SAFETY: winning the CAS at `pos` makes this thread
                        // the unique owner of the slot until the store below.
                        writer(unsafe { &mut *slot.data.get() });
                        slot.seq.store(pos.wrapping_add(1), Ordering::Release);
                        return true;
                    }
                    Err(current) => {
                        pos = current;
                        backoff.spin();
                    }
                }
            } else if diff < 0 {
                // The slot still holds the previous revolution. Full only if
                // a fresh head observation confirms the whole ring is in
                // flight; otherwise the consumer moved and we retry.
                let head = self.head.load(Ordering::Acquire);
                if pos.wrapping_sub(head) >= N {
                    return false;
                }
                pos = self.tail.load(Ordering::Relaxed);
            } else {
                // Another producer claimed this position first.
                pos = self.tail.load(Ordering::Relaxed);
                backoff.spin();
            }
        }
    }

    /// Pops a value. Returns `None` iff no published element is available.
    ///
    /// Single consumer by contract.
    pub fn pop(&self) -> Option<T> {
        let pos = self.head.load(Ordering::Relaxed);
        let slot = &self.slots[pos & Self::MASK];
        let seq = slot.seq.load(Ordering::Acquire);
        debug_assert_phase!(seq, pos, N);

        if seq != pos.wrapping_add(1) {
            return None;
        }

        // SAFETY: the Acquire load saw the producer's Release publish for
        // this exact position; the slot is ours until recycled below.
        let value = unsafe { (*slot.data.get()).assume_init_read() };
        slot.seq.store(pos.wrapping_add(N), Ordering::Release);
        self.head.store(pos.wrapping_add(1), Ordering::Release);
        Some(value)
    }

    /// In-place reader form of [`pop`](Self::pop). Returns false iff no
    /// published element is available; the reference must not escape the
    /// call.
    pub fn pop_with<F>(&self, reader: F) -> bool
    where
        F: FnOnce(&T),
    {
        let pos = self.head.load(Ordering::Relaxed);
        let slot = &self.slots[pos & Self::MASK];
        let seq = slot.seq.load(Ordering::Acquire);
        debug_assert_phase!(seq, pos, N);

        if seq != pos.wrapping_add(1) {
            return false;
        }

        // SAFETY: as in `pop`.
        reader(unsafe { (*slot.data.get()).assume_init_ref() });
        slot.seq.store(pos.wrapping_add(N), Ordering::Release);
        self.head.store(pos.wrapping_add(1), Ordering::Release);
        true
    }

    /// Number of claimed-but-unconsumed positions (approximate: a claimed
    /// slot counts before its data is published).
    #[inline]
    pub fn len(&self) -> usize {
        let tail = self.tail.load(Ordering::Acquire);
        let head = self.head.load(Ordering::Acquire);
        tail.wrapping_sub(head)
    }

    /// True if the queue appears empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns the capacity. All `N` slots are usable: the phase scheme
    /// distinguishes full from empty without sacrificing a slot.
    #[inline]
    pub const fn capacity(&self) -> usize {
        N
    }
}

impl<T: Copy, const N: usize> Default for SlotMpsc<T, N> {
    fn default() -> Self {
        Self::new()
    }
}
