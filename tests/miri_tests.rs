//! Miri-compatible tests for detecting undefined behavior.
//!
//! Run with: `cargo +nightly miri test --test miri_tests`
//!
//! Small capacities and item counts keep the interpreter fast while still
//! exercising every unsafe path: slot writes through UnsafeCell, seam-
//! crossing bulk copies, phase-gated hand-off, and the reorder worker.

use seqring::{Reorderer, Sequenced, SeqMpsc, ShardedMpsc, SlotMpsc, Spsc};
use std::sync::Arc;
use std::thread;

#[test]
fn miri_spsc_scalar_and_closure_paths() {
    let ring: Spsc<u64, 4> = Spsc::new();

    assert!(ring.push(1));
    assert!(ring.push_with(|slot| {
        slot.write(2);
    }));

    assert_eq!(ring.pop(), Some(1));
    let mut seen = None;
    assert!(ring.pop_with(|v| seen = Some(*v)));
    assert_eq!(seen, Some(2));
    assert_eq!(ring.pop(), None);
}

#[test]
fn miri_spsc_bulk_seam_crossing() {
    let ring: Spsc<u32, 4> = Spsc::new();

    // Walk the indices around the ring so the bulk copy splits.
    for round in 0..4u32 {
        assert!(ring.push(round));
        assert_eq!(ring.pop(), Some(round));
    }

    assert_eq!(ring.push_bulk(&[10, 11, 12]), 3);
    let mut out = [0u32; 3];
    assert_eq!(ring.pop_bulk(&mut out), 3);
    assert_eq!(out, [10, 11, 12]);
}

#[test]
fn miri_spsc_two_threads() {
    let ring: Arc<Spsc<u64, 4>> = Arc::new(Spsc::new());

    let producer = {
        let ring = Arc::clone(&ring);
        thread::spawn(move || {
            for i in 0..16 {
                while !ring.push(i) {
                    thread::yield_now();
                }
            }
        })
    };

    let mut next = 0u64;
    while next < 16 {
        if let Some(v) = ring.pop() {
            assert_eq!(v, next);
            next += 1;
        } else {
            thread::yield_now();
        }
    }
    producer.join().unwrap();
}

#[test]
fn miri_sharded_register_and_drain() {
    let queue: ShardedMpsc<u32, 4, 2> = ShardedMpsc::new();
    let p0 = queue.register().unwrap();
    let p1 = queue.register().unwrap();

    assert!(p0.push(1));
    assert!(p1.push(2));
    assert_eq!(p0.push_bulk(&[3, 4]), 2);

    let mut got = Vec::new();
    while let Some(v) = queue.pop() {
        got.push(v);
    }
    got.sort_unstable();
    assert_eq!(got, vec![1, 2, 3, 4]);
}

#[test]
fn miri_slot_two_producers() {
    let queue: Arc<SlotMpsc<u64, 4>> = Arc::new(SlotMpsc::new());

    let handles: Vec<_> = (0..2u64)
        .map(|p| {
            let q = Arc::clone(&queue);
            thread::spawn(move || {
                for i in 0..8 {
                    while !q.push(p * 100 + i) {
                        thread::yield_now();
                    }
                }
            })
        })
        .collect();

    let mut got = Vec::new();
    while got.len() < 16 {
        if let Some(v) = queue.pop() {
            got.push(v);
        } else {
            thread::yield_now();
        }
    }
    for h in handles {
        h.join().unwrap();
    }

    got.sort_unstable();
    let expected: Vec<u64> = (0..8).chain(100..108).collect();
    assert_eq!(got, expected);
}

#[test]
fn miri_seq_phase_handoff() {
    let queue: SeqMpsc<u64, 4> = SeqMpsc::new();

    queue.push_at(1, 11);
    queue.push_at(0, 10);
    assert_eq!(queue.try_pop(), Some(10));
    assert_eq!(queue.try_pop(), Some(11));
    assert_eq!(queue.try_pop(), None);

    // Next revolution reuses the slots.
    for seq in 2..6u64 {
        queue.push_at(seq, seq);
    }
    for seq in 2..6u64 {
        assert_eq!(queue.try_pop(), Some(seq));
    }
}

#[test]
fn miri_reorderer_tiny_permutation() {
    let source: Arc<SlotMpsc<Sequenced<u64>, 4>> = Arc::new(SlotMpsc::new());
    let reorderer: Reorderer<u64, 4, 2> = Reorderer::spawn(Arc::clone(&source));

    for seq in [1u64, 0, 3, 2] {
        while !source.push(Sequenced::new(seq, seq + 100)) {
            thread::yield_now();
        }
    }

    let mut got = Vec::new();
    while got.len() < 4 {
        if let Some(item) = reorderer.pop() {
            got.push(item.value);
        } else {
            thread::yield_now();
        }
    }
    assert_eq!(got, vec![100, 101, 102, 103]);
}
