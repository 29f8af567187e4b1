use rand::Rng;
use seqring::{Backoff, Reorderer, Sequenced, SlotMpsc, Spsc};
use std::sync::Arc;
use std::thread;

#[test]
fn restores_order_after_parallel_jitter() {
    // A sequencer fans elements out to four workers over SPSC rings; each
    // worker adds random processing jitter before pushing into the shared
    // source, so arrivals there are a permutation with bounded displacement.
    const COUNT: u64 = 200_000;
    const WORKERS: usize = 4;

    let source: Arc<SlotMpsc<Sequenced<u64>, 1024>> = Arc::new(SlotMpsc::new());
    let reorderer: Reorderer<u64, 4096> = Reorderer::spawn(Arc::clone(&source));

    let stages: Vec<Arc<Spsc<Sequenced<u64>, 1024>>> =
        (0..WORKERS).map(|_| Arc::new(Spsc::new())).collect();

    let sequencer = {
        let stages = stages.clone();
        thread::spawn(move || {
            for seq in 0..COUNT {
                let stage = &stages[(seq % WORKERS as u64) as usize];
                let mut backoff = Backoff::new();
                while !stage.push(Sequenced::new(seq, seq ^ 0xdead_beef)) {
                    backoff.snooze();
                }
            }
        })
    };

    let workers: Vec<_> = stages
        .iter()
        .map(|stage| {
            let stage = Arc::clone(stage);
            let source = Arc::clone(&source);
            thread::spawn(move || {
                let mut rng = rand::thread_rng();
                let mut done = 0u64;
                while done < COUNT / WORKERS as u64 {
                    let Some(item) = stage.pop() else {
                        thread::yield_now();
                        continue;
                    };
                    for _ in 0..rng.gen_range(0..200u32) {
                        std::hint::spin_loop();
                    }
                    let mut backoff = Backoff::new();
                    while !source.push(item) {
                        backoff.snooze();
                    }
                    done += 1;
                }
            })
        })
        .collect();

    let mut next = 0u64;
    while next < COUNT {
        if let Some(item) = reorderer.pop() {
            assert_eq!(item.seq, next, "output broke ascending order");
            assert_eq!(item.value, next ^ 0xdead_beef);
            next += 1;
        } else {
            thread::yield_now();
        }
    }

    sequencer.join().unwrap();
    for w in workers {
        w.join().unwrap();
    }

    let snap = reorderer.snapshot();
    assert_eq!(snap.processed, COUNT);
    assert_eq!(
        snap.direct_hits + snap.l1_hits + snap.l2_hits,
        COUNT,
        "every processed element must be accounted to exactly one tier"
    );
    assert_eq!(snap.stale, 0);
}

#[test]
fn single_producer_in_order_is_all_direct_hits() {
    const COUNT: u64 = 10_000;

    let source: Arc<SlotMpsc<Sequenced<u32>, 256>> = Arc::new(SlotMpsc::new());
    let reorderer: Reorderer<u32, 256> = Reorderer::spawn(Arc::clone(&source));

    let producer = {
        let source = Arc::clone(&source);
        thread::spawn(move || {
            for seq in 0..COUNT {
                let mut backoff = Backoff::new();
                while !source.push(Sequenced::new(seq, seq as u32)) {
                    backoff.snooze();
                }
            }
        })
    };

    let mut next = 0u64;
    while next < COUNT {
        if let Some(item) = reorderer.pop() {
            assert_eq!(item.seq, next);
            next += 1;
        } else {
            thread::yield_now();
        }
    }
    producer.join().unwrap();

    let snap = reorderer.snapshot();
    assert_eq!(snap.processed, COUNT);
    assert_eq!(snap.direct_hits, COUNT);
    assert_eq!(snap.l1_hits + snap.l2_hits + snap.stale, 0);
    assert_eq!(snap.max_gap, 0);
}

#[test]
fn duplicate_sends_surface_in_stale_counter() {
    let source: Arc<SlotMpsc<Sequenced<u64>, 64>> = Arc::new(SlotMpsc::new());
    let reorderer: Reorderer<u64, 64> = Reorderer::spawn(Arc::clone(&source));

    for seq in 0..10u64 {
        assert!(source.push(Sequenced::new(seq, seq)));
    }
    // Duplicate a couple of already delivered sequences.
    let mut drained = 0;
    while drained < 10 {
        if reorderer.pop().is_some() {
            drained += 1;
        } else {
            thread::yield_now();
        }
    }
    assert!(source.push(Sequenced::new(3, 3)));
    assert!(source.push(Sequenced::new(7, 7)));
    assert!(source.push(Sequenced::new(10, 10)));

    let mut got = None;
    while got.is_none() {
        got = reorderer.pop();
        thread::yield_now();
    }
    assert_eq!(got.unwrap().seq, 10);

    let snap = reorderer.snapshot();
    assert_eq!(snap.stale, 2);
    assert_eq!(snap.processed, 13);
}
